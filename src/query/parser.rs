//! Predicate parser
//!
//! Recursive descent over the lexer's tokens.
//!
//! ## Grammar
//! ```text
//! expr       := conjunction ( OR conjunction )*
//! conjunction:= primary ( AND primary )*
//! primary    := '(' expr ')' | comparison
//! comparison := field '=' literal
//! literal    := quoted | number | true | false | word
//! ```
//!
//! Nested nodes of the same operator are flattened while parsing, so
//! `a=1 AND (b=2 AND c=3)` yields one `And` with three children.

use crate::error::{GridError, Result};

use super::lexer::{tokenize, Token, TokenKind};
use super::{Expr, Literal};

/// Words that belong to query languages beyond the supported subset
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "NOT", "IN", "LIKE", "ILIKE", "REGEX", "BETWEEN", "IS", "NULL",
];

/// Deepest parenthesis nesting accepted
pub const MAX_NESTING: usize = 256;

/// Parse a free-form predicate. Empty input yields [`Expr::All`].
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(Expr::All);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.expr()?;

    if let Some(token) = parser.peek() {
        return Err(GridError::syntax(token.text(), token.offset));
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    /// Currently open parentheses
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| GridError::syntax("<end of input>", self.end))?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Word(w), .. }) if w.eq_ignore_ascii_case(keyword))
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut terms = Vec::new();
        push_flat(&mut terms, self.conjunction()?, |e| matches!(e, Expr::Or(_)));

        while self.peek_keyword("OR") {
            self.pos += 1;
            push_flat(&mut terms, self.conjunction()?, |e| matches!(e, Expr::Or(_)));
        }

        Ok(collapse(terms, Expr::Or))
    }

    fn conjunction(&mut self) -> Result<Expr> {
        let mut terms = Vec::new();
        push_flat(&mut terms, self.primary()?, |e| matches!(e, Expr::And(_)));

        while self.peek_keyword("AND") {
            self.pos += 1;
            push_flat(&mut terms, self.primary()?, |e| matches!(e, Expr::And(_)));
        }

        Ok(collapse(terms, Expr::And))
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.next()?;
        match token.kind {
            TokenKind::LParen => {
                if self.depth == MAX_NESTING {
                    return Err(GridError::syntax("(", token.offset));
                }
                self.depth += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                let close = self.next().map_err(|_| GridError::syntax("(", token.offset))?;
                if close.kind != TokenKind::RParen {
                    return Err(GridError::syntax(close.text(), close.offset));
                }
                Ok(inner)
            }
            TokenKind::Word(ref field) if is_field_name(field) => {
                let op = self.next()?;
                if op.kind != TokenKind::Equals {
                    return Err(GridError::syntax(op.text(), op.offset));
                }
                let value = self.literal()?;
                Ok(Expr::Equal {
                    field: field.clone(),
                    value,
                })
            }
            _ => Err(GridError::syntax(token.text(), token.offset)),
        }
    }

    fn literal(&mut self) -> Result<Literal> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Quoted(text) => Ok(Literal::Text(text)),
            TokenKind::Number(text) if is_number(&text) => Ok(Literal::Number(text)),
            TokenKind::Word(ref word) if word.eq_ignore_ascii_case("true") => Ok(Literal::Bool(true)),
            TokenKind::Word(ref word) if word.eq_ignore_ascii_case("false") => Ok(Literal::Bool(false)),
            TokenKind::Word(ref word) if is_field_name(word) => Ok(Literal::Text(word.clone())),
            _ => Err(GridError::syntax(token.text(), token.offset)),
        }
    }
}

/// A word usable as a field or bare literal: not a reserved keyword
fn is_field_name(word: &str) -> bool {
    !word.eq_ignore_ascii_case("AND")
        && !word.eq_ignore_ascii_case("OR")
        && !UNSUPPORTED_KEYWORDS
            .iter()
            .any(|k| word.eq_ignore_ascii_case(k))
}

fn is_number(text: &str) -> bool {
    text.parse::<i64>().is_ok() || text.parse::<f64>().is_ok()
}

fn push_flat(terms: &mut Vec<Expr>, expr: Expr, same_op: impl Fn(&Expr) -> bool) {
    if same_op(&expr) {
        if let Expr::And(inner) | Expr::Or(inner) = expr {
            terms.extend(inner);
        }
    } else {
        terms.push(expr);
    }
}

fn collapse(mut terms: Vec<Expr>, build: fn(Vec<Expr>) -> Expr) -> Expr {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        build(terms)
    }
}
