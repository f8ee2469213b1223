//! Predicate lexer
//!
//! Splits a free-form predicate into offset-tagged tokens.

use crate::error::{GridError, Result};

/// Kind of a lexed token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare word: field name, keyword or unquoted literal
    Word(String),
    /// Quoted string with quotes removed and `''` / `""` unescaped
    Quoted(String),
    /// Numeric literal as written
    Number(String),
    Equals,
    LParen,
    RParen,
    /// Comparison operator the predicate subset does not support
    Unsupported(String),
}

/// A token and the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    /// Source-like rendering used in error messages
    pub fn text(&self) -> String {
        match &self.kind {
            TokenKind::Word(w) => w.clone(),
            TokenKind::Quoted(s) => format!("'{}'", s),
            TokenKind::Number(n) => n.clone(),
            TokenKind::Equals => "=".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Unsupported(op) => op.clone(),
        }
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '$'
}

/// Tokenize a predicate expression
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match c {
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            '=' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    TokenKind::Unsupported("==".to_string())
                } else {
                    TokenKind::Equals
                }
            }
            ',' => {
                chars.next();
                TokenKind::Unsupported(",".to_string())
            }
            '<' | '>' | '!' => {
                chars.next();
                let mut op = c.to_string();
                if let Some(&(_, next)) = chars.peek() {
                    if next == '=' || (c == '<' && next == '>') {
                        op.push(next);
                        chars.next();
                    }
                }
                TokenKind::Unsupported(op)
            }
            '\'' | '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    if ch == c {
                        // doubled quote is an escaped quote
                        if matches!(chars.peek(), Some(&(_, next)) if next == c) {
                            chars.next();
                            text.push(c);
                            continue;
                        }
                        closed = true;
                        break;
                    }
                    text.push(ch);
                }
                if !closed {
                    return Err(GridError::syntax(&input[offset..], offset));
                }
                TokenKind::Quoted(text)
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut end = offset + c.len_utf8();
                chars.next();
                let mut seen_dot = false;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_ascii_digit() || (ch == '.' && !seen_dot) {
                        seen_dot |= ch == '.';
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &input[offset..end];
                if text == "-" || text.ends_with('.') {
                    return Err(GridError::syntax(text, offset));
                }
                TokenKind::Number(text.to_string())
            }
            c if is_word_start(c) => {
                let mut end = offset;
                while let Some(&(i, ch)) = chars.peek() {
                    if is_word_char(ch) {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Word(input[offset..end].to_string())
            }
            other => return Err(GridError::syntax(other.to_string(), offset)),
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}
