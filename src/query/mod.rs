//! Query Module
//!
//! Compiles criteria into canonical predicates the cluster evaluates.
//!
//! ## Responsibilities
//! - Parse free-form predicates (`=`, `AND`, `OR`, parentheses)
//! - Turn field → literal mappings into conjunctions
//! - Re-serialize with canonical spacing and minimal grouping
//! - Evaluate a compiled predicate against an entry value
//!
//! ## Canonical Text
//! ```text
//! active = false AND (age = 45 OR name = 'Joe Mategna')
//!                      │
//!                      ▼
//! (active=false AND (age=45 OR name=Joe Mategna))
//! ```

mod compiler;
mod lexer;
mod parser;

pub use compiler::{CompiledPredicate, PredicateCompiler};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::MAX_NESTING;

use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;

// =============================================================================
// Literal
// =============================================================================

/// A literal on the right-hand side of `=`
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Numeric literal parsed from predicate text, kept as written (`007`, `45.0`)
    Number(String),
    Text(String),
}

impl Literal {
    /// Whether an attribute value equals this literal
    ///
    /// Numbers compare numerically, text attributes compare against the
    /// literal's rendered text (a written number compares as written).
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Int(a), Value::Int(b)) => a == b,
            (Literal::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Literal::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Literal::Float(a), Value::Float(b)) => a == b,
            (Literal::Number(n), Value::Int(b)) => match n.parse::<i64>() {
                Ok(a) => a == *b,
                Err(_) => n.parse::<f64>().ok() == Some(*b as f64),
            },
            (Literal::Number(n), Value::Float(b)) => n.parse::<f64>().ok() == Some(*b),
            (Literal::Bool(a), Value::Bool(b)) => a == b,
            (Literal::Text(a), Value::Bool(b)) => a.eq_ignore_ascii_case(&b.to_string()),
            (Literal::Text(a), Value::Int(b)) => a.trim().parse::<i64>().ok() == Some(*b),
            (Literal::Text(a), Value::Float(b)) => a.trim().parse::<f64>().ok() == Some(*b),
            (literal, Value::Text(s)) => *s == literal.to_string(),
            _ => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Number(n) => f.write_str(n),
            Literal::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

macro_rules! int_literal {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Literal {
            fn from(value: $ty) -> Self {
                Literal::Int(value as i64)
            }
        })*
    };
}

int_literal!(i8, i16, i32, i64, u8, u16, u32);

// =============================================================================
// Expression Tree
// =============================================================================

/// Parsed predicate
///
/// `And`/`Or` never directly contain a node of the same operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Matches every entry
    All,
    Equal { field: String, value: Literal },
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    /// Evaluate against one entry value
    pub fn evaluate(&self, value: &Value) -> bool {
        match self {
            Expr::All => true,
            Expr::Equal { field, value: literal } => {
                let attribute = if field == "this" {
                    Some(value)
                } else {
                    value.field(field)
                };
                attribute.map_or(false, |a| literal.matches(a))
            }
            Expr::And(terms) => terms.iter().all(|t| t.evaluate(value)),
            Expr::Or(terms) => terms.iter().any(|t| t.evaluate(value)),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (terms, joiner) = match self {
            Expr::All => return Ok(()),
            Expr::Equal { field, value } => return write!(f, "{}={}", field, value),
            Expr::And(terms) => (terms, " AND "),
            Expr::Or(terms) => (terms, " OR "),
        };

        f.write_str("(")?;
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                f.write_str(joiner)?;
            }
            write!(f, "{}", term)?;
        }
        f.write_str(")")
    }
}

// =============================================================================
// Criteria
// =============================================================================

/// Input to [`PredicateCompiler::compile`]
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// Already-written predicate text
    Expression(String),
    /// Field → literal pairs, ANDed in this order
    Fields(Vec<(String, Literal)>),
}

impl Criteria {
    pub fn expression(text: impl Into<String>) -> Self {
        Criteria::Expression(text.into())
    }

    /// Build from any ordered sequence of pairs
    pub fn fields<K, L, I>(pairs: I) -> Self
    where
        K: Into<String>,
        L: Into<Literal>,
        I: IntoIterator<Item = (K, L)>,
    {
        Criteria::Fields(
            pairs
                .into_iter()
                .map(|(k, l)| (k.into(), l.into()))
                .collect(),
        )
    }

    /// Criteria matching every entry
    pub fn all() -> Self {
        Criteria::Fields(Vec::new())
    }
}

impl From<&str> for Criteria {
    fn from(value: &str) -> Self {
        Criteria::Expression(value.to_string())
    }
}

impl From<String> for Criteria {
    fn from(value: String) -> Self {
        Criteria::Expression(value)
    }
}

impl<K: Into<String>, L: Into<Literal>> From<Vec<(K, L)>> for Criteria {
    fn from(value: Vec<(K, L)>) -> Self {
        Criteria::fields(value)
    }
}

impl<K: Into<String>, L: Into<Literal>, const N: usize> From<[(K, L); N]> for Criteria {
    fn from(value: [(K, L); N]) -> Self {
        Criteria::fields(value)
    }
}

impl<K: Into<String>, L: Into<Literal>> From<BTreeMap<K, L>> for Criteria {
    fn from(value: BTreeMap<K, L>) -> Self {
        Criteria::fields(value)
    }
}
