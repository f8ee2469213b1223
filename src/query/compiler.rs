//! Predicate compiler
//!
//! Turns [`Criteria`] into an immutable [`CompiledPredicate`].

use std::fmt;

use crate::value::Value;

use super::parser::parse;
use super::{Criteria, Expr};
use crate::error::Result;

/// A compiled predicate: canonical text plus the tree the cluster evaluates
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    text: String,
    expr: Expr,
}

impl CompiledPredicate {
    /// The predicate that matches every entry (empty text)
    pub fn match_all() -> Self {
        Self {
            text: String::new(),
            expr: Expr::All,
        }
    }

    /// Canonical text sent to the query engine
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn is_match_all(&self) -> bool {
        self.expr == Expr::All
    }

    /// Evaluate against one entry value
    pub fn matches(&self, value: &Value) -> bool {
        self.expr.evaluate(value)
    }
}

impl fmt::Display for CompiledPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Stateless compiler, safe to share between threads
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateCompiler;

impl PredicateCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile criteria into a canonical predicate
    ///
    /// Expressions are parsed and re-serialized; field mappings become a
    /// flat conjunction in their iteration order, without parentheses.
    pub fn compile(&self, criteria: impl Into<Criteria>) -> Result<CompiledPredicate> {
        match criteria.into() {
            Criteria::Expression(text) => {
                let expr = parse(&text)?;
                tracing::trace!(input = %text, compiled = %expr, "Compiled predicate expression");
                Ok(CompiledPredicate {
                    text: expr.to_string(),
                    expr,
                })
            }
            Criteria::Fields(pairs) => {
                let mut clauses: Vec<Expr> = pairs
                    .into_iter()
                    .map(|(field, value)| Expr::Equal { field, value })
                    .collect();

                let text = clauses
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" AND ");

                let expr = match clauses.len() {
                    0 => Expr::All,
                    1 => clauses.remove(0),
                    _ => Expr::And(clauses),
                };

                Ok(CompiledPredicate { text, expr })
            }
        }
    }
}
