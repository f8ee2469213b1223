//! PredicateCompiler Tests
//!
//! Tests verify:
//! - Canonical re-serialization of free-form expressions
//! - Field mappings compile to ordered conjunctions
//! - Syntax errors name the offending token and offset
//! - Compiled predicates evaluate against entry values

use std::collections::BTreeMap;

use gridmap::error::GridError;
use gridmap::query::{Criteria, Expr, Literal, PredicateCompiler, MAX_NESTING};
use gridmap::value::Value;

fn compile(criteria: impl Into<Criteria>) -> String {
    PredicateCompiler::new().compile(criteria).unwrap().to_string()
}

fn syntax_error(input: &str) -> (String, usize) {
    match PredicateCompiler::new().compile(input) {
        Err(GridError::PredicateSyntax { token, offset }) => (token, offset),
        other => panic!("expected syntax error for {:?}, got {:?}", input, other),
    }
}

// =============================================================================
// Expression Tests
// =============================================================================

#[test]
fn test_expression_with_nested_or() {
    assert_eq!(
        compile("active = false AND (age = 45 OR name = 'Joe Mategna')"),
        "(active=false AND (age=45 OR name=Joe Mategna))"
    );
}

#[test]
fn test_single_comparison_has_no_parentheses() {
    assert_eq!(compile("quantity = 3"), "quantity=3");
    assert_eq!(compile("  ((quantity=3))  "), "quantity=3");
}

#[test]
fn test_same_operator_nesting_is_flattened() {
    assert_eq!(compile("a=1 AND (b=2 AND c=3)"), "(a=1 AND b=2 AND c=3)");
    assert_eq!(compile("(a=1 OR b=2) OR c=3"), "(a=1 OR b=2 OR c=3)");
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(compile("a=1 OR b=2 AND c=3"), "(a=1 OR (b=2 AND c=3))");
    assert_eq!(compile("(a=1 OR b=2) AND c=3"), "((a=1 OR b=2) AND c=3)");
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(compile("a = 1 and b = 2 or c = 3"), "((a=1 AND b=2) OR c=3)");
}

#[test]
fn test_literal_forms() {
    assert_eq!(compile("price = 2.50"), "price=2.50");
    assert_eq!(compile("price = 45.0"), "price=45.0");
    assert_eq!(compile("id = 007"), "id=007");
    assert_eq!(compile("delta = -3"), "delta=-3");
    assert_eq!(compile("name = \"Joe\""), "name=Joe");
    assert_eq!(compile("flag = TRUE"), "flag=true");
    assert_eq!(compile("city = Paris"), "city=Paris");
    assert_eq!(compile("owner.name = 'O''Brien'"), "owner.name=O'Brien");
}

#[test]
fn test_parsed_tree_shape() {
    let predicate = PredicateCompiler::new()
        .compile("a = 1 AND (b = 'x' OR c = true)")
        .unwrap();

    assert_eq!(
        predicate.expr(),
        &Expr::And(vec![
            Expr::Equal {
                field: "a".to_string(),
                value: Literal::Number("1".to_string()),
            },
            Expr::Or(vec![
                Expr::Equal {
                    field: "b".to_string(),
                    value: Literal::Text("x".to_string()),
                },
                Expr::Equal {
                    field: "c".to_string(),
                    value: Literal::Bool(true),
                },
            ]),
        ])
    );
}

#[test]
fn test_blank_expression_matches_all() {
    let predicate = PredicateCompiler::new().compile("   ").unwrap();
    assert!(predicate.is_match_all());
    assert_eq!(predicate.as_str(), "");
}

// =============================================================================
// Mapping Tests
// =============================================================================

#[test]
fn test_mapping_single_integer() {
    assert_eq!(compile([("quantity", 3)]), "quantity=3");
}

#[test]
fn test_mapping_string_is_not_quoted() {
    assert_eq!(
        compile([("country", "Unites States of America")]),
        "country=Unites States of America"
    );
}

#[test]
fn test_mapping_preserves_iteration_order() {
    let criteria = Criteria::fields(vec![
        ("quantity", Literal::from(3)),
        ("country", Literal::from("US")),
        ("active", Literal::from(true)),
    ]);
    assert_eq!(compile(criteria), "quantity=3 AND country=US AND active=true");
}

#[test]
fn test_mapping_from_btreemap_uses_key_order() {
    let mut fields = BTreeMap::new();
    fields.insert("zeta", 1);
    fields.insert("alpha", 2);
    assert_eq!(compile(fields), "alpha=2 AND zeta=1");
}

#[test]
fn test_empty_mapping_matches_all() {
    let predicate = PredicateCompiler::new().compile(Criteria::all()).unwrap();
    assert!(predicate.is_match_all());
    assert_eq!(predicate.as_str(), "");
    assert!(predicate.matches(&Value::from("anything")));
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_unsupported_comparison_operators() {
    assert_eq!(syntax_error("age < 45"), ("<".to_string(), 4));
    assert_eq!(syntax_error("age >= 45"), (">=".to_string(), 4));
    assert_eq!(syntax_error("age != 45"), ("!=".to_string(), 4));
    assert_eq!(syntax_error("age <> 45"), ("<>".to_string(), 4));
    assert_eq!(syntax_error("age == 45"), ("==".to_string(), 4));
}

#[test]
fn test_unsupported_keywords() {
    assert_eq!(syntax_error("age IN (1, 2)"), ("IN".to_string(), 4));
    assert_eq!(syntax_error("name LIKE 'J%'"), ("LIKE".to_string(), 5));
    assert_eq!(syntax_error("NOT a = 1"), ("NOT".to_string(), 0));
}

#[test]
fn test_unbalanced_parentheses() {
    assert_eq!(syntax_error("(a = 1"), ("(".to_string(), 0));
    assert_eq!(syntax_error("a = 1)"), (")".to_string(), 5));
    assert_eq!(syntax_error("(a = 1 OR (b = 2)"), ("(".to_string(), 0));
}

#[test]
fn test_missing_operands() {
    assert_eq!(syntax_error("a = 1 AND"), ("<end of input>".to_string(), 9));
    assert_eq!(syntax_error("a ="), ("<end of input>".to_string(), 3));
    assert_eq!(syntax_error("= 1"), ("=".to_string(), 0));
    assert_eq!(syntax_error("a = 1 OR OR b = 2"), ("OR".to_string(), 9));
}

#[test]
fn test_trailing_tokens() {
    assert_eq!(syntax_error("a = 1 b = 2"), ("b".to_string(), 6));
    assert_eq!(
        syntax_error("name = Joe Mategna"),
        ("Mategna".to_string(), 11)
    );
}

fn nested(depth: usize) -> String {
    format!("{}a=1{}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn test_nesting_at_limit_compiles() {
    assert_eq!(compile(nested(MAX_NESTING).as_str()), "a=1");
}

#[test]
fn test_nesting_past_limit_is_rejected() {
    assert_eq!(
        syntax_error(&nested(MAX_NESTING + 1)),
        ("(".to_string(), MAX_NESTING)
    );
}

#[test]
fn test_very_deep_nesting_is_rejected_without_overflow() {
    assert_eq!(
        syntax_error(&nested(20_000)),
        ("(".to_string(), MAX_NESTING)
    );
}

#[test]
fn test_nesting_limit_counts_open_parentheses_only() {
    // Sibling groups do not accumulate depth
    let groups = vec!["(a=1)"; MAX_NESTING + 10].join(" AND ");
    assert!(PredicateCompiler::new().compile(groups.as_str()).is_ok());
}

#[test]
fn test_unterminated_string_reports_fragment() {
    assert_eq!(syntax_error("a = 'open"), ("'open".to_string(), 4));
}

// =============================================================================
// Evaluation Tests
// =============================================================================

fn person(name: &str, age: i64, active: bool) -> Value {
    Value::record([
        ("name", Value::from(name)),
        ("age", Value::from(age)),
        ("active", Value::from(active)),
    ])
}

#[test]
fn test_evaluate_nested_predicate() {
    let predicate = PredicateCompiler::new()
        .compile("active = false AND (age = 45 OR name = 'Joe Mategna')")
        .unwrap();

    assert!(predicate.matches(&person("Joe Mategna", 30, false)));
    assert!(predicate.matches(&person("Ann", 45, false)));
    assert!(!predicate.matches(&person("Ann", 45, true)));
    assert!(!predicate.matches(&person("Ann", 30, false)));
}

#[test]
fn test_evaluate_numeric_across_int_and_float() {
    let value = Value::record([("price", Value::from(2.0)), ("qty", Value::from(3))]);
    let compiler = PredicateCompiler::new();

    assert!(compiler.compile("price = 2").unwrap().matches(&value));
    assert!(compiler.compile("qty = 3.0").unwrap().matches(&value));
    assert!(compiler.compile([("qty", "3")]).unwrap().matches(&value));
}

#[test]
fn test_evaluate_number_as_written() {
    let compiler = PredicateCompiler::new();
    let predicate = compiler.compile("id = 007").unwrap();

    assert!(predicate.matches(&Value::record([("id", Value::from("007"))])));
    assert!(predicate.matches(&Value::record([("id", Value::from(7))])));
    assert!(!predicate.matches(&Value::record([("id", Value::from("7"))])));

    let price = compiler.compile("price = 45.0").unwrap();
    assert!(price.matches(&Value::record([("price", Value::from(45))])));
    assert!(price.matches(&Value::record([("price", Value::from("45.0"))])));
}

#[test]
fn test_evaluate_missing_field_and_scalars() {
    let compiler = PredicateCompiler::new();
    let predicate = compiler.compile("age = 45").unwrap();

    assert!(!predicate.matches(&Value::record([("name", Value::from("x"))])));
    assert!(!predicate.matches(&Value::from(45)));
    assert!(compiler.compile("this = 45").unwrap().matches(&Value::from(45)));
}

#[test]
fn test_evaluate_dotted_path() {
    let value = Value::record([(
        "owner",
        Value::record([("city", Value::from("Paris"))]),
    )]);
    let compiler = PredicateCompiler::new();

    assert!(compiler.compile("owner.city = Paris").unwrap().matches(&value));
    assert!(!compiler.compile("owner.city = Rome").unwrap().matches(&value));
}
