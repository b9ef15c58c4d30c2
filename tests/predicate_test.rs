//! Tests for predicate rendering and collection keys.

use muninn::predicate::{CompareOp, Expr, Literal, Predicate, collection_key};
use muninn::{CacheRuntime, CacheSettings, MuninnError};

#[test]
fn unrestricted_query_key() {
    assert_eq!(
        collection_key("Contact", &Predicate::True, &[]).unwrap(),
        "Contact where true"
    );
}

#[test]
fn comparison_operators() {
    let cases = [
        (CompareOp::Eq, "="),
        (CompareOp::Ne, "<>"),
        (CompareOp::Lt, "<"),
        (CompareOp::Le, "<="),
        (CompareOp::Gt, ">"),
        (CompareOp::Ge, ">="),
        (CompareOp::Like, "like"),
    ];
    for (op, text) in cases {
        let p = Predicate::compare(Expr::field("Age"), op, Expr::lit(5));
        assert_eq!(p.canonical_text(&[]).unwrap(), format!("Age {text} 5"));
    }
}

#[test]
fn literal_rendering() {
    let guid = uuid::Uuid::nil();
    let p = Predicate::In(
        Expr::field("X"),
        vec![
            Expr::lit(Literal::Null),
            Expr::lit(true),
            Expr::lit(-3i64),
            Expr::lit(1.5),
            Expr::lit("it's"),
            Expr::lit(guid),
        ],
    );
    assert_eq!(
        p.canonical_text(&[]).unwrap(),
        "X in (null, true, -3, 1.5, 'it''s', '00000000-0000-0000-0000-000000000000')"
    );
}

#[test]
fn parameter_values_change_the_key() {
    let p = Predicate::compare(Expr::field("Name"), CompareOp::Eq, Expr::param(0));
    let mary = collection_key("Contact", &p, &["Mary".into()]).unwrap();
    let john = collection_key("Contact", &p, &["John".into()]).unwrap();
    assert_eq!(mary, "Contact where Name = 'Mary'");
    assert_ne!(mary, john);
}

#[test]
fn parameter_and_literal_forms_share_a_key() {
    let with_param = Predicate::compare(Expr::field("Id"), CompareOp::Eq, Expr::param(0));
    let with_literal = Predicate::field_eq("Id", 7);
    assert_eq!(
        collection_key("Contact", &with_param, &[Literal::Int(7)]).unwrap(),
        collection_key("Contact", &with_literal, &[]).unwrap()
    );
}

#[test]
fn missing_parameter_is_an_error() {
    let p = Predicate::compare(Expr::field("Name"), CompareOp::Eq, Expr::param(0));
    let err = collection_key("Contact", &p, &[]).unwrap_err();
    assert!(matches!(
        err,
        MuninnError::MissingParameter {
            index: 0,
            provided: 0
        }
    ));
}

#[test]
fn junction_rendering() {
    let p = Predicate::Or(vec![
        Predicate::field_eq("A", 1).and(Predicate::field_eq("B", 2)),
        Predicate::IsNull(Expr::field("C")).not(),
    ]);
    assert_eq!(
        p.canonical_text(&[]).unwrap(),
        "(A = 1 and B = 2) or not (C is null)"
    );
    assert_eq!(Predicate::And(Vec::new()).canonical_text(&[]).unwrap(), "true");
    assert_eq!(Predicate::Or(Vec::new()).canonical_text(&[]).unwrap(), "false");
}

#[test]
fn raw_text_is_verbatim() {
    let p = Predicate::Raw("1=2".into());
    assert_eq!(collection_key("Contact", &p, &[]).unwrap(), "Contact where 1=2");
}

#[test]
fn raw_operands_keep_their_grouping() {
    let grouped_or = Predicate::And(vec![
        Predicate::Raw("a = 1 or b = 2".into()),
        Predicate::field_eq("c", 3),
    ]);
    let grouped_and = Predicate::Or(vec![
        Predicate::Raw("a = 1".into()),
        Predicate::Raw("b = 2 and c = 3".into()),
    ]);

    let left = collection_key("Contact", &grouped_or, &[]).unwrap();
    let right = collection_key("Contact", &grouped_and, &[]).unwrap();
    assert_eq!(left, "Contact where (a = 1 or b = 2) and c = 3");
    assert_eq!(right, "Contact where (a = 1) or (b = 2 and c = 3)");
    assert_ne!(left, right);
}

#[test]
fn equivalent_predicates_are_distinct_keys() {
    let a = Predicate::field_eq("A", 1).and(Predicate::field_eq("B", 2));
    let b = Predicate::field_eq("B", 2).and(Predicate::field_eq("A", 1));
    assert_ne!(
        collection_key("Contact", &a, &[]).unwrap(),
        collection_key("Contact", &b, &[]).unwrap()
    );
}

#[test]
fn runtime_derives_the_same_key() {
    let runtime = CacheRuntime::from_settings(CacheSettings::default());
    let p = Predicate::field_eq("Name", "Mary");
    assert_eq!(
        runtime.collection_key("Contact", &p, &[]).unwrap(),
        collection_key("Contact", &p, &[]).unwrap()
    );
}
