//! Query predicates and canonical collection keys.
//!
//! A cached query result is keyed by its class name plus the pretty-printed
//! predicate with parameters substituted:
//!
//! ```rust
//! # use muninn::predicate::{collection_key, CompareOp, Expr, Literal, Predicate};
//! let p = Predicate::compare(Expr::field("Name"), CompareOp::Like, Expr::param(0));
//! let key = collection_key("Contact", &p, &[Literal::from("Mary%")]).unwrap();
//! assert_eq!(key, "Contact where Name like 'Mary%'");
//! ```
//!
//! Pretty printing is the only canonicalization: `a = 1 and b = 2` and
//! `b = 2 and a = 1` produce different keys and are cached separately.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MuninnError, Result};

/// A constant value in a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Guid(Uuid),
}

impl Literal {
    fn render(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(true) => out.push_str("true"),
            Self::Bool(false) => out.push_str("false"),
            Self::Int(v) => out.push_str(&v.to_string()),
            Self::Float(v) => out.push_str(&v.to_string()),
            Self::Text(v) => {
                out.push('\'');
                out.push_str(&v.replace('\'', "''"));
                out.push('\'');
            }
            Self::Guid(v) => {
                out.push('\'');
                out.push_str(&v.to_string());
                out.push('\'');
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for Literal {
    fn from(v: Uuid) -> Self {
        Self::Guid(v)
    }
}

/// Operand of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Field path, e.g. `Name` or `PrimaryGroup.Manager.Name`.
    Field(String),
    Literal(Literal),
    /// Positional query parameter, substituted when the key is built.
    Parameter(usize),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    pub fn lit(value: impl Into<Literal>) -> Self {
        Self::Literal(value.into())
    }

    pub fn param(index: usize) -> Self {
        Self::Parameter(index)
    }

    fn render(&self, out: &mut String, params: &[Literal]) -> Result<()> {
        match self {
            Self::Field(path) => out.push_str(path),
            Self::Literal(lit) => lit.render(out),
            Self::Parameter(index) => {
                let lit = params.get(*index).ok_or(MuninnError::MissingParameter {
                    index: *index,
                    provided: params.len(),
                })?;
                lit.render(out);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "like",
        }
    }
}

/// Boolean filter of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// The unrestricted predicate.
    True,
    False,
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    IsNull(Expr),
    In(Expr, Vec<Expr>),
    /// Predicate text produced elsewhere, used verbatim.
    Raw(String),
}

impl Predicate {
    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Self::Compare { left, op, right }
    }

    /// `field = value`
    pub fn field_eq(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::compare(Expr::field(field), CompareOp::Eq, Expr::lit(value))
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Self::Or(mut parts) => {
                parts.push(other);
                Self::Or(parts)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Pretty-print with `params` substituted for parameter references.
    pub fn canonical_text(&self, params: &[Literal]) -> Result<String> {
        let mut out = String::new();
        self.render(&mut out, params)?;
        Ok(out)
    }

    fn render(&self, out: &mut String, params: &[Literal]) -> Result<()> {
        match self {
            Self::True => out.push_str("true"),
            Self::False => out.push_str("false"),
            Self::Compare { left, op, right } => {
                left.render(out, params)?;
                out.push(' ');
                out.push_str(op.as_str());
                out.push(' ');
                right.render(out, params)?;
            }
            Self::And(parts) => render_junction(out, parts, " and ", "true", params)?,
            Self::Or(parts) => render_junction(out, parts, " or ", "false", params)?,
            Self::Not(inner) => {
                out.push_str("not (");
                inner.render(out, params)?;
                out.push(')');
            }
            Self::IsNull(expr) => {
                expr.render(out, params)?;
                out.push_str(" is null");
            }
            Self::In(expr, list) => {
                expr.render(out, params)?;
                out.push_str(" in (");
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render(out, params)?;
                }
                out.push(')');
            }
            Self::Raw(text) => out.push_str(text),
        }
        Ok(())
    }

    /// Operands whose text may contain a top-level `and`/`or` are
    /// parenthesised inside a junction. Raw text is opaque, so it always is.
    fn needs_parens(&self) -> bool {
        match self {
            Self::And(parts) | Self::Or(parts) => parts.len() > 1,
            Self::Raw(_) => true,
            _ => false,
        }
    }
}

fn render_junction(
    out: &mut String,
    parts: &[Predicate],
    separator: &str,
    empty: &str,
    params: &[Literal],
) -> Result<()> {
    match parts {
        [] => out.push_str(empty),
        [single] => single.render(out, params)?,
        _ => {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push_str(separator);
                }
                if part.needs_parens() {
                    out.push('(');
                    part.render(out, params)?;
                    out.push(')');
                } else {
                    part.render(out, params)?;
                }
            }
        }
    }
    Ok(())
}

/// Cache key for the result of querying `class_name` filtered by `predicate`.
pub fn collection_key(class_name: &str, predicate: &Predicate, params: &[Literal]) -> Result<String> {
    let text = predicate.canonical_text(params)?;
    Ok(format!("{class_name} where {text}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_renders_true() {
        assert_eq!(
            collection_key("Contact", &Predicate::True, &[]).unwrap(),
            "Contact where true"
        );
    }

    #[test]
    fn literal_comparison() {
        let p = Predicate::compare(Expr::lit(1), CompareOp::Eq, Expr::lit(2));
        assert_eq!(collection_key("Contact", &p, &[]).unwrap(), "Contact where 1 = 2");
    }

    #[test]
    fn strings_are_quoted_and_escaped() {
        let p = Predicate::field_eq("Name", "O'Brien");
        assert_eq!(p.canonical_text(&[]).unwrap(), "Name = 'O''Brien'");
    }

    #[test]
    fn parameters_are_substituted() {
        let p = Predicate::compare(Expr::field("Age"), CompareOp::Ge, Expr::param(1));
        let text = p.canonical_text(&[Literal::Null, Literal::Int(18)]).unwrap();
        assert_eq!(text, "Age >= 18");
    }

    #[test]
    fn missing_parameter_fails() {
        let p = Predicate::compare(Expr::field("Age"), CompareOp::Ge, Expr::param(2));
        let err = p.canonical_text(&[Literal::Int(1)]).unwrap_err();
        assert!(matches!(
            err,
            MuninnError::MissingParameter {
                index: 2,
                provided: 1
            }
        ));
    }

    #[test]
    fn nested_junctions_are_parenthesised() {
        let p = Predicate::field_eq("A", 1)
            .and(Predicate::field_eq("B", 2).or(Predicate::field_eq("C", 3)));
        assert_eq!(p.canonical_text(&[]).unwrap(), "A = 1 and (B = 2 or C = 3)");
    }

    #[test]
    fn raw_operands_are_parenthesised() {
        let p = Predicate::Raw("a = 1 or b = 2".into()).and(Predicate::field_eq("c", 3));
        assert_eq!(p.canonical_text(&[]).unwrap(), "(a = 1 or b = 2) and c = 3");
        assert_eq!(
            Predicate::And(vec![Predicate::Raw("x > 0".into())])
                .canonical_text(&[])
                .unwrap(),
            "x > 0"
        );
    }

    #[test]
    fn not_in_and_null() {
        let p = Predicate::IsNull(Expr::field("Manager"))
            .and(Predicate::In(Expr::field("Id"), vec![Expr::lit(1), Expr::lit(2)]).not());
        assert_eq!(
            p.canonical_text(&[]).unwrap(),
            "Manager is null and not (Id in (1, 2))"
        );
    }

    #[test]
    fn operand_order_is_not_normalized() {
        let a = Predicate::field_eq("A", 1).and(Predicate::field_eq("B", 2));
        let b = Predicate::field_eq("B", 2).and(Predicate::field_eq("A", 1));
        assert_ne!(
            collection_key("Contact", &a, &[]).unwrap(),
            collection_key("Contact", &b, &[]).unwrap()
        );
    }
}
