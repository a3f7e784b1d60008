//! Operators and their runtime semantics.
//!
//! [`BinaryOp`] and [`UnaryOp`] carry their precedence and display form; the
//! arithmetic, comparison and equality rules follow the loose typing of
//! browser scripting languages so that `'' + 1 + 1` is `"11"` while `1 + 1`
//! is `2`.

use std::cmp::Ordering;

use crate::value::Value;

/// Binary operator.
///
/// Operators are grouped by precedence, lowest first:
/// - **Nullish**: `??`
/// - **Logical**: `||`, then `&&`
/// - **Equality**: `==`, `!=`, `===`, `!==`
/// - **Relational**: `<`, `<=`, `>`, `>=`
/// - **Additive**: `+`, `-`
/// - **Multiplicative**: `*`, `/`, `%`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `??` - right operand when the left is `null`/`undefined`.
    Coalesce,
    /// `||` - first truthy operand, else the last.
    Or,
    /// `&&` - first falsy operand, else the last.
    And,

    /// `==` loose equality.
    Eq,
    /// `!=` loose inequality.
    Ne,
    /// `===` strict equality.
    StrictEq,
    /// `!==` strict inequality.
    StrictNe,

    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,

    /// Addition or string concatenation.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder (sign follows the dividend).
    Rem,
}

impl BinaryOp {
    /// Binding power; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Coalesce => 1,
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::StrictEq | BinaryOp::StrictNe => 4,
            BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 7,
        }
    }

    /// Returns `true` for operators whose right operand may not be evaluated.
    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::Coalesce | BinaryOp::Or | BinaryOp::And)
    }

    /// Applies an eagerly evaluated operator.
    ///
    /// Short-circuit operators are handled by the evaluator; passing one here
    /// evaluates it as if both operands were already known.
    pub fn apply(self, lhs: &Value, rhs: &Value) -> Value {
        match self {
            BinaryOp::Coalesce => {
                if lhs.is_nullish() {
                    rhs.clone()
                } else {
                    lhs.clone()
                }
            }
            BinaryOp::Or => {
                if lhs.is_truthy() {
                    lhs.clone()
                } else {
                    rhs.clone()
                }
            }
            BinaryOp::And => {
                if lhs.is_truthy() {
                    rhs.clone()
                } else {
                    lhs.clone()
                }
            }
            BinaryOp::Eq => Value::Bool(loose_eq(lhs, rhs)),
            BinaryOp::Ne => Value::Bool(!loose_eq(lhs, rhs)),
            BinaryOp::StrictEq => Value::Bool(strict_eq(lhs, rhs)),
            BinaryOp::StrictNe => Value::Bool(!strict_eq(lhs, rhs)),
            BinaryOp::Lt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Less)),
            BinaryOp::Lte => Value::Bool(matches!(
                compare(lhs, rhs),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOp::Gt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Greater)),
            BinaryOp::Gte => Value::Bool(matches!(
                compare(lhs, rhs),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinaryOp::Add => add(lhs, rhs),
            BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
            BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
            BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
            BinaryOp::Rem => Value::Number(lhs.to_number() % rhs.to_number()),
        }
    }

    /// Returns the source form of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Coalesce => "??",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!` logical negation.
    Not,
    /// `-` numeric negation.
    Neg,
    /// `+` numeric coercion.
    Plus,
}

impl UnaryOp {
    /// Applies the operator.
    pub fn apply(self, operand: &Value) -> Value {
        match self {
            UnaryOp::Not => Value::Bool(!operand.is_truthy()),
            UnaryOp::Neg => Value::Number(-operand.to_number()),
            UnaryOp::Plus => Value::Number(operand.to_number()),
        }
    }

    /// Returns the source form of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `+`: concatenates when either side is (or collapses to) a string,
/// otherwise adds numerically.
pub fn add(lhs: &Value, rhs: &Value) -> Value {
    let lhs = lhs.to_primitive();
    let rhs = rhs.to_primitive();
    match (&lhs, &rhs) {
        (Value::String(a), _) => Value::String(format!("{}{}", a, rhs)),
        (_, Value::String(b)) => Value::String(format!("{}{}", lhs, b)),
        _ => Value::Number(lhs.to_number() + rhs.to_number()),
    }
}

/// Strict equality: same type and same value. `NaN` is never equal to
/// itself; arrays and objects compare structurally.
pub fn strict_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => lhs == rhs,
    }
}

/// Loose equality with type coercion.
pub fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => strict_eq(a, b),
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Bool(_), other) => loose_eq(&Value::Number(lhs.to_number()), other),
        (other, Value::Bool(_)) => loose_eq(other, &Value::Number(rhs.to_number())),
        (Value::Number(a), Value::String(_)) => *a == rhs.to_number(),
        (Value::String(_), Value::Number(b)) => lhs.to_number() == *b,
        (Value::Array(_) | Value::Object(_), _) => loose_eq(&lhs.to_primitive(), rhs),
        (_, Value::Array(_) | Value::Object(_)) => loose_eq(lhs, &rhs.to_primitive()),
        _ => false,
    }
}

/// Relational comparison. Two strings compare lexicographically; any other
/// pair compares numerically, and `NaN` on either side yields `None`.
pub fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    let lhs = lhs.to_primitive();
    let rhs = rhs.to_primitive();
    match (&lhs, &rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => lhs.to_number().partial_cmp(&rhs.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    fn n(v: f64) -> Value {
        Value::Number(v)
    }

    #[test]
    fn add_numbers_and_strings() {
        assert_eq!(add(&n(1.0), &n(1.0)), n(2.0));
        assert_eq!(add(&s(""), &n(2.0)), s("2"));
        assert_eq!(add(&n(1.0), &s("a")), s("1a"));
        assert_eq!(add(&s("a"), &Value::Null), s("anull"));
        assert_eq!(add(&Value::Bool(true), &n(1.0)), n(2.0));
        assert!(add(&Value::Undefined, &n(1.0)).as_number().unwrap().is_nan());
    }

    #[test]
    fn add_collections_concatenates() {
        let arr = Value::Array(vec![n(1.0)]);
        assert_eq!(add(&arr, &n(2.0)), s("[1]2"));
    }

    #[test]
    fn arithmetic_coerces() {
        assert_eq!(BinaryOp::Sub.apply(&s("5"), &n(2.0)), n(3.0));
        assert_eq!(BinaryOp::Mul.apply(&s("3"), &s("4")), n(12.0));
        assert_eq!(BinaryOp::Rem.apply(&n(-7.0), &n(3.0)), n(-1.0));
        assert_eq!(
            BinaryOp::Div.apply(&n(1.0), &n(0.0)),
            n(f64::INFINITY)
        );
    }

    #[test]
    fn loose_equality() {
        assert!(loose_eq(&Value::Null, &Value::Undefined));
        assert!(loose_eq(&n(1.0), &s("1")));
        assert!(loose_eq(&Value::Bool(true), &n(1.0)));
        assert!(loose_eq(&Value::Bool(false), &s("")));
        assert!(!loose_eq(&Value::Null, &n(0.0)));
        assert!(!loose_eq(&n(f64::NAN), &n(f64::NAN)));
    }

    #[test]
    fn strict_equality() {
        assert!(strict_eq(&n(0.0), &n(-0.0)));
        assert!(!strict_eq(&n(1.0), &s("1")));
        assert!(!strict_eq(&Value::Null, &Value::Undefined));
        assert!(strict_eq(&s("a"), &s("a")));
    }

    #[test]
    fn relational() {
        assert_eq!(BinaryOp::Lt.apply(&n(1.0), &n(2.0)), Value::Bool(true));
        assert_eq!(BinaryOp::Lt.apply(&s("10"), &s("9")), Value::Bool(true));
        assert_eq!(BinaryOp::Lt.apply(&s("10"), &n(9.0)), Value::Bool(false));
        assert_eq!(BinaryOp::Gte.apply(&n(2.0), &n(2.0)), Value::Bool(true));
        assert_eq!(
            BinaryOp::Lte.apply(&n(f64::NAN), &n(1.0)),
            Value::Bool(false)
        );
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(BinaryOp::Or.apply(&s(""), &s("x")), s("x"));
        assert_eq!(BinaryOp::Or.apply(&n(3.0), &s("x")), n(3.0));
        assert_eq!(BinaryOp::And.apply(&n(0.0), &s("x")), n(0.0));
        assert_eq!(BinaryOp::Coalesce.apply(&n(0.0), &s("x")), n(0.0));
        assert_eq!(BinaryOp::Coalesce.apply(&Value::Null, &s("x")), s("x"));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(UnaryOp::Not.apply(&s("")), Value::Bool(true));
        assert_eq!(UnaryOp::Neg.apply(&s("3")), n(-3.0));
        assert_eq!(UnaryOp::Plus.apply(&Value::Bool(true)), n(1.0));
    }

    #[test]
    fn precedence_ordering() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Lt.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
        assert!(BinaryOp::Or.precedence() > BinaryOp::Coalesce.precedence());
        assert!(BinaryOp::Or.is_short_circuit());
        assert!(!BinaryOp::Add.is_short_circuit());
    }
}
