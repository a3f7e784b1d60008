//! Runtime values produced by expression evaluation.
//!
//! The [`Value`] enum models the loosely typed values expressions work with.
//! Context data arrives as `serde_json::Value` and is converted on lookup;
//! the extra [`Value::Undefined`] variant distinguishes "no such property"
//! from an explicit `null`.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ExprError, Result};

/// Runtime value of an expression.
///
/// # Example
///
/// ```
/// use stencil_expr::Value;
///
/// let v = Value::from(serde_json::json!({"name": "lion"}));
/// assert_eq!(v.get_member("name").unwrap(), Value::from("lion"));
/// assert!(v.get_member("missing").unwrap().is_undefined());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value (missing property, `undefined` literal).
    #[default]
    Undefined,
    /// Explicit `null`.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value. All numbers are 64-bit floats.
    Number(f64),
    /// String value.
    String(String),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// String-keyed map of values.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` if this is [`Value::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns `true` for `undefined` and `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns `true` if this is a `String` value.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Truthiness test used by `!`, `&&`, `||`, `?:` and default substitution.
    ///
    /// `undefined`, `null`, `false`, `0`, `-0`, `NaN` and `""` are falsy.
    /// Every other value, including empty arrays and objects, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Name of the value's type, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Numeric coercion.
    ///
    /// Strings are trimmed and parsed (empty means `0`, unparsable means
    /// `NaN`), booleans map to `1`/`0`, `null` to `0`, everything else to `NaN`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Object(_) => f64::NAN,
        }
    }

    /// Collapses arrays and objects to their string form; other values are
    /// returned unchanged.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) => Value::String(self.to_string()),
            other => other.clone(),
        }
    }

    /// Reads a named property.
    ///
    /// Missing properties yield `undefined`; reading from `undefined` or
    /// `null` is a type error.
    pub fn get_member(&self, name: &str) -> Result<Value> {
        match self {
            Value::Undefined | Value::Null => Err(ExprError::type_error(format!(
                "cannot read property '{}' of {}",
                name,
                self.kind()
            ))),
            Value::String(s) if name == "length" => Ok(Value::from(s.chars().count())),
            Value::Array(items) if name == "length" => Ok(Value::from(items.len())),
            Value::Array(items) => Ok(index_from_key(name)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default()),
            Value::Object(map) => Ok(map.get(name).cloned().unwrap_or_default()),
            _ => Ok(Value::Undefined),
        }
    }

    /// Reads a computed property (`value[index]`).
    pub fn get_index(&self, index: &Value) -> Result<Value> {
        match (self, index) {
            (Value::Undefined | Value::Null, _) => Err(ExprError::type_error(format!(
                "cannot read index {} of {}",
                index,
                self.kind()
            ))),
            (Value::Array(items), Value::Number(n)) => Ok(index_from_number(*n)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default()),
            (Value::String(s), Value::Number(n)) => Ok(index_from_number(*n)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default()),
            (_, key) => self.get_member(&key.to_string()),
        }
    }

    /// Converts to a JSON value. `undefined` and non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(|num| {
                    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
                        serde_json::Value::Number((*n as i64).into())
                    } else {
                        serde_json::Value::Number(num)
                    }
                })
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Longest string, in bytes, an expression may produce.
///
/// Methods that grow strings and `+` chains fail with [`ExprError::Type`]
/// instead of allocating past this.
pub const MAX_STRING_LEN: usize = 1 << 24;

pub(crate) fn check_string_len(len: usize) -> Result<()> {
    if len > MAX_STRING_LEN {
        return Err(ExprError::type_error(format!(
            "invalid string length: {} exceeds {} bytes",
            len, MAX_STRING_LEN
        )));
    }
    Ok(())
}

/// Formats a number the way it appears in rendered output.
///
/// Integral values print without a fraction, `-0` prints as `0`, and the
/// non-finite values print as `NaN`, `Infinity` and `-Infinity`.
/// Magnitudes of at least `1e21` or below `1e-6` switch to exponent form
/// with a signed exponent, `1e+21` and `1.5e-7`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        n.to_string()
    }
}

fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    // f64::from_str also accepts "inf" and "nan" spellings
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

fn index_from_number(n: f64) -> Option<usize> {
    if n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64 {
        Some(n as usize)
    } else {
        None
    }
}

fn index_from_key(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            // Arrays and objects render as JSON
            Value::Array(_) | Value::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from(&value)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
