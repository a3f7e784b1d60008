//! Allow-listed callables.
//!
//! Expressions cannot define functions. They can only call:
//!
//! - functions registered by dotted name in a [`Functions`] registry
//!   (`Date.now()`, `Math.max(a, b)`, `String(x)`), and
//! - a fixed set of methods on strings, numbers and arrays
//!   (`name.toUpperCase()`, `price.toFixed(2)`, `tags.join(', ')`).
//!
//! # Example
//!
//! ```
//! use stencil_expr::{Functions, Value};
//!
//! let mut functions = Functions::builtin();
//! functions.register("shout", |args: &[Value]| {
//!     let text = args.first().map(|v| v.to_string()).unwrap_or_default();
//!     Ok(Value::from(text.to_uppercase() + "!"))
//! });
//! assert!(functions.contains("shout"));
//! assert!(functions.contains("Math.max"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;

use crate::error::{ExprError, Result};
use crate::op::strict_eq;
use crate::value::{check_string_len, Value, MAX_STRING_LEN};

/// Signature of a registered function.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

static BUILTINS: Lazy<Functions> = Lazy::new(|| {
    let mut functions = Functions::empty();
    register_builtins(&mut functions);
    functions
});

/// Registry of callable functions keyed by dotted name.
#[derive(Clone)]
pub struct Functions {
    entries: HashMap<String, Arc<NativeFn>>,
}

impl Functions {
    /// Creates a registry with no functions.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Creates a registry with the standard functions.
    ///
    /// | Name | Behavior |
    /// |------|----------|
    /// | `Date.now()` | Milliseconds since the Unix epoch |
    /// | `Math.max(..)`, `Math.min(..)` | Largest / smallest argument |
    /// | `Math.abs`, `Math.floor`, `Math.ceil`, `Math.round`, `Math.sqrt` | One-argument numeric helpers |
    /// | `Math.pow(x, y)` | `x` raised to `y` |
    /// | `String(x)`, `Number(x)`, `Boolean(x)` | Conversions |
    /// | `JSON.stringify(x)` | JSON text of `x` |
    pub fn builtin() -> Self {
        BUILTINS.clone()
    }

    /// Registers (or replaces) a function under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(function));
        self
    }

    /// Removes a function, returning `true` if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Looks up a function by dotted name.
    pub fn get(&self, name: &str) -> Option<&Arc<NativeFn>> {
        self.entries.get(name)
    }

    /// Checks if a function with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names of all registered functions, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Functions {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functions")
            .field("names", &self.names())
            .finish()
    }
}

fn register_builtins(functions: &mut Functions) {
    functions
        .register("Date.now", |args| {
            arity("Date.now", args, 0, 0)?;
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as f64)
                .unwrap_or(0.0);
            Ok(Value::Number(millis))
        })
        .register("Math.max", |args| {
            Ok(Value::Number(
                args.iter()
                    .map(Value::to_number)
                    .try_fold(f64::NEG_INFINITY, |acc, n| {
                        if n.is_nan() {
                            None
                        } else {
                            Some(acc.max(n))
                        }
                    })
                    .unwrap_or(f64::NAN),
            ))
        })
        .register("Math.min", |args| {
            Ok(Value::Number(
                args.iter()
                    .map(Value::to_number)
                    .try_fold(f64::INFINITY, |acc, n| {
                        if n.is_nan() {
                            None
                        } else {
                            Some(acc.min(n))
                        }
                    })
                    .unwrap_or(f64::NAN),
            ))
        })
        .register("Math.abs", |args| unary_math("Math.abs", args, f64::abs))
        .register("Math.floor", |args| unary_math("Math.floor", args, f64::floor))
        .register("Math.ceil", |args| unary_math("Math.ceil", args, f64::ceil))
        .register("Math.sqrt", |args| unary_math("Math.sqrt", args, f64::sqrt))
        .register("Math.round", |args| {
            // halves round towards +Infinity
            unary_math("Math.round", args, |n| (n + 0.5).floor())
        })
        .register("Math.pow", |args| {
            arity("Math.pow", args, 2, 2)?;
            Ok(Value::Number(args[0].to_number().powf(args[1].to_number())))
        })
        .register("String", |args| {
            arity("String", args, 0, 1)?;
            Ok(Value::String(
                args.first().map(Value::to_string).unwrap_or_default(),
            ))
        })
        .register("Number", |args| {
            arity("Number", args, 0, 1)?;
            Ok(Value::Number(args.first().map(Value::to_number).unwrap_or(0.0)))
        })
        .register("Boolean", |args| {
            arity("Boolean", args, 0, 1)?;
            Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
        })
        .register("JSON.stringify", |args| {
            arity("JSON.stringify", args, 1, 1)?;
            match &args[0] {
                Value::Undefined => Ok(Value::Undefined),
                other => Ok(Value::String(other.to_json().to_string())),
            }
        });
}

fn unary_math(name: &str, args: &[Value], f: impl Fn(f64) -> f64) -> Result<Value> {
    arity(name, args, 1, 1)?;
    Ok(Value::Number(f(args[0].to_number())))
}

/// Checks that `args.len()` lies within `min..=max`.
pub fn arity(function: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() >= min && args.len() <= max {
        return Ok(());
    }
    let expected = match (min, max) {
        (0, 0) => "no",
        (0, 1) => "at most 1",
        (1, 1) => "1",
        (1, 2) => "1 or 2",
        (2, 2) => "2",
        _ => "a different number of",
    };
    Err(ExprError::Arity {
        function: function.to_string(),
        expected,
        actual: args.len(),
    })
}

/// Calls an allow-listed method on a receiver value.
pub fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value> {
    let qualified = || format!("{}.{}", receiver.kind(), name);
    match receiver {
        Value::Undefined | Value::Null => Err(ExprError::type_error(format!(
            "cannot call method '{}' of {}",
            name,
            receiver.kind()
        ))),
        Value::String(s) => string_method(s, name, args).unwrap_or_else(|| {
            Err(ExprError::UnknownFunction(qualified()))
        }),
        Value::Number(n) => match name {
            "toFixed" => {
                arity(&qualified(), args, 0, 1)?;
                let digits = args.first().map(Value::to_number).unwrap_or(0.0);
                if !(0.0..=100.0).contains(&digits) {
                    return Err(ExprError::type_error("toFixed() digits must be between 0 and 100"));
                }
                if !n.is_finite() || n.abs() >= 1e21 {
                    return Ok(Value::String(receiver.to_string()));
                }
                Ok(Value::String(format!("{:.*}", digits as usize, n)))
            }
            "toString" => {
                arity(&qualified(), args, 0, 0)?;
                Ok(Value::String(receiver.to_string()))
            }
            _ => Err(ExprError::UnknownFunction(qualified())),
        },
        Value::Bool(_) | Value::Object(_) if name == "toString" => {
            arity(&qualified(), args, 0, 0)?;
            Ok(Value::String(receiver.to_string()))
        }
        Value::Array(items) => match name {
            "join" => {
                arity(&qualified(), args, 0, 1)?;
                let separator = match args.first() {
                    None | Some(Value::Undefined) => ",".to_string(),
                    Some(sep) => sep.to_string(),
                };
                let parts = items
                    .iter()
                    .map(|item| {
                        if item.is_nullish() {
                            String::new()
                        } else {
                            item.to_string()
                        }
                    })
                    .collect::<Vec<_>>();
                let total = parts.iter().map(String::len).sum::<usize>()
                    + separator.len().saturating_mul(parts.len().saturating_sub(1));
                check_string_len(total)?;
                Ok(Value::String(parts.join(&separator)))
            }
            "includes" => {
                arity(&qualified(), args, 1, 1)?;
                Ok(Value::Bool(items.iter().any(|item| strict_eq(item, &args[0]))))
            }
            "indexOf" => {
                arity(&qualified(), args, 1, 1)?;
                let index = items
                    .iter()
                    .position(|item| strict_eq(item, &args[0]))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0);
                Ok(Value::Number(index))
            }
            "toString" => {
                arity(&qualified(), args, 0, 0)?;
                Ok(Value::String(receiver.to_string()))
            }
            _ => Err(ExprError::UnknownFunction(qualified())),
        },
        _ => Err(ExprError::UnknownFunction(qualified())),
    }
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Option<Result<Value>> {
    let qualified = format!("string.{}", name);
    let arg_str = |i: usize| args.get(i).map(Value::to_string).unwrap_or_default();

    let result = match name {
        "toUpperCase" => arity(&qualified, args, 0, 0).map(|_| Value::from(s.to_uppercase())),
        "toLowerCase" => arity(&qualified, args, 0, 0).map(|_| Value::from(s.to_lowercase())),
        "trim" => arity(&qualified, args, 0, 0).map(|_| Value::from(s.trim())),
        "trimStart" => arity(&qualified, args, 0, 0).map(|_| Value::from(s.trim_start())),
        "trimEnd" => arity(&qualified, args, 0, 0).map(|_| Value::from(s.trim_end())),
        "toString" => arity(&qualified, args, 0, 0).map(|_| Value::from(s)),
        "includes" => {
            arity(&qualified, args, 1, 1).map(|_| Value::Bool(s.contains(arg_str(0).as_str())))
        }
        "startsWith" => {
            arity(&qualified, args, 1, 1).map(|_| Value::Bool(s.starts_with(arg_str(0).as_str())))
        }
        "endsWith" => {
            arity(&qualified, args, 1, 1).map(|_| Value::Bool(s.ends_with(arg_str(0).as_str())))
        }
        "indexOf" => arity(&qualified, args, 1, 1).map(|_| {
            let index = s
                .find(arg_str(0).as_str())
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0);
            Value::Number(index)
        }),
        "slice" => arity(&qualified, args, 1, 2).map(|_| {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len();
            let start = relative_index(args.first(), len, 0);
            let end = relative_index(args.get(1), len, len);
            if start >= end {
                Value::from("")
            } else {
                Value::String(chars[start..end].iter().collect())
            }
        }),
        "repeat" => arity(&qualified, args, 1, 1).and_then(|_| {
            let count = args[0].to_number();
            if count < 0.0 || !count.is_finite() {
                return Err(ExprError::type_error("repeat() count must be non-negative"));
            }
            if s.is_empty() {
                return Ok(Value::from(""));
            }
            // saturates for huge counts
            let count = count as usize;
            check_string_len(s.len().checked_mul(count).unwrap_or(usize::MAX))?;
            Ok(Value::String(s.repeat(count)))
        }),
        "padStart" | "padEnd" => arity(&qualified, args, 1, 2).and_then(|_| {
            let target = args[0].to_number();
            let fill = match args.get(1) {
                None | Some(Value::Undefined) => " ".to_string(),
                Some(v) => v.to_string(),
            };
            let len = s.chars().count();
            if target.is_nan() || target <= len as f64 || fill.is_empty() {
                return Ok(Value::from(s));
            }
            if target > MAX_STRING_LEN as f64 {
                return Err(ExprError::type_error(format!(
                    "invalid string length: {} exceeds {} characters",
                    target, MAX_STRING_LEN
                )));
            }
            let padding: String = fill.chars().cycle().take(target as usize - len).collect();
            check_string_len(s.len() + padding.len())?;
            if name == "padStart" {
                Ok(Value::String(padding + s))
            } else {
                Ok(Value::String(s.to_string() + &padding))
            }
        }),
        "replace" => arity(&qualified, args, 2, 2)
            .map(|_| Value::String(s.replacen(arg_str(0).as_str(), &arg_str(1), 1))),
        "split" => arity(&qualified, args, 0, 1).map(|_| match args.first() {
            None | Some(Value::Undefined) => Value::Array(vec![Value::from(s)]),
            Some(sep) => {
                let sep = sep.to_string();
                if sep.is_empty() {
                    Value::Array(s.chars().map(|c| Value::String(c.to_string())).collect())
                } else {
                    Value::Array(s.split(sep.as_str()).map(Value::from).collect())
                }
            }
        }),
        _ => return None,
    };
    Some(result)
}

fn relative_index(arg: Option<&Value>, len: usize, default: usize) -> usize {
    let Some(value) = arg.filter(|v| !v.is_undefined()) else {
        return default;
    };
    let n = value.to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        (n as usize).min(len)
    }
}
