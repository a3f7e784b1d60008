//! Stencil Expr - sandboxed expression language for stencil templates.
//!
//! This crate parses and evaluates the small expression language used inside
//! `{ ... }` template placeholders. It supports:
//!
//! - Literals: numbers, quoted strings, `true`, `false`, `null`, `undefined`, arrays
//! - Arithmetic, comparison, equality and logical operators with loose typing
//! - Property access (`user.name`, `items[0]`, `user?.name`)
//! - Calls to allow-listed functions (`Date.now()`, `Math.max(a, b)`) and
//!   methods (`name.toUpperCase()`, `tags.join(', ')`)
//!
//! There is no assignment, no loops, no user-defined functions and no access
//! to anything outside the supplied [`Scope`] and [`Functions`].
//!
//! # Quick Start
//!
//! ```rust
//! use stencil_expr::{evaluate, Value};
//! use serde_json::json;
//!
//! let data = json!({"user": {"name": "lion"}, "n": 2});
//! let scope = data.as_object().unwrap();
//!
//! assert_eq!(evaluate("user.name.toUpperCase()", scope).unwrap(), Value::from("LION"));
//! assert_eq!(evaluate("1 + n", scope).unwrap(), Value::from(3));
//! assert_eq!(evaluate("'' + 1 + n", scope).unwrap(), Value::from("12"));
//! ```
//!
//! # Truthiness
//!
//! | Value | Truthy? |
//! |-------|---------|
//! | `undefined`, `null` | no |
//! | `false` | no |
//! | `0`, `-0`, `NaN` | no |
//! | `""` | no |
//! | everything else, including `[]` | yes |
//!
//! Template rendering relies on this table to decide when the default value
//! replaces an expression's result.
//!
//! Numbers display like JavaScript's: `2.0` as `2`, `1e21` as `1e+21` and
//! `1e-7` as `1e-7`.
//!
//! # Limits
//!
//! Parsing fails with [`ExprError::Syntax`] once the syntax tree would be
//! more than 128 levels deep, whether through parentheses, operator chains
//! like `a * b * c` or member chains like `a.b.c`. `+` chains are flat and
//! may be any length. Strings longer than [`MAX_STRING_LEN`] bytes fail
//! with [`ExprError::Type`].

mod ast;
mod error;
mod eval;
mod functions;
mod lexer;
mod op;
mod parser;
mod value;

// Re-export public API
pub use ast::Expr;
pub use error::{ExprError, Result};
pub use eval::{EmptyScope, Evaluator, Scope};
pub use functions::{arity, call_method, Functions, NativeFn};
pub use lexer::{is_ident_continue, is_ident_start, Lexer, Punct, Spanned, Token};
pub use op::{add, compare, loose_eq, strict_eq, BinaryOp, UnaryOp};
pub use parser::{parse, parse_program, KEYWORDS};
pub use value::{format_number, Value, MAX_STRING_LEN};

/// Parses and evaluates `source` against `scope` with the builtin functions.
pub fn evaluate(source: &str, scope: &dyn Scope) -> Result<Value> {
    let expr = parse(source)?;
    let functions = Functions::builtin();
    Evaluator::new(scope, &functions).eval(&expr)
}
