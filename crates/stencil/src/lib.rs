//! # Stencil - Compiled `{expression}` String Templates
//!
//! `stencil` turns a string with `{ ... }` placeholders into a reusable
//! renderer. Each placeholder holds an expression of the sandboxed
//! [`stencil_expr`] language, evaluated against a data context. When an
//! expression yields a falsy value (`""`, `0`, `false`, `null`, `undefined`,
//! `NaN`) the default value is rendered instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use stencil::{build_template, format};
//! use serde_json::json;
//!
//! assert_eq!(format("hello, {name}", &json!({"name": "lion"}), "").unwrap(), "hello, lion");
//! assert_eq!(format("{1+1}", &json!({}), "").unwrap(), "2");
//!
//! let greet = build_template("hello, {name}", "...").unwrap();
//! assert_eq!(greet.render(&json!({})).unwrap(), "hello, ...");
//! assert_eq!(greet.render_with_default(&json!({}), "E.T.").unwrap(), "hello, E.T.");
//! ```
//!
//! ## Template Syntax
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `{expr}` | Placeholder; `expr` is trimmed before use |
//! | `\{`, `\}` | Literal braces |
//! | `{}` | Literal text, not a placeholder |
//! | `{ }` | Blank placeholder, renders nothing |
//!
//! Quotes and backslashes in literal text render unchanged.
//!
//! ## One-shot vs Reusable
//!
//! [`format`] puts every key of the data in scope, and a referenced name the
//! data lacks is a [`TemplateError::UnresolvedBinding`]. [`build_template`]
//! binds exactly the names the template uses; a missing name takes the
//! default value instead of failing.
//!
//! ## Compilation
//!
//! Templates compile into a single concatenation program, see
//! [`CompiledTemplate`]. An [`Engine`] keeps recent compilations in a
//! [`CompileCache`] (one entry by default), so rendering the same template
//! repeatedly compiles it once.
//!
//! ```rust
//! use std::sync::Arc;
//! use stencil::Engine;
//!
//! let engine = Engine::new();
//! let a = engine.compile("[{Date.now()}] hello, {user.name}", "", true).unwrap();
//! let b = engine.compile("[{Date.now()}] hello, {user.name}", "", true).unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(a.identifiers(), Some(&["Date".to_string(), "user".to_string()][..]));
//! ```

mod cache;
mod compiler;
mod config;
mod engine;
mod error;
mod escape;
mod identifiers;
mod scanner;
mod template;

use once_cell::sync::Lazy;
use serde::Serialize;

pub use cache::{CompileCache, DEFAULT_CAPACITY};
pub use compiler::{compile, CompiledTemplate, Program, Slot};
pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::TemplateError;
pub use escape::{escape_literal, quote_literal};
pub use identifiers::{extract_all, extract_identifiers, identifiers_of};
pub use scanner::{distinct_expressions, normalize_escapes, scan, Normalized, Span};
pub use template::Template;

// Re-export the expression types that appear in this crate's API
pub use stencil_expr::{ExprError, Functions, Value};

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::new);

/// The process-wide engine behind [`format`] and [`build_template`].
pub fn default_engine() -> &'static Engine {
    &DEFAULT_ENGINE
}

/// Renders `template` once against `data`; see [`Engine::format`].
pub fn format<T: Serialize + ?Sized>(
    template: &str,
    data: &T,
    default_value: &str,
) -> Result<String, TemplateError> {
    DEFAULT_ENGINE.format(template, data, default_value)
}

/// Compiles `template` into a reusable [`Template`]; see [`Engine::build`].
pub fn build_template(template: &str, default_value: &str) -> Result<Template, TemplateError> {
    DEFAULT_ENGINE.build(template, default_value)
}
