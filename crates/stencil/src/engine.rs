//! The template engine: a compilation cache plus a function registry.
//!
//! [`Engine`] is the entry point for both ways of rendering:
//!
//! - [`Engine::format`] renders once. Every key of the data is in scope and
//!   a name the data lacks is an error.
//! - [`Engine::build`] returns a reusable [`Template`] that binds missing
//!   names to a default instead.
//!
//! The free functions [`format`](crate::format) and
//! [`build_template`](crate::build_template) use a process-wide engine with
//! the default configuration.

use std::sync::Arc;

use serde::Serialize;
use stencil_expr::{Functions, Result as ExprResult, Value};

use crate::cache::CompileCache;
use crate::compiler::CompiledTemplate;
use crate::config::EngineConfig;
use crate::error::TemplateError;
use crate::template::Template;

/// Compiles, caches and renders templates.
///
/// # Example
///
/// ```rust
/// use stencil::{Engine, Value};
/// use serde_json::json;
///
/// let engine = Engine::builder()
///     .cache_capacity(4)
///     .function("shout", |args: &[Value]| {
///         Ok(Value::from(format!("{}!", args.first().cloned().unwrap_or_default())))
///     })
///     .build();
///
/// let out = engine.format("{shout(name)}", &json!({"name": "lion"}), "").unwrap();
/// assert_eq!(out, "lion!");
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    cache: CompileCache,
    functions: Functions,
}

impl Engine {
    /// Creates an engine with the default configuration and builtin functions.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            cache: CompileCache::new(config.cache_capacity),
            config,
            functions: Functions::builtin(),
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &CompileCache {
        &self.cache
    }

    pub fn functions(&self) -> &Functions {
        &self.functions
    }

    /// Registers (or replaces) a function callable from expressions.
    pub fn register_function<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> ExprResult<Value> + Send + Sync + 'static,
    {
        self.functions.register(name, function);
        self
    }

    /// Compiles `template` through the cache.
    pub fn compile(
        &self,
        template: &str,
        default_value: &str,
        extract_identifiers: bool,
    ) -> Result<Arc<CompiledTemplate>, TemplateError> {
        self.cache
            .get_or_compile(template, default_value, extract_identifiers)
    }

    /// Renders `template` once against `data`.
    ///
    /// Expressions resolving to a falsy value render as `default_value`. A
    /// name that `data` does not contain fails with
    /// [`TemplateError::UnresolvedBinding`]. The empty template renders as
    /// `""` without compiling.
    pub fn format<T: Serialize + ?Sized>(
        &self,
        template: &str,
        data: &T,
        default_value: &str,
    ) -> Result<String, TemplateError> {
        if template.is_empty() {
            return Ok(String::new());
        }
        let context = context_of(data)?;
        let compiled = self.compile(template, default_value, false)?;
        compiled.render(&context, &self.functions)
    }

    /// Compiles `template` into a reusable [`Template`].
    pub fn build(&self, template: &str, default_value: &str) -> Result<Template, TemplateError> {
        let compiled = self.compile(template, default_value, true)?;
        Ok(Template::new(compiled, self.functions.clone()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Engine`].
#[derive(Debug)]
pub struct EngineBuilder {
    config: EngineConfig,
    functions: Functions,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            functions: Functions::builtin(),
        }
    }
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Replaces the whole function registry.
    pub fn functions(mut self, functions: Functions) -> Self {
        self.functions = functions;
        self
    }

    /// Adds one function to the registry.
    pub fn function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> ExprResult<Value> + Send + Sync + 'static,
    {
        self.functions.register(name, function);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            cache: CompileCache::new(self.config.cache_capacity),
            config: self.config,
            functions: self.functions,
        }
    }
}

/// Serializes `data` into the map expressions resolve names against.
pub(crate) fn context_of<T: Serialize + ?Sized>(
    data: &T,
) -> Result<serde_json::Map<String, serde_json::Value>, TemplateError> {
    match serde_json::to_value(data)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(TemplateError::Context(format!(
            "data must serialize to an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
