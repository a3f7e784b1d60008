//! Reusable templates with pre-bound parameters.
//!
//! A [`Template`] is compiled once and rendered many times. Its parameters
//! are the free names of its expressions. On every render each parameter is
//! bound to the matching data value when the data has that key, and to a
//! default otherwise, so rendering never fails on a missing name.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use stencil_expr::{Functions, Value};

use crate::compiler::CompiledTemplate;
use crate::error::TemplateError;
use crate::identifiers::dedupe;

/// A compiled template ready to render against different data.
///
/// Created by [`Engine::build`](crate::Engine::build) or
/// [`build_template`](crate::build_template).
///
/// # Example
///
/// ```rust
/// use stencil::build_template;
/// use serde_json::json;
///
/// let greet = build_template("hello, {name}", "...").unwrap();
///
/// assert_eq!(greet.render(&json!({"name": "lion"})).unwrap(), "hello, lion");
/// assert_eq!(greet.render(&json!({})).unwrap(), "hello, ...");
/// assert_eq!(greet.render_with_default(&json!({}), "E.T.").unwrap(), "hello, E.T.");
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    compiled: Arc<CompiledTemplate>,
    parameters: Vec<String>,
    functions: Functions,
}

impl Template {
    pub(crate) fn new(compiled: Arc<CompiledTemplate>, functions: Functions) -> Self {
        let parameters = dedupe(compiled.ensure_identifiers());
        Self {
            compiled,
            parameters,
            functions,
        }
    }

    /// Names bound on every render, without repeats.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn compiled(&self) -> &Arc<CompiledTemplate> {
        &self.compiled
    }

    pub fn default_value(&self) -> &str {
        self.compiled.default_value()
    }

    /// Renders with the template's own default for missing names.
    pub fn render<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, TemplateError> {
        self.render_with_default(data, "")
    }

    /// Renders with `per_call_default` bound to names missing from `data`.
    ///
    /// An empty `per_call_default` falls back to the template's default. A
    /// key present in `data` is used even when its value is `null`.
    pub fn render_with_default<T: Serialize + ?Sized>(
        &self,
        data: &T,
        per_call_default: &str,
    ) -> Result<String, TemplateError> {
        let context = crate::engine::context_of(data)?;
        let fallback = if per_call_default.is_empty() {
            self.compiled.default_value()
        } else {
            per_call_default
        };

        let scope: HashMap<String, Value> = self
            .parameters
            .iter()
            .map(|name| {
                let value = context
                    .get(name)
                    .map(Value::from)
                    .unwrap_or_else(|| Value::from(fallback));
                (name.clone(), value)
            })
            .collect();

        self.compiled.render(&scope, &self.functions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use serde_json::json;

    fn build(template: &str, default_value: &str) -> Template {
        let compiled = compile(template, default_value, false).unwrap();
        Template::new(Arc::new(compiled), Functions::builtin())
    }

    #[test]
    fn test_parameters_are_deduped() {
        let template = build("{a} {a + b} {b.c}", "");
        assert_eq!(template.parameters(), ["a", "b"]);
        assert_eq!(
            template.compiled().identifiers().map(<[String]>::len),
            Some(3)
        );
    }

    #[test]
    fn test_missing_names_take_build_default() {
        let template = build("hello, {name}", "...");
        assert_eq!(template.render(&json!({})).unwrap(), "hello, ...");
    }

    #[test]
    fn test_per_call_default_wins() {
        let template = build("hello, {name}", "...");
        assert_eq!(
            template.render_with_default(&json!({}), "E.T.").unwrap(),
            "hello, E.T."
        );
        assert_eq!(
            template.render_with_default(&json!({}), "").unwrap(),
            "hello, ..."
        );
    }

    #[test]
    fn test_present_null_is_used() {
        // null is falsy, so the slot falls back to the build default, not the per-call one
        let template = build("[{v}]", "build");
        assert_eq!(
            template.render_with_default(&json!({"v": null}), "call").unwrap(),
            "[build]"
        );
        assert_eq!(
            template.render_with_default(&json!({}), "call").unwrap(),
            "[call]"
        );
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let template = build("{a}", "");
        assert_eq!(template.render(&json!({"a": 1, "b": 2})).unwrap(), "1");
    }

    #[test]
    fn test_builtin_call_with_bound_root() {
        let template = build("{Date.now() > 0}", "");
        assert_eq!(template.parameters(), ["Date"]);
        assert_eq!(template.render(&json!({})).unwrap(), "true");
    }

    #[test]
    fn test_data_must_be_an_object() {
        let template = build("{a}", "");
        assert!(matches!(
            template.render(&json!([1, 2])),
            Err(TemplateError::Context(_))
        ));
    }

    #[test]
    fn test_serializable_structs() {
        #[derive(Serialize)]
        struct User {
            name: String,
        }
        let template = build("hi {name.toUpperCase()}", "");
        let user = User {
            name: "lion".into(),
        };
        assert_eq!(template.render(&user).unwrap(), "hi LION");
    }
}
