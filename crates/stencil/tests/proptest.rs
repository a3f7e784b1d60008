//! Property-based tests for template compilation using proptest.

use proptest::prelude::*;
use serde_json::json;
use stencil::{Engine, TemplateError};

// ============================================================================
// Test helpers
// ============================================================================

/// Escapes every brace so the text contains no placeholders.
fn escape_braces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '{' || c == '}' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn format(engine: &Engine, template: &str, data: serde_json::Value) -> Result<String, TemplateError> {
    engine.format(template, &data, "")
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Text without placeholders renders unchanged, quotes and backslashes included.
    #[test]
    fn literal_text_round_trips(text in "[^{}]{0,64}") {
        let engine = Engine::new();
        prop_assert_eq!(format(&engine, &text, json!({}))?, text);
    }

    /// Escaped braces render as plain braces.
    #[test]
    fn escaped_braces_round_trip(text in "(?s).{0,64}") {
        let engine = Engine::new();
        prop_assert_eq!(format(&engine, &escape_braces(&text), json!({}))?, text);
    }

    /// Private-use characters next to escaped braces keep their identity.
    #[test]
    fn private_use_characters_survive_escapes(text in "[\u{E000}\u{E001}\u{E002}{}a ]{0,32}") {
        let engine = Engine::new();
        let template = format!("{}{{v}}", escape_braces(&text));
        prop_assert_eq!(format(&engine, &template, json!({"v": "!"}))?, format!("{}!", text));
    }

    /// A placeholder renders its string value, surrounded by literal text.
    #[test]
    fn placeholder_renders_value(
        before in "[a-z '\"]{0,12}",
        value in "(?s).{1,24}",
        after in "[a-z '\"\\\\]{0,12}",
    ) {
        let engine = Engine::new();
        let template = format!("{}{{v}}{}", before, after);
        let rendered = format(&engine, &template, json!({ "v": value.clone() }))?;
        prop_assert_eq!(rendered, format!("{}{}{}", before, value, after));
    }

    /// Repeated placeholders compile to one slot and render the same value.
    #[test]
    fn repeated_placeholders_share_a_slot(count in 1usize..8, n in 1i64..1000) {
        let engine = Engine::new();
        let template = vec!["{ n }"; count].join(",");
        let compiled = engine.compile(&template, "", false)?;
        prop_assert_eq!(compiled.expression_mapping().count(), 1);

        let expected = vec![n.to_string(); count].join(",");
        prop_assert_eq!(format(&engine, &template, json!({ "n": n }))?, expected);
    }

    /// Consecutive compilations of the same template share one artifact.
    #[test]
    fn consecutive_compiles_are_identical(name in "[a-z]{1,8}", default in "[a-z]{0,4}") {
        let engine = Engine::new();
        let template = format!("hello, {{{}}}", name);
        let first = engine.compile(&template, &default, false)?;
        let second = engine.compile(&template, &default, true)?;
        prop_assert!(std::sync::Arc::ptr_eq(&first, &second));
    }
}
