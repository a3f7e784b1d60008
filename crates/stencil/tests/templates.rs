//! End-to-end behavior of `format`, `build_template` and compilation.
//!
//! Tests that go through the process-wide engine run serially, since they
//! share its compilation cache.

use std::sync::Arc;

use regex::Regex;
use serde_json::json;
use serial_test::serial;
use stencil::{build_template, default_engine, format, Engine, TemplateError};

const GREETING: &str = "[{Date.now()}] hello, {firstName + ' ' + middleName} {lastName + ', bye~'}";

// ============================================================================
// compile
// ============================================================================

#[test]
#[serial]
fn compile_empty_template() {
    let compiled = default_engine().compile("", "", false).unwrap();
    assert_eq!(compiled.template(), "");
    assert_eq!(compiled.default_value(), "");
    assert_eq!(compiled.expression_mapping().count(), 0);
    assert_eq!(compiled.identifiers(), None);
}

#[test]
#[serial]
fn compile_plain_text() {
    let compiled = default_engine().compile("hello", "", false).unwrap();
    assert_eq!(compiled.template(), "hello");
    assert_eq!(compiled.expression_mapping().count(), 0);
    assert_eq!(compiled.identifiers(), None);
}

#[test]
#[serial]
fn compile_single_placeholder() {
    let compiled = default_engine().compile("hello, {name}", "", false).unwrap();
    assert_eq!(compiled.expression_mapping().count(), 1);
}

#[test]
#[serial]
fn compile_reuses_cached_entry_and_attaches_identifiers() {
    let engine = default_engine();
    let first = engine.compile(GREETING, "", true).unwrap();
    let second = engine.compile(GREETING, "", false).unwrap();
    let third = engine.compile(GREETING, "", true).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(first.expression_mapping().count(), 3);
    assert_eq!(
        first.identifiers().map(|names| names.join(" ")).as_deref(),
        Some("Date firstName middleName lastName")
    );
}

#[test]
#[serial]
fn compile_after_another_template_is_equal_but_new() {
    let engine = default_engine();
    let first = engine.compile("{a} and {b}", "", false).unwrap();
    engine.compile("{c}", "", false).unwrap();
    let again = engine.compile("{a} and {b}", "", false).unwrap();

    assert!(!Arc::ptr_eq(&first, &again));
    assert_eq!(first.program().source(), again.program().source());
}

// ============================================================================
// format
// ============================================================================

#[test]
#[serial]
fn format_degenerate_templates() {
    assert_eq!(format("", &json!({}), "").unwrap(), "");
    assert_eq!(format("hello", &json!({}), "").unwrap(), "hello");
}

#[test]
#[serial]
fn format_substitutes_names() {
    assert_eq!(
        format("hello, {name}", &json!({"name": "lion"}), "").unwrap(),
        "hello, lion"
    );
    assert_eq!(
        format(
            "hello, {firstName} {lastName}!",
            &json!({"firstName": "Eavii", "lastName": "Jiang"}),
            ""
        )
        .unwrap(),
        "hello, Eavii Jiang!"
    );
}

#[test]
#[serial]
fn format_evaluates_expressions() {
    assert_eq!(format("{1+1}", &json!({}), "").unwrap(), "2");
    assert_eq!(format("{1 + n}", &json!({"n": 2}), "").unwrap(), "3");
    assert_eq!(
        format("{a} + {b} = {a + b}", &json!({"a": 1, "b": 2}), "").unwrap(),
        "1 + 2 = 3"
    );
}

#[test]
#[serial]
fn format_preserves_quotes_in_literal_text() {
    assert_eq!(
        format(r#"hello' "{name}". "end'"#, &json!({"name": "lion"}), "").unwrap(),
        r#"hello' "lion". "end'"#
    );
}

#[test]
#[serial]
fn format_preserves_backslashes_in_literal_text() {
    assert_eq!(
        format(r"C:\Users\{name}", &json!({"name": "lion"}), "").unwrap(),
        r"C:\Users{name}"
    );
    assert_eq!(
        format(r"path\to\{name}\", &json!({"name": "x"}), "").unwrap(),
        r"path\to{name}\"
    );
    assert_eq!(format(r"it\'s {v}", &json!({"v": 1}), "").unwrap(), r"it\'s 1");
}

#[test]
#[serial]
fn format_missing_name_is_an_error() {
    let err = format(r#"hello' "{name}""#, &json!({}), "").unwrap_err();
    assert!(matches!(err, TemplateError::UnresolvedBinding { ref name } if name == "name"));
}

#[test]
#[serial]
fn format_falsy_results_take_default() {
    assert_eq!(format("{missing}", &json!({"missing": ""}), "X").unwrap(), "X");
    assert_eq!(format("{n - 1}", &json!({"n": 1}), "none").unwrap(), "none");
    assert_eq!(format("{flag}", &json!({"flag": false}), "off").unwrap(), "off");
    assert_eq!(format("{user.age}", &json!({"user": {}}), "?").unwrap(), "?");
}

#[test]
#[serial]
fn format_brace_edge_cases() {
    assert_eq!(format("a{}b", &json!({}), "").unwrap(), "a{}b");
    assert_eq!(format("a{  }b", &json!({}), "").unwrap(), "ab");
    assert_eq!(format(r"\{name\}", &json!({"name": "lion"}), "").unwrap(), "{name}");
    assert_eq!(
        format(r"\{{name}\}", &json!({"name": "lion"}), "").unwrap(),
        "{lion}"
    );
    assert_eq!(format("open {brace", &json!({}), "").unwrap(), "open {brace");
}

#[test]
#[serial]
fn format_repeated_expression_evaluates_once() {
    let compiled = default_engine().compile("{n}/{ n }/{n}", "", false).unwrap();
    assert_eq!(compiled.expression_mapping().count(), 1);
    assert_eq!(format("{n}/{ n }/{n}", &json!({"n": 7}), "").unwrap(), "7/7/7");
}

#[test]
#[serial]
fn format_reports_invalid_expressions() {
    let err = format("{1 +* 2}", &json!({}), "").unwrap_err();
    assert!(matches!(err, TemplateError::Evaluation { ref expression, .. } if expression == "1 +* 2"));

    let err = format("{launch()}", &json!({}), "").unwrap_err();
    assert!(matches!(err, TemplateError::Evaluation { .. }));
}

// ============================================================================
// build_template
// ============================================================================

#[test]
#[serial]
fn build_empty_template() {
    let template = build_template("", "").unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), "");
    assert!(template.parameters().is_empty());
}

#[test]
#[serial]
fn build_renders_repeatedly() {
    let template = build_template("hello, {name}", "").unwrap();
    assert_eq!(template.render(&json!({"name": "lion"})).unwrap(), "hello, lion");
    assert_eq!(template.render(&json!({"name": "xxxx"})).unwrap(), "hello, xxxx");
}

#[test]
#[serial]
fn build_with_builtin_date() {
    let template = build_template("[{Date.now()}] hello, {user.name}", "").unwrap();
    let output = template.render(&json!({"user": {"name": "lion"}})).unwrap();
    let expected = Regex::new(r"^\[\d+\] hello, lion$").unwrap();
    assert!(expected.is_match(&output), "unexpected output: {output}");
}

#[test]
#[serial]
fn build_defaults_for_missing_names() {
    let template = build_template("hello, {name}", "...").unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), "hello, ...");
    assert_eq!(
        template.render_with_default(&json!({}), "E.T.").unwrap(),
        "hello, E.T."
    );
}

#[test]
#[serial]
fn build_and_format_differ_on_missing_names() {
    assert!(format("hello, {name}", &json!({}), "...").is_err());
    let template = build_template("hello, {name}", "...").unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), "hello, ...");
}

#[test]
#[serial]
fn build_parameters_are_distinct_names() {
    let template = build_template("{a} {a + b} {b.length}", "").unwrap();
    assert_eq!(template.parameters(), ["a", "b"]);
    assert_eq!(template.compiled().identifiers().map(<[String]>::len), Some(4));
}

// ============================================================================
// independent engines
// ============================================================================

#[test]
fn engines_have_independent_caches() {
    let left = Engine::new();
    let right = Engine::new();
    let a = left.compile("{x}", "", false).unwrap();
    let b = right.compile("{x}", "", false).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &left.compile("{x}", "", false).unwrap()));
}

#[test]
fn templates_render_across_threads() {
    let template = Arc::new(Engine::new().build("{who} #{n}", "?").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let template = Arc::clone(&template);
            std::thread::spawn(move || template.render(&json!({ "n": n })))
        })
        .collect();
    let mut outputs: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();
    outputs.sort();
    // `n` of 0 is falsy
    assert_eq!(outputs, vec!["? #1", "? #2", "? #3", "? #?"]);
}

// ============================================================================
// resource limits
// ============================================================================

fn evaluation_error(result: Result<String, TemplateError>) -> stencil::ExprError {
    match result {
        Err(TemplateError::Evaluation { source, .. }) => source,
        other => panic!("expected evaluation error, got {:?}", other),
    }
}

#[test]
fn long_operator_chains_fail_to_compile() {
    let engine = Engine::new();
    for op in [" * ", " && ", " || ", " - "] {
        let template = format!("{{{}}}", vec!["n"; 10_000].join(op));
        let err = evaluation_error(engine.format(&template, &json!({"n": 1}), ""));
        assert!(err.to_string().contains("nested too deeply"), "{err}");
    }
}

#[test]
fn deep_nesting_fails_to_compile() {
    let engine = Engine::new();
    let template = format!("{{{}n{}}}", "(".repeat(10_000), ")".repeat(10_000));
    evaluation_error(engine.format(&template, &json!({"n": 1}), ""));

    let template = format!("{{n{}}}", ".a".repeat(10_000));
    evaluation_error(engine.format(&template, &json!({"n": 1}), ""));
}

#[test]
fn many_placeholders_render() {
    let engine = Engine::new();
    let template: String = (0..5_000).map(|i| format!("{{n + {}}},", i % 7)).collect();
    let rendered = engine.format(&template, &json!({"n": 1}), "").unwrap();
    assert_eq!(rendered.matches(',').count(), 5_000);
    assert!(rendered.starts_with("1,2,3,4,5,6,7,1,"));
}

#[test]
fn oversized_strings_fail_to_render() {
    let engine = Engine::new();
    let err = evaluation_error(engine.format("{'ab'.repeat(1e18)}", &json!({}), ""));
    assert!(matches!(err, stencil::ExprError::Type(_)));
    let err = evaluation_error(engine.format("{'x'.padStart(1e15)}", &json!({}), ""));
    assert!(matches!(err, stencil::ExprError::Type(_)));
}

#[test]
fn private_use_text_renders_unchanged() {
    let engine = Engine::new();
    let template = "\u{E000}\\{{name}\\}\u{E001}";
    let rendered = engine.format(template, &json!({"name": "lion"}), "").unwrap();
    assert_eq!(rendered, "\u{E000}{lion}\u{E001}");
}

#[test]
fn large_numbers_render_in_exponent_form() {
    let engine = Engine::new();
    let rendered = engine.format("{big} {small}", &json!({"big": 1e21, "small": 1e-7}), "").unwrap();
    assert_eq!(rendered, "1e+21 1e-7");
}
