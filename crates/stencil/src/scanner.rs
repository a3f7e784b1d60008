//! Splits template text into literal and expression spans.
//!
//! # Syntax
//!
//! - `{expr}` - an expression placeholder, trimmed before use
//! - `\{` and `\}` - literal braces, never delimiters
//! - `{}` - not a placeholder, kept as literal text
//!
//! Escaped braces are first rewritten to stand-in characters by
//! [`normalize_escapes`], so the delimiter pattern cannot match them. The
//! stand-ins are picked from code points the template does not use, which
//! keeps every other character intact. [`Normalized::restore`] turns them
//! back into plain braces in literal text and expression sources.
//!
//! Scanning never fails. An unterminated `{` stays literal text and nested
//! braces split at the first `}`.

use std::borrow::Cow;
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// First stand-in candidate, the start of the private use area.
const FIRST_STAND_IN: u32 = 0xE000;

static EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("expression pattern is valid"));

/// A contiguous piece of a normalized template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    /// Text copied to the output as-is.
    Literal(&'a str),
    /// The text between `{` and `}`, untrimmed.
    Expression(&'a str),
}

/// Template text with escaped braces swapped for stand-in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<'a> {
    text: Cow<'a, str>,
    stand_ins: Option<(char, char)>,
}

impl<'a> Normalized<'a> {
    /// The normalized text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Characters standing in for `\{` and `\}`, when the template had any.
    pub fn stand_ins(&self) -> Option<(char, char)> {
        self.stand_ins
    }

    /// Splits the normalized text into spans.
    pub fn spans(&self) -> Vec<Span<'_>> {
        scan(&self.text)
    }

    /// Turns stand-in characters in `text` back into plain braces.
    pub fn restore<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let Some((open, close)) = self.stand_ins else {
            return Cow::Borrowed(text);
        };
        if !text.contains([open, close]) {
            return Cow::Borrowed(text);
        }
        Cow::Owned(
            text.chars()
                .map(|c| {
                    if c == open {
                        '{'
                    } else if c == close {
                        '}'
                    } else {
                        c
                    }
                })
                .collect(),
        )
    }

    /// The template with escaped braces replaced by plain ones.
    pub fn unescaped(&self) -> Cow<'_, str> {
        self.restore(&self.text)
    }

    /// Returns the trimmed source of an expression span, braces restored.
    ///
    /// `None` for literals and for blank placeholders such as `{  }`, which
    /// contribute nothing to the output.
    pub fn expression_source(&self, span: &Span<'_>) -> Option<String> {
        match span {
            Span::Literal(_) => None,
            Span::Expression(raw) => {
                let restored = self.restore(raw);
                let trimmed = restored.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// Rewrites `\{` and `\}` to stand-in characters absent from `template`.
pub fn normalize_escapes(template: &str) -> Normalized<'_> {
    if !template.contains("\\{") && !template.contains("\\}") {
        return Normalized {
            text: Cow::Borrowed(template),
            stand_ins: None,
        };
    }
    let (open, close) = pick_stand_ins(template);
    let text = template
        .replace("\\{", &open.to_string())
        .replace("\\}", &close.to_string());
    Normalized {
        text: Cow::Owned(text),
        stand_ins: Some((open, close)),
    }
}

fn pick_stand_ins(template: &str) -> (char, char) {
    let used: HashSet<char> = template.chars().collect();
    let mut free = (FIRST_STAND_IN..=u32::from(char::MAX))
        .chain(0x80..FIRST_STAND_IN)
        .filter_map(char::from_u32)
        .filter(|c| !used.contains(c));
    match (free.next(), free.next()) {
        (Some(open), Some(close)) => (open, close),
        _ => {
            tracing::warn!("no free stand-in characters; escaped braces may collide");
            ('\u{E000}', '\u{E001}')
        }
    }
}

/// Splits normalized template text into spans, left to right.
///
/// Empty literals are omitted. Blank expression spans are kept so the
/// spans always reconstruct the input; callers drop them.
pub fn scan(normalized: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in EXPRESSION.captures_iter(normalized) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::Literal(&normalized[last..whole.start()]));
        }
        spans.push(Span::Expression(inner.as_str()));
        last = whole.end();
    }

    if last < normalized.len() {
        spans.push(Span::Literal(&normalized[last..]));
    }
    spans
}

/// Distinct trimmed expression sources of `template`, in first-occurrence order.
pub fn distinct_expressions(template: &str) -> Vec<String> {
    let normalized = normalize_escapes(template);
    let mut sources: Vec<String> = Vec::new();
    for span in normalized.spans() {
        if let Some(source) = normalized.expression_source(&span) {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(spans: &[Span<'_>]) -> String {
        spans
            .iter()
            .map(|span| match span {
                Span::Literal(text) => text.to_string(),
                Span::Expression(raw) => format!("{{{}}}", raw),
            })
            .collect()
    }

    #[test]
    fn test_scan_alternates_literals_and_expressions() {
        let spans = scan("hello, {name}! {1 + 1}");
        assert_eq!(
            spans,
            vec![
                Span::Literal("hello, "),
                Span::Expression("name"),
                Span::Literal("! "),
                Span::Expression("1 + 1"),
            ]
        );
    }

    #[test]
    fn test_scan_plain_text() {
        assert_eq!(scan("hello"), vec![Span::Literal("hello")]);
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_empty_braces_stay_literal() {
        assert_eq!(scan("a{}b"), vec![Span::Literal("a{}b")]);
    }

    #[test]
    fn test_blank_expression_has_no_source() {
        let normalized = normalize_escapes("a{  }b");
        let spans = normalized.spans();
        assert_eq!(spans[1], Span::Expression("  "));
        assert_eq!(normalized.expression_source(&spans[1]), None);
        assert_eq!(normalized.expression_source(&spans[0]), None);
    }

    #[test]
    fn test_unterminated_brace_is_literal() {
        assert_eq!(scan("cost: {price"), vec![Span::Literal("cost: {price")]);
        assert_eq!(
            scan("{a} and {b"),
            vec![Span::Expression("a"), Span::Literal(" and {b")]
        );
    }

    #[test]
    fn test_nested_braces_split_best_effort() {
        let spans = scan("{a{b}c}");
        assert_eq!(
            spans,
            vec![Span::Expression("a{b"), Span::Literal("c}")]
        );
    }

    #[test]
    fn test_escaped_braces_are_not_delimiters() {
        let normalized = normalize_escapes(r"\{name\} is {name}");
        let spans = normalized.spans();
        assert_eq!(spans.len(), 2);
        match spans[0] {
            Span::Literal(text) => assert_eq!(normalized.restore(text), "{name} is "),
            other => panic!("expected literal, got {:?}", other),
        }
        assert_eq!(spans[1], Span::Expression("name"));
    }

    #[test]
    fn test_escaped_braces_inside_expression_are_restored() {
        let normalized = normalize_escapes(r"{'\{' + name + '\}'}");
        let spans = normalized.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(
            normalized.expression_source(&spans[0]).as_deref(),
            Some("'{' + name + '}'")
        );
    }

    #[test]
    fn test_normalize_borrows_without_escapes() {
        let normalized = normalize_escapes(r"{a} C:\dir");
        assert_eq!(normalized.stand_ins(), None);
        assert_eq!(normalized.as_str(), r"{a} C:\dir");
        assert!(matches!(normalized.restore("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_private_use_text_survives_normalization() {
        let template = "\u{E000}\\{x\\}\u{E001} {a}";
        let normalized = normalize_escapes(template);
        let (open, close) = normalized.stand_ins().unwrap();
        assert!(!template.contains([open, close]));
        assert_eq!(normalized.unescaped(), "\u{E000}{x}\u{E001} {a}");
        assert_eq!(
            normalized.spans(),
            vec![
                Span::Literal(&normalized.as_str()[..normalized.as_str().len() - 3]),
                Span::Expression("a"),
            ]
        );
    }

    #[test]
    fn test_text_without_escapes_keeps_private_use_characters() {
        let normalized = normalize_escapes("\u{E000}{a}\u{E001}");
        assert_eq!(normalized.unescaped(), "\u{E000}{a}\u{E001}");
    }

    #[test]
    fn test_spans_reconstruct_template() {
        for template in ["hello, {name}", "{a}{b}", "x{ }y{}z", "{a{b}c}", "{open"] {
            assert_eq!(reconstruct(&scan(template)), template);
        }
    }

    #[test]
    fn test_distinct_expressions_dedupes_trimmed_sources() {
        assert_eq!(
            distinct_expressions("{ a }-{a}-{b}-{ }"),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
