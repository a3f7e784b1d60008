//! Quoting of literal template text for embedding in a compiled program.
//!
//! Compiled programs hold literal text inside single-quoted string literals.
//! Every backslash and single quote is escaped, so the string the expression
//! lexer decodes is exactly the input text and rendering shows it
//! unchanged.

/// Escapes `text` for use between single quotes.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes `text` and wraps it in single quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", escape_literal(text))
}
