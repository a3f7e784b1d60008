//! Free-name extraction for template expressions.
//!
//! An expression's free names are the identifiers a data context has to
//! bind for the expression to resolve. Only the root of an access chain
//! counts: `user.name` needs `user`, and `Date.now()` needs `Date`.
//!
//! Extraction runs on the expression lexer's tokens. String literals are
//! single tokens there, so words inside quotes are never reported.
//!
//! # Unbalanced quotes
//!
//! An unterminated string swallows the rest of the expression. Names before
//! it are still reported and a warning is logged. Compilation rejects such
//! expressions before extraction, so this only affects direct callers.

use stencil_expr::{Lexer, Punct, Token, KEYWORDS};

use crate::scanner::distinct_expressions;

/// Returns the free root names of one expression, first-seen order, no repeats.
///
/// ```rust
/// use stencil::extract_identifiers;
///
/// assert_eq!(extract_identifiers("a.b + c"), vec!["a", "c"]);
/// assert_eq!(extract_identifiers("'name' + first"), vec!["first"]);
/// ```
pub fn extract_identifiers(expression: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut after_member = false;

    for spanned in Lexer::new(expression) {
        let spanned = match spanned {
            Ok(spanned) => spanned,
            Err(err) => {
                tracing::warn!(
                    expression,
                    error = %err,
                    "identifier extraction stopped at a lexer error"
                );
                break;
            }
        };

        if let Token::Ident(name) = spanned.token {
            let is_free = !after_member && !KEYWORDS.contains(&name);
            if is_free && !names.iter().any(|known| known == name) {
                names.push(name.to_string());
            }
        }
        after_member = matches!(
            spanned.token,
            Token::Punct(Punct::Dot) | Token::Punct(Punct::QuestionDot)
        );
    }
    names
}

/// Concatenates the free names of several expressions.
///
/// Names repeat when more than one expression uses them.
pub fn extract_all<I, S>(expressions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    expressions
        .into_iter()
        .flat_map(|expression| extract_identifiers(expression.as_ref()))
        .collect()
}

/// Returns the free names of every distinct expression in `template`.
///
/// ```rust
/// use stencil::identifiers_of;
///
/// assert_eq!(identifiers_of("{a.b + c}"), vec!["a", "c"]);
/// assert_eq!(identifiers_of("{a} {a + b}"), vec!["a", "a", "b"]);
/// ```
pub fn identifiers_of(template: &str) -> Vec<String> {
    extract_all(distinct_expressions(template))
}

/// Removes repeated names, keeping the first occurrence.
pub(crate) fn dedupe(names: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    unique
}
