//! Template compilation.
//!
//! A template compiles into a [`Program`]: a single concatenation expression
//! whose operands are quoted literal text and slot references. Every distinct
//! placeholder expression becomes one [`Slot`] that evaluates
//! `(<expression>) || '<default>'`, so a falsy result is replaced by the
//! default value.
//!
//! ```text
//! template:  hello, {name}! {name.length}
//! program:   'hello, ' + $0 + '! ' + $1 + ''
//! $0:        (name) || ''
//! $1:        (name.length) || ''
//! ```
//!
//! Rendering evaluates each slot once against the data context and then the
//! program with those values, so repeated placeholders always agree.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use stencil_expr::{parse, parse_program, EmptyScope, Evaluator, Expr, Functions, Scope, Value};

use crate::error::TemplateError;
use crate::escape::quote_literal;
use crate::identifiers::extract_all;
use crate::scanner::{normalize_escapes, Span};

/// One distinct placeholder expression of a compiled template.
#[derive(Debug, Clone)]
pub struct Slot {
    id: usize,
    source: String,
    program: String,
    expr: Expr,
}

impl Slot {
    /// Position of this slot in the program, in first-occurrence order.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The reference used for this slot in program text: `$0`, `$1`, ...
    pub fn name(&self) -> String {
        format!("${}", self.id)
    }

    /// The trimmed expression as written in the template.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The expression with its default fallback: `(<source>) || '<default>'`.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

/// The executable form of a template.
#[derive(Debug, Clone)]
pub struct Program {
    source: String,
    expr: Expr,
    slots: Vec<Slot>,
}

impl Program {
    /// Program text, e.g. `'hello, ' + $0 + ''`.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Evaluates the program against `scope`.
    ///
    /// Each slot is evaluated once. A name missing from `scope` surfaces as
    /// [`TemplateError::UnresolvedBinding`].
    pub fn render(&self, scope: &dyn Scope, functions: &Functions) -> Result<String, TemplateError> {
        let evaluator = Evaluator::new(scope, functions);
        let values = self
            .slots
            .iter()
            .map(|slot| {
                evaluator
                    .eval(&slot.expr)
                    .map_err(|err| TemplateError::from_expr(&slot.source, err))
            })
            .collect::<Result<Vec<Value>, _>>()?;

        let output = Evaluator::new(&EmptyScope, functions)
            .with_slots(&values)
            .eval(&self.expr)
            .map_err(|err| TemplateError::from_expr(&self.source, err))?;
        Ok(output.to_string())
    }
}

/// A compiled template, shared through the compilation cache.
#[derive(Debug)]
pub struct CompiledTemplate {
    template: String,
    source_template: String,
    default_value: String,
    program: Program,
    identifiers: OnceCell<Vec<String>>,
}

impl CompiledTemplate {
    /// The template exactly as passed to [`compile`].
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The template after escaped braces were normalized.
    pub fn source_template(&self) -> &str {
        &self.source_template
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Distinct expression sources with the slot each maps to, in slot order.
    pub fn expression_mapping(&self) -> impl Iterator<Item = (&str, &Slot)> + '_ {
        self.program.slots.iter().map(|slot| (slot.source(), slot))
    }

    /// Looks up the slot compiled for an expression source.
    pub fn slot_for(&self, source: &str) -> Option<&Slot> {
        self.program.slots.iter().find(|slot| slot.source == source)
    }

    /// Free names of every slot, concatenated in slot order.
    ///
    /// `None` until extraction was requested at compile time or through a
    /// later cache hit.
    pub fn identifiers(&self) -> Option<&[String]> {
        self.identifiers.get().map(Vec::as_slice)
    }

    /// Extracts identifiers if that has not happened yet.
    pub(crate) fn ensure_identifiers(&self) -> &[String] {
        self.identifiers
            .get_or_init(|| extract_all(self.program.slots.iter().map(Slot::source)))
    }

    /// Renders against `scope`; see [`Program::render`].
    pub fn render(&self, scope: &dyn Scope, functions: &Functions) -> Result<String, TemplateError> {
        self.program.render(scope, functions)
    }
}

/// Compiles `template` without consulting any cache.
///
/// Fails with [`TemplateError::Evaluation`] when a placeholder is not a
/// valid expression.
///
/// ```rust
/// use stencil::compile;
///
/// let compiled = compile("hello, {name}", "...", true).unwrap();
/// assert_eq!(compiled.program().source(), "'hello, ' + $0 + ''");
/// assert_eq!(compiled.program().slots()[0].program(), "(name) || '...'");
/// assert_eq!(compiled.identifiers(), Some(&["name".to_string()][..]));
/// ```
pub fn compile(
    template: &str,
    default_value: &str,
    extract_identifiers: bool,
) -> Result<CompiledTemplate, TemplateError> {
    let normalized = normalize_escapes(template);
    let fallback = quote_literal(default_value);

    let mut terms: Vec<String> = Vec::new();
    let mut literal = String::new();
    let mut slots: Vec<Slot> = Vec::new();
    let mut mapping: HashMap<String, usize> = HashMap::new();

    for span in normalized.spans() {
        match span {
            Span::Literal(text) => literal.push_str(&normalized.restore(text)),
            Span::Expression(_) => {
                // blank placeholders vanish; surrounding text joins up
                let Some(source) = normalized.expression_source(&span) else {
                    continue;
                };
                let id = match mapping.get(&source) {
                    Some(&id) => id,
                    None => {
                        let id = slots.len();
                        let program = format!("({}) || {}", source, fallback);
                        let expr = parse(&program)
                            .map_err(|err| TemplateError::from_expr(&source, err))?;
                        mapping.insert(source.clone(), id);
                        slots.push(Slot {
                            id,
                            source,
                            program,
                            expr,
                        });
                        id
                    }
                };
                terms.push(quote_literal(&literal));
                terms.push(format!("${}", id));
                literal.clear();
            }
        }
    }
    terms.push(quote_literal(&literal));

    let source = terms.join(" + ");
    let expr = parse_program(&source).map_err(|err| TemplateError::from_expr(&source, err))?;

    let identifiers = OnceCell::new();
    if extract_identifiers {
        let _ = identifiers.set(extract_all(slots.iter().map(Slot::source)));
    }

    tracing::debug!(
        template,
        slots = slots.len(),
        identifiers = extract_identifiers,
        "compiled template"
    );

    Ok(CompiledTemplate {
        template: template.to_string(),
        source_template: normalized.unescaped().into_owned(),
        default_value: default_value.to_string(),
        program: Program {
            source,
            expr,
            slots,
        },
        identifiers,
    })
}
