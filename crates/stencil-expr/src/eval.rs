//! Tree-walking evaluator.
//!
//! Names are resolved through a [`Scope`]. A name the scope does not know is
//! an [`ExprError::Unresolved`] error; callers that want lenient lookups bind
//! every name up front instead.

use std::collections::{BTreeMap, HashMap};

use crate::ast::Expr;
use crate::error::{ExprError, Result};
use crate::functions::{call_method, Functions};
use crate::op::{add, BinaryOp};
use crate::value::{check_string_len, Value};

/// Source of variable bindings.
pub trait Scope {
    /// Returns the value bound to `name`, or `None` if it is unbound.
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl Scope for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Scope for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Scope for serde_json::Map<String, serde_json::Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).map(Value::from)
    }
}

/// Scope with no bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn lookup(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Evaluates expressions against a scope and a function registry.
///
/// # Example
///
/// ```
/// use stencil_expr::{parse, Evaluator, Functions, Value};
/// use std::collections::HashMap;
///
/// let mut scope = HashMap::new();
/// scope.insert("n".to_string(), Value::from(2));
///
/// let functions = Functions::builtin();
/// let expr = parse("1 + n").unwrap();
/// let value = Evaluator::new(&scope, &functions).eval(&expr).unwrap();
/// assert_eq!(value, Value::from(3));
/// ```
pub struct Evaluator<'a> {
    scope: &'a dyn Scope,
    functions: &'a Functions,
    slots: &'a [Value],
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: &'a dyn Scope, functions: &'a Functions) -> Self {
        Self {
            scope,
            functions,
            slots: &[],
        }
    }

    /// Supplies the pre-evaluated values that `$n` references resolve to.
    pub fn with_slots(mut self, slots: &'a [Value]) -> Self {
        self.slots = slots;
        self
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Array(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_>>()?,
            )),
            Expr::Ident(name) => self
                .scope
                .lookup(name)
                .ok_or_else(|| ExprError::Unresolved(name.clone())),
            Expr::Slot(index) => self.slots.get(*index).cloned().ok_or_else(|| {
                ExprError::type_error(format!("slot ${} has no value", index))
            }),
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let object = self.eval(object)?;
                if *optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                object.get_member(property)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                object.get_index(&index)
            }
            Expr::Call { callee, args } => self.eval_call(callee, args),
            Expr::Unary { op, operand } => Ok(op.apply(&self.eval(operand)?)),
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
            Expr::Sum(terms) => self.eval_sum(terms),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn eval_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value> {
        let lhs = self.eval(lhs)?;
        let short_circuits = match op {
            BinaryOp::Or => lhs.is_truthy(),
            BinaryOp::And => !lhs.is_truthy(),
            BinaryOp::Coalesce => !lhs.is_nullish(),
            _ => false,
        };
        if short_circuits {
            return Ok(lhs);
        }
        let rhs = self.eval(rhs)?;
        Ok(op.apply(&lhs, &rhs))
    }

    fn eval_sum(&self, terms: &[Expr]) -> Result<Value> {
        let mut iter = terms.iter();
        let mut acc = match iter.next() {
            Some(first) => self.eval(first)?,
            None => return Ok(Value::Undefined),
        };
        for term in iter {
            let value = self.eval(term)?;
            acc = match acc {
                // string accumulators append in place
                Value::String(mut s) => {
                    let piece = value.to_primitive().to_string();
                    check_string_len(s.len() + piece.len())?;
                    s.push_str(&piece);
                    Value::String(s)
                }
                other => add(&other, &value),
            };
        }
        if let Value::String(s) = &acc {
            check_string_len(s.len())?;
        }
        Ok(acc)
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr]) -> Result<Value> {
        if let Some(path) = callee.path() {
            if let Some(function) = self.functions.get(&path) {
                let args = self.eval_args(args)?;
                return function(&args);
            }
        }

        match callee {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let receiver = self.eval(object)?;
                if *optional && receiver.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let args = self.eval_args(args)?;
                call_method(&receiver, property, &args)
            }
            other => Err(ExprError::UnknownFunction(
                other.path().unwrap_or_else(|| "<expression>".to_string()),
            )),
        }
    }

    fn eval_args(&self, args: &[Expr]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}
