//! Expression syntax tree.

use crate::op::{BinaryOp, UnaryOp};
use crate::value::Value;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant value (numbers, strings, `true`, `null`, ...).
    Literal(Value),
    /// Array literal `[a, b]`.
    Array(Vec<Expr>),
    /// Free variable reference.
    Ident(String),
    /// Reference to a pre-evaluated slot of a compiled program.
    Slot(usize),
    /// Property access `object.property` or `object?.property`.
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    /// Computed access `object[index]`.
    Index { object: Box<Expr>, index: Box<Expr> },
    /// Function or method call.
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// Prefix operator.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operator other than a `+` chain.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Left-associative `+` chain, `a + b + c`, folded left to right.
    Sum(Vec<Expr>),
    /// `test ? consequent : alternate`.
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

impl Expr {
    /// Dotted path of a plain name chain such as `Math.max`.
    ///
    /// Returns `None` when the chain contains anything other than
    /// identifiers and non-optional `.name` accesses.
    pub fn path(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Member {
                object,
                property,
                optional: false,
            } => object.path().map(|p| format!("{}.{}", p, property)),
            _ => None,
        }
    }

    /// Number of nodes on the longest path from this node to a leaf.
    ///
    /// The parser rejects trees taller than its nesting limit, so this
    /// recursion stays shallow for any parsed expression.
    pub fn height(&self) -> usize {
        let children = match self {
            Expr::Literal(_) | Expr::Ident(_) | Expr::Slot(_) => 0,
            Expr::Array(items) | Expr::Sum(items) => max_height(items),
            Expr::Member { object, .. } => object.height(),
            Expr::Index { object, index } => object.height().max(index.height()),
            Expr::Call { callee, args } => callee.height().max(max_height(args)),
            Expr::Unary { operand, .. } => operand.height(),
            Expr::Binary { lhs, rhs, .. } => lhs.height().max(rhs.height()),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => test
                .height()
                .max(consequent.height())
                .max(alternate.height()),
        };
        children + 1
    }

    /// Root identifier of a member/index/call chain (`a` in `a.b[0].c()`).
    pub fn root(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            Expr::Member { object, .. } | Expr::Index { object, .. } => object.root(),
            Expr::Call { callee, .. } => callee.root(),
            _ => None,
        }
    }
}

fn max_height(exprs: &[Expr]) -> usize {
    exprs.iter().map(Expr::height).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn path_of_member_chain() {
        let expr = Expr::Member {
            object: Box::new(Expr::Member {
                object: ident("a"),
                property: "b".into(),
                optional: false,
            }),
            property: "c".into(),
            optional: false,
        };
        assert_eq!(expr.path().as_deref(), Some("a.b.c"));
        assert_eq!(expr.root(), Some("a"));
    }

    #[test]
    fn optional_member_has_no_path() {
        let expr = Expr::Member {
            object: ident("a"),
            property: "b".into(),
            optional: true,
        };
        assert_eq!(expr.path(), None);
        assert_eq!(expr.root(), Some("a"));
    }

    #[test]
    fn height_counts_longest_branch() {
        assert_eq!(Expr::Ident("a".into()).height(), 1);
        let expr = Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(Expr::Member {
                object: ident("a"),
                property: "b".into(),
                optional: false,
            }),
            rhs: ident("c"),
        };
        assert_eq!(expr.height(), 3);
        assert_eq!(Expr::Sum(vec![Expr::Ident("a".into()); 50]).height(), 2);
    }

    #[test]
    fn index_breaks_path_but_keeps_root() {
        let expr = Expr::Index {
            object: ident("items"),
            index: Box::new(Expr::Literal(Value::Number(0.0))),
        };
        assert_eq!(expr.path(), None);
        assert_eq!(expr.root(), Some("items"));
    }
}
