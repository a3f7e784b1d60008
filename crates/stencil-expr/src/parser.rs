//! Precedence-climbing parser producing [`Expr`] trees.
//!
//! Two entry points exist: [`parse`] for user-written expressions and
//! [`parse_program`] for compiled template programs, which are the only
//! place `$n` slot references are accepted.

use crate::ast::Expr;
use crate::error::{ExprError, Result};
use crate::lexer::{Lexer, Punct, Spanned, Token};
use crate::op::{BinaryOp, UnaryOp};
use crate::value::Value;

/// Limit on both parser recursion and the height of the resulting tree.
///
/// Operator and postfix chains are built in loops, so they are bounded by
/// tree height rather than recursion. `+` chains are flat and exempt.
const MAX_DEPTH: usize = 128;

/// Parses a user expression. Slot references are rejected.
pub fn parse(source: &str) -> Result<Expr> {
    Parser::new(source, false)?.parse_all()
}

/// Parses a compiled program, where `$n` slot references are allowed.
pub fn parse_program(source: &str) -> Result<Expr> {
    Parser::new(source, true)?.parse_all()
}

struct Parser<'a> {
    tokens: Vec<Spanned<'a>>,
    pos: usize,
    end: usize,
    allow_slots: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, allow_slots: bool) -> Result<Self> {
        Ok(Self {
            tokens: Lexer::tokenize(source)?,
            pos: 0,
            end: source.len(),
            allow_slots,
            depth: 0,
        })
    }

    fn parse_all(mut self) -> Result<Expr> {
        if self.tokens.is_empty() {
            return Err(ExprError::syntax("empty expression", 0));
        }
        let expr = self.parse_expression()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some(spanned) => Err(ExprError::syntax(
                format!("unexpected {}", describe(&spanned.token)),
                spanned.offset,
            )),
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|s| s.offset).unwrap_or(self.end)
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct, what: &str) -> Result<()> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        let found = match self.peek() {
            Some(token) => describe(token),
            None => "end of expression".to_string(),
        };
        ExprError::syntax(format!("expected {}, found {}", expected, found), self.offset())
    }

    fn too_deep(&self) -> ExprError {
        ExprError::syntax("expression nested too deeply", self.offset())
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn bounded(&self, height: usize) -> Result<usize> {
        if height > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(height)
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.enter()?;
        let result = self.parse_conditional();
        self.depth -= 1;
        result
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let test = self.parse_binary(1)?;
        if !self.eat(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.parse_expression()?;
        self.expect(Punct::Colon, "':'")?;
        let alternate = self.parse_expression()?;
        let tallest = test
            .height()
            .max(consequent.height())
            .max(alternate.height());
        self.bounded(tallest + 1)?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn peek_binary(&self) -> Option<BinaryOp> {
        let op = match self.peek()? {
            Token::Punct(p) => match p {
                Punct::Coalesce => BinaryOp::Coalesce,
                Punct::OrOr => BinaryOp::Or,
                Punct::AndAnd => BinaryOp::And,
                Punct::EqEq => BinaryOp::Eq,
                Punct::NotEq => BinaryOp::Ne,
                Punct::EqEqEq => BinaryOp::StrictEq,
                Punct::NotEqEq => BinaryOp::StrictNe,
                Punct::Lt => BinaryOp::Lt,
                Punct::Lte => BinaryOp::Lte,
                Punct::Gt => BinaryOp::Gt,
                Punct::Gte => BinaryOp::Gte,
                Punct::Plus => BinaryOp::Add,
                Punct::Minus => BinaryOp::Sub,
                Punct::Star => BinaryOp::Mul,
                Punct::Slash => BinaryOp::Div,
                Punct::Percent => BinaryOp::Rem,
                _ => return None,
            },
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        let mut height = lhs.height();

        while let Some(op) = self.peek_binary() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_binary(precedence + 1)?;

            height = match (op, &lhs) {
                (BinaryOp::Add, Expr::Sum(_)) => height.max(rhs.height() + 1),
                _ => height.max(rhs.height()) + 1,
            };
            self.bounded(height)?;
            lhs = match (op, lhs) {
                (BinaryOp::Add, Expr::Sum(mut terms)) => {
                    terms.push(rhs);
                    Expr::Sum(terms)
                }
                (BinaryOp::Add, lhs) => Expr::Sum(vec![lhs, rhs]),
                (op, lhs) => Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(Token::Punct(Punct::Bang)) => Some(UnaryOp::Not),
            Some(Token::Punct(Punct::Minus)) => Some(UnaryOp::Neg),
            Some(Token::Punct(Punct::Plus)) => Some(UnaryOp::Plus),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.parse_unary();
        self.depth -= 1;
        let operand = operand?;
        self.bounded(operand.height() + 1)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        let mut height = expr.height();

        loop {
            if matches!(
                self.peek(),
                Some(Token::Punct(
                    Punct::Dot | Punct::QuestionDot | Punct::LBracket | Punct::LParen
                ))
            ) {
                height = self.bounded(height + 1)?;
            }
            if self.eat(Punct::Dot) {
                let property = self.parse_property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional: false,
                };
            } else if self.eat(Punct::QuestionDot) {
                let property = self.parse_property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional: true,
                };
            } else if self.eat(Punct::LBracket) {
                let index = self.parse_expression()?;
                self.expect(Punct::RBracket, "']'")?;
                height = self.bounded(height.max(index.height() + 1))?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat(Punct::LParen) {
                let args = self.parse_list(Punct::RParen, "')'")?;
                height = self.bounded(height.max(max_height(&args) + 1))?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_property_name(&mut self) -> Result<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("property name")),
        }
    }

    fn parse_list(&mut self, close: Punct, what: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(Punct::Comma, &format!("',' or {}", what))?;
            // trailing comma
            if self.eat(close) {
                return Ok(items);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let offset = self.offset();
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("expression"));
        };

        let expr = match token {
            Token::Number(n) => Expr::Literal(Value::Number(n)),
            Token::Str(s) => Expr::Literal(Value::String(s)),
            Token::Ident(name) => match name {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                "undefined" => Expr::Literal(Value::Undefined),
                other => Expr::Ident(other.to_string()),
            },
            Token::Slot(index) => {
                if !self.allow_slots {
                    return Err(ExprError::syntax(
                        format!("slot reference ${} is not allowed here", index),
                        offset,
                    ));
                }
                Expr::Slot(index)
            }
            Token::Punct(Punct::LParen) => {
                self.pos += 1;
                let inner = self.parse_expression()?;
                self.expect(Punct::RParen, "')'")?;
                return Ok(inner);
            }
            Token::Punct(Punct::LBracket) => {
                self.pos += 1;
                let items = self.parse_list(Punct::RBracket, "']'")?;
                self.bounded(max_height(&items) + 1)?;
                return Ok(Expr::Array(items));
            }
            _ => return Err(self.unexpected("expression")),
        };

        self.pos += 1;
        Ok(expr)
    }
}

/// Words that are literals rather than free variables.
pub const KEYWORDS: &[&str] = &["true", "false", "null", "undefined"];

fn max_height(exprs: &[Expr]) -> usize {
    exprs.iter().map(Expr::height).max().unwrap_or(0)
}

fn describe(token: &Token<'_>) -> String {
    match token {
        Token::Number(n) => format!("number {}", crate::value::format_number(*n)),
        Token::Str(_) => "string literal".to_string(),
        Token::Ident(name) => format!("'{}'", name),
        Token::Slot(index) => format!("${}", index),
        Token::Punct(p) => format!("{:?}", p),
    }
}
