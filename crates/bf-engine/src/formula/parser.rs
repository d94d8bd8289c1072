//! Formula parser and evaluator.
//!
//! Precedence, lowest first: ternary `?:`, `||`, `&&`, equality, comparison,
//! additive, multiplicative, unary, `**` (right-associative).

use crate::binding::Lookup;

use super::FormulaError;
use super::lexer::{Token, TokenKind};

/// Nesting limit for parenthesized, unary and exponent sub-expressions.
const MAX_DEPTH: usize = 64;

/// Limit on operator nodes in one formula. Evaluation recurses once per
/// level of the tree, and left-associative chains grow one level per
/// operator.
const MAX_OPERATORS: usize = 256;

/// Parsed formula expression.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// Value of a reserved literal, or `None` for ordinary identifiers.
///
/// See [`RESERVED_WORDS`](super::RESERVED_WORDS).
pub(crate) fn literal_value(name: &str) -> Option<f64> {
    match name {
        "true" => Some(1.0),
        "false" | "null" => Some(0.0),
        "undefined" => Some(f64::NAN),
        _ => None,
    }
}

fn truthy(n: f64) -> bool {
    n != 0.0 && !n.is_nan()
}

fn from_bool(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

impl Expr {
    /// Evaluate against bindings. Reads go through `bindings` only for
    /// variables on the taken branch.
    #[allow(clippy::float_cmp)]
    pub(crate) fn eval(&self, bindings: &dyn Lookup) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Variable(name) => bindings.lookup(name).map_or(0.0, |v| v.as_number()),
            Self::Unary(op, expr) => {
                let value = expr.eval(bindings);
                match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Pos => value,
                    UnaryOp::Not => from_bool(!truthy(value)),
                }
            }
            Self::Binary(op, left, right) => {
                let l = left.eval(bindings);
                match op {
                    BinaryOp::And if truthy(l) => right.eval(bindings),
                    BinaryOp::Or if !truthy(l) => right.eval(bindings),
                    BinaryOp::And | BinaryOp::Or => l,
                    BinaryOp::Add => l + right.eval(bindings),
                    BinaryOp::Sub => l - right.eval(bindings),
                    BinaryOp::Mul => l * right.eval(bindings),
                    BinaryOp::Div => l / right.eval(bindings),
                    BinaryOp::Pow => l.powf(right.eval(bindings)),
                    BinaryOp::Lt => from_bool(l < right.eval(bindings)),
                    BinaryOp::Le => from_bool(l <= right.eval(bindings)),
                    BinaryOp::Gt => from_bool(l > right.eval(bindings)),
                    BinaryOp::Ge => from_bool(l >= right.eval(bindings)),
                    BinaryOp::Eq => from_bool(l == right.eval(bindings)),
                    BinaryOp::Ne => from_bool(l != right.eval(bindings)),
                }
            }
            Self::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if truthy(condition.eval(bindings)) {
                    then.eval(bindings)
                } else {
                    otherwise.eval(bindings)
                }
            }
        }
    }

    /// Collect variable names in first-appearance order, without duplicates.
    pub(crate) fn variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::Unary(_, expr) => expr.variables(out),
            Self::Binary(_, left, right) => {
                left.variables(out);
                right.variables(out);
            }
            Self::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.variables(out);
                then.variables(out);
                otherwise.variables(out);
            }
        }
    }
}

/// Parse a token stream into an expression.
pub(crate) fn parse(tokens: Vec<Token>, source_len: usize) -> Result<Expr, FormulaError> {
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        operators: 0,
        source_len,
    };
    let expr = parser.parse_expr()?;
    match parser.tokens.get(parser.pos) {
        Some(token) => Err(FormulaError::UnexpectedToken {
            found: token.kind.describe(),
            offset: token.offset,
        }),
        None => Ok(expr),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    operators: usize,
    source_len: usize,
}

impl Parser {
    fn parse_expr(&mut self) -> Result<Expr, FormulaError> {
        self.nested(Self::parse_ternary)
    }

    /// Run `parse` one nesting level deeper.
    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Expr, FormulaError>,
    ) -> Result<Expr, FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::TooDeep { limit: MAX_DEPTH });
        }
        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    /// Count an operator node against the size limit.
    fn operator(&mut self, expr: Expr) -> Result<Expr, FormulaError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(FormulaError::TooLong {
                limit: MAX_OPERATORS,
            });
        }
        Ok(expr)
    }

    fn parse_ternary(&mut self) -> Result<Expr, FormulaError> {
        let condition = self.parse_or()?;

        if self.eat(&TokenKind::Question) {
            let then = self.parse_expr()?;
            self.expect(&TokenKind::Colon)?;
            let otherwise = self.parse_expr()?;
            self.operator(Expr::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            })
        } else {
            Ok(condition)
        }
    }

    fn parse_or(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = self.operator(Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right)))?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_equality()?;
            left = self.operator(Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right)))?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Eq | TokenKind::StrictEq) => BinaryOp::Eq,
                Some(TokenKind::Ne | TokenKind::StrictNe) => BinaryOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_comparison()?;
            left = self.operator(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_add()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Le) => BinaryOp::Le,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_add()?;
            left = self.operator(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }

        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_mul()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_mul()?;
            left = self.operator(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }

        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = self.operator(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Pos,
            Some(TokenKind::Not) => UnaryOp::Not,
            _ => return self.parse_power(),
        };
        self.pos += 1;

        let expr = self.nested(Self::parse_unary)?;
        self.operator(Expr::Unary(op, Box::new(expr)))
    }

    fn parse_power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.parse_primary()?;

        if self.eat(&TokenKind::DoubleStar) {
            let exponent = self.nested(Self::parse_unary)?;
            self.operator(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)))
        } else {
            Ok(base)
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let Some(token) = self.tokens.get(self.pos) else {
            return Err(FormulaError::UnexpectedEnd {
                offset: self.source_len,
            });
        };

        let expr = match &token.kind {
            TokenKind::Number(n) => Expr::Number(*n),
            TokenKind::Ident(name) => {
                literal_value(name).map_or_else(|| Expr::Variable(name.clone()), Expr::Number)
            }
            TokenKind::LParen => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            other => {
                return Err(FormulaError::UnexpectedToken {
                    found: other.describe(),
                    offset: token.offset,
                });
            }
        };
        self.pos += 1;
        Ok(expr)
    }

    // Helpers

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), FormulaError> {
        if self.eat(kind) {
            return Ok(());
        }
        match self.tokens.get(self.pos) {
            Some(token) => Err(FormulaError::UnexpectedToken {
                found: token.kind.describe(),
                offset: token.offset,
            }),
            None => Err(FormulaError::UnexpectedEnd {
                offset: self.source_len,
            }),
        }
    }
}
