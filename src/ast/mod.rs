use std::fmt;
use std::hash::{Hash, Hasher};

mod evaluator;
mod function;
mod lexer;
mod optimizer;
mod parser;
mod variables;

pub use evaluator::*;
pub use function::*;
pub use lexer::*;
pub use optimizer::optimize;
pub use parser::{Associativity, Parser, MAX_DEPTH, MAX_NESTING};
pub use variables::Variables;

/// An immutable expression tree.
///
/// Equality is structural: two trees are equal when they have the same shape,
/// operators, names and constant values. Constants compare by value, so
/// `NaN == NaN` and `0.0 == -0.0` here, and hashing agrees with that.
#[derive(Debug, Clone)]
pub enum Expression {
    Constant(f64),
    Variable(String),
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Call {
        name: String,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Expression::Constant(value)
    }

    pub fn variable(name: &str) -> Self {
        Expression::Variable(name.to_string())
    }

    pub fn unary(operator: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Self {
        Expression::Call {
            name: name.to_string(),
            args,
        }
    }

    /// Variable names in the order a depth-first, left-to-right walk first
    /// meets them. Each name appears once.
    pub fn free_variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            Expression::Constant(_) => {}
            Expression::Variable(name) => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
            Expression::Unary { operand, .. } => operand.collect_variables(names),
            Expression::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

fn constant_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expression::Constant(a), Expression::Constant(b)) => {
                constant_bits(*a) == constant_bits(*b)
            }
            (Expression::Variable(a), Expression::Variable(b)) => a == b,
            (
                Expression::Unary {
                    operator: op_a,
                    operand: a,
                },
                Expression::Unary {
                    operator: op_b,
                    operand: b,
                },
            ) => op_a == op_b && a == b,
            (
                Expression::Binary {
                    left: left_a,
                    operator: op_a,
                    right: right_a,
                },
                Expression::Binary {
                    left: left_b,
                    operator: op_b,
                    right: right_b,
                },
            ) => op_a == op_b && left_a == left_b && right_a == right_b,
            (
                Expression::Call {
                    name: name_a,
                    args: args_a,
                },
                Expression::Call {
                    name: name_b,
                    args: args_b,
                },
            ) => name_a == name_b && args_a == args_b,
            _ => false,
        }
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Expression::Constant(value) => constant_bits(*value).hash(state),
            Expression::Variable(name) => name.hash(state),
            Expression::Unary { operator, operand } => {
                operator.hash(state);
                operand.hash(state);
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                left.hash(state);
                operator.hash(state);
                right.hash(state);
            }
            Expression::Call { name, args } => {
                name.hash(state);
                args.hash(state);
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Unary { operator, operand } => write!(f, "{}{}", operator, operand),
            Expression::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

impl UnaryOperator {
    pub fn apply(&self, operand: f64) -> f64 {
        match self {
            UnaryOperator::Plus => operand,
            UnaryOperator::Minus => -operand,
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Minus => write!(f, "-"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl BinaryOperator {
    /// Plain IEEE-754 arithmetic. `%` is the floating remainder (sign of the
    /// dividend) and `^` is `powf`.
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Subtract => left - right,
            BinaryOperator::Multiply => left * right,
            BinaryOperator::Divide => left / right,
            BinaryOperator::Modulo => left % right,
            BinaryOperator::Power => left.powf(right),
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
            BinaryOperator::Modulo => '%',
            BinaryOperator::Power => '^',
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl TryFrom<TokenKind> for BinaryOperator {
    type Error = TokenKind;

    fn try_from(kind: TokenKind) -> Result<Self, Self::Error> {
        match kind {
            TokenKind::Plus => Ok(BinaryOperator::Add),
            TokenKind::Minus => Ok(BinaryOperator::Subtract),
            TokenKind::Star => Ok(BinaryOperator::Multiply),
            TokenKind::Slash => Ok(BinaryOperator::Divide),
            TokenKind::Percent => Ok(BinaryOperator::Modulo),
            TokenKind::Caret => Ok(BinaryOperator::Power),
            other => Err(other),
        }
    }
}
