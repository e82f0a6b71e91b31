use crate::ast::{BinaryOperator, Expression};
use log::trace;

/// Bottom-up constant folding.
///
/// Children are optimized first. A binary node over two constants folds into
/// one constant, except that equal constants under `/` and `-` become `1` and
/// `0`. A division of two structurally equal subtrees becomes `1`, which relies
/// on evaluation being free of side effects. Nothing else is rewritten.
pub fn optimize(expression: &Expression) -> Expression {
    match expression {
        Expression::Constant(_) | Expression::Variable(_) => expression.clone(),

        Expression::Unary { operator, operand } => Expression::unary(*operator, optimize(operand)),

        Expression::Call { name, args } => Expression::Call {
            name: name.clone(),
            args: args.iter().map(optimize).collect(),
        },

        Expression::Binary {
            left,
            operator,
            right,
        } => {
            let left = optimize(left);
            let right = optimize(right);
            let folded = fold(&left, *operator, &right);
            if let Some(constant) = &folded {
                trace!("folded ({} {} {}) into {}", left, operator, right, constant);
            }
            folded.unwrap_or_else(|| Expression::binary(left, *operator, right))
        }
    }
}

fn fold(left: &Expression, operator: BinaryOperator, right: &Expression) -> Option<Expression> {
    match (left, right) {
        (Expression::Constant(a), Expression::Constant(b)) => {
            let value = if left == right {
                match operator {
                    BinaryOperator::Divide => 1.0,
                    BinaryOperator::Subtract => 0.0,
                    _ => operator.apply(*a, *b),
                }
            } else {
                operator.apply(*a, *b)
            };
            Some(Expression::Constant(value))
        }
        _ if operator == BinaryOperator::Divide && left == right => {
            Some(Expression::Constant(1.0))
        }
        _ => None,
    }
}
