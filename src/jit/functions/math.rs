use crate::ast::BinaryOperator;

pub(crate) extern "C" fn pow(base: f64, exponent: f64) -> f64 {
    BinaryOperator::Power.apply(base, exponent)
}

pub(crate) extern "C" fn rem(dividend: f64, divisor: f64) -> f64 {
    BinaryOperator::Modulo.apply(dividend, divisor)
}
