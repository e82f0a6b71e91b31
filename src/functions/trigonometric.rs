use crate::ast::{Environment, Function};

pub fn register(environment: &mut Environment) {
    environment.set_function("sin", Function::unary(f64::sin));
    environment.set_function("cos", Function::unary(f64::cos));
    environment.set_function("tan", Function::unary(f64::tan));
    environment.set_function("ctg", Function::unary(cotangent));
    environment.set_function("asin", Function::unary(f64::asin));
    environment.set_function("acos", Function::unary(f64::acos));
    environment.set_function("atan", Function::unary(f64::atan));
    environment.set_function("rad", Function::unary(radians));
    environment.set_function("deg", Function::unary(degrees));
}

pub fn cotangent(x: f64) -> f64 {
    1.0 / x.tan()
}

/// Degrees to radians.
pub fn radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Radians to degrees.
pub fn degrees(radians: f64) -> f64 {
    radians.to_degrees()
}
