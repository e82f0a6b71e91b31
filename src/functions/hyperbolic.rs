use crate::ast::{Environment, Function};

pub fn register(environment: &mut Environment) {
    environment.set_function("sinh", Function::unary(f64::sinh));
    environment.set_function("cosh", Function::unary(f64::cosh));
    environment.set_function("tanh", Function::unary(f64::tanh));
    environment.set_function("asinh", Function::unary(f64::asinh));
    environment.set_function("acosh", Function::unary(f64::acosh));
    environment.set_function("atanh", Function::unary(f64::atanh));
}
