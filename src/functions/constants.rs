use crate::ast::Environment;
use std::f64::consts;

pub fn register(environment: &mut Environment) {
    environment.set_constant("E", consts::E);
    environment.set_constant("PI", consts::PI);
}
