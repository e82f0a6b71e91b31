//! Default bindings, grouped by family.
//!
//! Nothing here is registered automatically; an engine opts in through
//! [`register_functions`] and [`register_constants`].

pub mod arithmetic;
pub mod constants;
pub mod hyperbolic;
pub mod trigonometric;

use crate::ast::Environment;

pub fn register_functions(environment: &mut Environment) {
    arithmetic::register(environment);
    trigonometric::register(environment);
    hyperbolic::register(environment);
}

pub fn register_constants(environment: &mut Environment) {
    constants::register(environment);
}
