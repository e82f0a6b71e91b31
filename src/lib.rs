//! Mathematical expressions over `f64`: tokenize, parse, fold constants,
//! then evaluate the tree or compile it to machine code with Cranelift.
//!
//! ```
//! use mathexpr_rs::EvaluationEngine;
//!
//! let mut engine = EvaluationEngine::new();
//! engine.add_default_functions();
//! engine.add_default_constants();
//!
//! let value = engine.evaluate("2 * sin(x) ^ 2", &[("x", 0.5)]).unwrap();
//! let compiled = engine.compile("2 * sin(x) ^ 2").unwrap();
//! assert_eq!(compiled.invoke(&[0.5]).unwrap(), value);
//! ```

pub mod ast;
pub mod bytecode;
pub mod functions;
pub mod jit;

mod bindings;
mod engine;
mod error;

pub use ast::{Associativity, CancellationToken, Expression, Function, Variables};
pub use bindings::Bindings;
pub use engine::{EngineOptions, EvaluationEngine};
pub use error::{Error, Result};
pub use jit::{CompiledFunction, TypedFunction};
pub use mathexpr_macros::bindings;

/// Evaluates `expression` with the default functions and constants.
pub fn evaluate_expression<V: Variables + ?Sized>(expression: &str, variables: &V) -> Result<f64> {
    let mut engine = EvaluationEngine::new();
    engine.add_default_functions();
    engine.add_default_constants();
    engine.evaluate(expression, variables)
}
