use crate::ast::Function;
use std::fmt;
use std::sync::Arc;

mod compiler;

pub use compiler::BytecodeCompiler;

/// Postfix instructions for a single expression.
///
/// Names are already resolved: variables are parameter slots, constants are
/// literals and calls point into [`Program::functions`].
#[derive(Debug, Clone, PartialEq)]
pub enum Bytecode {
    // Stack Operations
    PushFloat(f64),
    LoadVariable(usize),

    // Arithmetic Operations
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Neg,

    // Function Calls
    Call(usize, usize), // Function index, argument count
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bytecode::PushFloat(value) => write!(f, "push {}", value),
            Bytecode::LoadVariable(slot) => write!(f, "load ${}", slot),
            Bytecode::Add => write!(f, "add"),
            Bytecode::Sub => write!(f, "sub"),
            Bytecode::Mul => write!(f, "mul"),
            Bytecode::Div => write!(f, "div"),
            Bytecode::Mod => write!(f, "mod"),
            Bytecode::Pow => write!(f, "pow"),
            Bytecode::Neg => write!(f, "neg"),
            Bytecode::Call(index, argc) => write!(f, "call #{}/{}", index, argc),
        }
    }
}

/// A lowered expression together with everything it refers to.
#[derive(Debug, Clone)]
pub struct Program {
    pub code: Vec<Bytecode>,
    /// Free variable names; slot `i` of [`Bytecode::LoadVariable`] is `parameters[i]`.
    pub parameters: Vec<String>,
    /// Functions resolved while lowering, indexed by [`Bytecode::Call`].
    pub functions: Vec<(String, Arc<Function>)>,
}
