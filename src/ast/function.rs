use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

pub type NullaryFn = Arc<dyn Fn() -> f64 + Send + Sync>;
pub type UnaryFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;
pub type BinaryFn = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;
pub type TernaryFn = Arc<dyn Fn(f64, f64, f64) -> f64 + Send + Sync>;
pub type NaryFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// A native callable tagged with its arity.
///
/// A function that wants to fail panics; the panic reaches whoever called
/// `evaluate` or the compiled function.
#[derive(Clone)]
pub enum Function {
    Nullary(NullaryFn),
    Unary(UnaryFn),
    Binary(BinaryFn),
    Ternary(TernaryFn),
    Nary { arity: usize, function: NaryFn },
}

impl Function {
    pub fn nullary<F>(f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        Function::Nullary(Arc::new(f))
    }

    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Function::Unary(Arc::new(f))
    }

    pub fn binary<F>(f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Function::Binary(Arc::new(f))
    }

    pub fn ternary<F>(f: F) -> Self
    where
        F: Fn(f64, f64, f64) -> f64 + Send + Sync + 'static,
    {
        Function::Ternary(Arc::new(f))
    }

    /// A function of any fixed arity receiving its arguments as a slice whose
    /// length is always `arity`.
    pub fn nary<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Function::Nary {
            arity,
            function: Arc::new(f),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Nullary(_) => 0,
            Function::Unary(_) => 1,
            Function::Binary(_) => 2,
            Function::Ternary(_) => 3,
            Function::Nary { arity, .. } => *arity,
        }
    }

    /// Checks the argument count against the arity, then invokes.
    pub fn call(&self, name: &str, args: &[f64]) -> Result<f64> {
        if args.len() != self.arity() {
            return Err(Error::ArityMismatch {
                name: name.to_string(),
                expected: self.arity(),
                actual: args.len(),
            });
        }
        Ok(self.call_unchecked(args))
    }

    /// Invokes with `args.len() == self.arity()` already established.
    pub(crate) fn call_unchecked(&self, args: &[f64]) -> f64 {
        match self {
            Function::Nullary(f) => f(),
            Function::Unary(f) => f(args[0]),
            Function::Binary(f) => f(args[0], args[1]),
            Function::Ternary(f) => f(args[0], args[1], args[2]),
            Function::Nary { function, .. } => function(args),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function(arity = {})", self.arity())
    }
}
