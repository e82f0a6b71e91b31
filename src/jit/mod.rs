//! Native compilation of expressions through Cranelift.
//!
//! A [`Program`](crate::bytecode::Program) is lowered into a function that
//! reads its parameters from an f64 buffer. `%`, `^` and registered functions
//! are calls back into Rust, so results match the tree-walking evaluator bit
//! for bit.

mod builder;
mod compiler;
mod functions;
mod rt_env;

pub use builder::{HostParam, JITCompilerBuilder};
pub use compiler::*;
pub use rt_env::*;

use crate::ast::{Function, Variables};
use crate::error::{Error, Result};
use cranelift_jit::JITModule;
use log::debug;
use std::fmt;
use std::panic;
use std::sync::Arc;

type NativeFn = unsafe extern "C" fn(*const f64) -> f64;

/// **Executes compiled JIT function**
///
/// A panic raised by a registered function during the call resumes here.
///
/// # Safety
/// `memory_ptr` must address at least as many f64 values as `code` reads.
unsafe fn execute(code: NativeFn, memory_ptr: *const f64) -> f64 {
    let result = code(memory_ptr);
    if let Some(payload) = functions::take_pending_panic() {
        panic::resume_unwind(payload);
    }
    result
}

/// An expression compiled to machine code.
///
/// Parameters are the expression's free variables in order of first
/// appearance. The code and everything it calls stay alive until the value
/// is dropped; it can be shared and invoked from several threads at once.
pub struct CompiledFunction {
    code: NativeFn,
    environment: RuntimeEnvironment,
    // Referenced by address from the generated code.
    _functions: Vec<Arc<Function>>,
    module: Option<JITModule>,
}

// SAFETY: the generated code is immutable once finalized and only reads its
// argument buffer; registered functions are `Send + Sync`; the module is
// touched again only in `drop`, which has exclusive access.
unsafe impl Send for CompiledFunction {}
unsafe impl Sync for CompiledFunction {}

impl CompiledFunction {
    pub(crate) fn new(
        code: NativeFn,
        environment: RuntimeEnvironment,
        functions: Vec<Arc<Function>>,
        module: JITModule,
    ) -> Self {
        Self {
            code,
            environment,
            _functions: functions,
            module: Some(module),
        }
    }

    /// Parameter names, in the order [`invoke`](Self::invoke) expects them.
    pub fn parameters(&self) -> &[String] {
        self.environment.names()
    }

    pub fn arity(&self) -> usize {
        self.environment.len()
    }

    /// Runs the code with positional arguments.
    pub fn invoke(&self, args: &[f64]) -> Result<f64> {
        if args.len() != self.arity() {
            return Err(Error::SignatureMismatch {
                expected: self.arity(),
                actual: args.len(),
            });
        }
        // SAFETY: the length matches the parameter count checked above.
        Ok(unsafe { execute(self.code, args.as_ptr()) })
    }

    /// Runs the code with arguments looked up by parameter name.
    ///
    /// Only parameters are looked up. Names that were registered constants
    /// at compile time are baked into the code, so `variables` cannot
    /// override them the way it can when evaluating.
    pub fn invoke_with<V: Variables + ?Sized>(&self, variables: &V) -> Result<f64> {
        let args = self.environment.bind(variables)?;
        self.invoke(&args)
    }

    /// Fixes the parameter count in the type, so calls need no checks.
    pub fn typed<const N: usize>(self) -> Result<TypedFunction<N>> {
        if N != self.arity() {
            return Err(Error::SignatureMismatch {
                expected: self.arity(),
                actual: N,
            });
        }
        Ok(TypedFunction { inner: self })
    }
}

impl Drop for CompiledFunction {
    fn drop(&mut self) {
        if let Some(module) = self.module.take() {
            debug!("freeing compiled function over {:?}", self.parameters());
            // SAFETY: nothing can call `code` anymore.
            unsafe { module.free_memory() };
        }
    }
}

impl fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("parameters", &self.parameters())
            .finish_non_exhaustive()
    }
}

/// A [`CompiledFunction`] whose parameter count is known at compile time.
#[derive(Debug)]
pub struct TypedFunction<const N: usize> {
    inner: CompiledFunction,
}

impl<const N: usize> TypedFunction<N> {
    pub fn call(&self, args: [f64; N]) -> f64 {
        // SAFETY: `N` equals the parameter count, checked in `typed`.
        unsafe { execute(self.inner.code, args.as_ptr()) }
    }

    pub fn parameters(&self) -> &[String] {
        self.inner.parameters()
    }

    pub fn into_inner(self) -> CompiledFunction {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Environment, Evaluator, Parser};
    use crate::bytecode::BytecodeCompiler;
    use std::collections::HashMap;

    fn setup_environment() -> Environment {
        let mut environment = Environment::new();
        environment.set_function("max", Function::binary(f64::max));
        environment.set_function("sqrt", Function::unary(f64::sqrt));
        environment.set_function("clamp", Function::ternary(|v, lo, hi| v.max(lo).min(hi)));
        environment.set_function(
            "sum",
            Function::nary(4, |args: &[f64]| args.iter().sum::<f64>()),
        );
        environment.set_function("answer", Function::nullary(|| 42.0));
        environment.set_function(
            "checked_log",
            Function::unary(|x| {
                if x <= 0.0 {
                    panic!("domain error");
                }
                x.ln()
            }),
        );
        environment.set_constant("PI", std::f64::consts::PI);
        environment
    }

    fn compile_with(environment: &Environment, input: &str) -> CompiledFunction {
        let ast = Parser::parse_expression(input).unwrap();
        let program = BytecodeCompiler::new(environment).compile(&ast).unwrap();
        JITCompilerBuilder::new()
            .build()
            .unwrap()
            .compile(program)
            .unwrap()
    }

    fn compile(input: &str) -> CompiledFunction {
        compile_with(&setup_environment(), input)
    }

    #[test]
    fn test_invoke_positional() {
        let function = compile("a + b");
        assert_eq!(function.parameters(), ["a", "b"]);
        assert_eq!(function.invoke(&[3.0, 4.0]).unwrap(), 7.0);
    }

    #[test]
    fn test_constant_expression_takes_no_arguments() {
        let function = compile("2 * PI + answer()");
        assert!(function.parameters().is_empty());
        assert_eq!(
            function.invoke(&[]).unwrap(),
            2.0 * std::f64::consts::PI + 42.0
        );
    }

    #[test]
    fn test_signature_mismatch() {
        let function = compile("a + b");
        assert_eq!(
            function.invoke(&[1.0]).unwrap_err(),
            Error::SignatureMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(compile("x").typed::<2>().is_err());
    }

    #[test]
    fn test_invoke_with_names() {
        let function = compile("x * y - x");
        let mut vars = HashMap::new();
        vars.insert("x".to_string(), 3.0);
        vars.insert("y".to_string(), 5.0);
        assert_eq!(function.invoke_with(&vars).unwrap(), 12.0);

        vars.remove("y");
        assert_eq!(
            function.invoke_with(&vars).unwrap_err(),
            Error::VariableNotFound("y".to_string())
        );
    }

    #[test]
    fn test_typed_call() {
        let function = compile("clamp(v, 0, 10) + sum(a, b, c, d)")
            .typed::<5>()
            .unwrap();
        assert_eq!(function.parameters(), ["v", "a", "b", "c", "d"]);
        assert_eq!(function.call([12.0, 1.0, 2.0, 3.0, 4.0]), 20.0);
        assert_eq!(function.call([-3.0, 0.0, 0.0, 0.0, 0.5]), 0.5);
    }

    #[test]
    fn test_matches_evaluator_bit_for_bit() {
        let environment = setup_environment();
        let evaluator = Evaluator::new(&environment);
        let inputs = [
            "x ^ 0.5 + y % 3",
            "-x ^ 3 / (y - 2.5)",
            "max(x, y) % (x - y)",
            "sqrt(x * x + y * y) - PI",
            "x / 0 + y",
            "(x - x) / (y - y)",
        ];
        let samples = [(2.0, 7.25), (-3.5, 2.5), (0.1, -9.0), (1e300, 1e-300)];

        for input in inputs {
            let ast = Parser::parse_expression(input).unwrap();
            let function = compile_with(&environment, input);
            for (x, y) in samples {
                let vars = [("x", x), ("y", y)];
                let expected = evaluator.evaluate(&ast, &vars).unwrap();
                let actual = function.invoke_with(&vars).unwrap();
                assert_eq!(
                    expected.to_bits(),
                    actual.to_bits(),
                    "{input} at x={x}, y={y}"
                );
            }
        }
    }

    #[test]
    fn test_panic_propagates_to_caller() {
        let function = compile("checked_log(x) + 1");
        assert_eq!(function.invoke(&[1.0]).unwrap(), 1.0);

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| function.invoke(&[-1.0])));
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"domain error"));

        // The next call starts clean.
        assert_eq!(function.invoke(&[1.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_shared_across_threads() {
        let function = Arc::new(compile("x * 2 + max(x, 10)"));
        let handles = (0..4)
            .map(|i| {
                let function = Arc::clone(&function);
                std::thread::spawn(move || function.invoke(&[i as f64 * 10.0]).unwrap())
            })
            .collect::<Vec<_>>();
        let results = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(results, vec![10.0, 30.0, 60.0, 90.0]);
    }
}
