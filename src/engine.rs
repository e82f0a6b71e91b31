use crate::ast::{
    optimize, Associativity, CancellationToken, Environment, Evaluator, Expression, Function,
    Lexer, Parser, Token, Variables,
};
use crate::bindings::{self, Bindings};
use crate::bytecode::BytecodeCompiler;
use crate::error::Result;
use crate::functions;
use crate::jit::{CompiledFunction, JITCompilerBuilder, TypedFunction};
use log::debug;

/// Knobs for how an [`EvaluationEngine`] treats expression text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Run constant folding on every tree parsed from text.
    pub optimize: bool,
    /// Grouping of `+ - * / %` chains. `^` is right-associative regardless.
    pub associativity: Associativity,
}

/// Owns the registered constants and functions and runs the whole pipeline:
/// text to tokens to tree, then either evaluation or native compilation.
///
/// Registration takes `&mut self`; everything else takes `&self`, so a fully
/// configured engine can be shared between threads for read-only work.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    environment: Environment,
    options: EngineOptions,
}

impl EvaluationEngine {
    /// An engine with no functions or constants and default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            environment: Environment::new(),
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Inserts or replaces a constant.
    pub fn set_constant(&mut self, name: &str, value: f64) {
        debug!("set constant {} = {}", name, value);
        self.environment.set_constant(name, value);
    }

    /// Inserts or replaces a function.
    pub fn set_function(&mut self, name: &str, function: Function) {
        debug!("set function {}/{}", name, function.arity());
        self.environment.set_function(name, function);
    }

    pub fn constant(&self, name: &str) -> Option<f64> {
        self.environment.constant(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.environment.function(name).map(|function| function.as_ref())
    }

    /// Registers `sin`, `cos`, `sqrt`, `min`, `max`, `clamp` and the rest of
    /// the default function set.
    pub fn add_default_functions(&mut self) {
        debug!("registering default functions");
        functions::register_functions(&mut self.environment);
    }

    /// Registers `E` and `PI`.
    pub fn add_default_constants(&mut self) {
        debug!("registering default constants");
        functions::register_constants(&mut self.environment);
    }

    /// Registers every function and constant of `provider` under its own name.
    pub fn bind<B: Bindings + ?Sized>(&mut self, provider: &B) {
        self.bind_with(provider, str::to_string);
    }

    /// Registers every function and constant of `provider` under the name
    /// returned by `rename`.
    pub fn bind_with<B, R>(&mut self, provider: &B, rename: R)
    where
        B: Bindings + ?Sized,
        R: Fn(&str) -> String,
    {
        let (functions, constants) = bindings::renamed(provider, rename);
        for (name, function) in functions {
            self.set_function(&name, function);
        }
        for (name, value) in constants {
            self.set_constant(&name, value);
        }
    }

    /// Parses `text`, folding constants when [`EngineOptions::optimize`] is set.
    pub fn parse(&self, text: &str) -> Result<Expression> {
        debug!("Parsing expression: {}", text);
        self.build_tree(&Lexer::tokenize(text))
    }

    fn build_tree(&self, tokens: &[Token]) -> Result<Expression> {
        let expression = Parser::new(tokens)
            .with_associativity(self.options.associativity)
            .parse()?;

        if self.options.optimize {
            let optimized = optimize(&expression);
            debug!("Optimized {} into {}", expression, optimized);
            Ok(optimized)
        } else {
            Ok(expression)
        }
    }

    pub fn evaluate<V: Variables + ?Sized>(&self, text: &str, variables: &V) -> Result<f64> {
        let expression = self.parse(text)?;
        self.evaluate_expression(&expression, variables)
    }

    /// Evaluates an already built tree as is, without optimizing it.
    pub fn evaluate_expression<V: Variables + ?Sized>(
        &self,
        expression: &Expression,
        variables: &V,
    ) -> Result<f64> {
        Evaluator::new(&self.environment).evaluate(expression, variables)
    }

    /// Like [`evaluate`](Self::evaluate), but tokenization stops with
    /// [`Error::Cancelled`](crate::Error::Cancelled) once `token` is cancelled.
    pub fn evaluate_cancellable<V: Variables + ?Sized>(
        &self,
        text: &str,
        variables: &V,
        token: &CancellationToken,
    ) -> Result<f64> {
        let tokens = Lexer::tokenize_cancellable(text, token)?;
        let expression = self.build_tree(&tokens)?;
        self.evaluate_expression(&expression, variables)
    }

    pub async fn evaluate_async<V: Variables + ?Sized>(
        &self,
        text: &str,
        variables: &V,
        token: &CancellationToken,
    ) -> Result<f64> {
        let tokens = Lexer::tokenize_async(text, token).await?;
        let expression = self.build_tree(&tokens)?;
        self.evaluate_expression(&expression, variables)
    }

    /// Compiles `text` to machine code. Parameters are the free variables in
    /// order of first appearance; registered constants are baked in.
    pub fn compile(&self, text: &str) -> Result<CompiledFunction> {
        let expression = self.parse(text)?;
        self.compile_expression(&expression)
    }

    pub fn compile_expression(&self, expression: &Expression) -> Result<CompiledFunction> {
        let program = BytecodeCompiler::new(&self.environment).compile(expression)?;
        JITCompilerBuilder::new().build()?.compile(program)
    }

    /// Compiles `text` into a function taking exactly `N` arguments.
    pub fn compile_typed<const N: usize>(&self, text: &str) -> Result<TypedFunction<N>> {
        self.compile(text)?.typed::<N>()
    }
}
