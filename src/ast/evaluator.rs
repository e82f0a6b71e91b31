use crate::ast::{Expression, Function, Variables};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Named constants and functions consulted during evaluation and compilation.
///
/// Only registration mutates it; evaluation and compilation take `&self`.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub(crate) constants: HashMap<String, f64>,
    pub(crate) functions: HashMap<String, Arc<Function>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a constant.
    pub fn set_constant(&mut self, name: &str, value: f64) {
        self.constants.insert(name.to_string(), value);
    }

    /// Inserts or replaces a function.
    pub fn set_function(&mut self, name: &str, function: Function) {
        self.functions.insert(name.to_string(), Arc::new(function));
    }

    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }

    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(name)
    }
}

/// Tree-walking interpreter.
pub struct Evaluator<'e> {
    environment: &'e Environment,
}

impl<'e> Evaluator<'e> {
    pub fn new(environment: &'e Environment) -> Self {
        Self { environment }
    }

    /// Walks `expression`. A variable resolves to the caller's value first,
    /// then to a registered constant.
    pub fn evaluate<V>(&self, expression: &Expression, variables: &V) -> Result<f64>
    where
        V: Variables + ?Sized,
    {
        match expression {
            Expression::Constant(value) => Ok(*value),

            Expression::Variable(name) => variables
                .get(name)
                .or_else(|| self.environment.constant(name))
                .ok_or_else(|| Error::VariableNotFound(name.clone())),

            Expression::Unary { operator, operand } => {
                Ok(operator.apply(self.evaluate(operand, variables)?))
            }

            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let left_value = self.evaluate(left, variables)?;
                let right_value = self.evaluate(right, variables)?;
                Ok(operator.apply(left_value, right_value))
            }

            Expression::Call { name, args } => {
                let function = self
                    .environment
                    .function(name)
                    .ok_or_else(|| Error::FunctionNotFound(name.clone()))?;

                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg, variables))
                    .collect::<Result<Vec<f64>>>()?;

                function.call(name, &values)
            }
        }
    }
}
