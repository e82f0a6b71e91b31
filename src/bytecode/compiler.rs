use crate::ast::{BinaryOperator, Environment, Expression, UnaryOperator};
use crate::bytecode::{Bytecode, Program};
use crate::error::{Error, Result};
use log::debug;

/// Lowers an expression tree into a [`Program`].
///
/// Every name is settled here, so the resulting program performs no lookups:
/// - a variable naming a registered constant becomes that constant's value;
/// - any other variable gets a parameter slot on first sight and reuses it later;
/// - a call is bound to the registered function, and an unknown name or a
///   wrong argument count fails right away.
pub struct BytecodeCompiler<'e> {
    environment: &'e Environment,
    program: Program,
}

impl<'e> BytecodeCompiler<'e> {
    pub fn new(environment: &'e Environment) -> Self {
        Self {
            environment,
            program: Program {
                code: Vec::new(),
                parameters: Vec::new(),
                functions: Vec::new(),
            },
        }
    }

    pub fn compile(mut self, expression: &Expression) -> Result<Program> {
        self.compile_expression(expression)?;
        debug!(
            "Lowered {} into {} instructions, parameters {:?}",
            expression,
            self.program.code.len(),
            self.program.parameters
        );
        Ok(self.program)
    }

    fn compile_expression(&mut self, expression: &Expression) -> Result<()> {
        match expression {
            Expression::Constant(value) => self.emit(Bytecode::PushFloat(*value)),

            Expression::Variable(name) => match self.environment.constant(name) {
                Some(value) => self.emit(Bytecode::PushFloat(value)),
                None => {
                    let slot = self.parameter_slot(name);
                    self.emit(Bytecode::LoadVariable(slot));
                }
            },

            Expression::Unary { operator, operand } => {
                self.compile_expression(operand)?;
                if *operator == UnaryOperator::Minus {
                    self.emit(Bytecode::Neg);
                }
            }

            Expression::Binary {
                left,
                operator,
                right,
            } => {
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                self.emit(match operator {
                    BinaryOperator::Add => Bytecode::Add,
                    BinaryOperator::Subtract => Bytecode::Sub,
                    BinaryOperator::Multiply => Bytecode::Mul,
                    BinaryOperator::Divide => Bytecode::Div,
                    BinaryOperator::Modulo => Bytecode::Mod,
                    BinaryOperator::Power => Bytecode::Pow,
                });
            }

            Expression::Call { name, args } => {
                let index = self.function_index(name)?;
                let arity = self.program.functions[index].1.arity();
                if arity != args.len() {
                    return Err(Error::ArityMismatch {
                        name: name.clone(),
                        expected: arity,
                        actual: args.len(),
                    });
                }
                for arg in args {
                    self.compile_expression(arg)?;
                }
                self.emit(Bytecode::Call(index, args.len()));
            }
        }

        Ok(())
    }

    fn emit(&mut self, instruction: Bytecode) {
        self.program.code.push(instruction);
    }

    fn parameter_slot(&mut self, name: &str) -> usize {
        let parameters = &mut self.program.parameters;
        match parameters.iter().position(|p| p == name) {
            Some(slot) => slot,
            None => {
                parameters.push(name.to_string());
                parameters.len() - 1
            }
        }
    }

    fn function_index(&mut self, name: &str) -> Result<usize> {
        let functions = &mut self.program.functions;
        if let Some(index) = functions.iter().position(|(n, _)| n == name) {
            return Ok(index);
        }
        let function = self
            .environment
            .function(name)
            .ok_or_else(|| Error::FunctionNotFound(name.to_string()))?;
        functions.push((name.to_string(), function.clone()));
        Ok(functions.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Function, Parser};

    fn setup_environment() -> Environment {
        let mut environment = Environment::new();
        environment.set_function("max", Function::binary(f64::max));
        environment.set_function("sin", Function::unary(f64::sin));
        environment.set_constant("PI", std::f64::consts::PI);
        environment
    }

    fn lower(input: &str) -> Result<Program> {
        let environment = setup_environment();
        let ast = Parser::parse_expression(input)?;
        BytecodeCompiler::new(&environment).compile(&ast)
    }

    #[test]
    fn test_postfix_order() {
        let program = lower("a + b * 2").unwrap();
        assert_eq!(
            program.code,
            vec![
                Bytecode::LoadVariable(0),
                Bytecode::LoadVariable(1),
                Bytecode::PushFloat(2.0),
                Bytecode::Mul,
                Bytecode::Add,
            ]
        );
        assert_eq!(program.parameters, vec!["a", "b"]);
    }

    #[test]
    fn test_parameter_slots_reused() {
        let program = lower("y * x - y").unwrap();
        assert_eq!(program.parameters, vec!["y", "x"]);
        assert_eq!(program.code[0], Bytecode::LoadVariable(0));
        assert_eq!(program.code[3], Bytecode::LoadVariable(0));
    }

    #[test]
    fn test_constants_are_embedded() {
        let program = lower("-PI").unwrap();
        assert_eq!(
            program.code,
            vec![Bytecode::PushFloat(std::f64::consts::PI), Bytecode::Neg]
        );
        assert!(program.parameters.is_empty());
    }

    #[test]
    fn test_unary_plus_emits_nothing() {
        let program = lower("+x").unwrap();
        assert_eq!(program.code, vec![Bytecode::LoadVariable(0)]);
    }

    #[test]
    fn test_functions_resolved_once() {
        let program = lower("max(sin(x), sin(y))").unwrap();
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.functions[0].0, "max");
        assert_eq!(program.functions[1].0, "sin");
        assert_eq!(program.code.last(), Some(&Bytecode::Call(0, 2)));
    }

    #[test]
    fn test_unknown_function_fails_at_compile_time() {
        assert_eq!(
            lower("1 + nope(2)").unwrap_err(),
            Error::FunctionNotFound("nope".to_string())
        );
    }

    #[test]
    fn test_arity_checked_at_compile_time() {
        assert_eq!(
            lower("max(1, 2, 3)").unwrap_err(),
            Error::ArityMismatch {
                name: "max".to_string(),
                expected: 2,
                actual: 3
            }
        );
    }
}
