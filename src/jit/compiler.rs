use crate::bytecode::{Bytecode, Program};
use crate::error::{Error, Result};
use crate::jit::functions::{INVOKE_SYMBOL, POW_SYMBOL, REM_SYMBOL};
use crate::jit::{CompiledFunction, RuntimeEnvironment};
use cranelift::codegen::ir::{FuncRef, StackSlotData, StackSlotKind};
use cranelift::frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift::prelude::*;
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Module};
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

/// Turns one [`Program`] into native code.
///
/// The generated function has the C signature `fn(*const f64) -> f64`; the
/// pointer addresses one f64 per program parameter.
pub struct JITCompiler {
    pub(super) module: JITModule,
    pub(super) functions_map: HashMap<String, FuncId>,
    pub(super) stack: Vec<Value>,
}

struct HostRefs {
    pow: FuncRef,
    rem: FuncRef,
    invoke: FuncRef,
}

impl JITCompiler {
    fn link_external_functions(
        &mut self,
        ctx: &mut cranelift::codegen::Context,
    ) -> Result<HostRefs> {
        let mut func_refs = HashMap::new();
        for (func_name, func_id) in &self.functions_map {
            let func_ref = self.module.declare_func_in_func(*func_id, &mut ctx.func);
            func_refs.insert(func_name.as_str(), func_ref);
        }

        let lookup = |name: &str| {
            func_refs
                .get(name)
                .copied()
                .ok_or_else(|| Error::Codegen(format!("host function {name} is not linked")))
        };
        Ok(HostRefs {
            pow: lookup(POW_SYMBOL)?,
            rem: lookup(REM_SYMBOL)?,
            invoke: lookup(INVOKE_SYMBOL)?,
        })
    }

    fn binary_op<F>(&mut self, builder: &mut FunctionBuilder, op: F) -> Result<()>
    where
        F: Fn(&mut FunctionBuilder, Value, Value) -> Value,
    {
        let (b, a) = (self.pop_value()?, self.pop_value()?);
        trace!("binary_op {a:?} {b:?}");
        let res = op(builder, a, b);
        self.stack.push(res);
        Ok(())
    }

    /// Compiles the program and hands ownership of the code to the result.
    pub fn compile(mut self, program: Program) -> Result<CompiledFunction> {
        let pointer_type = self.module.target_config().pointer_type();

        let mut ctx = self.module.make_context();
        ctx.func.signature.params.push(AbiParam::new(pointer_type));
        ctx.func.signature.returns.push(AbiParam::new(types::F64));

        let host = self.link_external_functions(&mut ctx)?;

        let mut func_ctx = FunctionBuilderContext::new();
        let mut builder = FunctionBuilder::new(&mut ctx.func, &mut func_ctx);

        let main_block = builder.create_block();
        builder.switch_to_block(main_block);
        builder.append_block_params_for_function_params(main_block);
        builder.seal_block(main_block);

        let memory_ptr = builder.block_params(main_block)[0];
        let parameters = (0..program.parameters.len())
            .map(|slot| {
                let offset = (slot * 8) as i32; // f64 values -> 8 bytes each
                builder
                    .ins()
                    .load(types::F64, MemFlags::trusted(), memory_ptr, offset)
            })
            .collect::<Vec<_>>();

        self.compile_main_block(&mut builder, &host, &program, &parameters, pointer_type)?;

        let result = self.pop_value()?;
        if !self.stack.is_empty() {
            return Err(Error::Codegen(format!(
                "{} values left on the stack",
                self.stack.len()
            )));
        }
        builder.ins().return_(&[result]);
        builder.finalize();
        trace!("generated IR:\n{}", ctx.func.display());

        let func_id = self
            .module
            .declare_anonymous_function(&ctx.func.signature)
            .map_err(Error::codegen)?;
        self.module
            .define_function(func_id, &mut ctx)
            .map_err(Error::codegen)?;
        self.module.clear_context(&mut ctx);
        self.module.finalize_definitions().map_err(Error::codegen)?;

        let code = self.module.get_finalized_function(func_id);
        debug!(
            "compiled {} instructions over parameters {:?}",
            program.code.len(),
            program.parameters
        );

        // SAFETY: `code` was generated above with the matching signature and
        // stays valid as long as `self.module` does, which moves into the result.
        let code = unsafe {
            std::mem::transmute::<*const u8, unsafe extern "C" fn(*const f64) -> f64>(code)
        };
        Ok(CompiledFunction::new(
            code,
            RuntimeEnvironment::new(&program.parameters),
            program.functions.into_iter().map(|(_, f)| f).collect(),
            self.module,
        ))
    }

    fn compile_main_block(
        &mut self,
        builder: &mut FunctionBuilder,
        host: &HostRefs,
        program: &Program,
        parameters: &[Value],
        pointer_type: Type,
    ) -> Result<()> {
        for instruction in &program.code {
            trace!("lowering {instruction}");
            match instruction {
                Bytecode::PushFloat(value) => {
                    let val = builder.ins().f64const(*value);
                    self.stack.push(val);
                }
                Bytecode::LoadVariable(slot) => {
                    let val = *parameters.get(*slot).ok_or_else(|| {
                        Error::Codegen(format!("parameter slot {slot} out of range"))
                    })?;
                    self.stack.push(val);
                }
                Bytecode::Add => {
                    self.binary_op(builder, |builder, a, b| builder.ins().fadd(a, b))?;
                }
                Bytecode::Sub => {
                    self.binary_op(builder, |builder, a, b| builder.ins().fsub(a, b))?;
                }
                Bytecode::Mul => {
                    self.binary_op(builder, |builder, a, b| builder.ins().fmul(a, b))?;
                }
                Bytecode::Div => {
                    self.binary_op(builder, |builder, a, b| builder.ins().fdiv(a, b))?;
                }
                Bytecode::Mod => {
                    self.binary_op(builder, |builder, a, b| {
                        let call = builder.ins().call(host.rem, &[a, b]);
                        builder.inst_results(call)[0]
                    })?;
                }
                Bytecode::Pow => {
                    self.binary_op(builder, |builder, a, b| {
                        let call = builder.ins().call(host.pow, &[a, b]);
                        builder.inst_results(call)[0]
                    })?;
                }
                Bytecode::Neg => {
                    let a = self.pop_value()?;
                    let res = builder.ins().fneg(a);
                    self.stack.push(res);
                }
                Bytecode::Call(index, arg_count) => {
                    let mut args = Vec::with_capacity(*arg_count);
                    for _ in 0..*arg_count {
                        args.push(self.pop_value()?);
                    }
                    args.reverse();

                    let (name, function) = program.functions.get(*index).ok_or_else(|| {
                        Error::Codegen(format!("function index {index} out of range"))
                    })?;
                    debug!("call {name} with {arg_count} args");

                    // Arguments are spilled to the stack and passed as a slice.
                    let args_ptr = if args.is_empty() {
                        builder.ins().iconst(pointer_type, 0)
                    } else {
                        let slot = builder.create_sized_stack_slot(StackSlotData::new(
                            StackSlotKind::ExplicitSlot,
                            (args.len() * 8) as u32,
                            3,
                        ));
                        for (i, arg) in args.iter().enumerate() {
                            builder.ins().stack_store(*arg, slot, (i * 8) as i32);
                        }
                        builder.ins().stack_addr(pointer_type, slot, 0)
                    };

                    let function_ptr = builder
                        .ins()
                        .iconst(pointer_type, Arc::as_ptr(function) as i64);
                    let len = builder.ins().iconst(pointer_type, *arg_count as i64);

                    let call = builder
                        .ins()
                        .call(host.invoke, &[function_ptr, args_ptr, len]);
                    let res = builder.inst_results(call)[0];
                    self.stack.push(res);
                }
            }
        }

        Ok(())
    }

    /// Extracts a value from the stack
    fn pop_value(&mut self) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| Error::Codegen("stack underflow".to_string()))
    }
}
