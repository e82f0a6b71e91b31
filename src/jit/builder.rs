use crate::error::{Error, Result};
use crate::jit::functions::{self, INVOKE_SYMBOL, POW_SYMBOL, REM_SYMBOL};
use crate::jit::JITCompiler;
use cranelift::prelude::*;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module};
use log::debug;
use std::collections::HashMap;

/// Shape of a host function parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostParam {
    Float,
    Pointer,
}

impl HostParam {
    fn abi(self, pointer_type: Type) -> AbiParam {
        match self {
            HostParam::Float => AbiParam::new(types::F64),
            HostParam::Pointer => AbiParam::new(pointer_type),
        }
    }
}

struct HostFunction {
    name: String,
    ptr: *const u8,
    params: Vec<HostParam>,
    returns: HostParam,
}

/// Sets up a [`JITModule`] for the host ISA and links host functions into it.
pub struct JITCompilerBuilder {
    functions: Vec<HostFunction>,
}

impl Default for JITCompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JITCompilerBuilder {
    /// A builder with the intrinsics every compiled expression may call.
    pub fn new() -> Self {
        JITCompilerBuilder {
            functions: Vec::new(),
        }
        .add_function(
            POW_SYMBOL,
            functions::pow as *const u8,
            &[HostParam::Float, HostParam::Float],
            HostParam::Float,
        )
        .add_function(
            REM_SYMBOL,
            functions::rem as *const u8,
            &[HostParam::Float, HostParam::Float],
            HostParam::Float,
        )
        .add_function(
            INVOKE_SYMBOL,
            functions::invoke as *const u8,
            &[HostParam::Pointer, HostParam::Pointer, HostParam::Pointer],
            HostParam::Float,
        )
    }

    pub fn add_function(
        mut self,
        name: impl Into<String>,
        ptr: *const u8,
        params: &[HostParam],
        returns: HostParam,
    ) -> Self {
        self.functions.push(HostFunction {
            name: name.into(),
            ptr,
            params: params.to_vec(),
            returns,
        });
        self
    }

    fn build_funcs(&self, module: &mut JITModule) -> Result<HashMap<String, FuncId>> {
        let pointer_type = module.target_config().pointer_type();
        let mut functions_map = HashMap::new();

        for function in &self.functions {
            let mut signature = module.make_signature();
            signature.params.extend(
                function
                    .params
                    .iter()
                    .map(|param| param.abi(pointer_type)),
            );
            signature.returns.push(function.returns.abi(pointer_type));

            let func_id = module
                .declare_function(&function.name, Linkage::Import, &signature)
                .map_err(Error::codegen)?;
            debug!("declared host function {} as {func_id:?}", function.name);

            functions_map.insert(function.name.clone(), func_id);
        }

        Ok(functions_map)
    }

    pub fn build(self) -> Result<JITCompiler> {
        let mut flag_builder = settings::builder();
        flag_builder
            .set("use_colocated_libcalls", "false")
            .map_err(Error::codegen)?;
        flag_builder.set("is_pic", "false").map_err(Error::codegen)?;
        flag_builder
            .set("opt_level", "speed")
            .map_err(Error::codegen)?;

        let isa_builder = cranelift_native::builder().map_err(Error::codegen)?;
        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(Error::codegen)?;

        let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
        for function in &self.functions {
            builder.symbol(&function.name, function.ptr);
        }

        let mut module = JITModule::new(builder);
        let functions_map = self.build_funcs(&mut module)?;

        Ok(JITCompiler {
            module,
            functions_map,
            stack: Vec::new(),
        })
    }
}
