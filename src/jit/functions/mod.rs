//! Host functions that JIT-compiled code calls into.
//!
//! Cranelift has no instructions for `powf` or floating remainder, and
//! registered functions are Rust closures, so generated code calls these
//! `extern "C"` entry points instead.

mod call;
mod math;

pub(crate) use call::{invoke, take_pending_panic};
pub(crate) use math::{pow, rem};

pub(crate) const POW_SYMBOL: &str = "mathexpr_pow";
pub(crate) const REM_SYMBOL: &str = "mathexpr_rem";
pub(crate) const INVOKE_SYMBOL: &str = "mathexpr_invoke";
