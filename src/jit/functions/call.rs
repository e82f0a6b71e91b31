use crate::ast::Function;
use log::trace;
use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};

thread_local! {
    static PENDING_PANIC: RefCell<Option<Box<dyn Any + Send>>> = const { RefCell::new(None) };
}

/// Trampoline from generated code into a registered [`Function`].
///
/// Unwinding through JIT frames is not possible, so a panic raised by the
/// function is parked in a thread-local and NaN is returned. The caller of
/// the compiled code picks it up with [`take_pending_panic`] and resumes it.
/// Once a panic is parked, later calls return NaN without running anything.
pub(crate) extern "C" fn invoke(function: *const Function, args: *const f64, len: usize) -> f64 {
    if PENDING_PANIC.with(|pending| pending.borrow().is_some()) {
        return f64::NAN;
    }

    // SAFETY: `function` comes from an `Arc<Function>` owned by the compiled
    // function that is running, and `args` points at `len` initialized f64
    // stack slots written right before the call.
    let function = unsafe { &*function };
    let args = if len == 0 {
        &[][..]
    } else {
        unsafe { std::slice::from_raw_parts(args, len) }
    };
    trace!("invoke {:?} with {:?}", function, args);

    match panic::catch_unwind(AssertUnwindSafe(|| function.call_unchecked(args))) {
        Ok(value) => value,
        Err(payload) => {
            PENDING_PANIC.with(|pending| {
                pending.borrow_mut().get_or_insert(payload);
            });
            f64::NAN
        }
    }
}

pub(crate) fn take_pending_panic() -> Option<Box<dyn Any + Send>> {
    PENDING_PANIC.with(|pending| pending.borrow_mut().take())
}
