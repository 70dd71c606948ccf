pub mod bytecode;
pub mod compiler;
pub mod error;
pub mod reference;
pub mod vm;

pub use bytecode::{Inst, OpCode};
pub use compiler::{Options, compile, compile_with};
pub use error::CompileError;
pub use vm::{TAPE_LEN, Vm};

use std::ffi::CStr;
use std::io;
use std::os::raw::{c_char, c_int, c_uchar};

/// Compile and execute Brainfuck code against stdin/stdout through a
/// C-compatible interface.
///
/// Returns `0` on success, `1` if the program does not compile, `2` if
/// stdin/stdout failed and `-1` if `code` is null or not UTF-8.
///
/// # Safety
/// `code` must be null or a valid null-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ccbf_run(code: *const c_char, flush: c_uchar) -> c_int {
    if code.is_null() {
        return -1;
    }
    let c_str = unsafe { CStr::from_ptr(code) };
    let Ok(code_str) = c_str.to_str() else {
        return -1;
    };
    let prog = match compile(code_str) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("{}", e);
            return 1;
        }
    };
    let mut vm = Vm::new(io::stdin().lock(), io::stdout().lock());
    let result = if flush != 0 {
        vm.run_flushing(&prog)
    } else {
        vm.run(&prog)
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::warn!("{}", e);
            2
        }
    }
}
