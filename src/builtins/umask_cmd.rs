//! `umask`: reads/sets the process umask via `libc::umask`.

use std::io::Write;

use crate::builtins::BuiltinOutcome;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_umask(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    match argv.get(1) {
        None => {
            // umask(2) has no read-only form; set then restore to observe it.
            let probe = unsafe { libc::umask(0) };
            unsafe { libc::umask(probe) };
            writeln!(ctx.stdout, "{:04o}", probe)?;
            Ok(BuiltinOutcome::Code(0))
        }
        Some(s) => match u32::from_str_radix(s, 8) {
            Ok(mode) => {
                unsafe { libc::umask(mode as libc::mode_t) };
                Ok(BuiltinOutcome::Code(0))
            }
            Err(_) => {
                crate::builtins::errorf("umask", &mut ctx.stderr, format!("\u{2018}{}\u{2019} isn\u{2019}t a valid octal mode", s));
                Ok(BuiltinOutcome::Code(1))
            }
        },
    }
}
