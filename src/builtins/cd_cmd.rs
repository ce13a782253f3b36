//! `cd`, grounded on `cmdCd`/`cdPop` in
//! `examples/original_source/cmd/andy/builtin.go`. `-` pops/swaps with the
//! directory stack; no argument goes to `$HOME` (resolved via user lookup,
//! not the environment, per §6).

use crate::builtins::{errorf, BuiltinOutcome};
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_cd(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let dst = match argv.len() {
        1 => match home_dir() {
            Some(h) => h,
            None => {
                errorf("cd", &mut ctx.stderr, "could not resolve $HOME");
                return Ok(BuiltinOutcome::Code(1));
            }
        },
        2 if argv[1] == "-" => return cd_pop(ctx),
        2 => argv[1].clone(),
        _ => {
            let _ = std::io::Write::write_all(&mut ctx.stderr, b"Usage: cd [directory]\n");
            return Ok(BuiltinOutcome::Code(1));
        }
    };

    if let Ok(cwd) = std::env::current_dir() {
        ctx.rt.dir_stack.lock().unwrap().push(cwd.to_string_lossy().into_owned());
    }

    match std::env::set_current_dir(&dst) {
        Ok(()) => {
            ctx.rt.sync_cdstack();
            Ok(BuiltinOutcome::Code(0))
        }
        Err(e) => {
            ctx.rt.dir_stack.lock().unwrap().pop();
            errorf("cd", &mut ctx.stderr, e);
            Ok(BuiltinOutcome::Code(1))
        }
    }
}

fn cd_pop(ctx: &mut EvalContext) -> Result<BuiltinOutcome, ShellError> {
    let dst = ctx.rt.dir_stack.lock().unwrap().pop();
    match dst {
        None => {
            errorf("cd", &mut ctx.stderr, "the directory stack is empty");
            Ok(BuiltinOutcome::Code(1))
        }
        Some(dst) => match std::env::set_current_dir(&dst) {
            Ok(()) => {
                ctx.rt.sync_cdstack();
                Ok(BuiltinOutcome::Code(0))
            }
            Err(e) => {
                errorf("cd", &mut ctx.stderr, e);
                Ok(BuiltinOutcome::Code(1))
            }
        },
    }
}

fn home_dir() -> Option<String> {
    unsafe {
        let pw = libc::getpwuid(libc::getuid());
        if pw.is_null() || (*pw).pw_dir.is_null() {
            return None;
        }
        Some(std::ffi::CStr::from_ptr((*pw).pw_dir).to_string_lossy().into_owned())
    }
}
