//! `exit`: returns a control-flow outcome the executor's top-level loop
//! turns into process exit (§4.5).

use crate::builtins::BuiltinOutcome;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_exit(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let code = match argv.get(1) {
        None => 0,
        Some(s) => match s.parse::<u8>() {
            Ok(n) => n,
            Err(_) => {
                crate::builtins::errorf("exit", &mut ctx.stderr, format!("\u{2018}{}\u{2019} isn\u{2019}t a valid exit code", s));
                return Ok(BuiltinOutcome::Code(1));
            }
        },
    };
    Ok(BuiltinOutcome::Exit(code))
}
