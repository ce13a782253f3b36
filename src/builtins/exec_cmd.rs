//! `exec`: like external-command dispatch, but intended to replace the
//! interpreter's own I/O context rather than forking a pipeline stage.
//!
//! A true `execve`-replace is not attempted inside a safe multi-threaded
//! Rust process (other threads — the lexer, pipeline stages, signal
//! handlers — would simply vanish under it); this is a synchronous
//! spawn-and-wait instead, documented as a resolved Open Question in
//! DESIGN.md.

use crate::builtins::BuiltinOutcome;
use crate::interpreter::command_resolution::resolve_external;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_exec(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    if argv.len() < 2 {
        let _ = std::io::Write::write_all(&mut ctx.stderr, b"Usage: exec command [args ...]\n");
        return Ok(BuiltinOutcome::Code(1));
    }
    let name = &argv[1];
    match resolve_external(name) {
        Some(path) => {
            let outcome = crate::interpreter::command_resolution::spawn_external(&path, &argv[1..], ctx)?;
            Ok(BuiltinOutcome::Code(outcome.exit_code()))
        }
        None => {
            crate::builtins::errorf("exec", &mut ctx.stderr, format!("\u{2018}{}\u{2019}: command not found", name));
            Ok(BuiltinOutcome::Code(1))
        }
    }
}
