//! `echo`, grounded on `cmdEcho` in `examples/original_source/cmd/andy/builtin.go`.

use std::io::Write;

use crate::builtins::BuiltinOutcome;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_echo(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    writeln!(ctx.stdout, "{}", argv[1..].join(" "))?;
    Ok(BuiltinOutcome::Code(0))
}
