//! `type`: reports whether the first argument names a function, a
//! builtin, or an executable found via `$PATH`.

use std::io::Write;

use crate::builtins::BuiltinOutcome;
use crate::interpreter::command_resolution::resolve_external;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_type(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let Some(name) = argv.get(1) else {
        let _ = ctx.stderr.write_all(b"Usage: type name\n");
        return Ok(BuiltinOutcome::Code(1));
    };

    if ctx.rt.functions.lock().unwrap().contains_key(name) {
        writeln!(ctx.stdout, "{} is a function", name)?;
        return Ok(BuiltinOutcome::Code(0));
    }
    if crate::builtins::lookup(name).is_some() {
        writeln!(ctx.stdout, "{} is a builtin", name)?;
        return Ok(BuiltinOutcome::Code(0));
    }
    if let Some(path) = resolve_external(name) {
        writeln!(ctx.stdout, "{} is {}", name, path.display())?;
        return Ok(BuiltinOutcome::Code(0));
    }

    writeln!(ctx.stderr, "{}: not found", name)?;
    Ok(BuiltinOutcome::Code(1))
}
