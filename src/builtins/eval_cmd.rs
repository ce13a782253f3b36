//! `eval`: concatenates argv with spaces and re-lexes/re-parses/re-executes
//! the result in the current scope.

use crate::builtins::{run_source, BuiltinOutcome};
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_eval(argv: &[String], ctx: &mut EvalContext, closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let src = argv[1..].join(" ");
    run_source(&src, ctx, closables)
}
