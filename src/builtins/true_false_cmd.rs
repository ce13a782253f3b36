use crate::builtins::BuiltinOutcome;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_true(_argv: &[String], _ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    Ok(BuiltinOutcome::Code(0))
}

pub fn cmd_false(_argv: &[String], _ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    Ok(BuiltinOutcome::Code(1))
}
