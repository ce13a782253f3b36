//! `wait`: blocks on the async-task registry (§5) for the named id(s), or
//! every outstanding task if none are given.

use crate::builtins::BuiltinOutcome;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_wait(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let ids: Vec<u64> = if argv.len() > 1 {
        let mut ids = Vec::with_capacity(argv.len() - 1);
        for s in &argv[1..] {
            match s.parse() {
                Ok(id) => ids.push(id),
                Err(_) => {
                    crate::builtins::errorf("wait", &mut ctx.stderr, format!("\u{2018}{}\u{2019} isn\u{2019}t a task id", s));
                    return Ok(BuiltinOutcome::Code(1));
                }
            }
        }
        ids
    } else {
        ctx.rt.all_task_ids()
    };

    for id in ids {
        if let Some(task) = ctx.rt.take_task(id) {
            let _ = task.handle.join();
        }
    }
    Ok(BuiltinOutcome::Code(0))
}
