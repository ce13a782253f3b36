//! Builtin command table (§4.5, ambient). Each entry is a thin wrapper
//! grounded on `examples/original_source/cmd/andy/builtin.go`'s
//! `builtin func(cmd *exec.Cmd, ctx context) uint8` shape, adapted to this
//! interpreter's `EvalContext`/`IoHandle` types.

mod cd_cmd;
mod dot_cmd;
mod echo_cmd;
mod eval_cmd;
mod exec_cmd;
mod exit_cmd;
mod quote_cmd;
mod read_cmd;
mod set_cmd;
mod true_false_cmd;
mod type_cmd;
mod umask_cmd;
mod wait_cmd;

use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

/// What a builtin asked the executor to do after it returns.
pub enum BuiltinOutcome {
    /// Ordinary completion with an exit code.
    Code(u8),
    /// `exit` was invoked: the executor's top-level loop turns this into
    /// process exit rather than continuing evaluation.
    Exit(u8),
}

pub type BuiltinFn = fn(&[String], &mut EvalContext, &mut Closables) -> Result<BuiltinOutcome, ShellError>;

pub fn lookup(name: &str) -> Option<BuiltinFn> {
    Some(match name {
        "true" => true_false_cmd::cmd_true,
        "false" => true_false_cmd::cmd_false,
        "echo" => echo_cmd::cmd_echo,
        "cd" => cd_cmd::cmd_cd,
        "set" => set_cmd::cmd_set,
        "read" => read_cmd::cmd_read,
        "exit" => exit_cmd::cmd_exit,
        "exec" => exec_cmd::cmd_exec,
        "type" => type_cmd::cmd_type,
        "umask" => umask_cmd::cmd_umask,
        "quote" => quote_cmd::cmd_quote,
        "wait" => wait_cmd::cmd_wait,
        "eval" => eval_cmd::cmd_eval,
        "." => dot_cmd::cmd_dot,
        _ => return None,
    })
}

pub(crate) fn errorf(name: &str, stderr: &mut crate::interpreter::context::IoHandle, msg: impl std::fmt::Display) {
    use std::io::Write;
    let _ = writeln!(stderr, "{}: {}", name, msg);
}

/// Lexes, parses, and executes `src` in the caller's own scope (used by
/// both `eval` and `.`/dot — neither opens a fresh scope).
pub(crate) fn run_source(src: &str, ctx: &mut EvalContext, closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let program = crate::parser::parse(src)?;
    let outcome = crate::interpreter::executor::exec_program(&program, ctx, closables)?;
    match outcome {
        crate::interpreter::errors::ExecOutcome::Exit(c) => Ok(BuiltinOutcome::Exit(c)),
        crate::interpreter::errors::ExecOutcome::Code(c) => Ok(BuiltinOutcome::Code(c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_builtins_resolve() {
        assert!(lookup("true").is_some());
        assert!(lookup("cd").is_some());
        assert!(lookup(".").is_some());
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert!(lookup("ls").is_none());
    }
}
