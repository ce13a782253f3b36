//! `.`/dot (source), grounded on `cmdDot` in
//! `examples/original_source/cmd/andy/builtin.go`: reads a file from `$PATH`
//! or a relative/absolute path, and executes it in the *current* scope
//! (not a fresh one). With no arguments, reads the script from stdin.

use std::io::Read;

use crate::builtins::{errorf, run_source, BuiltinOutcome};
use crate::interpreter::command_resolution::resolve_external;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_dot(argv: &[String], ctx: &mut EvalContext, closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let files: Vec<String> = if argv.len() == 1 { vec!["-".to_string()] } else { argv[1..].to_vec() };

    let mut last = BuiltinOutcome::Code(0);
    for f in &files {
        let contents = if f == "-" {
            let mut buf = String::new();
            ctx.stdin.read_to_string(&mut buf).map_err(ShellError::internal)?;
            buf
        } else {
            match read_source_file(f) {
                Ok(s) => s,
                Err(e) => {
                    errorf(".", &mut ctx.stderr, e);
                    return Ok(BuiltinOutcome::Code(1));
                }
            }
        };
        last = run_source(&contents, ctx, closables)?;
        if matches!(last, BuiltinOutcome::Exit(_)) {
            break;
        }
    }
    Ok(last)
}

fn read_source_file(f: &str) -> std::io::Result<String> {
    let direct = std::path::Path::new(f);
    if direct.exists() {
        return std::fs::read_to_string(direct);
    }
    if !f.contains('/') {
        if let Some(path) = resolve_external(f) {
            return std::fs::read_to_string(path);
        }
    }
    std::fs::read_to_string(direct)
}
