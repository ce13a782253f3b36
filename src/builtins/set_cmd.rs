//! `set`, grounded on `cmdSet` in `examples/original_source/cmd/andy/builtin.go`.
//! `-g` forces the global scope even inside a function; `-e` manipulates
//! the process environment instead of a shell variable.

use crate::builtins::{errorf, BuiltinOutcome};
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;
use crate::interpreter::runtime::RESERVED_IDENTS;
use crate::token::is_ref_name;

struct Flags {
    eflag: bool,
    gflag: bool,
    rest_start: usize,
}

fn parse_flags(argv: &[String]) -> Flags {
    let mut eflag = false;
    let mut gflag = false;
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-e" => eflag = true,
            "-g" => gflag = true,
            _ => break,
        }
        i += 1;
    }
    Flags { eflag, gflag, rest_start: i }
}

fn usage(ctx: &mut EvalContext) -> Result<BuiltinOutcome, ShellError> {
    let _ = std::io::Write::write_all(
        &mut ctx.stderr,
        b"Usage: set [-g] variable [value ...]\n       set -e variable [value]\n",
    );
    Ok(BuiltinOutcome::Code(1))
}

pub fn cmd_set(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let flags = parse_flags(argv);
    let rest = &argv[flags.rest_start..];

    if rest.is_empty() || (flags.eflag && rest.len() > 2) || (flags.eflag && flags.gflag) {
        return usage(ctx);
    }

    let ident = &rest[0];
    if RESERVED_IDENTS.contains(&ident.as_str()) {
        errorf("set", &mut ctx.stderr, format!("the \u{2018}{}\u{2019} variable is read-only", ident));
        return Ok(BuiltinOutcome::Code(1));
    }
    if let Err(bad) = is_ref_name(ident) {
        errorf("set", &mut ctx.stderr, format!("rune \u{2018}{}\u{2019} is not allowed in variable names", bad));
        return Ok(BuiltinOutcome::Code(1));
    }

    if flags.eflag {
        if rest.len() == 1 {
            std::env::remove_var(ident);
        } else {
            std::env::set_var(ident, &rest[1]);
        }
        return Ok(BuiltinOutcome::Code(0));
    }

    let global = flags.gflag || ctx.scope.is_none();
    if rest.len() == 1 {
        if global {
            ctx.rt.global_vars.lock().unwrap().remove(ident);
        } else if let Some(scope) = &mut ctx.scope {
            scope.remove(ident);
        }
    } else {
        ctx.assign(ident.clone(), rest[1..].to_vec(), global);
    }

    Ok(BuiltinOutcome::Code(0))
}
