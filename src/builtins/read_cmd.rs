//! `read`, grounded on `cmdRead` in `examples/original_source/cmd/andy/builtin.go`.
//! Reads byte-at-a-time honoring a delimiter set (`-d`) and an optional
//! count (`-n`), then assigns through the same path as `set`.

use std::io::Read;

use crate::builtins::{set_cmd, BuiltinOutcome};
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

struct Flags {
    delimiters: Vec<u8>,
    no_empty: bool,
    global: bool,
    count: usize,
    rest_start: usize,
}

fn parse_flags(argv: &[String]) -> Result<Flags, ()> {
    let mut delimiters = Vec::new();
    let mut no_empty = false;
    let mut global = false;
    let mut count = usize::MAX;
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-d" => {
                i += 1;
                delimiters = argv.get(i).ok_or(())?.as_bytes().to_vec();
            }
            "-D" => no_empty = true,
            "-g" => global = true,
            "-n" => {
                i += 1;
                count = argv.get(i).ok_or(())?.parse().map_err(|_| ())?;
            }
            _ => break,
        }
        i += 1;
    }
    Ok(Flags { delimiters, no_empty, global, count, rest_start: i })
}

fn usage(ctx: &mut EvalContext) -> Result<BuiltinOutcome, ShellError> {
    let _ = std::io::Write::write_all(&mut ctx.stderr, b"Usage: read [-Dg] [-n num] [-d string] variable\n");
    Ok(BuiltinOutcome::Code(1))
}

pub fn cmd_read(argv: &[String], ctx: &mut EvalContext, closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let flags = match parse_flags(argv) {
        Ok(f) => f,
        Err(()) => return usage(ctx),
    };
    let rest = &argv[flags.rest_start..];
    if rest.len() != 1 {
        return usage(ctx);
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut remaining = flags.count;
    let mut byte = [0u8; 1];
    loop {
        if remaining == 0 {
            break;
        }
        match ctx.stdin.read(&mut byte) {
            Ok(0) => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
                break;
            }
            Ok(_) => {
                if flags.delimiters.contains(&byte[0]) {
                    remaining = remaining.saturating_sub(1);
                    parts.push(std::mem::take(&mut current));
                } else {
                    current.push(byte[0] as char);
                }
            }
            Err(e) => return Err(ShellError::internal(e)),
        }
    }

    if flags.no_empty {
        parts.retain(|s| !s.is_empty());
    }
    if let Some(last) = parts.last_mut() {
        if let Some(trimmed) = last.strip_suffix('\n') {
            *last = trimmed.to_string();
        }
    }

    let had_any = !parts.is_empty();
    let ident = rest[0].clone();
    let mut set_argv = vec!["set".to_string()];
    if flags.global {
        set_argv.push("-g".to_string());
    }
    set_argv.push(ident);
    set_argv.extend(parts);

    let outcome = set_cmd::cmd_set(&set_argv, ctx, closables)?;
    if !had_any {
        return Ok(BuiltinOutcome::Code(1));
    }
    Ok(outcome)
}
