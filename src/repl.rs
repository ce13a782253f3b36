//! The REPL and file-mode entry points, grounded on
//! `examples/original_source/cmd/andy/main.go`'s `runRepl`/`runFile`.

use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::Runtime;

/// Runs `.andyrc` (if present) then reads lines from stdin, prompting with
/// `[<status>] > ` to stderr, until EOF.
pub fn run_repl(rt: Arc<Runtime>) {
    run_file_quiet(".andyrc", rt.clone());

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let status = rt.global_vars.lock().unwrap().get("status").and_then(|v| v.first().cloned()).unwrap_or_else(|| "0".to_string());
        eprint!("[{}] > ", status);
        let _ = std::io::stderr().flush();

        match lines.next() {
            None => {
                eprintln!("^D");
                std::process::exit(0);
            }
            Some(Err(e)) => {
                warn(&e);
                continue;
            }
            Some(Ok(line)) => {
                run_source_line(&line, &rt);
            }
        }
    }
}

fn run_source_line(line: &str, rt: &Arc<Runtime>) {
    let program = match crate::parser::parse(line) {
        Ok(p) => p,
        Err(e) => {
            warn(&e);
            return;
        }
    };

    let mut ctx = EvalContext::root(rt.clone());
    let mut closables = Closables::new();
    match crate::interpreter::executor::exec_program(&program, &mut ctx, &mut closables) {
        Ok(_) => {}
        Err(e) => warn(&e),
    }
}

/// Reads and executes `path`. Missing files are silently skipped (matching
/// `runFile`'s `os.ErrNotExist` case); any other read error or fatal shell
/// error prints a diagnostic and exits the process with status 1.
pub fn run_file(path: &str, rt: Arc<Runtime>) -> u8 {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => die(&e),
    };

    let program = match crate::parser::parse(&contents) {
        Ok(p) => p,
        Err(e) => die(&e),
    };

    let mut ctx = EvalContext::root(rt.clone());
    ctx.rt.global_vars.lock().unwrap().insert("args".to_string(), std::env::args().skip(2).collect());
    let mut closables = Closables::new();
    match crate::interpreter::executor::exec_program(&program, &mut ctx, &mut closables) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => die(&e),
    }
}

fn run_file_quiet(path: &str, rt: Arc<Runtime>) {
    let _ = run_file(path, rt);
}

fn warn(e: &impl std::fmt::Display) {
    eprintln!("andy: {}", e);
}

fn die(e: &impl std::fmt::Display) -> ! {
    eprintln!("andy: {}", e);
    std::process::exit(1);
}
