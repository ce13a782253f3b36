//! CLI entry point, grounded on `examples/original_source/cmd/andy/main.go`'s
//! `main`: with no argument, run the REPL; with one argument, run it as a
//! script file. `ANDY_LOG` controls tracing verbosity the way the teacher's
//! binaries read their own log-level env var.

use std::sync::Arc;

use andy::interpreter::Runtime;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_env("ANDY_LOG").unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.len() {
        1 => {
            let rt = Arc::new(Runtime::new(true));
            andy::repl::run_repl(rt);
        }
        2 => {
            let rt = Arc::new(Runtime::new(false));
            let code = andy::repl::run_file(&args[1], rt);
            std::process::exit(code as i32);
        }
        _ => {
            eprintln!("usage: andy [file]");
            std::process::exit(1);
        }
    }
}
