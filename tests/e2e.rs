//! End-to-end scenarios, run in-process against the public API rather than
//! by spawning the `andy` binary (the interpreter has no meaningful
//! subprocess boundary of its own).

use std::sync::Arc;

use andy::interpreter::{Closables, EvalContext, ExecOutcome};
use andy::interpreter::executor::exec_program;
use andy::interpreter::runtime::Runtime;
use andy::parse;

fn run(src: &str) -> (ExecOutcome, Arc<Runtime>) {
    let rt = Arc::new(Runtime::new(false));
    let program = parse(src).expect("parse");
    let mut ctx = EvalContext::root(rt.clone());
    let mut closables = Closables::new();
    let outcome = exec_program(&program, &mut ctx, &mut closables).expect("exec");
    (outcome, rt)
}

#[test]
fn simple_command_and_pipe_propagate_exit_status() {
    let (outcome, _rt) = run("true | false");
    assert_eq!(outcome, ExecOutcome::Code(1));

    let (outcome, _rt) = run("false | true");
    assert_eq!(outcome, ExecOutcome::Code(0));
}

#[test]
fn plain_write_redirect_refuses_an_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    std::fs::write(&path, b"already here").unwrap();

    let src = format!("echo hi > {}", path.to_string_lossy());
    let rt = Arc::new(Runtime::new(false));
    let program = parse(&src).expect("parse");
    let mut ctx = EvalContext::root(rt);
    let mut closables = Closables::new();
    let err = exec_program(&program, &mut ctx, &mut closables).unwrap_err();
    assert!(matches!(err, andy::interpreter::ShellError::ClobberRefused { .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "already here");
}

#[test]
fn append_then_clobbering_write_on_the_same_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.txt");
    let p = path.to_string_lossy();

    let src = format!("echo one >> {p}\necho two >> {p}\necho three >! {p}\n");
    let (outcome, _rt) = run(&src);
    assert_eq!(outcome, ExecOutcome::Code(0));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "three\n");
}

#[test]
fn logical_chain_short_circuits_left_to_right() {
    let (outcome, _rt) = run("true && true && false || true");
    assert_eq!(outcome, ExecOutcome::Code(0));

    let (outcome, _rt) = run("false && true");
    assert_eq!(outcome, ExecOutcome::Code(1));
}

#[test]
fn variable_indices_and_cartesian_concat_expand_as_argv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let p = path.to_string_lossy();

    let src = format!("set xs a b c\necho $xs[0]$xs[2] > {p}\n");
    let (outcome, _rt) = run(&src);
    assert_eq!(outcome, ExecOutcome::Code(0));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "ac\n");
}

#[test]
fn exit_unwinds_through_nested_control_flow() {
    let (outcome, _rt) = run("if true { if true { exit 7 } }\necho unreachable");
    assert_eq!(outcome, ExecOutcome::Exit(7));
}

#[test]
fn process_substitution_output_is_split_on_separators() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let p = path.to_string_lossy();

    let src = format!("set parts `(,){{echo a,b,c}}\necho $parts[1] > {p}\n");
    let (outcome, _rt) = run(&src);
    assert_eq!(outcome, ExecOutcome::Code(0));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\n");
}
