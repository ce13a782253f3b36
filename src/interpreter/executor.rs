//! Tree-walking executor (§4.4): top-level dispatch, CommandList
//! short-circuiting, pipeline fan-out, redirect-scoped CleanCommand
//! evaluation, simple-command resolution, and control flow.

use std::collections::HashMap;

use crate::ast::{CleanCommand, Command, CommandList, For, If, LogOp, Pipeline, Program, Redirect, TopLevel, While};
use crate::builtins::{self, BuiltinOutcome};
use crate::interpreter::command_resolution;
use crate::interpreter::context::{Closables, EvalContext, IoHandle};
use crate::interpreter::errors::{CommandResult, ExecOutcome, ShellError};
use crate::interpreter::expand::expand;
use crate::interpreter::functions;
use crate::interpreter::runtime::Scope;

/// Evaluates every top-level item in order, refreshing `status` after each
/// one (§4.4 Status & scope rules).
pub fn exec_program(prog: &Program, ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    let mut last = ExecOutcome::OK;
    for item in prog {
        let result = exec_top_level(item, ctx, closables)?;
        ctx.rt.set_status(result.exit_code());
        last = result;
        if last.is_exit() {
            break;
        }
    }
    Ok(last)
}

fn exec_top_level(item: &TopLevel, ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    match item {
        TopLevel::FunctionDef(def) => {
            functions::define(def, ctx, closables)?;
            Ok(ExecOutcome::OK)
        }
        TopLevel::CommandList(cl) => exec_command_list(cl, ctx, closables),
    }
}

/// `exec(cl): if cl.lhs is none, return exec(cl.rhs); else short-circuit
/// on `&&`/`||` per the left-leaning fold described in §4.4.
pub fn exec_command_list(cl: &CommandList, ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    let lhs_result = match &cl.lhs {
        None => return exec_pipeline(&cl.rhs, ctx, closables),
        Some(lhs) => exec_command_list(lhs, ctx, closables)?,
    };
    if lhs_result.is_exit() {
        return Ok(lhs_result);
    }
    let take_rhs = match cl.op {
        LogOp::And => lhs_result.exit_code() == 0,
        LogOp::Or => lhs_result.exit_code() != 0,
    };
    if take_rhs {
        exec_pipeline(&cl.rhs, ctx, closables)
    } else {
        Ok(lhs_result)
    }
}

/// Wires `n-1` OS pipes between `n` stages, runs stages `0..n-2` on
/// independent threads and the last stage on the current thread, then
/// joins. Returns the last stage's result (§4.4 Pipeline evaluation).
pub fn exec_pipeline(pl: &Pipeline, ctx: &mut EvalContext, _closables: &mut Closables) -> CommandResult {
    let n = pl.len();
    if n == 1 {
        return exec_clean_command(&pl[0], ctx);
    }

    let mut stage_ctxs = Vec::with_capacity(n);
    let mut prev_read: Option<IoHandle> = None;
    for i in 0..n {
        let stdin = if i == 0 {
            ctx.stdin.try_clone()?
        } else {
            prev_read.take().expect("pipe read end set by previous stage")
        };
        let stdout = if i == n - 1 {
            ctx.stdout.try_clone()?
        } else {
            let (r, w) = nix::unistd::pipe().map_err(ShellError::internal)?;
            prev_read = Some(IoHandle::File(std::fs::File::from(r)));
            IoHandle::File(std::fs::File::from(w))
        };
        let stderr = ctx.stderr.try_clone()?;
        stage_ctxs.push(ctx.fork_io(stdin, stdout, stderr)?);
    }

    let mut ctx_iter = stage_ctxs.into_iter();
    let mut handles = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let mut stage_ctx = ctx_iter.next().expect("one context per stage");
        let cmd = pl[i].clone();
        handles.push(std::thread::spawn(move || {
            let _ = exec_clean_command(&cmd, &mut stage_ctx);
        }));
    }
    let mut last_ctx = ctx_iter.next().expect("one context per stage");

    let result = exec_clean_command(&pl[n - 1], &mut last_ctx);
    for h in handles {
        let _ = h.join();
    }
    result
}

fn redirs_of(cmd: &Command) -> &[Redirect] {
    match cmd {
        Command::Simple(s) => &s.redirs,
        Command::Compound(c) => &c.redirs,
        Command::If(i) => &i.redirs,
        Command::While(w) => &w.redirs,
        Command::For(f) => &f.redirs,
    }
}

/// A CleanCommand's frame: fork an isolated I/O context, materialize its
/// redirects into a fresh `Closables`, dispatch the body, then release
/// every owned handle exactly once when the frame exits.
pub fn exec_clean_command(cc: &CleanCommand, ctx: &mut EvalContext) -> CommandResult {
    let mut cmd_ctx = ctx.fork_io(ctx.stdin.try_clone()?, ctx.stdout.try_clone()?, ctx.stderr.try_clone()?)?;
    let mut closables = Closables::new();
    crate::interpreter::redirect::apply_redirects(redirs_of(&cc.cmd), &mut cmd_ctx, &mut closables)?;
    let result = exec_command(&cc.cmd, &mut cmd_ctx, &mut closables);
    closables.close_all();
    result
}

fn exec_command(cmd: &Command, ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    match cmd {
        Command::Simple(s) => exec_simple(&s.args, ctx, closables),
        Command::Compound(c) => exec_program(&c.cmds, ctx, closables),
        Command::If(i) => exec_if(i, ctx, closables),
        Command::While(w) => exec_while(w, ctx, closables),
        Command::For(f) => exec_for(f, ctx, closables),
    }
}

fn exec_if(i: &If, ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    let cond = exec_command_list(&i.cond, ctx, closables)?;
    if cond.is_exit() {
        return Ok(cond);
    }
    if cond.exit_code() == 0 {
        exec_program(&i.body, ctx, closables)
    } else {
        exec_program(&i.else_, ctx, closables)
    }
}

fn exec_while(w: &While, ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    loop {
        let cond = exec_command_list(&w.cond, ctx, closables)?;
        if cond.is_exit() {
            return Ok(cond);
        }
        if cond.exit_code() != 0 {
            return Ok(ExecOutcome::OK);
        }
        let body_result = exec_program(&w.body, ctx, closables)?;
        if body_result.is_exit() {
            return Ok(body_result);
        }
    }
}

fn exec_for(f: &For, ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    let mut bind_name = expand(&f.bind, ctx, closables)?;
    if bind_name.len() != 1 {
        return Err(ShellError::Expected {
            want: "a single binding name".to_string(),
            got: format!("{} strings", bind_name.len()),
        });
    }
    let name = bind_name.remove(0);

    let mut values = Vec::new();
    for v in &f.vals {
        values.extend(expand(v, ctx, closables)?);
    }

    let mut last = ExecOutcome::OK;
    for elem in values {
        let mut vars: Scope = HashMap::new();
        vars.insert(name.clone(), vec![elem]);
        let mut loop_ctx = ctx.child_scope(vars);
        last = exec_program(&f.body, &mut loop_ctx, closables)?;
        if last.is_exit() {
            break;
        }
    }
    Ok(last)
}

/// Simple-command dispatch (§4.4 steps 1-6): expand argv, try a user
/// function, then a builtin, then fork-exec via `$PATH`.
fn exec_simple(args: &[crate::ast::Value], ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    let mut argv = Vec::new();
    for v in args {
        argv.extend(expand(v, ctx, closables)?);
    }

    if argv.is_empty() {
        return Ok(ExecOutcome::OK);
    }

    let name = argv[0].clone();

    if let Some(def) = ctx.rt.functions.lock().unwrap().get(&name).cloned() {
        return functions::call(&def, &argv[1..], ctx, closables);
    }

    if let Some(builtin) = builtins::lookup(&name) {
        return match builtin(&argv, ctx, closables)? {
            BuiltinOutcome::Code(code) => Ok(ExecOutcome::code(code)),
            BuiltinOutcome::Exit(code) => Ok(ExecOutcome::Exit(code)),
        };
    }

    match command_resolution::resolve_external(&name) {
        Some(path) => command_resolution::spawn_external(&path, &argv, ctx),
        None => Err(ShellError::internal(format!("\u{2018}{}\u{2019}: command not found", name))),
    }
}
