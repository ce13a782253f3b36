//! Function definition binding and invocation (§4.4 top-level dispatch,
//! Simple command step 3, Status & scope rules).

use std::collections::HashMap;

use crate::ast::FunctionDef;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::{CommandResult, ShellError};
use crate::interpreter::executor;
use crate::interpreter::expand::expand;
use crate::interpreter::runtime::Scope;
use crate::signals;

/// Binds `def`'s name (first expanded value) to the function table. If the
/// name matches a signal identifier and no function of that name was bound
/// before, installs an asynchronous handler that re-invokes it on delivery.
pub fn define(def: &FunctionDef, ctx: &mut EvalContext, closables: &mut Closables) -> Result<(), ShellError> {
    let mut names = expand(&def.name_value, ctx, closables)?;
    if names.len() != 1 {
        return Err(ShellError::Expected {
            want: "a single function name".to_string(),
            got: format!("{} strings", names.len()),
        });
    }
    let name = names.remove(0);

    let already_bound = ctx.rt.functions.lock().unwrap().contains_key(&name);
    ctx.rt.functions.lock().unwrap().insert(name.clone(), def.clone());

    if !already_bound {
        if let Some(sig) = signals::by_name(&name) {
            signals::install_handler(sig, name, ctx.rt.clone());
        }
    }
    Ok(())
}

/// Clones the caller's scope, binds formal parameters to positional
/// arguments (extras collected into `_`), and evaluates the body.
pub fn call(def: &FunctionDef, argv_rest: &[String], ctx: &mut EvalContext, closables: &mut Closables) -> CommandResult {
    let mut names = Vec::with_capacity(def.args.len());
    for a in &def.args {
        let mut expanded = expand(a, ctx, closables)?;
        if expanded.len() != 1 {
            return Err(ShellError::Expected {
                want: "a single parameter name".to_string(),
                got: format!("{} strings", expanded.len()),
            });
        }
        names.push(expanded.remove(0));
    }

    let mut vars: Scope = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        let v = argv_rest.get(i).cloned().map(|s| vec![s]).unwrap_or_default();
        vars.insert(name.clone(), v);
    }
    let extras: Vec<String> = if argv_rest.len() > names.len() {
        argv_rest[names.len()..].to_vec()
    } else {
        Vec::new()
    };
    vars.insert("_".to_string(), extras);

    let mut call_ctx = ctx.child_scope(vars);
    let mut call_closables = Closables::new();
    let result = executor::exec_program(&def.body, &mut call_ctx, &mut call_closables);
    call_closables.close_all();
    result
}
