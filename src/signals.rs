//! Signal name table and handler installation (§4.6, ambient/thin).
//!
//! A `FunctionDef` whose name matches an entry here gets re-invoked with a
//! fresh scope and empty argv on each delivery of the corresponding POSIX
//! signal. This is best-effort: it does not implement job control.

use std::sync::Arc;

use nix::sys::signal::{SigSet, Signal};

use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::functions;
use crate::interpreter::runtime::Runtime;

pub fn by_name(name: &str) -> Option<Signal> {
    Some(match name {
        "int" => Signal::SIGINT,
        "term" => Signal::SIGTERM,
        "hup" => Signal::SIGHUP,
        "quit" => Signal::SIGQUIT,
        "usr1" => Signal::SIGUSR1,
        "usr2" => Signal::SIGUSR2,
        "pipe" => Signal::SIGPIPE,
        "chld" => Signal::SIGCHLD,
        _ => return None,
    })
}

/// Blocks `sig` process-wide (the mask is inherited by threads spawned
/// after this call) and starts a dedicated thread that dequeues it via
/// `sigwait` and re-invokes the function named `name` on every delivery.
pub fn install_handler(sig: Signal, name: String, rt: Arc<Runtime>) {
    let mut set = SigSet::empty();
    set.add(sig);
    if let Err(e) = set.thread_block() {
        tracing::warn!("failed to block signal {:?} for handler installation: {}", sig, e);
        return;
    }

    std::thread::spawn(move || loop {
        match set.wait() {
            Ok(_) => {
                let def = rt.functions.lock().unwrap().get(&name).cloned();
                let Some(def) = def else { break };
                let mut ctx = EvalContext::root(rt.clone());
                let mut closables = Closables::new();
                if let Err(e) = functions::call(&def, &[], &mut ctx, &mut closables) {
                    tracing::warn!("signal handler \u{2018}{}\u{2019} failed: {}", name, e);
                }
            }
            Err(e) => {
                tracing::warn!("sigwait failed for {:?}: {}", sig, e);
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert_eq!(by_name("int"), Some(Signal::SIGINT));
        assert_eq!(by_name("chld"), Some(Signal::SIGCHLD));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(by_name("bogus"), None);
    }
}
