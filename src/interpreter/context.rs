//! Evaluation context and the I/O handle / CleanCommand ownership model.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::process::Stdio;
use std::sync::Arc;

use crate::interpreter::runtime::{Runtime, Scope};

/// One end of a stream the evaluator reads from or writes to: either the
/// process's real stdio, or an owned file/pipe descriptor (a redirect
/// target, a pipeline pipe end, or a process-substitution pipe end).
pub enum IoHandle {
    InheritStdin,
    InheritStdout,
    InheritStderr,
    File(File),
}

impl IoHandle {
    pub fn try_clone(&self) -> io::Result<IoHandle> {
        match self {
            IoHandle::InheritStdin => Ok(IoHandle::InheritStdin),
            IoHandle::InheritStdout => Ok(IoHandle::InheritStdout),
            IoHandle::InheritStderr => Ok(IoHandle::InheritStderr),
            IoHandle::File(f) => Ok(IoHandle::File(f.try_clone()?)),
        }
    }

    pub fn to_stdio(&self) -> io::Result<Stdio> {
        match self {
            IoHandle::InheritStdin | IoHandle::InheritStdout | IoHandle::InheritStderr => {
                Ok(Stdio::inherit())
            }
            IoHandle::File(f) => Ok(Stdio::from(f.try_clone()?)),
        }
    }

    pub fn raw_fd(&self) -> RawFd {
        match self {
            IoHandle::InheritStdin => io::stdin().as_raw_fd(),
            IoHandle::InheritStdout => io::stdout().as_raw_fd(),
            IoHandle::InheritStderr => io::stderr().as_raw_fd(),
            IoHandle::File(f) => f.as_raw_fd(),
        }
    }
}

impl Read for IoHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            IoHandle::InheritStdin => io::stdin().read(buf),
            IoHandle::InheritStdout | IoHandle::InheritStderr => {
                Err(io::Error::new(io::ErrorKind::Other, "stream is not readable"))
            }
            IoHandle::File(f) => f.read(buf),
        }
    }
}

impl Write for IoHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            IoHandle::InheritStdout => io::stdout().write(buf),
            IoHandle::InheritStderr => io::stderr().write(buf),
            IoHandle::InheritStdin => {
                Err(io::Error::new(io::ErrorKind::Other, "stream is not writable"))
            }
            IoHandle::File(f) => f.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            IoHandle::InheritStdout => io::stdout().flush(),
            IoHandle::InheritStderr => io::stderr().flush(),
            IoHandle::InheritStdin => Ok(()),
            IoHandle::File(f) => f.flush(),
        }
    }
}

/// An owned resource a `CleanCommand` must release exactly once when its
/// evaluation frame exits: a redirect target, a pipeline pipe end, or a
/// process-redirection handle. Plain `Drop` on the underlying `File`
/// already closes the descriptor; this type exists so the executor can
/// name the collection and close it early (e.g. a pipe's write end must
/// close before its reader sees EOF).
#[derive(Default)]
pub struct Closables {
    handles: Vec<IoHandle>,
}

impl Closables {
    pub fn new() -> Self {
        Closables::default()
    }

    pub fn push(&mut self, h: IoHandle) {
        self.handles.push(h);
    }

    pub fn extend(&mut self, other: Closables) {
        self.handles.extend(other.handles);
    }

    /// Drop every handle now instead of waiting for scope exit.
    pub fn close_all(&mut self) {
        self.handles.clear();
    }
}

/// `{ in, out, err, scope }` from the distilled spec's Runtime model.
/// `scope == None` means the global variable map is the active scope.
pub struct EvalContext {
    pub rt: Arc<Runtime>,
    pub stdin: IoHandle,
    pub stdout: IoHandle,
    pub stderr: IoHandle,
    pub scope: Option<Scope>,
    /// `/dev/fd/N` paths and their backing descriptors contributed by
    /// process redirections in the current simple command's argv.
    pub extra_fds: Vec<RawFd>,
}

impl EvalContext {
    pub fn root(rt: Arc<Runtime>) -> Self {
        EvalContext {
            rt,
            stdin: IoHandle::InheritStdin,
            stdout: IoHandle::InheritStdout,
            stderr: IoHandle::InheritStderr,
            scope: None,
            extra_fds: Vec::new(),
        }
    }

    /// A context for a process-substitution/redirection task or pipeline
    /// stage: same runtime and scope, independent stdio.
    pub fn fork_io(&self, stdin: IoHandle, stdout: IoHandle, stderr: IoHandle) -> io::Result<Self> {
        Ok(EvalContext {
            rt: self.rt.clone(),
            stdin,
            stdout,
            stderr,
            scope: self.scope.clone(),
            extra_fds: Vec::new(),
        })
    }

    pub fn child_scope(&self, vars: Scope) -> Self {
        EvalContext {
            rt: self.rt.clone(),
            stdin: self.stdin.try_clone().unwrap_or(IoHandle::InheritStdin),
            stdout: self.stdout.try_clone().unwrap_or(IoHandle::InheritStdout),
            stderr: self.stderr.try_clone().unwrap_or(IoHandle::InheritStderr),
            scope: Some(vars),
            extra_fds: self.extra_fds.clone(),
        }
    }

    /// Looks up a variable through scope, then the global map, then the
    /// process environment (§4.3 VarRef expansion rule).
    pub fn lookup(&self, ident: &str) -> Option<Vec<String>> {
        if let Some(scope) = &self.scope {
            if let Some(v) = scope.get(ident) {
                return Some(v.clone());
            }
        }
        if let Some(v) = self.rt.global_vars.lock().unwrap().get(ident) {
            return Some(v.clone());
        }
        std::env::var(ident).ok().map(|v| vec![v])
    }

    pub fn assign(&mut self, ident: String, value: Vec<String>, global: bool) {
        if global {
            self.rt.global_vars.lock().unwrap().insert(ident, value);
        } else if let Some(scope) = &mut self.scope {
            scope.insert(ident, value);
        } else {
            self.rt.global_vars.lock().unwrap().insert(ident, value);
        }
    }
}
