//! PATH-based external command resolution and fork-exec dispatch
//! (§4.4 Simple command, steps 3-6).

use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use crate::interpreter::context::EvalContext;
use crate::interpreter::errors::{CommandResult, ExecOutcome, ShellError};

pub const DEFAULT_PATH: &str = "/usr/bin:/bin";

pub fn split_path(path_env: &str) -> Vec<&str> {
    path_env.split(':').filter(|s| !s.is_empty()).collect()
}

/// Resolves `name` to an executable path via `$PATH`, tolerating (with a
/// warning) a `.` entry in `$PATH` — the "dot in PATH" special case.
pub fn resolve_external(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let p = PathBuf::from(name);
        return is_executable_file(&p).then_some(p);
    }

    let path_env = std::env::var("PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string());
    for dir in split_path(&path_env) {
        if dir == "." {
            tracing::warn!("ignoring untrustworthy \u{2018}.\u{2019} entry in $PATH");
        }
        let candidate = Path::new(dir).join(name);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

/// Forks and execs `path` with `argv[1..]` as arguments, inheriting the
/// context's stdio and placing `extra_fds` at descriptor positions `fd-3`
/// onward so their numeric values match the `/dev/fd/N` paths handed to
/// the child by process substitutions/redirections.
pub fn spawn_external(path: &Path, argv: &[String], ctx: &EvalContext) -> CommandResult {
    let mut cmd = StdCommand::new(path);
    cmd.args(&argv[1..]);
    cmd.stdin(ctx.stdin.to_stdio()?);
    cmd.stdout(ctx.stdout.to_stdio()?);
    cmd.stderr(ctx.stderr.to_stdio()?);

    let extra_fds = ctx.extra_fds.clone();
    if !extra_fds.is_empty() {
        unsafe {
            cmd.pre_exec(move || {
                for (i, fd) in extra_fds.iter().enumerate() {
                    let target = 3 + i as i32;
                    if *fd != target {
                        nix::unistd::dup2(*fd, target).map_err(std::io::Error::from)?;
                    }
                }
                Ok(())
            });
        }
    }

    let status = cmd.status().map_err(|e| ShellError::FileOp {
        op: crate::interpreter::errors::FileOp::Open,
        file: path.to_path_buf(),
        cause: e,
    })?;

    match status.code() {
        Some(code) => Ok(ExecOutcome::code(code as u8)),
        None => Err(ShellError::internal(format!("child terminated by {:?}", status))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_path_skips_empty_entries() {
        assert_eq!(split_path("/usr/bin::/bin:"), vec!["/usr/bin", "/bin"]);
    }

    #[test]
    fn resolve_external_finds_true() {
        assert!(resolve_external("true").is_some());
    }

    #[test]
    fn resolve_external_rejects_unknown() {
        assert!(resolve_external("definitely-not-a-real-binary-xyz").is_none());
    }
}
