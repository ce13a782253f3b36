//! Redirect materialization (§4.4): turn a parsed `Redirect` into an open
//! file/socket handle wired into the command's `EvalContext`.

use std::fs::OpenOptions;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use crate::ast::{Redirect, RedirectKind};
use crate::interpreter::context::{Closables, EvalContext, IoHandle};
use crate::interpreter::errors::{FileOp, ShellError};
use crate::interpreter::expand::{dial_unix_socket, expand};

const NULL_DEVICE: &str = "/dev/null";

/// Applies every redirect in order, mutating `ctx`'s stdin/stdout and
/// pushing the opened handles into `closables` so they release exactly
/// once when the owning CleanCommand's frame exits.
pub fn apply_redirects(
    redirs: &[Redirect],
    ctx: &mut EvalContext,
    closables: &mut Closables,
) -> Result<(), ShellError> {
    for r in redirs {
        let handle = materialize(r, ctx, closables)?;
        match r.kind {
            RedirectKind::Read | RedirectKind::SockRead => {
                ctx.stdin = handle.try_clone()?;
            }
            RedirectKind::Append | RedirectKind::Clobber | RedirectKind::Write | RedirectKind::SockWrite => {
                ctx.stdout = handle.try_clone()?;
            }
        }
        closables.push(handle);
    }
    Ok(())
}

fn materialize(r: &Redirect, ctx: &mut EvalContext, closables: &mut Closables) -> Result<IoHandle, ShellError> {
    let targets = expand(&r.file, ctx, closables)?;
    if targets.len() != 1 {
        return Err(ShellError::Expected {
            want: "a single filename".to_string(),
            got: format!("{} strings", targets.len()),
        });
    }
    let target = &targets[0];

    // Step 2: underscore special case.
    if target == "_" {
        return match r.kind {
            RedirectKind::Read => open_path(Path::new(NULL_DEVICE), RedirectKind::Read),
            _ => open_path(Path::new(NULL_DEVICE), RedirectKind::Clobber),
        };
    }

    let path = PathBuf::from(target);
    let mut kind = r.kind;

    if let Ok(meta) = std::fs::symlink_metadata(&path) {
        let ft = meta.file_type();
        // Step 3: socket upgrade.
        if ft.is_socket() {
            kind = match kind {
                RedirectKind::Read => RedirectKind::SockRead,
                _ => RedirectKind::SockWrite,
            };
        } else if matches!(kind, RedirectKind::Write) && !ft.is_file() {
            // Step 4: write to a non-regular existing target upgrades to Clobber.
            kind = RedirectKind::Clobber;
        }
    }

    open_path(&path, kind)
}

fn open_path(path: &Path, kind: RedirectKind) -> Result<IoHandle, ShellError> {
    match kind {
        RedirectKind::Append => {
            let f = OpenOptions::new()
                .append(true)
                .create(true)
                .mode(0o666)
                .open(path)
                .map_err(|e| ShellError::FileOp { op: FileOp::Open, file: path.to_path_buf(), cause: e })?;
            Ok(IoHandle::File(f))
        }
        RedirectKind::Clobber => {
            let f = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o666)
                .open(path)
                .map_err(|e| ShellError::FileOp { op: FileOp::Create, file: path.to_path_buf(), cause: e })?;
            Ok(IoHandle::File(f))
        }
        RedirectKind::Read => {
            let f = OpenOptions::new()
                .read(true)
                .open(path)
                .map_err(|e| ShellError::FileOp { op: FileOp::Open, file: path.to_path_buf(), cause: e })?;
            Ok(IoHandle::File(f))
        }
        RedirectKind::Write => {
            if path.exists() {
                return Err(ShellError::ClobberRefused { file: path.to_path_buf() });
            }
            let f = OpenOptions::new()
                .write(true)
                .create(true)
                .mode(0o666)
                .open(path)
                .map_err(|e| ShellError::FileOp { op: FileOp::Create, file: path.to_path_buf(), cause: e })?;
            Ok(IoHandle::File(f))
        }
        RedirectKind::SockRead | RedirectKind::SockWrite => {
            let stream = dial_unix_socket(path)?;
            let f: std::fs::File = stream.into();
            Ok(IoHandle::File(f))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;

    #[test]
    fn write_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, b"x").unwrap();

        let redir = Redirect { kind: RedirectKind::Write, file: Value::String(path.to_string_lossy().into_owned()) };
        let rt = std::sync::Arc::new(crate::interpreter::runtime::Runtime::new(false));
        let mut ctx = EvalContext::root(rt);
        let mut closables = Closables::new();
        let err = materialize(&redir, &mut ctx, &mut closables).unwrap_err();
        assert!(matches!(err, ShellError::ClobberRefused { .. }));
    }

    #[test]
    fn append_then_clobber_on_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let rt = std::sync::Arc::new(crate::interpreter::runtime::Runtime::new(false));
        let mut ctx = EvalContext::root(rt);
        let mut closables = Closables::new();

        let append = Redirect { kind: RedirectKind::Append, file: Value::String(path.to_string_lossy().into_owned()) };
        materialize(&append, &mut ctx, &mut closables).unwrap();

        let clobber = Redirect { kind: RedirectKind::Clobber, file: Value::String(path.to_string_lossy().into_owned()) };
        materialize(&clobber, &mut ctx, &mut closables).unwrap();
    }
}
