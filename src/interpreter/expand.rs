//! Value expansion (§4.3): every `Value` variant's `expand` contract.

use std::io::Read;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream as StdUnixStream;

use nix::unistd;

use crate::ast::{ProcRedirDirection, Value, VarRefKind};
use crate::interpreter::context::{Closables, EvalContext, IoHandle};
use crate::interpreter::errors::{ExecOutcome, ShellError};
use crate::interpreter::executor;

pub type ExpandResult = Result<Vec<String>, ShellError>;

/// Expands a `Value` to the strings it denotes, accumulating any pipe or
/// process handles it creates into `closables` so the caller's
/// `CleanCommand` can release them when its frame exits.
pub fn expand(v: &Value, ctx: &mut EvalContext, closables: &mut Closables) -> ExpandResult {
    match v {
        Value::Argument(s) => Ok(vec![tilde_expand(s)?]),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Concat(l, r) => {
            let ls = expand(l, ctx, closables)?;
            let rs = expand(r, ctx, closables)?;
            let mut out = Vec::with_capacity(ls.len() * rs.len());
            for l in &ls {
                for r in &rs {
                    out.push(format!("{}{}", l, r));
                }
            }
            Ok(out)
        }
        Value::List(items) => {
            let mut out = Vec::new();
            for item in items {
                out.extend(expand(item, ctx, closables)?);
            }
            Ok(out)
        }
        Value::VarRef { ident, kind, indices } => expand_var_ref(ident, *kind, indices.as_deref(), ctx, closables),
        Value::ProcSub { separators, body } => expand_proc_sub(separators.as_deref(), body, ctx, closables),
        Value::ProcRedir { direction, body } => expand_proc_redir(*direction, body, ctx, closables),
    }
}

fn tilde_expand(s: &str) -> Result<String, ShellError> {
    if !s.starts_with('~') {
        return Ok(s.to_string());
    }
    let slash = s.find('/').unwrap_or(s.len());
    let user_part = &s[1..slash];
    let rest = &s[slash..];

    if user_part.is_empty() {
        let home = std::env::var("HOME").map_err(|_| ShellError::internal("$HOME is unset"))?;
        return Ok(format!("{}{}", home, rest));
    }

    match lookup_user_home(user_part) {
        Some(home) => Ok(format!("{}{}", home, rest)),
        None => Ok(s.to_string()),
    }
}

fn lookup_user_home(name: &str) -> Option<String> {
    use std::ffi::CString;
    let cname = CString::new(name).ok()?;
    unsafe {
        let pw = libc::getpwnam(cname.as_ptr());
        if pw.is_null() {
            return None;
        }
        let dir = (*pw).pw_dir;
        if dir.is_null() {
            return None;
        }
        Some(std::ffi::CStr::from_ptr(dir).to_string_lossy().into_owned())
    }
}

fn expand_var_ref(
    ident: &str,
    kind: VarRefKind,
    indices: Option<&[Value]>,
    ctx: &mut EvalContext,
    closables: &mut Closables,
) -> ExpandResult {
    let mut xs = ctx.lookup(ident).unwrap_or_default();

    if let Some(idx_values) = indices {
        let mut idx_strings = Vec::new();
        for iv in idx_values {
            idx_strings.extend(expand(iv, ctx, closables)?);
        }
        let mut ys = Vec::with_capacity(idx_strings.len());
        for idx in &idx_strings {
            ys.extend(resolve_index(idx, &xs)?);
        }
        xs = ys;
    }

    match kind {
        VarRefKind::Flatten => Ok(vec![xs.join(" ")]),
        VarRefKind::Length => Ok(vec![xs.len().to_string()]),
        VarRefKind::Expand => Ok(xs),
    }
}

/// Resolves one index expression (`i`, `i..j`, `..j`, `i..`, `..`) against
/// `xs`, per §4.3's indexing rules.
fn resolve_index(expr: &str, xs: &[String]) -> Result<Vec<String>, ShellError> {
    let n = xs.len() as i64;
    if let Some(dotdot) = expr.find("..") {
        let (lo_s, hi_s) = (&expr[..dotdot], &expr[dotdot + 2..]);
        let lo = if lo_s.is_empty() { 0 } else { parse_index(lo_s)? };
        let hi = if hi_s.is_empty() { n } else { parse_index(hi_s)? };
        let lo = resolve_negative(lo, n);
        let hi = resolve_negative(hi, n);
        return slice_range(xs, lo, hi, expr, n);
    }

    let i = parse_index(expr)?;
    let i = resolve_negative(i, n);
    if i < 0 || i >= n {
        return Err(ShellError::InvalidIndex { i: expr.to_string(), n: xs.len() });
    }
    Ok(vec![xs[i as usize].clone()])
}

fn parse_index(s: &str) -> Result<i64, ShellError> {
    s.parse::<i64>().map_err(|_| ShellError::internal(format!("\u{2018}{}\u{2019} isn\u{2019}t a valid index", s)))
}

fn resolve_negative(i: i64, n: i64) -> i64 {
    if i < 0 {
        i + n
    } else {
        i
    }
}

fn slice_range(xs: &[String], lo: i64, hi: i64, expr: &str, n: i64) -> Result<Vec<String>, ShellError> {
    let in_range = |i: i64| i >= 0 && i < n;
    if lo == hi {
        return Ok(Vec::new());
    }
    if lo < hi {
        if !in_range(lo) && lo != n {
            return Err(ShellError::InvalidIndex { i: expr.to_string(), n: xs.len() });
        }
        if hi > n || hi < 0 {
            return Err(ShellError::InvalidIndex { i: expr.to_string(), n: xs.len() });
        }
        Ok((lo..hi).map(|i| xs[i as usize].clone()).collect())
    } else {
        if !in_range(lo - 1) && lo != n {
            return Err(ShellError::InvalidIndex { i: expr.to_string(), n: xs.len() });
        }
        if hi < 0 || hi > n {
            return Err(ShellError::InvalidIndex { i: expr.to_string(), n: xs.len() });
        }
        let mut out = Vec::new();
        let mut i = lo - 1;
        while i >= hi {
            out.push(xs[i as usize].clone());
            i -= 1;
        }
        Ok(out)
    }
}

/// Splits `buf` at every occurrence of any separator in `seps`, trying
/// separators in list order at each scan position (first match wins, not
/// longest match — see SPEC_FULL.md §4.3 for why this departs from the
/// looser "longest-match-first" prose paraphrase).
pub fn split_multi(buf: &str, seps: &[String]) -> Vec<String> {
    if seps.is_empty() {
        return vec![buf.to_string()];
    }
    let mut out = Vec::new();
    let mut piece_start = 0usize;
    let mut i = 0usize;
    'scan: while i < buf.len() {
        for sep in seps {
            if sep.is_empty() {
                continue;
            }
            if buf[i..].starts_with(sep.as_str()) {
                out.push(buf[piece_start..i].to_string());
                i += sep.len();
                piece_start = i;
                continue 'scan;
            }
        }
        i += buf[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
    }
    out.push(buf[piece_start..].to_string());
    out
}

fn trim_one_trailing_newline(s: &str) -> &str {
    s.strip_suffix('\n').unwrap_or(s)
}

fn expand_proc_sub(
    separators: Option<&[Value]>,
    body: &[crate::ast::TopLevel],
    ctx: &mut EvalContext,
    closables: &mut Closables,
) -> ExpandResult {
    let seps = match separators {
        Some(vs) => {
            let mut out = Vec::new();
            for v in vs {
                out.extend(expand(v, ctx, closables)?);
            }
            out
        }
        None => Vec::new(),
    };

    let (r, w) = unistd::pipe().map_err(ShellError::internal)?;
    let mut reader = std::fs::File::from(r);
    let writer = std::fs::File::from(w);

    let mut body_ctx = ctx.fork_io(IoHandle::InheritStdin, IoHandle::File(writer), ctx.stderr.try_clone()?)?;
    let body = body.to_vec();
    let handle = std::thread::spawn(move || {
        let mut cls = Closables::new();
        let _ = executor::exec_program(&body, &mut body_ctx, &mut cls);
    });

    let mut buf = String::new();
    reader.read_to_string(&mut buf).map_err(ShellError::internal)?;
    let _ = handle.join();

    let trimmed = trim_one_trailing_newline(&buf);
    let _ = closables;
    if seps.is_empty() {
        Ok(vec![trimmed.to_string()])
    } else {
        Ok(split_multi(trimmed, &seps))
    }
}

fn expand_proc_redir(
    direction: ProcRedirDirection,
    body: &[crate::ast::TopLevel],
    ctx: &mut EvalContext,
    closables: &mut Closables,
) -> ExpandResult {
    let want_read = matches!(direction, ProcRedirDirection::Read | ProcRedirDirection::ReadWrite);
    let want_write = matches!(direction, ProcRedirDirection::Write | ProcRedirDirection::ReadWrite);

    let mut paths = Vec::new();
    let mut body_stdin = IoHandle::InheritStdin;
    let mut body_stdout = IoHandle::InheritStdout;

    if want_read {
        // Body writes; caller reads from r.
        let (r, w) = unistd::pipe().map_err(ShellError::internal)?;
        let rf = std::fs::File::from(r);
        let wf = std::fs::File::from(w);
        let fd = rf.as_raw_fd();
        paths.push(format!("/dev/fd/{}", fd));
        ctx.extra_fds.push(fd);
        closables.push(IoHandle::File(rf));
        body_stdout = IoHandle::File(wf);
    }
    if want_write {
        // Body reads; caller writes to w.
        let (r, w) = unistd::pipe().map_err(ShellError::internal)?;
        let rf = std::fs::File::from(r);
        let wf = std::fs::File::from(w);
        let fd = wf.as_raw_fd();
        paths.push(format!("/dev/fd/{}", fd));
        ctx.extra_fds.push(fd);
        closables.push(IoHandle::File(wf));
        body_stdin = IoHandle::File(rf);
    }

    let mut body_ctx = ctx.fork_io(body_stdin, body_stdout, ctx.stderr.try_clone()?)?;
    let body = body.to_vec();
    std::thread::spawn(move || {
        let mut cls = Closables::new();
        let _ = executor::exec_program(&body, &mut body_ctx, &mut cls);
    });

    Ok(paths)
}

/// Unix-domain dial used by redirect materialization when a target path
/// turns out to be a socket (step 3 of §4.4's redirect materialization).
pub fn dial_unix_socket(path: &std::path::Path) -> Result<StdUnixStream, ShellError> {
    StdUnixStream::connect(path).map_err(|e| ShellError::FileOp {
        op: crate::interpreter::errors::FileOp::Connect,
        file: path.to_path_buf(),
        cause: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_multi_single_separator() {
        assert_eq!(split_multi("foo:bar:baz", &[":".to_string()]), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn split_multi_first_match_wins_in_list_order() {
        // "ab" should win over "a" when "ab" is listed first, even though
        // "a" would also match at the same position.
        let parts = split_multi("xaby", &["ab".to_string(), "a".to_string()]);
        assert_eq!(parts, vec!["x", "y"]);
    }

    #[test]
    fn index_simple_and_negative() {
        let xs = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(resolve_index("0", &xs).unwrap(), vec!["a"]);
        assert_eq!(resolve_index("-1", &xs).unwrap(), vec!["c"]);
    }

    #[test]
    fn index_forward_range() {
        let xs = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(resolve_index("0..3", &xs).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn index_reverse_range() {
        let xs = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(resolve_index("3..0", &xs).unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn index_out_of_range_errors() {
        let xs = vec!["a".to_string()];
        assert!(resolve_index("5", &xs).is_err());
    }

    #[test]
    fn concat_cartesian_product_size() {
        let l = Value::List(vec![Value::argument("a"), Value::argument("b")]);
        let r = Value::List(vec![Value::argument("x"), Value::argument("y"), Value::argument("z")]);
        let v = Value::Concat(Box::new(l), Box::new(r));
        let rt = std::sync::Arc::new(crate::interpreter::runtime::Runtime::new(false));
        let mut ctx = EvalContext::root(rt);
        let mut cls = Closables::new();
        let out = expand(&v, &mut ctx, &mut cls).unwrap();
        assert_eq!(out.len(), 6);
    }
}
