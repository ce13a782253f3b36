//! Unified error taxonomy.
//!
//! Every AST traversal function returns a [`CommandResult`]. Successful
//! termination (including a nonzero exit code) is carried in the `Ok` arm as
//! an [`ExecOutcome`]; everything else is a [`ShellError`] that bubbles to
//! the top level, prints once, and sets `status` to 255.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type CommandResult = Result<ExecOutcome, ShellError>;

/// The outcome of evaluating a command list, pipeline, or single command.
///
/// `Exit` is carried here rather than as a `ShellError` variant because it
/// is not an error at all (§7): it is ordinary successful termination that
/// asks every enclosing evaluation frame to stop and propagate the code
/// upward instead of continuing sequential evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    Code(u8),
    Exit(u8),
}

impl ExecOutcome {
    pub const OK: ExecOutcome = ExecOutcome::Code(0);

    pub fn code(exit: u8) -> Self {
        ExecOutcome::Code(exit)
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ExecOutcome::Code(c) | ExecOutcome::Exit(c) => *c,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ExecOutcome::Code(0))
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, ExecOutcome::Exit(_))
    }
}

impl From<u8> for ExecOutcome {
    fn from(exit: u8) -> Self {
        ExecOutcome::Code(exit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Open,
    Stat,
    Create,
    Connect,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileOp::Open => "open",
            FileOp::Stat => "stat",
            FileOp::Create => "create",
            FileOp::Connect => "connect",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Failed to {op} file \u{2018}{file}\u{2019}: {cause}")]
    FileOp { op: FileOp, file: PathBuf, #[source] cause: std::io::Error },

    #[error("Won\u{2019}t clobber file \u{2018}{file}\u{2019}; did you mean to use \u{2018}>!\u{2019}?")]
    ClobberRefused { file: PathBuf },

    #[error("Expected {want} but got {got}")]
    Expected { want: String, got: String },

    #[error("invalid index \u{2018}{i}\u{2019} into list of length {n}")]
    InvalidIndex { i: String, n: usize },

    #[error("Attempt to {0} is unsupported")]
    Unsupported(String),

    #[error("{0}")]
    Internal(String),
}

impl ShellError {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        ShellError::Internal(e.to_string())
    }
}

impl From<std::io::Error> for ShellError {
    fn from(e: std::io::Error) -> Self {
        ShellError::Internal(e.to_string())
    }
}

impl From<crate::parser::ParseError> for ShellError {
    fn from(e: crate::parser::ParseError) -> Self {
        ShellError::Internal(e.to_string())
    }
}
