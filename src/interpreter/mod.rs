//! Tree-walking executor: runtime state, evaluation context, value
//! expansion, redirect materialization, command resolution, and the
//! executor proper.

pub mod command_resolution;
pub mod context;
pub mod errors;
pub mod executor;
pub mod expand;
pub mod functions;
pub mod redirect;
pub mod runtime;

pub use context::{Closables, EvalContext, IoHandle};
pub use errors::{CommandResult, ExecOutcome, ShellError};
pub use runtime::Runtime;
