//! Program AST produced by the parser and walked by the executor.

use std::fmt;

pub type Program = Vec<TopLevel>;

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    FunctionDef(FunctionDef),
    CommandList(CommandList),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name_value: Value,
    pub args: Vec<Value>,
    pub body: Program,
}

/// Left-leaning tree of pipelines joined by `&&`/`||`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandList {
    pub lhs: Option<Box<CommandList>>,
    pub op: LogOp,
    pub rhs: Pipeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOp {
    And,
    Or,
}

pub type Pipeline = Vec<CleanCommand>;

#[derive(Debug, Clone, PartialEq)]
pub struct CleanCommand {
    pub cmd: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Simple(Simple),
    Compound(Compound),
    If(If),
    While(While),
    For(For),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Simple {
    pub args: Vec<Value>,
    pub redirs: Vec<Redirect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub cmds: Program,
    pub redirs: Vec<Redirect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub cond: CommandList,
    pub body: Program,
    pub else_: Program,
    pub redirs: Vec<Redirect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub cond: CommandList,
    pub body: Program,
    pub redirs: Vec<Redirect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub bind: Value,
    pub vals: Vec<Value>,
    pub body: Program,
    pub redirs: Vec<Redirect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    Append,
    Clobber,
    Read,
    Write,
    SockRead,
    SockWrite,
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RedirectKind::Append => ">>",
            RedirectKind::Clobber => ">!",
            RedirectKind::Read => "<",
            RedirectKind::Write => ">",
            RedirectKind::SockRead => "<sock",
            RedirectKind::SockWrite => ">sock",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub kind: RedirectKind,
    pub file: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarRefKind {
    Expand,
    Flatten,
    Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcRedirDirection {
    Read,
    Write,
    ReadWrite,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Argument(String),
    String(String),
    VarRef {
        ident: String,
        kind: VarRefKind,
        indices: Option<Vec<Value>>,
    },
    Concat(Box<Value>, Box<Value>),
    List(Vec<Value>),
    ProcSub {
        separators: Option<Vec<Value>>,
        body: Program,
    },
    ProcRedir {
        direction: ProcRedirDirection,
        body: Program,
    },
}

impl Value {
    pub fn argument(s: impl Into<String>) -> Self {
        Value::Argument(s.into())
    }
}
