//! Token kinds produced by the lexer and consumed by the parser.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Error,

    EndStmt,
    Eof,

    Arg,
    Concat,
    String,
    VarFlat,
    VarLen,
    VarRef,

    Append,
    Clobber,
    Read,
    Write,

    Pipe,

    LAnd,
    LOr,

    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    ParenOpen,
    ParenClose,

    ProcSub,
    ProcRead,
    ProcWrite,
    ProcRdWr,
}

/// A lexeme: a kind plus the slice of source text it carries (empty for
/// punctuation kinds that need no payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub val: String,
    /// Byte offset into the source where this token begins.
    pub pos: usize,
}

impl Token {
    pub fn new(kind: TokenKind, val: impl Into<String>, pos: usize) -> Self {
        Token { kind, val: val.into(), pos }
    }

    pub fn is_redir(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Append | TokenKind::Clobber | TokenKind::Read | TokenKind::Write
        )
    }

    pub fn is_value_start(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Arg
                | TokenKind::Concat
                | TokenKind::ParenOpen
                | TokenKind::ProcRdWr
                | TokenKind::ProcRead
                | TokenKind::ProcSub
                | TokenKind::ProcWrite
                | TokenKind::String
                | TokenKind::VarFlat
                | TokenKind::VarLen
                | TokenKind::VarRef
        )
    }
}

const MAX_STR_LEN: usize = 20;

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Error => write!(f, "lexing error: {}", self.val),
            TokenKind::EndStmt => write!(f, "end of statement"),
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Arg | TokenKind::String => {
                if self.val.chars().count() > MAX_STR_LEN {
                    let truncated: String = self.val.chars().take(MAX_STR_LEN).collect();
                    write!(f, "\u{2018}{}\u{2026}\u{2019}", truncated)
                } else {
                    write!(f, "\u{2018}{}\u{2019}", self.val)
                }
            }
            TokenKind::Concat => write!(f, "value concatenation"),
            TokenKind::VarFlat => write!(f, "\u{2018}$^{}\u{2019}", self.val),
            TokenKind::VarLen => write!(f, "\u{2018}$#{}\u{2019}", self.val),
            TokenKind::VarRef => write!(f, "\u{2018}${}\u{2019}", self.val),
            TokenKind::Append => write!(f, "\u{2018}>>\u{2019}"),
            TokenKind::Clobber => write!(f, "\u{2018}>!\u{2019}"),
            TokenKind::Read => write!(f, "\u{2018}<\u{2019}"),
            TokenKind::Write => write!(f, "\u{2018}>\u{2019}"),
            TokenKind::Pipe => write!(f, "\u{2018}|\u{2019}"),
            TokenKind::LAnd => write!(f, "\u{2018}&&\u{2019}"),
            TokenKind::LOr => write!(f, "\u{2018}||\u{2019}"),
            TokenKind::BraceOpen => write!(f, "\u{2018}{{\u{2019}"),
            TokenKind::BraceClose => write!(f, "\u{2018}}}\u{2019}"),
            TokenKind::BracketOpen => write!(f, "\u{2018}[\u{2019}"),
            TokenKind::BracketClose => write!(f, "\u{2018}]\u{2019}"),
            TokenKind::ParenOpen => write!(f, "\u{2018}(\u{2019}"),
            TokenKind::ParenClose => write!(f, "\u{2018})\u{2019}"),
            TokenKind::ProcSub => write!(f, "\u{2018}`{{\u{2019}"),
            TokenKind::ProcRead => write!(f, "\u{2018}<{{\u{2019}"),
            TokenKind::ProcWrite => write!(f, "\u{2018}>{{\u{2019}"),
            TokenKind::ProcRdWr => write!(f, "\u{2018}<>{{\u{2019}"),
        }
    }
}

pub fn is_metachar(c: char) -> bool {
    matches!(c, '\'' | '"' | '|' | '>' | '<' | '&' | '{' | '}' | '(' | ')' | '$')
}

pub fn is_eol(c: char) -> bool {
    c == ';' || c == '\n'
}

pub fn is_ref_rune(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || matches!(c, '\u{2032}' | '\u{2033}' | '\u{2034}' | '\u{2057}')
}

pub fn is_ref_name(s: &str) -> Result<(), char> {
    for c in s.chars() {
        if !is_ref_rune(c) {
            return Err(c);
        }
    }
    Ok(())
}
