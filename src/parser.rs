//! Recursive-descent parser with one-token lookahead.
//!
//! Consumes the token stream produced by [`crate::lexer::lex`] and builds a
//! [`Program`]. Parse errors are fatal: there is no recovery, the parser
//! just returns a [`ParseError`] describing what it expected.

use std::fmt;

use crate::ast::*;
use crate::lexer::{lex, PROCSUB_BARE, PROCSUB_BRACE, PROCSUB_PAREN};
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub want: String,
    pub got: Token,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected {} but got {}", self.want, self.got)
    }
}

impl std::error::Error for ParseError {}

pub fn parse(src: &str) -> Result<Program, ParseError> {
    let mut p = Parser::new(lex(src));
    p.parse_program()
}

struct Parser<I: Iterator<Item = Token>> {
    stream: I,
    cache: Option<Token>,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    fn new(stream: I) -> Self {
        Parser { stream, cache: None }
    }

    fn next(&mut self) -> Token {
        if let Some(t) = self.cache.take() {
            return t;
        }
        self.stream.next().unwrap_or(Token::new(TokenKind::Eof, "", 0))
    }

    fn peek(&mut self) -> Token {
        if let Some(t) = &self.cache {
            return t.clone();
        }
        let t = self.stream.next().unwrap_or(Token::new(TokenKind::Eof, "", 0));
        self.cache = Some(t.clone());
        t
    }

    fn expect(&mut self, want: &str, kind: TokenKind) -> Result<Token, ParseError> {
        let t = self.next();
        if t.kind != kind {
            return Err(ParseError { want: want.to_string(), got: t });
        }
        Ok(t)
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut prog = Vec::new();
        loop {
            let t = self.peek();
            match t.kind {
                TokenKind::EndStmt => {
                    self.next();
                }
                TokenKind::Eof => return Ok(prog),
                TokenKind::Arg if t.val == "func" => {
                    prog.push(TopLevel::FunctionDef(self.parse_func_def()?));
                }
                _ => prog.push(TopLevel::CommandList(self.parse_command_list()?)),
            }
        }
    }

    fn parse_func_def(&mut self) -> Result<FunctionDef, ParseError> {
        self.next(); // 'func'
        let name_value = self.parse_value()?;
        let mut args = Vec::new();
        while self.peek().is_value_start() {
            args.push(self.parse_value()?);
        }
        self.expect("opening brace", TokenKind::BraceOpen)?;
        let body = self.parse_body()?;
        Ok(FunctionDef { name_value, args, body })
    }

    /// Builds the right-leaning chain the grammar naturally produces, then
    /// folds it into the left-leaning form the evaluator walks.
    fn parse_command_list(&mut self) -> Result<CommandList, ParseError> {
        let (first, mut rest) = self.parse_right_leaning_chain()?;
        let mut cmd_list = CommandList { lhs: None, op: LogOp::And, rhs: first };
        for (op, pipeline) in rest.drain(..) {
            cmd_list = CommandList { lhs: Some(Box::new(cmd_list)), op, rhs: pipeline };
        }
        Ok(cmd_list)
    }

    fn parse_right_leaning_chain(&mut self) -> Result<(Pipeline, Vec<(LogOp, Pipeline)>), ParseError> {
        let first = self.parse_pipeline()?;
        let mut chain = Vec::new();
        loop {
            let op = match self.peek().kind {
                TokenKind::LAnd => LogOp::And,
                TokenKind::LOr => LogOp::Or,
                _ => break,
            };
            self.next();
            while self.peek().kind == TokenKind::EndStmt {
                self.next();
            }
            let pipeline = self.parse_pipeline()?;
            chain.push((op, pipeline));
        }
        Ok((first, chain))
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, ParseError> {
        let mut pipe = vec![self.parse_command()?];
        loop {
            match self.peek().kind {
                TokenKind::Pipe => {
                    self.next();
                    pipe.push(self.parse_command()?);
                }
                TokenKind::EndStmt => {
                    self.next();
                }
                _ => return Ok(pipe),
            }
        }
    }

    fn parse_command(&mut self) -> Result<CleanCommand, ParseError> {
        let t = self.peek();
        let mut cmd = match t.kind {
            TokenKind::Arg if t.val == "if" => {
                self.next();
                Command::If(self.parse_if()?)
            }
            TokenKind::Arg if t.val == "while" => {
                self.next();
                Command::While(self.parse_while()?)
            }
            TokenKind::Arg if t.val == "for" => {
                self.next();
                Command::For(self.parse_for()?)
            }
            TokenKind::BraceOpen => {
                self.next();
                Command::Compound(self.parse_compound()?)
            }
            _ => Command::Simple(self.parse_simple()?),
        };

        let mut redirs = Vec::new();
        loop {
            let t = self.peek();
            if t.is_redir() {
                self.next();
                let kind = match t.kind {
                    TokenKind::Append => RedirectKind::Append,
                    TokenKind::Clobber => RedirectKind::Clobber,
                    TokenKind::Read => RedirectKind::Read,
                    TokenKind::Write => RedirectKind::Write,
                    _ => unreachable!(),
                };
                if !self.peek().is_value_start() {
                    return Err(ParseError { want: "file after redirect".into(), got: self.next() });
                }
                let file = self.parse_value()?;
                redirs.push(Redirect { kind, file });
            } else if t.is_value_start() {
                return Err(ParseError { want: "semicolon or newline".into(), got: t });
            } else {
                break;
            }
        }
        set_redirs(&mut cmd, redirs);
        Ok(CleanCommand { cmd })
    }

    fn parse_while(&mut self) -> Result<While, ParseError> {
        let cond = self.parse_command_list()?;
        self.expect("opening brace", TokenKind::BraceOpen)?;
        let body = self.parse_body()?;
        Ok(While { cond, body, redirs: Vec::new() })
    }

    fn parse_for(&mut self) -> Result<For, ParseError> {
        let mut bind: Option<Value> = None;
        let mut vals = Vec::new();
        let mut do_bind = false;
        let mut i = 0;
        while self.peek().is_value_start() {
            let t = self.peek();
            if i == 0 {
                bind = Some(self.parse_value()?);
            } else if i == 1 && t.kind == TokenKind::Arg && t.val == "in" {
                do_bind = true;
                self.next();
            } else {
                vals.push(self.parse_value()?);
            }
            i += 1;
        }

        let bind = if do_bind {
            bind.expect("binding parsed when do_bind is set")
        } else {
            if let Some(b) = bind {
                vals.insert(0, b);
            }
            Value::argument("_")
        };

        self.expect("opening brace", TokenKind::BraceOpen)?;
        let body = self.parse_body()?;
        Ok(For { bind, vals, body, redirs: Vec::new() })
    }

    fn parse_if(&mut self) -> Result<If, ParseError> {
        let cond = self.parse_command_list()?;
        self.expect("opening brace", TokenKind::BraceOpen)?;
        let body = self.parse_body()?;

        let t = self.peek();
        if !(t.kind == TokenKind::Arg && t.val == "else") {
            return Ok(If { cond, body, else_: Vec::new(), redirs: Vec::new() });
        }
        self.next(); // 'else'

        let t = self.peek();
        let else_ = if t.kind == TokenKind::Arg && t.val == "if" {
            self.next();
            let nested = self.parse_if()?;
            vec![TopLevel::CommandList(CommandList {
                lhs: None,
                op: LogOp::And,
                rhs: vec![CleanCommand { cmd: Command::If(nested) }],
            })]
        } else {
            self.expect("opening brace", TokenKind::BraceOpen)?;
            self.parse_body()?
        };

        Ok(If { cond, body, else_, redirs: Vec::new() })
    }

    fn parse_body(&mut self) -> Result<Program, ParseError> {
        let mut xs = Vec::new();
        loop {
            let t = self.peek();
            match t.kind {
                TokenKind::EndStmt => {
                    self.next();
                }
                TokenKind::BraceClose => {
                    self.next();
                    return Ok(xs);
                }
                TokenKind::Eof => return Err(ParseError { want: "closing brace".into(), got: t }),
                TokenKind::Arg if t.val == "func" => {
                    xs.push(TopLevel::FunctionDef(self.parse_func_def()?));
                }
                _ => xs.push(TopLevel::CommandList(self.parse_command_list()?)),
            }
        }
    }

    fn parse_compound(&mut self) -> Result<Compound, ParseError> {
        let mut cmds = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::BraceClose => {
                    self.next();
                    return Ok(Compound { cmds, redirs: Vec::new() });
                }
                TokenKind::EndStmt => {
                    self.next();
                }
                TokenKind::Eof => {
                    return Err(ParseError { want: "closing brace".into(), got: self.peek() })
                }
                _ => cmds.push(TopLevel::CommandList(self.parse_command_list()?)),
            }
        }
    }

    fn parse_simple(&mut self) -> Result<Simple, ParseError> {
        let mut args = vec![self.parse_value()?];
        while self.peek().is_value_start() {
            args.push(self.parse_value()?);
        }
        Ok(Simple { args, redirs: Vec::new() })
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let t = self.next();
        let mut v = match t.kind {
            TokenKind::Arg => Value::Argument(t.val),
            TokenKind::String => Value::String(t.val),
            TokenKind::VarRef | TokenKind::VarFlat | TokenKind::VarLen => {
                let kind = match t.kind {
                    TokenKind::VarFlat => VarRefKind::Flatten,
                    TokenKind::VarLen => VarRefKind::Length,
                    _ => VarRefKind::Expand,
                };
                let indices = if self.peek().kind == TokenKind::BracketOpen {
                    Some(self.parse_indices()?)
                } else {
                    None
                };
                Value::VarRef { ident: t.val, kind, indices }
            }
            TokenKind::ParenOpen => Value::List(self.parse_list()?),
            TokenKind::ProcRead => {
                self.expect("opening brace", TokenKind::BraceOpen)?;
                Value::ProcRedir { direction: ProcRedirDirection::Read, body: self.parse_body()? }
            }
            TokenKind::ProcWrite => {
                self.expect("opening brace", TokenKind::BraceOpen)?;
                Value::ProcRedir { direction: ProcRedirDirection::Write, body: self.parse_body()? }
            }
            TokenKind::ProcRdWr => {
                self.expect("opening brace", TokenKind::BraceOpen)?;
                Value::ProcRedir { direction: ProcRedirDirection::ReadWrite, body: self.parse_body()? }
            }
            TokenKind::ProcSub => self.parse_procsub(&t.val)?,
            _ => return Err(ParseError { want: "value".into(), got: t }),
        };

        if self.peek().kind == TokenKind::Concat {
            self.next();
            let rhs = self.parse_value()?;
            v = Value::Concat(Box::new(v), Box::new(rhs));
        }
        Ok(v)
    }

    fn parse_procsub(&mut self, spelling: &str) -> Result<Value, ParseError> {
        match spelling {
            PROCSUB_BRACE => Ok(Value::ProcSub { separators: None, body: self.parse_body()? }),
            PROCSUB_PAREN => {
                self.expect("opening paren", TokenKind::ParenOpen)?;
                let seps = self.parse_list()?;
                self.expect("opening brace", TokenKind::BraceOpen)?;
                Ok(Value::ProcSub { separators: Some(seps), body: self.parse_body()? })
            }
            PROCSUB_BARE => {
                let word = self.expect("bare word after backtick", TokenKind::Arg)?;
                let body = vec![TopLevel::CommandList(CommandList {
                    lhs: None,
                    op: LogOp::And,
                    rhs: vec![CleanCommand {
                        cmd: Command::Simple(Simple {
                            args: vec![Value::Argument(word.val)],
                            redirs: Vec::new(),
                        }),
                    }],
                })];
                Ok(Value::ProcSub { separators: None, body })
            }
            _ => unreachable!("lexer only emits known procsub spellings"),
        }
    }

    fn parse_indices(&mut self) -> Result<Vec<Value>, ParseError> {
        let mut xs = Vec::new();
        self.next(); // '['
        while self.peek().is_value_start() {
            xs.push(self.parse_value()?);
        }
        self.expect("closing bracket", TokenKind::BracketClose)?;
        Ok(xs)
    }

    fn parse_list(&mut self) -> Result<Vec<Value>, ParseError> {
        let mut xs = Vec::new();
        loop {
            let t = self.peek();
            match t.kind {
                TokenKind::ParenClose => {
                    self.next();
                    return Ok(xs);
                }
                TokenKind::EndStmt => {
                    self.next();
                }
                _ if !t.is_value_start() => {
                    return Err(ParseError { want: "value".into(), got: t });
                }
                _ => xs.push(self.parse_value()?),
            }
        }
    }
}

fn set_redirs(cmd: &mut Command, redirs: Vec<Redirect>) {
    match cmd {
        Command::Simple(c) => c.redirs = redirs,
        Command::Compound(c) => c.redirs = redirs,
        Command::If(c) => c.redirs = redirs,
        Command::While(c) => c.redirs = redirs,
        Command::For(c) => c.redirs = redirs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_pipe_parses() {
        let prog = parse("echo hello | tr a-z A-Z").unwrap();
        assert_eq!(prog.len(), 1);
        match &prog[0] {
            TopLevel::CommandList(cl) => {
                assert!(cl.lhs.is_none());
                assert_eq!(cl.rhs.len(), 2);
            }
            _ => panic!("expected command list"),
        }
    }

    #[test]
    fn logical_chain_is_left_leaning() {
        let prog = parse("true && echo yes || echo no").unwrap();
        match &prog[0] {
            TopLevel::CommandList(cl) => {
                assert_eq!(cl.op, LogOp::Or);
                let lhs = cl.lhs.as_ref().unwrap();
                assert_eq!(lhs.op, LogOp::And);
                assert!(lhs.lhs.is_none());
            }
            _ => panic!("expected command list"),
        }
    }

    #[test]
    fn for_sugar_with_in_keyword() {
        let prog = parse("for x in a b c { echo $x }").unwrap();
        match &prog[0] {
            TopLevel::CommandList(cl) => match &cl.rhs[0].cmd {
                Command::For(f) => {
                    assert_eq!(f.bind, Value::Argument("x".into()));
                    assert_eq!(f.vals.len(), 3);
                }
                _ => panic!("expected for"),
            },
            _ => panic!("expected command list"),
        }
    }

    #[test]
    fn for_sugar_without_in_keyword_binds_underscore() {
        let prog = parse("for a b c { echo $_ }").unwrap();
        match &prog[0] {
            TopLevel::CommandList(cl) => match &cl.rhs[0].cmd {
                Command::For(f) => {
                    assert_eq!(f.bind, Value::Argument("_".into()));
                    assert_eq!(f.vals.len(), 3);
                }
                _ => panic!("expected for"),
            },
            _ => panic!("expected command list"),
        }
    }

    #[test]
    fn redirect_attaches_to_command() {
        let prog = parse("echo x > foo").unwrap();
        match &prog[0] {
            TopLevel::CommandList(cl) => match &cl.rhs[0].cmd {
                Command::Simple(s) => {
                    assert_eq!(s.redirs.len(), 1);
                    assert_eq!(s.redirs[0].kind, RedirectKind::Write);
                }
                _ => panic!("expected simple"),
            },
            _ => panic!("expected command list"),
        }
    }

    #[test]
    fn variable_index_round_trips() {
        let prog = parse("echo $xs[1..3]").unwrap();
        match &prog[0] {
            TopLevel::CommandList(cl) => match &cl.rhs[0].cmd {
                Command::Simple(s) => match &s.args[1] {
                    Value::VarRef { ident, indices, .. } => {
                        assert_eq!(ident, "xs");
                        assert!(indices.is_some());
                    }
                    _ => panic!("expected varref"),
                },
                _ => panic!("expected simple"),
            },
            _ => panic!("expected command list"),
        }
    }

    #[test]
    fn unexpected_token_is_parse_error() {
        let err = parse("echo > ").unwrap_err();
        assert_eq!(err.want, "file after redirect");
    }
}
