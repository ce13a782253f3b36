//! Streaming lexer.
//!
//! Runs as a tail-calling state machine over the source string, emitting
//! tokens as soon as they're recognized. The public entry point spawns the
//! machine on its own thread and hands back an iterator that pulls tokens
//! off a rendezvous channel, so the parser never has to wait for more of
//! the source to be lexed than its one-token lookahead requires.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread;

use crate::token::{is_eol, is_metachar, is_ref_rune, Token, TokenKind};

/// Disambiguates lexical modes where the same character closes different
/// things (`}` ends a process-substitution body or nothing at all; `]`
/// closes an index only while inside brackets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NestTag {
    DoubleQuote,
    ProcBraces,
    Brackets,
}

/// How a process-substitution token was spelled, carried in [`Token::val`]
/// so the parser knows whether separators and/or a brace body follow.
pub const PROCSUB_BRACE: &str = "brace";
pub const PROCSUB_PAREN: &str = "paren";
pub const PROCSUB_BARE: &str = "bare";

struct Lexer {
    input: Vec<char>,
    out: SyncSender<Token>,
    pos: usize,
    start: usize,
    stack: Vec<NestTag>,
}

type LexFn = fn(&mut Lexer) -> Option<StateFn>;

enum StateFn {
    Default,
    Arg,
    VarRef,
    StringSingle,
    StringRaw,
    StringDouble,
    MaybeConcat,
    Backtick,
}

const EOF: char = '\u{0}';

impl Lexer {
    fn new(s: &str, out: SyncSender<Token>) -> Self {
        Lexer { input: s.chars().collect(), out, pos: 0, start: 0, stack: Vec::new() }
    }

    fn next(&mut self) -> char {
        if self.pos >= self.input.len() {
            return EOF;
        }
        let c = self.input[self.pos];
        self.pos += 1;
        c
    }

    fn peek(&self) -> char {
        if self.pos >= self.input.len() {
            EOF
        } else {
            self.input[self.pos]
        }
    }

    fn peek_at(&self, offset: usize) -> char {
        let i = self.pos + offset;
        if i >= self.input.len() {
            EOF
        } else {
            self.input[i]
        }
    }

    fn backup(&mut self) {
        self.pos -= 1;
    }

    fn cur_text(&self) -> String {
        self.input[self.start..self.pos].iter().collect()
    }

    fn emit(&mut self, kind: TokenKind) {
        let val = self.cur_text();
        let _ = self.out.send(Token::new(kind, val, self.start));
        self.start = self.pos;
    }

    fn emit_val(&mut self, kind: TokenKind, val: impl Into<String>) {
        let _ = self.out.send(Token::new(kind, val, self.start));
        self.start = self.pos;
    }

    fn error(&mut self, msg: impl Into<String>) {
        let _ = self.out.send(Token::new(TokenKind::Error, msg.into(), self.start));
    }

    fn in_quotes(&self) -> bool {
        self.stack.last() == Some(&NestTag::DoubleQuote)
    }

    fn run(mut self) {
        let mut state = StateFn::Default;
        loop {
            let f: LexFn = match state {
                StateFn::Default => lex_default,
                StateFn::Arg => lex_arg,
                StateFn::VarRef => lex_var_ref,
                StateFn::StringSingle => lex_string_single,
                StateFn::StringRaw => lex_string_raw,
                StateFn::StringDouble => lex_string_double,
                StateFn::MaybeConcat => lex_maybe_concat,
                StateFn::Backtick => lex_backtick,
            };
            match f(&mut self) {
                Some(next) => state = next,
                None => return,
            }
        }
    }
}

/// Spawn the lexer on its own thread; returns an iterator of tokens that
/// blocks until the next one is ready. No token is ever produced after a
/// terminating `Eof`/`Error`.
pub fn lex(src: &str) -> impl Iterator<Item = Token> {
    let (tx, rx) = sync_channel::<Token>(0);
    let src = src.to_string();
    thread::Builder::new()
        .name("andy-lexer".into())
        .spawn(move || Lexer::new(&src, tx).run())
        .expect("spawn lexer thread");
    LexIter { rx, done: false }
}

struct LexIter {
    rx: Receiver<Token>,
    done: bool,
}

impl Iterator for LexIter {
    type Item = Token;
    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        match self.rx.recv() {
            Ok(t) => {
                if matches!(t.kind, TokenKind::Eof | TokenKind::Error) {
                    self.done = true;
                }
                Some(t)
            }
            Err(_) => {
                self.done = true;
                None
            }
        }
    }
}

fn has_prefix(l: &Lexer, s: &str, from: usize) -> bool {
    let chars: Vec<char> = s.chars().collect();
    if from + chars.len() > l.input.len() {
        return false;
    }
    l.input[from..from + chars.len()] == chars[..]
}

fn lex_default(l: &mut Lexer) -> Option<StateFn> {
    loop {
        let start_of_rune = l.pos;
        let r = l.next();
        if is_eol(r) {
            l.emit(TokenKind::EndStmt);
            continue;
        }
        if r == EOF {
            l.emit(TokenKind::Eof);
            return None;
        }
        if r == '`' {
            l.backup();
            return Some(StateFn::Backtick);
        }
        if has_prefix(l, "<>{", start_of_rune) {
            l.pos = start_of_rune + 3;
            l.stack.push(NestTag::ProcBraces);
            l.emit(TokenKind::ProcRdWr);
            continue;
        }
        if has_prefix(l, "<{", start_of_rune) {
            l.pos = start_of_rune + 2;
            l.stack.push(NestTag::ProcBraces);
            l.emit(TokenKind::ProcRead);
            continue;
        }
        if has_prefix(l, ">{", start_of_rune) {
            l.pos = start_of_rune + 2;
            l.stack.push(NestTag::ProcBraces);
            l.emit(TokenKind::ProcWrite);
            continue;
        }
        if has_prefix(l, "r#", start_of_rune) || (r == 'r' && l.peek() == '\'') {
            l.backup();
            return Some(StateFn::StringRaw);
        }
        match r {
            '\'' => {
                l.backup();
                return Some(StateFn::StringSingle);
            }
            '"' => {
                l.backup();
                return Some(StateFn::StringDouble);
            }
            '&' => match l.next() {
                '&' => l.emit(TokenKind::LAnd),
                _ => {
                    l.error("Implement & operator");
                    return None;
                }
            },
            '|' => match l.peek() {
                '|' => {
                    l.next();
                    l.emit(TokenKind::LOr);
                }
                _ => l.emit(TokenKind::Pipe),
            },
            '<' => l.emit(TokenKind::Read),
            '>' => match l.peek() {
                '!' => {
                    l.next();
                    l.emit(TokenKind::Clobber);
                }
                '>' => {
                    l.next();
                    l.emit(TokenKind::Append);
                }
                _ => l.emit(TokenKind::Write),
            },
            '{' => l.emit(TokenKind::BraceOpen),
            '}' => {
                l.emit(TokenKind::BraceClose);
                if l.stack.last() == Some(&NestTag::ProcBraces) {
                    l.stack.pop();
                    if l.in_quotes() {
                        return Some(StateFn::StringDouble);
                    }
                    return Some(StateFn::MaybeConcat);
                }
            }
            '(' => l.emit(TokenKind::ParenOpen),
            ')' => {
                l.emit(TokenKind::ParenClose);
                return Some(StateFn::MaybeConcat);
            }
            ']' if l.stack.last() == Some(&NestTag::Brackets) => {
                l.emit(TokenKind::BracketClose);
                l.stack.pop();
                if l.in_quotes() {
                    return Some(StateFn::StringDouble);
                }
                return Some(StateFn::MaybeConcat);
            }
            '#' => {
                while l.peek() != '\n' && l.peek() != EOF {
                    l.next();
                }
                l.start = l.pos;
                continue;
            }
            '$' => {
                l.backup();
                return Some(StateFn::VarRef);
            }
            c if c.is_whitespace() => {
                l.start = l.pos;
                continue;
            }
            _ => {
                l.backup();
                return Some(StateFn::Arg);
            }
        }
    }
}

fn escape_rune(r: char) -> Result<char, String> {
    if r.is_whitespace() || is_metachar(r) {
        return Ok(r);
    }
    let mapped = match r {
        '\\' => '\\',
        '0' => '\0',
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{b}',
        _ => return Err(format!("invalid escape sequence \u{2018}\\{}\u{2019}", r)),
    };
    Ok(mapped)
}

fn lex_arg(l: &mut Lexer) -> Option<StateFn> {
    let mut buf = String::new();
    loop {
        let r = l.next();
        if r == '\\' {
            match escape_rune(l.next()) {
                Ok(c) => buf.push(c),
                Err(msg) => {
                    l.error(msg);
                    return None;
                }
            }
            continue;
        }
        if r == ']' && l.stack.last() == Some(&NestTag::Brackets) {
            l.backup();
            l.emit_val(TokenKind::Arg, buf);
            return Some(StateFn::Default);
        }
        if r.is_whitespace() || is_metachar(r) || is_eol(r) || r == EOF {
            l.backup();
            l.emit_val(TokenKind::Arg, buf);
            return Some(StateFn::MaybeConcat);
        }
        buf.push(r);
    }
}

fn lex_var_ref(l: &mut Lexer) -> Option<StateFn> {
    l.next(); // consume '$'

    let mut kind = if l.in_quotes() { TokenKind::VarFlat } else { TokenKind::VarRef };
    match l.peek() {
        '^' => {
            if l.in_quotes() {
                l.error("The \u{2018}^\u{2019} variable prefix is redundant in double-quoted strings");
                return None;
            }
            kind = TokenKind::VarFlat;
            l.next();
        }
        '#' => {
            kind = TokenKind::VarLen;
            l.next();
        }
        _ => {}
    }

    let braces = if l.peek() == '{' {
        l.next();
        true
    } else {
        false
    };
    l.start = l.pos;

    while is_ref_rune(l.peek()) {
        l.next();
    }

    if braces && l.peek() != '}' {
        l.error(format!("unterminated braced variable \u{2018}${{{}\u{2019}", l.cur_text()));
        return None;
    }
    l.emit(kind);
    if braces {
        l.next(); // consume closing brace
    }

    if l.peek() == '[' {
        l.next();
        l.emit_val(TokenKind::BracketOpen, "[");
        l.stack.push(NestTag::Brackets);
        return Some(StateFn::Default);
    }
    if l.in_quotes() {
        return Some(StateFn::StringDouble);
    }
    Some(StateFn::MaybeConcat)
}

fn lex_string_raw(l: &mut Lexer) -> Option<StateFn> {
    l.next(); // consume 'r'
    let mut n = 0;
    while l.peek() == '#' {
        l.next();
        n += 1;
    }
    if l.next() != '\'' {
        l.error("malformed raw string delimiter");
        return None;
    }
    l.start = l.pos;

    loop {
        let mut found = None;
        let mut i = l.pos;
        while i < l.input.len() {
            if l.input[i] == '\'' {
                found = Some(i);
                break;
            }
            i += 1;
        }
        let quote_at = match found {
            Some(i) => i,
            None => {
                l.error("unterminated string");
                return None;
            }
        };
        let content_end = quote_at;
        let mut j = quote_at + 1;
        let mut hashes = 0;
        while j < l.input.len() && l.input[j] == '#' {
            j += 1;
            hashes += 1;
        }
        if hashes == n {
            let end = l.pos;
            let _ = end;
            let text: String = l.input[l.start..content_end].iter().collect();
            l.pos = j;
            l.emit_val(TokenKind::String, text);
            return Some(StateFn::MaybeConcat);
        }
        l.pos = j;
    }
}

fn lex_string_single(l: &mut Lexer) -> Option<StateFn> {
    l.next(); // consume opening quote
    l.start = l.pos;
    let mut i = l.pos;
    while i < l.input.len() && l.input[i] != '\'' {
        i += 1;
    }
    if i >= l.input.len() {
        l.error("unterminated string");
        return None;
    }
    l.pos = i;
    l.emit(TokenKind::String);
    l.next(); // consume closing quote
    Some(StateFn::MaybeConcat)
}

fn lex_string_double(l: &mut Lexer) -> Option<StateFn> {
    if l.in_quotes() {
        l.emit_val(TokenKind::Concat, "");
        l.stack.pop();
    } else {
        l.next(); // consume opening quote
        l.stack.push(NestTag::DoubleQuote);
    }

    let mut buf = String::new();
    loop {
        let r = l.next();
        match r {
            EOF => {
                l.error("unterminated string");
                return None;
            }
            '\\' => match escape_rune(l.next()) {
                Ok(c) => buf.push(c),
                Err(msg) => {
                    l.error(msg);
                    return None;
                }
            },
            '`' if l.peek() == '{' => {
                l.backup();
                l.emit_val(TokenKind::String, buf);
                return Some(StateFn::Backtick);
            }
            '$' => {
                l.backup();
                l.emit_val(TokenKind::String, buf);
                return Some(StateFn::VarRef);
            }
            '"' => {
                l.stack.pop();
                l.emit_val(TokenKind::String, buf);
                return Some(StateFn::MaybeConcat);
            }
            _ => buf.push(r),
        }
    }
}

fn lex_maybe_concat(l: &mut Lexer) -> Option<StateFn> {
    let r = l.peek();
    if r.is_whitespace() || is_eol(r) || r == ')' || r == '}' || r == ']' || r == EOF {
        return Some(StateFn::Default);
    }

    l.emit_val(TokenKind::Concat, "");

    if has_prefix(l, "<>{", l.pos) {
        l.pos += 3;
        l.stack.push(NestTag::ProcBraces);
        l.emit_val(TokenKind::ProcRdWr, "");
        return Some(StateFn::Default);
    }
    if has_prefix(l, "<{", l.pos) {
        l.pos += 2;
        l.stack.push(NestTag::ProcBraces);
        l.emit_val(TokenKind::ProcRead, "");
        return Some(StateFn::Default);
    }
    if has_prefix(l, ">{", l.pos) {
        l.pos += 2;
        l.stack.push(NestTag::ProcBraces);
        l.emit_val(TokenKind::ProcWrite, "");
        return Some(StateFn::Default);
    }
    if r == '`' {
        return Some(StateFn::Backtick);
    }
    if has_prefix(l, "r#", l.pos) || (r == 'r' && l.peek_at(1) == '\'') {
        return Some(StateFn::StringRaw);
    }
    match r {
        '\'' => Some(StateFn::StringSingle),
        '"' => Some(StateFn::StringDouble),
        '(' => Some(StateFn::Default),
        '$' => Some(StateFn::VarRef),
        _ => Some(StateFn::Default),
    }
}

/// After a backtick: `{` opens a brace-bodied process substitution, `(`
/// opens a separator list ahead of a brace body, whitespace makes the
/// backtick a plain one-character argument, and anything else reads a
/// single bare word as a one-command process-substitution body.
fn lex_backtick(l: &mut Lexer) -> Option<StateFn> {
    l.next(); // consume '`'
    match l.peek() {
        '{' => {
            l.next();
            l.stack.push(NestTag::ProcBraces);
            l.emit_val(TokenKind::ProcSub, PROCSUB_BRACE);
            Some(StateFn::Default)
        }
        '(' => {
            l.emit_val(TokenKind::ProcSub, PROCSUB_PAREN);
            Some(StateFn::Default)
        }
        c if c.is_whitespace() || c == EOF => {
            l.emit_val(TokenKind::Arg, "`");
            Some(StateFn::MaybeConcat)
        }
        _ => {
            l.start = l.pos;
            l.emit_val(TokenKind::ProcSub, PROCSUB_BARE);
            Some(StateFn::Arg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).map(|t| t.kind).collect()
    }

    #[test]
    fn simple_pipe() {
        let ks = kinds("echo hello | tr a-z A-Z");
        assert_eq!(
            ks,
            vec![
                TokenKind::Arg,
                TokenKind::Arg,
                TokenKind::Pipe,
                TokenKind::Arg,
                TokenKind::Arg,
                TokenKind::Arg,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn logical_operators() {
        let ks = kinds("true && echo yes || echo no");
        assert!(ks.contains(&TokenKind::LAnd));
        assert!(ks.contains(&TokenKind::LOr));
        assert_eq!(ks.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn redirect_operators() {
        let toks: Vec<Token> = lex("echo a > b >> c >! d < e").collect();
        let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::Write));
        assert!(kinds.contains(&TokenKind::Append));
        assert!(kinds.contains(&TokenKind::Clobber));
        assert!(kinds.contains(&TokenKind::Read));
    }

    #[test]
    fn var_ref_with_index() {
        let toks: Vec<Token> = lex("echo $xs[1..3]").collect();
        let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::VarRef));
        assert!(kinds.contains(&TokenKind::BracketOpen));
        assert!(kinds.contains(&TokenKind::BracketClose));
    }

    #[test]
    fn double_quoted_with_embedded_var() {
        let toks: Vec<Token> = lex("echo \"a$b c\"").collect();
        let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::String));
        assert!(kinds.contains(&TokenKind::VarFlat));
        assert!(kinds.contains(&TokenKind::Concat));
    }

    #[test]
    fn unterminated_string_errors() {
        let toks: Vec<Token> = lex("echo 'abc").collect();
        assert_eq!(toks.last().unwrap().kind, TokenKind::Error);
    }

    #[test]
    fn positions_are_monotonic() {
        let toks: Vec<Token> = lex("echo hello | tr a-z A-Z; set x y z").collect();
        for pair in toks.windows(2) {
            assert!(pair[1].pos >= pair[0].pos);
        }
    }

    #[test]
    fn procsub_brace_token() {
        let toks: Vec<Token> = lex("`{ echo hi }").collect();
        assert_eq!(toks[0].kind, TokenKind::ProcSub);
        assert_eq!(toks[0].val, PROCSUB_BRACE);
    }

    #[test]
    fn procsub_paren_seps_token() {
        let toks: Vec<Token> = lex("`(:){ echo hi }").collect();
        assert_eq!(toks[0].kind, TokenKind::ProcSub);
        assert_eq!(toks[0].val, PROCSUB_PAREN);
    }
}
