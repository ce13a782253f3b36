//! `quote`: writes each argument shell-quoted, space-separated.

use std::io::Write;

use crate::builtins::BuiltinOutcome;
use crate::interpreter::context::{Closables, EvalContext};
use crate::interpreter::errors::ShellError;

pub fn cmd_quote(argv: &[String], ctx: &mut EvalContext, _closables: &mut Closables) -> Result<BuiltinOutcome, ShellError> {
    let quoted: Vec<String> = argv[1..].iter().map(|s| single_quote(s)).collect();
    writeln!(ctx.stdout, "{}", quoted.join(" "))?;
    Ok(BuiltinOutcome::Code(0))
}

fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::single_quote;

    #[test]
    fn escapes_embedded_quote() {
        assert_eq!(single_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn plain_word_unchanged_inside_quotes() {
        assert_eq!(single_quote("hello"), "'hello'");
    }
}
