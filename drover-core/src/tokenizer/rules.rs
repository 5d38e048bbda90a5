//! The command-line rule set.
//!
//! Four rules, registered most specific first:
//!
//! 1. Quoted string: either quote style, escape set `\n \t \r \b \\ \' \"`,
//!    no unescaped embedded quote. Adjacent unescaped quotes therefore lex as
//!    separate tokens (`'it''s` is `'it'` followed by the word `'s`).
//! 2. Long flag: `--name` or `--name=`.
//! 3. Short flag: `-x` or a cluster `-xyz`.
//! 4. Word: any other non-whitespace run.
//!
//! The compiled rules are shared behind a static; `Regex` handles are
//! internally ref-counted, so cloning the set per tokenizer is cheap.

use lazy_static::lazy_static;

use super::token::{TokenRule, Tokenizer};

/// Kind tag for quoted string literals.
pub const QUOTED: i32 = 0;
/// Kind tag for `--name` / `--name=` flags.
pub const LONG_FLAG: i32 = 1;
/// Kind tag for `-x` flags and `-xyz` clusters (`?` counts as a letter so
/// `-?` can reach help interception).
pub const SHORT_FLAG: i32 = 2;
/// Kind tag for bare words.
pub const WORD: i32 = 3;

const QUOTED_PATTERN: &str = r#""(?:\\[ntrb\\'"]|[^"\\])*"|'(?:\\[ntrb\\'"]|[^'\\])*'"#;
const LONG_FLAG_PATTERN: &str = r"--[A-Za-z][A-Za-z0-9_-]*=?";
const SHORT_FLAG_PATTERN: &str = r"-[A-Za-z?]+";
const WORD_PATTERN: &str = r"\S+";

lazy_static! {
    static ref COMMAND_LINE_RULES: Vec<TokenRule> = vec![
        TokenRule::new(QUOTED_PATTERN, QUOTED, false).expect("static rule must compile"),
        TokenRule::new(LONG_FLAG_PATTERN, LONG_FLAG, false).expect("static rule must compile"),
        TokenRule::new(SHORT_FLAG_PATTERN, SHORT_FLAG, false).expect("static rule must compile"),
        TokenRule::new(WORD_PATTERN, WORD, false).expect("static rule must compile"),
    ];
}

/// A tokenizer loaded with the command-line rules over `line`.
pub fn command_line_tokenizer(line: &str) -> Tokenizer {
    Tokenizer::with_rules(COMMAND_LINE_RULES.clone(), line)
}

/// Strips surrounding quotes and processes the escape set. Text that is not
/// a quoted literal is returned unchanged.
pub fn unquote(raw: &str) -> String {
    let stripped = match raw.as_bytes() {
        [b'"', .., b'"'] | [b'\'', .., b'\''] if raw.len() >= 2 => &raw[1..raw.len() - 1],
        _ => return raw.to_string(),
    };

    let mut out = String::with_capacity(stripped.len());
    let mut chars = stripped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                // lexer only admits the known escapes; be lenient elsewhere
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Wraps `word` in double quotes, escaping as needed, so it lexes back as a
/// single quoted token.
pub fn quote_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 2);
    out.push('"');
    for c in word.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `word` must be quoted to survive re-tokenization as one token.
pub fn needs_quoting(tokenizer: &Tokenizer, word: &str) -> bool {
    if word.is_empty() {
        return true;
    }
    tokenizer.independent(word).is_none()
}
