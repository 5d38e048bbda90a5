//! Core token types and the rule-driven tokenizer.

use regex::Regex;
use thiserror::Error;

/// Default number of characters of unmatched input shown in a
/// [`TokenizerError::NoMatch`].
pub const DEFAULT_FRAGMENT_LIMIT: usize = 32;

/// A single lexed token: an integer kind tag plus the matched text.
///
/// Kind tags are owned by whoever registered the rules; the tokenizer only
/// carries them through. The command-line tags live in
/// [`rules`](super::rules).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: i32,
    pub text: String,
}

impl Token {
    pub fn new(kind: i32, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A single lexing rule: a pattern anchored at the start of the remaining
/// source, the kind tag of the tokens it produces, and whether matches are
/// silently discarded.
#[derive(Debug, Clone)]
pub struct TokenRule {
    pattern: Regex,
    kind: i32,
    ignore: bool,
}

impl TokenRule {
    /// Compiles a rule. The pattern is anchored with `^` if it is not
    /// already.
    pub fn new(pattern: &str, kind: i32, ignore: bool) -> Result<Self, TokenizerError> {
        let anchored = if pattern.starts_with('^') {
            pattern.to_string()
        } else {
            format!("^(?:{})", pattern)
        };
        let compiled = Regex::new(&anchored).map_err(|e| TokenizerError::InvalidRule {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern: compiled,
            kind,
            ignore,
        })
    }

    pub fn kind(&self) -> i32 {
        self.kind
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    /// A rule pattern failed to compile at registration time.
    #[error("invalid token rule `{pattern}`: {message}")]
    InvalidRule { pattern: String, message: String },
    /// Non-empty input that no registered rule matches. Fatal for the
    /// current parse attempt.
    #[error("no token rule matches input starting at `{fragment}`")]
    NoMatch { fragment: String },
}

/// Rule-driven lexer over a single source string.
///
/// The owner registers rules once (most specific first), sets a source, and
/// pulls tokens with [`next`](Tokenizer::next) until it returns `Ok(None)`.
/// Emitted tokens are retained in [`history`](Tokenizer::history) for
/// introspection only; replacing the source resets the cursor and clears the
/// history.
///
/// Holds a mutable cursor over the remaining source. Not safe for concurrent
/// use; construct one per parse.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    rules: Vec<TokenRule>,
    remaining: String,
    history: Vec<Token>,
    fragment_limit: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            remaining: String::new(),
            history: Vec::new(),
            fragment_limit: DEFAULT_FRAGMENT_LIMIT,
        }
    }

    /// Builds a tokenizer over `source` from an already-compiled rule list.
    pub fn with_rules(rules: Vec<TokenRule>, source: &str) -> Self {
        let mut tokenizer = Self::new();
        tokenizer.rules = rules;
        tokenizer.set_source(source);
        tokenizer
    }

    /// Registers a rule. Registration order is match-priority order.
    pub fn register(&mut self, pattern: &str, kind: i32, ignore: bool) -> Result<(), TokenizerError> {
        self.rules.push(TokenRule::new(pattern, kind, ignore)?);
        Ok(())
    }

    /// Replaces the source, resetting the cursor and clearing the emitted
    /// token history.
    pub fn set_source(&mut self, source: &str) {
        self.remaining = source.to_string();
        self.history.clear();
    }

    pub fn set_fragment_limit(&mut self, limit: usize) {
        self.fragment_limit = limit;
    }

    /// The not-yet-consumed tail of the source.
    pub fn remaining(&self) -> &str {
        &self.remaining
    }

    /// Tokens emitted so far, for introspection and debugging.
    pub fn history(&self) -> &[Token] {
        &self.history
    }

    /// Produces the next token, skipping whitespace between tokens.
    pub fn next(&mut self) -> Result<Option<Token>, TokenizerError> {
        self.next_token(true)
    }

    /// Produces the next non-ignored token.
    ///
    /// Rules are tried in registration order against the start of the
    /// remaining source; the first match wins and its text is consumed.
    /// Matches of `ignore` rules are discarded and lexing continues, so
    /// ignorable input never surfaces in the stream. Returns `Ok(None)` only
    /// once the remaining source is empty; a non-empty remainder with no
    /// matching rule is a [`TokenizerError::NoMatch`].
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn next_token(&mut self, skip_whitespace: bool) -> Result<Option<Token>, TokenizerError> {
        loop {
            if skip_whitespace {
                self.remaining = self.remaining.trim_start().to_string();
            }
            if self.remaining.is_empty() {
                return Ok(None);
            }

            let matched = self.rules.iter().find_map(|rule| {
                rule.pattern
                    .find(&self.remaining)
                    .filter(|m| m.end() > 0)
                    .map(|m| (m.end(), rule.kind, rule.ignore))
            });

            match matched {
                Some((end, kind, ignore)) => {
                    let text = self.remaining[..end].to_string();
                    self.remaining = self.remaining[end..].to_string();
                    if ignore {
                        tracing::debug!(kind, %text, "discarding ignorable token");
                        continue;
                    }
                    let token = Token::new(kind, text);
                    self.history.push(token.clone());
                    return Ok(Some(token));
                }
                None => {
                    let fragment: String =
                        self.remaining.chars().take(self.fragment_limit).collect();
                    let error = TokenizerError::NoMatch { fragment };
                    tracing::error!("{}", error);
                    return Err(error);
                }
            }
        }
    }

    /// Tests whether a whole string matches some rule completely.
    ///
    /// Used to classify an already-extracted substring, e.g. to decide
    /// whether a word must be quoted to survive re-tokenization. Does not
    /// touch the cursor or history.
    pub fn independent(&self, text: &str) -> Option<Token> {
        self.rules.iter().find_map(|rule| {
            rule.pattern
                .find(text)
                .filter(|m| m.start() == 0 && m.end() == text.len())
                .map(|_| Token::new(rule.kind, text))
        })
    }
}
