//! # Tokenizer Component
//!
//! The Tokenizer component performs lexical analysis of a command line,
//! transforming raw text into a stream of typed tokens for the parser.
//!
//! ## Design Principles
//!
//! * **Rule-Driven**: Lexing is defined entirely by an ordered list of
//!   `(pattern, kind, ignore)` rules registered by the owner. The tokenizer
//!   itself knows nothing about command lines; the concrete rule set lives in
//!   [`rules`].
//! * **First Match Wins**: Rules are tried in registration order against the
//!   start of the remaining source, so owners register the most specific
//!   patterns first (a quoted string before a bare word).
//! * **Transparent Skipping**: Rules flagged as ignorable (comments in other
//!   grammars) are consumed without ever surfacing in the token stream.
//! * **Single Owner**: A tokenizer holds a mutable cursor over its source and
//!   is not safe for concurrent use; each parse constructs its own.
//!
//! ## Component Structure
//!
//! * [`token`]: Core token types and the tokenizer implementation
//! * [`rules`]: The command-line rule set (quoted strings, flags, words)
//!
//! ## Position in the Pipeline
//!
//! ```text
//! Command Line → Tokenizer → Parser → Dispatcher → Handler
//! ```
//!
//! ## Error Handling
//!
//! A non-empty remainder that no rule matches is a fatal
//! [`TokenizerError`](token::TokenizerError) carrying the offending fragment,
//! truncated for display.

pub mod rules;
pub mod token;

pub use token::{Token, TokenRule, Tokenizer, TokenizerError};
