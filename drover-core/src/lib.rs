//! # DROVER: Command-Line Dispatch Engine
//!
//! Drover turns a declarative tree of named commands (each with positional
//! parameters, optional flags, and child sub-commands) plus a raw command
//! line into a validated handler invocation.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Command Line → Tokenizer → Parser → Dispatcher → Context → Handler
//! ```
//!
//! ### Stage 1: Tokenization (Lexical Analysis)
//!
//! The [`tokenizer`] module is a generic regex-ordered lexer: an ordered list
//! of `(pattern, kind, ignore)` rules where the first match wins. The
//! command-line rule set (quoted strings with escapes, long flags, short
//! flag clusters, bare words) lives in [`tokenizer::rules`].
//!
//! ### Stage 2: Binding (Parsing)
//!
//! The [`parser`] module binds tokens to a target command's declared
//! parameters and flags by position and name, applying quoting, flag syntax,
//! and the positional defaulting rules, producing an ordered element list
//! that covers every token.
//!
//! ### Stage 3: Resolution and Validation (Dispatch)
//!
//! The [`dispatch`] module walks the command tree by consuming leading plain
//! tokens as sub-command names, enforces permission requirements, validates
//! the bound elements against the command's contract in a fixed order, and
//! invokes the handler with an immutable [`Context`](dispatch::Context).
//!
//! ## Command Model
//!
//! The [`command`] module holds the static side: the [`Value`](command::Value)
//! union, the caller-supplied [`TypeRegistry`](command::TypeRegistry) of
//! named parse functions, [`Parameter`](command::Parameter) and
//! [`Flag`](command::Flag) descriptors, and the validating
//! [`CommandBuilder`](command::CommandBuilder).
//!
//! ## Error Handling
//!
//! Everything that crosses the dispatch boundary is a tagged result
//! ([`dispatch::Outcome`]) with stable integer codes; only lexical failures
//! and rejected raw input surface as [`Error`]. Handler panics are caught at
//! the boundary and downgraded to an `exception_during_dispatch` result.
//!
//! ## Concurrency
//!
//! The engine is synchronous and single-threaded. Tokenizers and contexts
//! are created per dispatch; a built command tree is read-only and may be
//! shared across threads provided no caller mutates it after publication.
//! That is a caller contract, not something the engine enforces.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod parser;
pub mod tokenizer;

// Re-exports
pub use command::{
    Command, CommandBuildError, CommandBuilder, Flag, Handler, OperandRelation, Parameter,
    Requirement, TypeParser, TypeRegistry, Value, ValueKind,
};
pub use config::EngineConfig;
pub use dispatch::{
    Context, DispatchError, DispatchErrorKind, DispatchHooks, Dispatcher, Outcome, Reply,
    SearchError, Source,
};
pub use error::{EngineResult, Error};
pub use help::{HelpFormatter, PlainHelpFormatter};
pub use parser::{CommandElement, CommandLineParser, ElementKey, ParseError};
pub use tokenizer::{Token, TokenRule, Tokenizer, TokenizerError};

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
