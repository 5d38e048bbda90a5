//! The dispatch result taxonomy.
//!
//! Two independent code spaces cross the dispatch boundary as tagged results
//! rather than errors: command-search failures (no leaf was even identified)
//! and dispatch failures (a leaf was identified but could not or did not
//! run). The integer codes are stable; embedding code switches on them.

use thiserror::Error;

use crate::command::value::Value;

/// Failures before any command is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[repr(i32)]
pub enum SearchError {
    /// The first token is not a plain name.
    InvalidCommandName = 0,
    /// No top-level command matches the first token.
    CommandNotFound = 1,
}

impl SearchError {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Failures once a leaf command is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumIter)]
#[strum(serialize_all = "snake_case")]
#[repr(i32)]
pub enum DispatchErrorKind {
    MissingFlag = 10,
    FlagDoesNotAcceptValue = 11,
    FlagMissingValue = 12,
    NotEnoughArgs = 13,
    InvalidInput = 14,
    ExceptionDuringDispatch = 15,
    CommandRequiresSub = 16,
    ParameterAfterFlag = 17,
    FlagAfterParameter = 18,
}

impl DispatchErrorKind {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A typed dispatch failure: the kind, the command it happened on, a
/// user-facing message, and the element position for ordering violations.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("`{command}`: {message}")]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub command: String,
    pub message: String,
    pub position: Option<usize>,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind, command: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            command: command.to_string(),
            message: message.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

/// What a handler may hand back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A bare status code.
    Code(i32),
    /// An error wrapper the embedding code unpacks.
    Err(String),
    /// A structured value.
    Value(Value),
}

/// The outcome of one dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler ran; its return value, if any.
    Dispatched(Option<Reply>),
    /// A help flag intercepted the dispatch. Not an error.
    HelpShown,
    /// The before-dispatch hook vetoed.
    NotDispatched,
    /// The source failed a permission requirement.
    RequirementNotMet,
    /// No command was identified.
    Search(SearchError),
    /// A command was identified but did not run (or its handler failed).
    Error(DispatchError),
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Dispatched(_) | Outcome::HelpShown)
    }
}
