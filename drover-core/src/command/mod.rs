//! # Command Model
//!
//! The static description of what a command line may bind to: typed values,
//! positional parameters, flags, and the command tree itself.
//!
//! ## Component Structure
//!
//! * [`value`]: The closed [`Value`] union, parse functions, and the
//!   caller-supplied [`TypeRegistry`] of named parsers
//! * [`parameter`]: [`Parameter`] (positional slot) and [`Flag`] (named slot
//!   with aliases and conditional requiredness)
//! * [`command`]: [`Command`] tree nodes and the validating
//!   [`CommandBuilder`]
//!
//! ## Lifecycle
//!
//! Command trees are built once at startup through the builder and treated as
//! immutable afterwards. Sharing a built tree across threads is sound as long
//! as no caller mutates it after publication; this is a caller contract, not
//! something the model enforces.

pub mod command;
pub mod parameter;
pub mod value;

pub use command::{Command, CommandBuildError, CommandBuilder, Handler, OperandRelation, Requirement};
pub use parameter::{Flag, Parameter};
pub use value::{TypeParser, TypeRegistry, Value, ValueKind};
