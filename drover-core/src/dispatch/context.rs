//! The invoking source and the per-dispatch context handed to handlers.

use crate::command::command::Command;
use crate::command::value::Value;
use crate::parser::element::CommandElement;

/// The external actor issuing a command line.
///
/// The engine calls these for permission checks and user-visible output; it
/// never implements them.
pub trait Source {
    fn has_permission(&self, node: &str) -> bool;
    fn print(&self, message: &str);
    fn print_err(&self, message: &str);
}

/// Immutable per-dispatch view binding a source, the resolved command, and
/// its bound elements. Created fresh for each dispatch and discarded after.
pub struct Context<'a> {
    source: &'a dyn Source,
    command: &'a Command,
    elements: &'a [CommandElement],
}

impl<'a> Context<'a> {
    pub fn new(source: &'a dyn Source, command: &'a Command, elements: &'a [CommandElement]) -> Self {
        Self {
            source,
            command,
            elements,
        }
    }

    pub fn source(&self) -> &dyn Source {
        self.source
    }

    pub fn command(&self) -> &Command {
        self.command
    }

    pub fn elements(&self) -> &[CommandElement] {
        self.elements
    }

    /// Elements bound to declared positional parameters.
    pub fn params(&self) -> impl Iterator<Item = &CommandElement> {
        self.elements
            .iter()
            .filter(|e| e.is_positional() && e.key().is_some())
    }

    /// Elements bound to flags, declared or synthetic.
    pub fn flags(&self) -> impl Iterator<Item = &CommandElement> {
        self.elements.iter().filter(|e| e.is_flag())
    }

    /// Unconsumed positional overflow.
    pub fn extra(&self) -> impl Iterator<Item = &CommandElement> {
        self.elements.iter().filter(|e| e.key().is_none())
    }

    /// Resolved value of the named parameter.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.params()
            .find(|e| e.name() == Some(name))
            .and_then(|e| e.value())
    }

    /// Raw input of the named parameter.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.params()
            .find(|e| e.name() == Some(name))
            .and_then(|e| e.raw())
    }

    pub fn flag_present(&self, name: &str) -> bool {
        self.flags().any(|e| e.name() == Some(name))
    }

    /// Resolved value of the named flag.
    pub fn flag_value(&self, name: &str) -> Option<Value> {
        self.flags()
            .find(|e| e.name() == Some(name))
            .and_then(|e| e.value())
    }

    pub fn flag_raw(&self, name: &str) -> Option<&str> {
        self.flags()
            .find(|e| e.name() == Some(name))
            .and_then(|e| e.raw())
    }
}
