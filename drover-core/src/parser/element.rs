//! Bound command-line elements.

use std::sync::Arc;

use crate::command::parameter::{Flag, Parameter};
use crate::command::value::Value;

/// What a piece of input was bound to.
#[derive(Debug, Clone)]
pub enum ElementKey {
    Param(Arc<Parameter>),
    Flag(Arc<Flag>),
}

/// One parsed token-group: the slot it bound to (or none, for unconsumed
/// extra input), the raw input text, and a lazily resolved value.
#[derive(Debug, Clone)]
pub struct CommandElement {
    key: Option<ElementKey>,
    raw: Option<String>,
}

impl CommandElement {
    pub fn param(parameter: Arc<Parameter>, raw: Option<String>) -> Self {
        Self {
            key: Some(ElementKey::Param(parameter)),
            raw,
        }
    }

    pub fn flag(flag: Arc<Flag>, raw: Option<String>) -> Self {
        Self {
            key: Some(ElementKey::Flag(flag)),
            raw,
        }
    }

    /// Positional input beyond what the declared parameters consumed.
    pub fn extra(raw: String) -> Self {
        Self {
            key: None,
            raw: Some(raw),
        }
    }

    pub fn key(&self) -> Option<&ElementKey> {
        self.key.as_ref()
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Name of the bound slot; extra input has none.
    pub fn name(&self) -> Option<&str> {
        match &self.key {
            Some(ElementKey::Param(p)) => Some(p.name()),
            Some(ElementKey::Flag(f)) => Some(f.name()),
            None => None,
        }
    }

    /// Positional: bound to a parameter, or unconsumed extra input.
    pub fn is_positional(&self) -> bool {
        !matches!(self.key, Some(ElementKey::Flag(_)))
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.key, Some(ElementKey::Flag(_)))
    }

    pub fn has_input(&self) -> bool {
        self.raw.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// Resolves the value through the bound slot's accepted types and
    /// default. Extra input resolves to its raw text.
    pub fn value(&self) -> Option<Value> {
        match &self.key {
            Some(ElementKey::Param(p)) => p.value_of(self.raw.as_deref()),
            Some(ElementKey::Flag(f)) => f.value_of(self.raw.as_deref()),
            None => self.raw.clone().map(Value::Str),
        }
    }
}
