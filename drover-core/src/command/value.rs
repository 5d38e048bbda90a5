//! Typed values and the registry of named parse functions.
//!
//! Parameter and option values are untyped at the source: everything arrives
//! as a string. Instead of handing consumers an any-bag, resolution produces
//! a closed tagged union ([`Value`]) decided by each parse function, so
//! consumers pattern-match rather than downcast.
//!
//! Parse functions are plain `&str -> Option<Value>` closures. The
//! [`TypeRegistry`] is an explicit, caller-constructed table of named
//! parsers passed into builders; there is deliberately no global registry.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The closed union of resolved argument values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// Discriminant names for [`Value`], used in messages and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", rendered.join(","))
            }
            Value::Map(entries) => {
                let rendered: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{}", rendered.join(","))
            }
        }
    }
}

/// A parse function: raw input to a typed value, or `None` when the input
/// does not belong to the type.
pub type TypeParser = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Explicit table of named parse functions.
///
/// Built by the embedding code and passed into command builders; commands
/// hold the parsers they were given and never reach back into the table.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    parsers: HashMap<String, TypeParser>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the standard scalar parsers:
    /// `string`, `int`, `float`, `bool`, and `list` (comma-separated
    /// strings).
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("string", Arc::new(|raw| Some(Value::Str(raw.to_string()))));
        registry.register("int", Arc::new(|raw| raw.parse::<i64>().ok().map(Value::Int)));
        registry.register("float", Arc::new(|raw| raw.parse::<f64>().ok().map(Value::Float)));
        registry.register("bool", Arc::new(|raw| match raw.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        }));
        registry.register("list", Arc::new(|raw| {
            Some(Value::List(
                raw.split(',')
                    .map(|part| Value::Str(part.trim().to_string()))
                    .collect(),
            ))
        }));
        registry
    }

    pub fn register(&mut self, name: &str, parser: TypeParser) {
        self.parsers.insert(name.to_string(), parser);
    }

    pub fn get(&self, name: &str) -> Option<TypeParser> {
        self.parsers.get(name).cloned()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.parsers.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("parsers", &names).finish()
    }
}
