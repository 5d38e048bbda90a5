//! Positional parameters and flags.
//!
//! A [`Parameter`] describes one named value slot: which parse functions it
//! accepts, whether it is required, and what it falls back to. A [`Flag`] is
//! a parameter specialization with aliases and conditional requiredness; a
//! flag with no accepted types is a presence-only switch that never consumes
//! a value.

use std::fmt;

use super::value::{TypeParser, Value};

/// Static description of a positional value slot.
///
/// Value resolution order: missing or blank raw input resolves to the
/// default; otherwise the accepted parse functions are tried in registration
/// order and the first non-`None` result wins; if every function declines,
/// the default applies.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    description: String,
    display_name: Option<String>,
    required: bool,
    nullable: bool,
    default: Option<Value>,
    types: Vec<TypeParser>,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            display_name: None,
            required: false,
            nullable: false,
            default: None,
            types: Vec::new(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Overrides the name shown in help output.
    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// A nullable slot tolerates resolving to no value at all.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Appends an accepted parse function. Order of calls is resolution
    /// order.
    pub fn accept(mut self, parser: TypeParser) -> Self {
        self.types.push(parser);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    /// Display name override, or the parameter name.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn accepted_types(&self) -> &[TypeParser] {
        &self.types
    }

    /// Resolves raw input against the accepted types and the default.
    pub fn value_of(&self, raw: Option<&str>) -> Option<Value> {
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r,
            _ => return self.default.clone(),
        };
        for parse in &self.types {
            if let Some(value) = parse(raw) {
                return Some(value);
            }
        }
        self.default.clone()
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("nullable", &self.nullable)
            .field("default", &self.default)
            .field("types", &self.types.len())
            .finish()
    }
}

/// A named argument slot introduced by `-x` or `--name`.
///
/// Composes a [`Parameter`] for value resolution and adds aliases plus the
/// conditional requiredness vocabulary. Requiredness given the set of other
/// flags actually supplied resolves as: presence-only flags are never
/// required; a statically `required` flag always is; otherwise any
/// `required_unless` sibling being present wins (not required) over any
/// `required_if` sibling being present (required).
#[derive(Clone)]
pub struct Flag {
    parameter: Parameter,
    aliases: Vec<String>,
    required: bool,
    required_if: Vec<String>,
    required_unless: Vec<String>,
}

impl Flag {
    pub fn new(name: &str) -> Self {
        Self {
            parameter: Parameter::new(name),
            aliases: Vec::new(),
            required: false,
            required_if: Vec::new(),
            required_unless: Vec::new(),
        }
    }

    /// A presence-only stand-in for a flag the command never declared.
    /// The parser binds unknown flag names to these instead of failing.
    pub fn synthetic(name: &str) -> Self {
        Self::new(name)
    }

    pub fn description(mut self, description: &str) -> Self {
        self.parameter = self.parameter.description(description);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Required when any of the named sibling flags is supplied.
    pub fn required_if(mut self, names: &[&str]) -> Self {
        self.required_if = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Not required when any of the named sibling flags is supplied; takes
    /// precedence over `required_if`.
    pub fn required_unless(mut self, names: &[&str]) -> Self {
        self.required_unless = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn nullable(mut self) -> Self {
        self.parameter = self.parameter.nullable();
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.parameter = self.parameter.default_value(value);
        self
    }

    pub fn accept(mut self, parser: TypeParser) -> Self {
        self.parameter = self.parameter.accept(parser);
        self
    }

    pub fn name(&self) -> &str {
        self.parameter.name()
    }

    pub fn describe(&self) -> &str {
        self.parameter.describe()
    }

    pub fn label(&self) -> &str {
        self.parameter.label()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn required_if_names(&self) -> &[String] {
        &self.required_if
    }

    pub fn required_unless_names(&self) -> &[String] {
        &self.required_unless
    }

    pub fn is_nullable(&self) -> bool {
        self.parameter.is_nullable()
    }

    /// True when the flag consumes a value token.
    pub fn takes_value(&self) -> bool {
        !self.parameter.accepted_types().is_empty()
    }

    /// Derived: a flag with zero accepted types signals by mere presence.
    pub fn presence_only(&self) -> bool {
        !self.takes_value()
    }

    /// `-x` for single-letter names, `--name` otherwise.
    pub fn display_form(&self) -> String {
        if self.name().chars().count() == 1 {
            format!("-{}", self.name())
        } else {
            format!("--{}", self.name())
        }
    }

    /// Exact match against the name or any alias.
    pub fn matches(&self, name: &str) -> bool {
        self.name() == name || self.aliases.iter().any(|a| a == name)
    }

    pub fn value_of(&self, raw: Option<&str>) -> Option<Value> {
        self.parameter.value_of(raw)
    }

    /// Resolves requiredness given the names of the other flags supplied.
    pub fn required_given(&self, supplied: &[&str]) -> bool {
        if self.presence_only() {
            return false;
        }
        if self.required {
            return true;
        }
        if self
            .required_unless
            .iter()
            .any(|name| supplied.contains(&name.as_str()))
        {
            return false;
        }
        self.required_if
            .iter()
            .any(|name| supplied.contains(&name.as_str()))
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name())
            .field("aliases", &self.aliases)
            .field("required", &self.required)
            .field("required_if", &self.required_if)
            .field("required_unless", &self.required_unless)
            .field("presence_only", &self.presence_only())
            .finish()
    }
}
