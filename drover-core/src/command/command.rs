//! Command tree nodes and the validating builder.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::parameter::{Flag, Parameter};
use crate::dispatch::context::{Context, Source};
use crate::dispatch::result::Reply;

/// Permission predicate evaluated against the invoking source.
pub type Requirement = Arc<dyn Fn(&dyn Source) -> bool + Send + Sync>;

/// The function invoked once per successful dispatch of an executable
/// command. `None` is a valid "no particular result" return.
pub type Handler = Arc<dyn Fn(&Context) -> Option<Reply> + Send + Sync>;

/// Policy governing whether positionals and flags may interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum OperandRelation {
    /// Positionals and flags interleave freely.
    #[default]
    Mixed,
    /// Every positional must precede every flag.
    OperandsFirst,
    /// Every flag must precede every positional.
    OperandsLast,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandBuildError {
    #[error("command name must not be empty")]
    EmptyName,
    /// A command is either executable (has a handler) or a parent (has at
    /// least one child), never neither.
    #[error("command `{command}` has no handler and no children")]
    NeitherExecutableNorParent { command: String },
    /// Sibling commands under one parent must not share any alias,
    /// primary names included. Matching is case-insensitive.
    #[error("alias `{alias}` is used by more than one command under `{parent}`")]
    DuplicateAlias { parent: String, alias: String },
}

/// A named, aliasable node in the command tree.
///
/// Built once through [`CommandBuilder`] and read-only afterwards. Parameters
/// and flags are held behind `Arc` so parsed elements can reference them
/// without borrowing the tree.
#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    parameters: Vec<Arc<Parameter>>,
    flags: Vec<Arc<Flag>>,
    operand_relation: OperandRelation,
    requirement: Option<Requirement>,
    children: Vec<Arc<Command>>,
    handler: Option<Handler>,
    help_flags: Vec<String>,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[Arc<Parameter>] {
        &self.parameters
    }

    pub fn flags(&self) -> &[Arc<Flag>] {
        &self.flags
    }

    pub fn operand_relation(&self) -> OperandRelation {
        self.operand_relation
    }

    pub fn children(&self) -> &[Arc<Command>] {
        &self.children
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Flag names that trigger help interception for this command. Empty
    /// means "use the engine-wide defaults".
    pub fn help_flags(&self) -> &[String] {
        &self.help_flags
    }

    /// Case-insensitive match against the primary name and all aliases.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    pub fn child(&self, name: &str) -> Option<&Arc<Command>> {
        self.children.iter().find(|c| c.matches(name))
    }

    /// Declared flag whose name or alias equals `name` exactly.
    pub fn flag(&self, name: &str) -> Option<&Arc<Flag>> {
        self.flags.iter().find(|f| f.matches(name))
    }

    /// Count of required positional parameters.
    pub fn min_args(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_required()).count()
    }

    pub fn is_executable(&self) -> bool {
        self.handler.is_some()
    }

    pub fn is_parent(&self) -> bool {
        !self.children.is_empty()
    }

    /// Evaluates the permission requirement; commands without one allow
    /// every source.
    pub fn allows(&self, source: &dyn Source) -> bool {
        match &self.requirement {
            Some(requirement) => requirement(source),
            None => true,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("parameters", &self.parameters)
            .field("flags", &self.flags)
            .field("operand_relation", &self.operand_relation)
            .field("children", &self.children)
            .field("executable", &self.is_executable())
            .finish()
    }
}

/// Builder for [`Command`]; `build` runs the construction-time checks.
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: String,
    parameters: Vec<Arc<Parameter>>,
    flags: Vec<Arc<Flag>>,
    operand_relation: OperandRelation,
    requirement: Option<Requirement>,
    children: Vec<Arc<Command>>,
    handler: Option<Handler>,
    help_flags: Vec<String>,
}

impl CommandBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            description: String::new(),
            parameters: Vec::new(),
            flags: Vec::new(),
            operand_relation: OperandRelation::default(),
            requirement: None,
            children: Vec::new(),
            handler: None,
            help_flags: Vec::new(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Appends a positional parameter; declaration order is binding order.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(Arc::new(parameter));
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(Arc::new(flag));
        self
    }

    pub fn operand_relation(mut self, relation: OperandRelation) -> Self {
        self.operand_relation = relation;
        self
    }

    pub fn requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = Some(requirement);
        self
    }

    /// Shorthand: require `source.has_permission(node)`.
    pub fn permission(self, node: &str) -> Self {
        let node = node.to_string();
        self.requirement(Arc::new(move |source: &dyn Source| {
            source.has_permission(&node)
        }))
    }

    pub fn child(mut self, child: Command) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Overrides the engine-wide help flag names for this command.
    pub fn help_flags(mut self, names: &[&str]) -> Self {
        self.help_flags = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn build(self) -> Result<Command, CommandBuildError> {
        if self.name.trim().is_empty() {
            return Err(CommandBuildError::EmptyName);
        }
        if self.handler.is_none() && self.children.is_empty() {
            return Err(CommandBuildError::NeitherExecutableNorParent {
                command: self.name,
            });
        }
        check_sibling_aliases(&self.name, &self.children)?;

        Ok(Command {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            parameters: self.parameters,
            flags: self.flags,
            operand_relation: self.operand_relation,
            requirement: self.requirement,
            children: self.children,
            handler: self.handler,
            help_flags: self.help_flags,
        })
    }
}

/// Sibling alias uniqueness (case-insensitive, primary names included).
/// Shared with the dispatcher's root-level registration check.
pub(crate) fn check_sibling_aliases(
    parent: &str,
    siblings: &[Arc<Command>],
) -> Result<(), CommandBuildError> {
    let mut seen = std::collections::HashSet::new();
    for command in siblings {
        for alias in std::iter::once(command.name()).chain(command.aliases().iter().map(|a| a.as_str())) {
            if !seen.insert(alias.to_ascii_lowercase()) {
                return Err(CommandBuildError::DuplicateAlias {
                    parent: parent.to_string(),
                    alias: alias.to_string(),
                });
            }
        }
    }
    Ok(())
}
