//! # Dispatcher
//!
//! The resolver and validation state machine over the command tree.
//!
//! ## Resolution
//!
//! The first token of a line must be a plain name naming a top-level
//! command. While the current command has children, the next plain token is
//! tried as a child name; a missing, non-plain, or unmatched token stops the
//! walk and the *current* command becomes the dispatch target, fed the
//! remaining raw text, so a parent command can run with leftover input it
//! does not recognize as a sub-command name.
//!
//! ## Validation Order
//!
//! Once the target's elements are bound, checks run in a fixed order and the
//! first failure wins: help interception, executability, operand ordering,
//! arity, conditionally required flags, unwanted flag value, missing flag
//! value, invalid positional input, invalid flag input. Only then do the
//! hooks and the handler run.
//!
//! ## Failure Policy
//!
//! Validation failures are non-fatal: they emit one line via
//! [`Source::print_err`] and come back as a typed [`Outcome`]. A handler
//! panic is caught at the dispatch boundary, logged, and downgraded to an
//! `exception_during_dispatch` result so one misbehaving command cannot take
//! the dispatcher down. Only lexical failures and rejected raw input abort
//! with an [`Error`](crate::error::Error).

pub mod context;
pub mod result;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::command::command::{Command, CommandBuildError, OperandRelation, check_sibling_aliases};
use crate::config::EngineConfig;
use crate::error::{EngineResult, Error};
use crate::help::{HelpFormatter, PlainHelpFormatter};
use crate::parser::element::ElementKey;
use crate::parser::{CommandElement, CommandLineParser, ParseError};
use crate::tokenizer::rules;

pub use context::{Context, Source};
pub use result::{DispatchError, DispatchErrorKind, Outcome, Reply, SearchError};

/// Observation and veto points around handler invocation.
pub trait DispatchHooks: Send + Sync {
    /// Returning `false` vetoes the dispatch; the handler never runs.
    fn before_dispatch(&self, _ctx: &Context) -> bool {
        true
    }

    /// Runs after every proceeding dispatch, handler panic included.
    fn after_dispatch(&self, _ctx: &Context, _outcome: &Outcome) {}
}

/// The dispatch engine: a read-only command tree plus policy.
pub struct Dispatcher {
    roots: Vec<Arc<Command>>,
    config: EngineConfig,
    hooks: Option<Arc<dyn DispatchHooks>>,
    help: Arc<dyn HelpFormatter>,
}

impl Dispatcher {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            roots: Vec::new(),
            config,
            hooks: None,
            help: Arc::new(PlainHelpFormatter),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn DispatchHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_help_formatter(mut self, help: Arc<dyn HelpFormatter>) -> Self {
        self.help = help;
        self
    }

    /// Registers a top-level command. Root commands obey the same alias
    /// uniqueness rule as siblings under a parent.
    pub fn register(&mut self, command: Command) -> Result<(), CommandBuildError> {
        self.roots.push(Arc::new(command));
        if let Err(error) = check_sibling_aliases("<root>", &self.roots) {
            self.roots.pop();
            return Err(error);
        }
        Ok(())
    }

    pub fn roots(&self) -> &[Arc<Command>] {
        &self.roots
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves and runs one raw command line for `source`.
    #[tracing::instrument(level = "debug", skip(self, source))]
    pub fn dispatch(&self, source: &dyn Source, line: &str) -> EngineResult<Outcome> {
        if line.chars().any(|c| matches!(c, '\n' | '\r' | '\x0c')) {
            return Err(Error::ForbiddenInput(
                "command lines must not contain line breaks".to_string(),
            ));
        }

        let mut tokenizer = rules::command_line_tokenizer(line);
        tokenizer.set_fragment_limit(self.config.error_fragment_limit);

        let first = match tokenizer.next()? {
            Some(token) => token,
            None => {
                source.print_err("expected a command name");
                return Ok(Outcome::Search(SearchError::InvalidCommandName));
            }
        };
        if first.kind != rules::WORD {
            source.print_err(&format!("`{}` is not a valid command name", first.text));
            return Ok(Outcome::Search(SearchError::InvalidCommandName));
        }
        let Some(root) = self.roots.iter().find(|c| c.matches(&first.text)) else {
            source.print_err(&format!("unknown command `{}`", first.text));
            return Ok(Outcome::Search(SearchError::CommandNotFound));
        };

        // walk the tree, consuming leading plain tokens as child names
        let mut path: Vec<Arc<Command>> = Vec::new();
        let mut current = Arc::clone(root);
        let mut rest = tokenizer.remaining().to_string();
        loop {
            if current.children().is_empty() {
                break;
            }
            let snapshot = tokenizer.remaining().to_string();
            match tokenizer.next()? {
                Some(token) if token.kind == rules::WORD => {
                    let child = current.child(&token.text).map(Arc::clone);
                    match child {
                        Some(child) => {
                            path.push(std::mem::replace(&mut current, child));
                            rest = tokenizer.remaining().to_string();
                        }
                        None => {
                            // not a sub-command name: the current command
                            // runs with the token as part of its input
                            rest = snapshot;
                            break;
                        }
                    }
                }
                Some(_) => {
                    rest = snapshot;
                    break;
                }
                None => {
                    rest = String::new();
                    break;
                }
            }
        }
        tracing::debug!(target_command = current.name(), rest = %rest, "resolved dispatch target");

        // the target's requirement is always enforced; ancestors' only when
        // fallthrough checking is on
        let ancestors: &[Arc<Command>] = if self.config.source_requirement_fallthrough {
            &path
        } else {
            &[]
        };
        for node in ancestors.iter().chain(std::iter::once(&current)) {
            if !node.allows(source) {
                source.print_err(&format!(
                    "you do not meet the requirements to run `{}`",
                    node.name()
                ));
                return Ok(Outcome::RequirementNotMet);
            }
        }

        // help interception bypasses every further check, binding strictness
        // included, so it is decided on the raw tokens before parsing
        if self.help_requested(&current, &rest)? {
            source.print(&self.help.format(&current));
            return Ok(Outcome::HelpShown);
        }

        let elements = match CommandLineParser::parse(&current, &rest) {
            Ok(elements) => elements,
            Err(error) => return self.parse_failure(source, &current, error),
        };

        if let Some(outcome) = self.validate(source, &current, &elements) {
            return Ok(outcome);
        }

        let ctx = Context::new(source, &current, &elements);
        if let Some(hooks) = &self.hooks {
            if !hooks.before_dispatch(&ctx) {
                tracing::debug!(command = current.name(), "dispatch vetoed by hook");
                return Ok(Outcome::NotDispatched);
            }
        }

        let Some(handler) = current.handler() else {
            // executability is validated above; kept for direct callers
            return Ok(self.fail(
                source,
                DispatchError::new(
                    DispatchErrorKind::CommandRequiresSub,
                    current.name(),
                    format!("`{}` requires a sub-command", current.name()),
                ),
            ));
        };

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| handler(&ctx))) {
            Ok(reply) => Outcome::Dispatched(reply),
            Err(payload) => {
                tracing::error!(
                    command = current.name(),
                    panic = panic_message(payload.as_ref()),
                    "handler panicked during dispatch"
                );
                let message = format!("`{}` failed unexpectedly", current.name());
                source.print_err(&message);
                Outcome::Error(DispatchError::new(
                    DispatchErrorKind::ExceptionDuringDispatch,
                    current.name(),
                    message,
                ))
            }
        };
        if let Some(hooks) = &self.hooks {
            hooks.after_dispatch(&ctx, &outcome);
        }
        Ok(outcome)
    }

    /// Dispatches an already-tokenized word list, quoting words that would
    /// not survive re-tokenization as a single token.
    pub fn dispatch_words(&self, source: &dyn Source, words: &[&str]) -> EngineResult<Outcome> {
        let probe = rules::command_line_tokenizer("");
        let line = words
            .iter()
            .map(|word| {
                if rules::needs_quoting(&probe, word) {
                    rules::quote_word(word)
                } else {
                    (*word).to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        self.dispatch(source, &line)
    }

    /// Maps strict parser failures into the dispatch taxonomy. Lexical
    /// failures stay fatal for the attempt.
    fn parse_failure(
        &self,
        source: &dyn Source,
        command: &Command,
        error: ParseError,
    ) -> EngineResult<Outcome> {
        let kind = match &error {
            ParseError::TooFewArguments { .. } => DispatchErrorKind::NotEnoughArgs,
            ParseError::MissingFlag { .. } => DispatchErrorKind::MissingFlag,
            ParseError::FlagNeedsValue { .. } => DispatchErrorKind::FlagMissingValue,
            ParseError::Lex(lex) => return Err(Error::Tokenizer(lex.clone())),
        };
        Ok(self.fail(
            source,
            DispatchError::new(kind, command.name(), error.to_string()),
        ))
    }

    fn fail(&self, source: &dyn Source, error: DispatchError) -> Outcome {
        tracing::warn!(command = %error.command, kind = %error.kind, "dispatch rejected");
        source.print_err(&error.message);
        Outcome::Error(error)
    }

    /// Scans the unparsed input for a flag naming the command's help. The
    /// command's own help flag names shadow the engine-wide defaults.
    fn help_requested(&self, command: &Command, rest: &str) -> EngineResult<bool> {
        let help_names: &[String] = if command.help_flags().is_empty() {
            &self.config.help_flags
        } else {
            command.help_flags()
        };
        let mut tokenizer = rules::command_line_tokenizer(rest);
        tokenizer.set_fragment_limit(self.config.error_fragment_limit);
        while let Some(token) = tokenizer.next()? {
            match token.kind {
                rules::LONG_FLAG => {
                    let name = token.text.trim_start_matches('-').trim_end_matches('=');
                    if help_names.iter().any(|h| h == name) {
                        return Ok(true);
                    }
                }
                rules::SHORT_FLAG => {
                    if token.text[1..]
                        .chars()
                        .any(|c| help_names.iter().any(|h| *h == c.to_string()))
                    {
                        return Ok(true);
                    }
                }
                _ => {}
            }
        }
        Ok(false)
    }

    /// Runs the fixed-order validation over bound elements. `Some` means the
    /// dispatch short-circuits with that outcome. Help interception happens
    /// earlier, on the raw tokens.
    fn validate(
        &self,
        source: &dyn Source,
        command: &Command,
        elements: &[CommandElement],
    ) -> Option<Outcome> {
        // the target must be executable at all
        if !command.is_executable() {
            return Some(self.fail(
                source,
                DispatchError::new(
                    DispatchErrorKind::CommandRequiresSub,
                    command.name(),
                    format!("`{}` requires a sub-command", command.name()),
                ),
            ));
        }

        // operand ordering; default-bound parameters carry no source
        // position and are skipped
        match command.operand_relation() {
            OperandRelation::Mixed => {}
            OperandRelation::OperandsFirst => {
                let mut flag_seen = false;
                for (position, element) in elements.iter().enumerate() {
                    if element.is_flag() {
                        flag_seen = true;
                    } else if flag_seen && element.raw().is_some() {
                        return Some(self.fail(
                            source,
                            DispatchError::new(
                                DispatchErrorKind::ParameterAfterFlag,
                                command.name(),
                                format!("argument at position {} must precede all flags", position),
                            )
                            .at(position),
                        ));
                    }
                }
            }
            OperandRelation::OperandsLast => {
                let mut positional_seen = false;
                for (position, element) in elements.iter().enumerate() {
                    if element.is_positional() && element.raw().is_some() {
                        positional_seen = true;
                    } else if element.is_flag() && positional_seen {
                        return Some(self.fail(
                            source,
                            DispatchError::new(
                                DispatchErrorKind::FlagAfterParameter,
                                command.name(),
                                format!("flag at position {} must precede all arguments", position),
                            )
                            .at(position),
                        ));
                    }
                }
            }
        }

        // arity over positionals with raw input; an explicit empty string
        // still counts and is caught by the invalid-input check instead
        let supplied_positionals = elements
            .iter()
            .filter(|e| e.is_positional() && e.raw().is_some())
            .count();
        if supplied_positionals < command.min_args() {
            return Some(self.fail(
                source,
                DispatchError::new(
                    DispatchErrorKind::NotEnoughArgs,
                    command.name(),
                    format!(
                        "`{}` expects at least {} argument(s), got {}",
                        command.name(),
                        command.min_args(),
                        supplied_positionals
                    ),
                ),
            ));
        }

        // flags required given what else was supplied
        let supplied: Vec<&str> = elements
            .iter()
            .filter(|e| e.is_flag())
            .filter_map(|e| e.name())
            .collect();
        for flag in command.flags() {
            if flag.required_given(&supplied) && !supplied.contains(&flag.name()) {
                return Some(self.fail(
                    source,
                    DispatchError::new(
                        DispatchErrorKind::MissingFlag,
                        command.name(),
                        format!("missing required flag `{}`", flag.display_form()),
                    ),
                ));
            }
        }

        // a presence-only flag given a value
        if !self.config.ignore_unwanted_flag_values {
            for (position, element) in elements.iter().enumerate() {
                let Some(ElementKey::Flag(flag)) = element.key() else {
                    continue;
                };
                if flag.presence_only() && element.raw().is_some() {
                    return Some(self.fail(
                        source,
                        DispatchError::new(
                            DispatchErrorKind::FlagDoesNotAcceptValue,
                            command.name(),
                            format!("flag `{}` does not accept a value", flag.display_form()),
                        )
                        .at(position),
                    ));
                }
            }
        }

        // a required, non-nullable flag bound with no input
        for (position, element) in elements.iter().enumerate() {
            let Some(ElementKey::Flag(flag)) = element.key() else {
                continue;
            };
            if flag.takes_value()
                && flag.required_given(&supplied)
                && !flag.is_nullable()
                && element.raw().is_none()
            {
                return Some(self.fail(
                    source,
                    DispatchError::new(
                        DispatchErrorKind::FlagMissingValue,
                        command.name(),
                        format!("flag `{}` is missing its value", flag.display_form()),
                    )
                    .at(position),
                ));
            }
        }

        // positional input that resolves to nothing
        for element in elements {
            let Some(ElementKey::Param(parameter)) = element.key() else {
                continue;
            };
            if parameter.is_required() && !parameter.is_nullable() && element.value().is_none() {
                return Some(self.fail(
                    source,
                    DispatchError::new(
                        DispatchErrorKind::InvalidInput,
                        command.name(),
                        format!(
                            "invalid input `{}` for argument `{}`",
                            element.raw().unwrap_or(""),
                            parameter.label()
                        ),
                    ),
                ));
            }
        }

        // flag input that resolves to nothing
        for element in elements {
            let Some(ElementKey::Flag(flag)) = element.key() else {
                continue;
            };
            if flag.takes_value()
                && flag.required_given(&supplied)
                && !flag.is_nullable()
                && element.value().is_none()
            {
                return Some(self.fail(
                    source,
                    DispatchError::new(
                        DispatchErrorKind::InvalidInput,
                        command.name(),
                        format!(
                            "invalid input `{}` for flag `{}`",
                            element.raw().unwrap_or(""),
                            flag.display_form()
                        ),
                    ),
                ));
            }
        }

        None
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
