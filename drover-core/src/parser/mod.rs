//! # Command-Line Parser
//!
//! Binds the token stream of a raw command line to a target command's
//! declared parameters and flags, producing an ordered list of
//! [`CommandElement`]s that covers every token.
//!
//! ## Binding Rules
//!
//! * Quoted-string and bare-word tokens accumulate as candidate positionals
//!   in encounter order (quoted text is unquoted and unescaped first).
//! * `-x` resolves the single flag `x`; a value-taking flag consumes the next
//!   quoted/word token, otherwise the parse fails.
//! * `-xyz` explodes into independent presence-only letters; a cluster
//!   letter never takes a value, even when the flag it names does.
//! * `--name=` binds the next token as the flag's value; `--name` binds
//!   presence-only.
//! * Flag names the command never declared bind to synthetic presence-only
//!   flags instead of failing (see DESIGN.md).
//! * Statically required, value-taking flags must appear.
//! * Declared parameters then walk the buffered positionals: required ones
//!   always consume a token, optional ones only while surplus remains, and
//!   whatever is left over becomes extra elements. A parameter that gets no
//!   token is bound with empty raw input, which resolves to its default.
//!
//! Element order preserves source order for everything that originated from
//! a token; default-bound parameters come last. The dispatcher's operand
//! ordering check relies on this.

pub mod element;

use std::sync::Arc;

use thiserror::Error;

use crate::command::command::Command;
use crate::command::parameter::Flag;
use crate::tokenizer::rules::{self, LONG_FLAG, QUOTED, SHORT_FLAG, WORD};
use crate::tokenizer::{Token, TokenizerError};

pub use element::{CommandElement, ElementKey};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("`{command}` expects at least {expected} argument(s), got {found}")]
    TooFewArguments {
        command: String,
        expected: usize,
        found: usize,
    },
    #[error("flag `{flag}` of `{command}` requires a value")]
    FlagNeedsValue { command: String, flag: String },
    #[error("`{command}` is missing required flag `{flag}` and its value")]
    MissingFlag { command: String, flag: String },
    #[error(transparent)]
    Lex(#[from] TokenizerError),
}

/// Source-ordered intermediate slots, before positionals are matched to
/// declared parameters.
enum Slot {
    Positional(String),
    Flag { flag: Arc<Flag>, raw: Option<String> },
}

pub struct CommandLineParser;

impl CommandLineParser {
    /// Parses `line` against `command`, returning every token bound as an
    /// element or a [`ParseError`] naming the offending command.
    #[tracing::instrument(level = "debug", skip(command), fields(command = command.name()))]
    pub fn parse(command: &Command, line: &str) -> Result<Vec<CommandElement>, ParseError> {
        let mut tokenizer = rules::command_line_tokenizer(line);
        let mut slots: Vec<Slot> = Vec::new();

        while let Some(token) = tokenizer.next()? {
            match token.kind {
                QUOTED => slots.push(Slot::Positional(rules::unquote(&token.text))),
                WORD => slots.push(Slot::Positional(token.text)),
                SHORT_FLAG => {
                    let letters = &token.text[1..];
                    if letters.chars().count() == 1 {
                        let flag = resolve_flag(command, letters);
                        let raw = if flag.takes_value() {
                            Some(take_value(command, &flag, &mut tokenizer)?)
                        } else {
                            None
                        };
                        slots.push(Slot::Flag { flag, raw });
                    } else {
                        // a cluster letter is an independent presence switch
                        for letter in letters.chars() {
                            let flag = resolve_flag(command, &letter.to_string());
                            slots.push(Slot::Flag { flag, raw: None });
                        }
                    }
                }
                LONG_FLAG => {
                    let body = token.text.trim_start_matches('-');
                    let wants_value = body.ends_with('=');
                    let name = body.trim_end_matches('=');
                    let flag = resolve_flag(command, name);
                    let raw = if wants_value {
                        // bound even when the flag is presence-only; the
                        // dispatcher reports the unwanted value
                        Some(take_value(command, &flag, &mut tokenizer)?)
                    } else {
                        None
                    };
                    slots.push(Slot::Flag { flag, raw });
                }
                other => {
                    tracing::warn!(kind = other, text = %token.text, "unexpected token kind");
                    slots.push(Slot::Positional(token.text));
                }
            }
        }

        check_required_flags(command, &slots)?;
        bind_positionals(command, slots)
    }
}

/// Declared flag by name or alias, or a synthetic presence-only stand-in.
fn resolve_flag(command: &Command, name: &str) -> Arc<Flag> {
    match command.flag(name) {
        Some(flag) => Arc::clone(flag),
        None => {
            tracing::debug!(flag = name, command = command.name(), "binding undeclared flag");
            Arc::new(Flag::synthetic(name))
        }
    }
}

/// Consumes the next token as a flag value. Only quoted strings and bare
/// words qualify.
fn take_value(
    command: &Command,
    flag: &Flag,
    tokenizer: &mut crate::tokenizer::Tokenizer,
) -> Result<String, ParseError> {
    let error = || ParseError::FlagNeedsValue {
        command: command.name().to_string(),
        flag: flag.name().to_string(),
    };
    match tokenizer.next()? {
        Some(Token { kind: QUOTED, text }) => Ok(rules::unquote(&text)),
        Some(Token { kind: WORD, text }) => Ok(text),
        _ => Err(error()),
    }
}

/// Every statically required, value-taking flag must appear among the
/// parsed slots.
fn check_required_flags(command: &Command, slots: &[Slot]) -> Result<(), ParseError> {
    for declared in command.flags() {
        if !(declared.is_required() && declared.takes_value()) {
            continue;
        }
        let present = slots.iter().any(|slot| match slot {
            Slot::Flag { flag, .. } => flag.name() == declared.name(),
            Slot::Positional(_) => false,
        });
        if !present {
            return Err(ParseError::MissingFlag {
                command: command.name().to_string(),
                flag: declared.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Walks declared parameters over the buffered positionals and assembles the
/// final source-ordered element list.
fn bind_positionals(command: &Command, slots: Vec<Slot>) -> Result<Vec<CommandElement>, ParseError> {
    let unnamed = slots
        .iter()
        .filter(|s| matches!(s, Slot::Positional(_)))
        .count();
    let min = command.min_args();
    if unnamed < min {
        return Err(ParseError::TooFewArguments {
            command: command.name().to_string(),
            expected: min,
            found: unnamed,
        });
    }

    // decide which declared parameters consume a token: required ones
    // always do, optional ones while surplus lasts
    let mut leftover = unnamed - min;
    let mut takers = Vec::new();
    let mut defaulted = Vec::new();
    for parameter in command.parameters() {
        if parameter.is_required() {
            takers.push(Arc::clone(parameter));
        } else if leftover > 0 {
            leftover -= 1;
            takers.push(Arc::clone(parameter));
        } else {
            defaulted.push(Arc::clone(parameter));
        }
    }

    let mut elements = Vec::with_capacity(slots.len() + defaulted.len());
    let mut positional_index = 0;
    for slot in slots {
        match slot {
            Slot::Flag { flag, raw } => elements.push(CommandElement::flag(flag, raw)),
            Slot::Positional(raw) => {
                if positional_index < takers.len() {
                    elements.push(CommandElement::param(
                        Arc::clone(&takers[positional_index]),
                        Some(raw),
                    ));
                } else {
                    elements.push(CommandElement::extra(raw));
                }
                positional_index += 1;
            }
        }
    }
    for parameter in defaulted {
        elements.push(CommandElement::param(parameter, None));
    }

    Ok(elements)
}
