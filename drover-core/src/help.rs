//! Help rendering interface.
//!
//! Help-text formatting is an embedding concern; the engine only needs
//! *something* to print when a help flag intercepts a dispatch. The trait is
//! the contract, [`PlainHelpFormatter`] the deliberately minimal default.

use crate::command::command::Command;

pub trait HelpFormatter: Send + Sync {
    fn format(&self, command: &Command) -> String;
}

/// Usage line plus one line per parameter, flag, and sub-command.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHelpFormatter;

impl HelpFormatter for PlainHelpFormatter {
    fn format(&self, command: &Command) -> String {
        let mut usage = format!("Usage: {}", command.name());
        for parameter in command.parameters() {
            if parameter.is_required() {
                usage.push_str(&format!(" <{}>", parameter.label()));
            } else {
                usage.push_str(&format!(" [{}]", parameter.label()));
            }
        }
        for flag in command.flags() {
            usage.push_str(&format!(" [{}]", flag.display_form()));
        }
        if command.is_parent() {
            usage.push_str(" <sub-command>");
        }

        let mut lines = vec![usage];
        if !command.describe().is_empty() {
            lines.push(command.describe().to_string());
        }
        for parameter in command.parameters() {
            lines.push(format!("  {}  {}", parameter.label(), parameter.describe()));
        }
        for flag in command.flags() {
            lines.push(format!("  {}  {}", flag.display_form(), flag.describe()));
        }
        for child in command.children() {
            lines.push(format!("  {}  {}", child.name(), child.describe()));
        }
        lines.join("\n")
    }
}
