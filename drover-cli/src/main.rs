//! Demo driver for the drover dispatch engine.
//!
//! Builds a small command tree (`greet`, `user add`/`user list`, `admin
//! reload`), then dispatches the trailing words of the invocation as one
//! command line for a stdio-backed source. Permissions are granted with
//! `--grant`; the exit code reflects the dispatch outcome.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use drover_core::config::ConfigError;
use drover_core::{
    Command, CommandBuildError, CommandBuilder, Context, Dispatcher, EngineConfig, Flag, Outcome,
    Parameter, Reply, Source, TypeRegistry,
};

#[derive(Parser)]
#[command(name = "drover", version, about = "Dispatch a command line against the demo tree")]
struct Cli {
    /// Permission nodes granted to the invoking source (repeatable)
    #[arg(long = "grant", value_name = "NODE")]
    grants: Vec<String>,

    /// Engine configuration file (JSON)
    #[arg(long, value_name = "PATH", env = "DROVER_CONFIG")]
    config: Option<PathBuf>,

    /// The command line to dispatch
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    line: Vec<String>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Engine(#[from] drover_core::Error),
    #[error("{0}")]
    Build(#[from] CommandBuildError),
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Source backed by stdout/stderr with a fixed permission set.
struct StdioSource {
    grants: HashSet<String>,
}

impl Source for StdioSource {
    fn has_permission(&self, node: &str) -> bool {
        self.grants.contains(node)
    }

    fn print(&self, message: &str) {
        println!("{}", message);
    }

    fn print_err(&self, message: &str) {
        eprintln!("{}", message);
    }
}

fn demo_tree(registry: &TypeRegistry) -> Result<Vec<Command>, CommandBuildError> {
    let string = registry.get("string").expect("standard registry has string");
    let int = registry.get("int").expect("standard registry has int");

    let greet = CommandBuilder::new("greet")
        .description("Greets someone")
        .parameter(Parameter::new("name").required().accept(string.clone()))
        .flag(Flag::new("loud").description("Shout the greeting"))
        .flag(Flag::new("times").alias("t").accept(int).description("Repeat count"))
        .handler(Arc::new(|ctx: &Context| {
            let name = ctx
                .value("name")
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default();
            let times = ctx
                .flag_value("times")
                .and_then(|v| v.as_int())
                .unwrap_or(1)
                .max(1);
            let mut message = format!("Hello, {}", name);
            if ctx.flag_present("loud") {
                message.make_ascii_uppercase();
                message.push('!');
            }
            for _ in 0..times {
                ctx.source().print(&message);
            }
            Some(Reply::Code(0))
        }))
        .build()?;

    let add = CommandBuilder::new("add")
        .description("Adds a user")
        .parameter(Parameter::new("name").required().accept(string.clone()))
        .handler(Arc::new(|ctx: &Context| {
            let name = ctx
                .value("name")
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default();
            ctx.source().print(&format!("added user {}", name));
            Some(Reply::Str(name))
        }))
        .build()?;
    let list = CommandBuilder::new("list")
        .description("Lists users")
        .handler(Arc::new(|ctx: &Context| {
            ctx.source().print("no users yet");
            Some(Reply::Int(0))
        }))
        .build()?;
    let user = CommandBuilder::new("user")
        .description("User management")
        .child(add)
        .child(list)
        .build()?;

    let reload = CommandBuilder::new("reload")
        .description("Reloads the engine")
        .handler(Arc::new(|ctx: &Context| {
            ctx.source().print("reloaded");
            None
        }))
        .build()?;
    let admin = CommandBuilder::new("admin")
        .description("Administrative commands")
        .permission("drover.admin")
        .child(reload)
        .build()?;

    Ok(vec![greet, user, admin])
}

fn run(cli: Cli) -> Result<Outcome, CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let registry = TypeRegistry::standard();
    let mut dispatcher = Dispatcher::new(config);
    for command in demo_tree(&registry)? {
        dispatcher.register(command)?;
    }

    let source = StdioSource {
        grants: cli.grants.iter().cloned().collect(),
    };
    let words: Vec<&str> = cli.line.iter().map(String::as_str).collect();
    Ok(dispatcher.dispatch_words(&source, &words)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) if outcome.succeeded() => ExitCode::SUCCESS,
        Ok(outcome) => {
            tracing::debug!(?outcome, "dispatch did not succeed");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::from(2)
        }
    }
}
