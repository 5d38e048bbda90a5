use thiserror::Error;

use crate::command::command::CommandBuildError;
use crate::config::ConfigError;
use crate::parser::ParseError;
use crate::tokenizer::TokenizerError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("command build error: {0}")]
    Build(#[from] CommandBuildError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Raw input rejected before tokenization (embedded line breaks).
    #[error("forbidden input: {0}")]
    ForbiddenInput(String),
}

pub type EngineResult<T> = Result<T, Error>;
