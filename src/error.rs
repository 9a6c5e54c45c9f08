//! Error types
//!
//! Nothing in this crate recovers from a failure: an error raised by any grammar backend,
//! at any nesting depth, aborts the whole parse or stringify call and surfaces unchanged.

use crate::backends::Grammar;
use crate::location::Position;
use thiserror::Error;

/// Which direction of the pipeline rejected a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Parse,
    Stringify,
}

/// Failure reported by a tokenizer, parser, generator or stringifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{grammar} error{}: {message}", at_suffix(.position))]
pub struct BackendError {
    pub grammar: Grammar,
    pub message: String,
    pub position: Option<Position>,
}

impl BackendError {
    pub fn new(grammar: Grammar, message: impl Into<String>) -> Self {
        Self {
            grammar,
            message: message.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

fn at_suffix(position: &Option<Position>) -> String {
    position.map(|pos| format!(" at {pos}")).unwrap_or_default()
}

/// Errors surfaced by the public API
#[derive(Debug, Error)]
pub enum Error {
    /// The file matches none of the known grammars
    #[error("{}", unsupported_message(.path, .operation))]
    UnsupportedFileKind { path: String, operation: Operation },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn unsupported_message(path: &str, operation: &Operation) -> String {
    match operation {
        Operation::Parse => format!("file {path} can not get AST"),
        Operation::Stringify => format!("can not convert file {path} AST to string"),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
