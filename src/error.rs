use std::path::PathBuf;

use thiserror::Error;

use crate::source::StrategyError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse posts file: {}", describe_attempts(.0))]
    Parse(Vec<StrategyError>),

    #[error("Expected a list of posts, found {0}")]
    NotAList(&'static str),

    #[error("MongoDB error: {0}")]
    Database(#[from] mongodb::error::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// A batch insert that did not fully succeed.
///
/// `partial` carries the number of documents the server still accepted,
/// when the driver reported per-document write errors.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct InsertFailure {
    pub partial: Option<usize>,
    pub message: String,
}

fn describe_attempts(attempts: &[StrategyError]) -> String {
    attempts
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
