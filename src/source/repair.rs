//! Best-effort parsing of a damaged posts export.
//!
//! Each [`ParseStrategy`] is tried in [`ParseStrategy::ALL`] order against the
//! original text and the first one that yields a value wins. Stripping control
//! characters loses content, so it only runs once everything else has failed.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use super::literal;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Plain JSON.
    Strict,
    /// JSON after replacing stray `\x` escapes with a space.
    ScrubHexEscapes,
    /// Permissive Python literal syntax over the scrubbed text.
    PythonLiteral,
    /// JSON after the scrub plus removal of raw control characters.
    StripControlChars,
}

#[derive(Error, Debug)]
#[error("{strategy}: {message}")]
pub struct StrategyError {
    pub strategy: ParseStrategy,
    pub message: String,
    /// Line and column of the failure, when the parser reports one.
    pub position: Option<(usize, usize)>,
}

#[derive(Debug)]
pub struct ParseOutcome {
    pub value: Value,
    pub strategy: ParseStrategy,
    /// Failures of the strategies tried before the winning one.
    pub failures: Vec<StrategyError>,
}

impl ParseStrategy {
    pub const ALL: [ParseStrategy; 4] = [
        ParseStrategy::Strict,
        ParseStrategy::ScrubHexEscapes,
        ParseStrategy::PythonLiteral,
        ParseStrategy::StripControlChars,
    ];

    pub fn attempt(self, text: &str) -> std::result::Result<Value, StrategyError> {
        match self {
            ParseStrategy::Strict => self.json(text),
            ParseStrategy::ScrubHexEscapes => self.json(&scrub_hex_escapes(text)),
            ParseStrategy::StripControlChars => {
                self.json(&strip_control_chars(&scrub_hex_escapes(text)))
            }
            ParseStrategy::PythonLiteral => {
                literal::parse(&scrub_hex_escapes(text)).map_err(|e| StrategyError {
                    strategy: self,
                    message: e.message,
                    position: Some(e.position),
                })
            }
        }
    }

    fn json(self, text: &str) -> std::result::Result<Value, StrategyError> {
        serde_json::from_str(text).map_err(|e| StrategyError {
            strategy: self,
            message: e.to_string(),
            position: Some((e.line(), e.column())),
        })
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseStrategy::Strict => "strict JSON",
            ParseStrategy::ScrubHexEscapes => "JSON without \\x escapes",
            ParseStrategy::StripControlChars => "JSON without control characters",
            ParseStrategy::PythonLiteral => "Python literal",
        };
        f.write_str(name)
    }
}

/// Run every strategy in order until one succeeds.
pub fn parse_posts(text: &str) -> Result<ParseOutcome> {
    let mut failures = Vec::new();
    for strategy in ParseStrategy::ALL {
        match strategy.attempt(text) {
            Ok(value) => {
                return Ok(ParseOutcome {
                    value,
                    strategy,
                    failures,
                })
            }
            Err(e) => {
                tracing::debug!("Parse strategy failed: {}", e);
                failures.push(e);
            }
        }
    }
    Err(AppError::Parse(failures))
}

/// Split the parsed document into raw records. The export must be a list.
pub fn into_records(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(_) => Err(AppError::NotAList("an object")),
        Value::String(_) => Err(AppError::NotAList("a string")),
        Value::Number(_) => Err(AppError::NotAList("a number")),
        Value::Bool(_) => Err(AppError::NotAList("a boolean")),
        Value::Null => Err(AppError::NotAList("null")),
    }
}

/// Replace every literal `\x` pair with a single space.
///
/// Rust strings are always valid UTF-8, so the lossy read already did the
/// re-encoding half of this repair.
pub fn scrub_hex_escapes(text: &str) -> String {
    text.replace("\\x", " ")
}

pub fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\u{0}'..='\u{1f}')).collect()
}
