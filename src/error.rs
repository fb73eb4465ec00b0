//! Domain errors raised while classifying, enriching and cleaning records.
//!
//! Plumbing failures (network, file system, CSV framing) stay as
//! [`anyhow::Error`]; everything here is local to a single record, a single
//! reason-file entry, or a configuration table.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A record field is missing or cannot be parsed.
    #[error("invalid input in record {index}, column {column}: {message} (value: {value:?})")]
    InvalidInput {
        index: usize,
        column: String,
        value: String,
        message: String,
    },

    /// A configured column does not exist in the dataset header.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A month or weekday token with no entry in the locale tables.
    #[error("unrecognized {kind} token: {token:?}")]
    UnrecognizedToken { kind: &'static str, token: String },

    /// A configuration table with the wrong shape.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    pub fn invalid_input(index: usize, column: &str, value: &str, message: impl Into<String>) -> Self {
        PipelineError::InvalidInput {
            index,
            column: column.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

/// A record that was excluded from a batch, with its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub index: usize,
    pub error: PipelineError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message_names_record_and_column() {
        let err = PipelineError::invalid_input(7, "DIA_TRANSPORTE", "2024-13-01", "bad date");
        let msg = err.to_string();
        assert!(msg.contains("record 7"));
        assert!(msg.contains("DIA_TRANSPORTE"));
        assert!(msg.contains("2024-13-01"));
    }

    #[test]
    fn test_unrecognized_token_message() {
        let err = PipelineError::UnrecognizedToken {
            kind: "month",
            token: "brumario".into(),
        };
        assert_eq!(err.to_string(), "unrecognized month token: \"brumario\"");
    }
}
