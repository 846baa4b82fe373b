// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for the bench runner.

use thiserror::Error;

/// Errors that can occur while resolving defines or running benches.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A slot was read with no layer providing a define for it.
    #[error("undefined define {} ({slot})", name.as_deref().unwrap_or("(unknown)"))]
    UndefinedDefine {
        /// Index of the slot that was read.
        slot: usize,
        /// Name of the slot, if any name table covers it.
        name: Option<String>,
    },

    /// An override from the command line could not be parsed.
    #[error("invalid define: {0}")]
    InvalidDefine(String),

    /// A step range from the command line could not be parsed.
    #[error("invalid step: {0}")]
    InvalidStep(String),

    /// A numeric command-line option could not be parsed.
    #[error("invalid {option}: {value}")]
    InvalidOption {
        /// The option's long name.
        option: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A measurement was stopped without a matching start.
    #[error("bench stopped before it was started ({0})")]
    BenchNotStarted(String),

    /// Writing a report or trace line failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bench runner operations.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_define_message() {
        let named = BenchError::UndefinedDefine {
            slot: 3,
            name: Some("BLOCK_COUNT".into()),
        };
        assert_eq!(named.to_string(), "undefined define BLOCK_COUNT (3)");

        let unnamed = BenchError::UndefinedDefine {
            slot: 40,
            name: None,
        };
        assert_eq!(unnamed.to_string(), "undefined define (unknown) (40)");
    }

    #[test]
    fn test_option_message() {
        let err = BenchError::InvalidOption {
            option: "trace-period",
            value: "x".into(),
        };
        assert_eq!(err.to_string(), "invalid trace-period: x");
    }
}
