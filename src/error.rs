//! Error types for the Stroop screener
//!
//! Every variant is recoverable by the caller; nothing in the library panics on bad input.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad trial count, empty palette or inconsistent bounds
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Caller-supplied value out of range (age, reaction time)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation invoked in the wrong session stage
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Scoring attempted without any responses
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The risk model could not produce a prediction (missing or corrupt artifact)
    #[error("risk classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// True for the one failure the front end reports as an expected runtime condition.
    pub fn is_classifier_unavailable(&self) -> bool {
        matches!(self, Error::ClassifierUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = Error::InvalidInput("age 5 outside 10..=120".into());
        assert_eq!(err.to_string(), "invalid input: age 5 outside 10..=120");

        let err = Error::ClassifierUnavailable("model.json not found".into());
        assert!(err.is_classifier_unavailable());
        assert!(err.to_string().starts_with("risk classifier unavailable"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_classifier_unavailable());
    }
}
