use thiserror::Error;

/// Errors raised by the scoring engine.
///
/// Every variant is a deterministic input-validation failure. Nothing is
/// retried and no partial result is produced: a batch call that hits one of
/// these fails as a whole.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("{country}: missing required field '{field}'")]
    MissingField { country: String, field: &'static str },

    #[error("invalid {factor} weight {value}: weights must be finite and non-negative")]
    InvalidWeight { factor: &'static str, value: f64 },

    #[error("{subject}: {field} = {value} is out of range (expected {expected})")]
    Domain {
        subject: String,
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("cannot allocate capital across {count} countries: total score is zero")]
    DegenerateAllocation { count: usize },

    #[error("country not found in dataset: {0}")]
    UnknownCountry(String),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
