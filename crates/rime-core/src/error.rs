use thiserror::Error;

pub type RimeResult<T> = Result<T, RimeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RimeError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Coordinates not strictly increasing at index {index} ({prev} >= {next})")]
    NotIncreasing { index: usize, prev: f64, next: f64 },
}
