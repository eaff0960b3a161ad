//! Error types for salescope-core
//!
//! Only structural problems surface here. Bad rows are dropped by the normalizer and a
//! forecast that cannot be produced is a `Forecast::Unavailable` value, not an error.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Input table has no data rows")]
    EmptyInput,

    #[error("Mismatched run state: {component} was computed from a different dataset")]
    MismatchedRun { component: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
