//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, malformed occupancy grids, out-of-range indices handed to the
//! planners, unknown survivor ids, IO, and generic errors.
//!
//! Only setup and query operations return errors. A running simulation reports
//! non-fatal outcomes (no path found, step ceiling reached) through events and the
//! final summary instead.
use thiserror::Error;

use crate::sim::SurvivorId;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid occupancy grid: {0}")]
    InvalidGrid(String),

    #[error("index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown survivor {id}")]
    UnknownSurvivor { id: SurvivorId },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        matches!(err, Error::Other(_))
            .then_some(())
            .expect("expected Other variant");
    }

    #[test]
    fn from_str_allocates_owned_message() {
        let err: Error = "issue".into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "issue"));
    }

    #[test]
    fn index_out_of_range_formats_both_values() {
        let err = Error::IndexOutOfRange { index: 4, len: 3 };
        assert_eq!(err.to_string(), "index 4 out of range for 3 points");
    }

    #[test]
    fn unknown_survivor_formats_id() {
        let err = Error::UnknownSurvivor { id: SurvivorId(7) };
        assert_eq!(err.to_string(), "unknown survivor #7");
    }
}
