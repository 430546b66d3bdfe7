//! Unified error types for the chargeplan crates.
//!
//! This module provides a common error type [`PlanError`] that can represent
//! errors from any phase of planning: catalog validation, model construction,
//! solving and solution auditing. Domain-specific errors are converted to
//! `PlanError` for uniform handling at API boundaries.
//!
//! # Example
//!
//! ```ignore
//! use chargeplan_core::{PlanError, PlanResult};
//!
//! fn plan_day(input: &str) -> PlanResult<()> {
//!     let catalog = load_catalog(input)?;
//!     build_and_solve(&catalog)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all planning operations.
///
/// Catalog and time-grid errors are raised before any model is built; a
/// missing lookup entry is always fatal, never silently defaulted.
#[derive(Error, Debug)]
pub enum PlanError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid or inconsistent catalog data
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A required lookup entry is absent from the catalog
    #[error("Missing {entity} entry for `{key}`")]
    MissingEntry {
        entity: &'static str,
        key: String,
    },

    /// Invalid time-grid definition
    #[error("Time grid error: {0}")]
    TimeGrid(String),

    /// Model construction errors (bad bounds, inconsistent dimensions)
    #[error("Model error: {0}")]
    Model(String),

    /// Solver backend errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// A solved model violates one of its own structural invariants,
    /// e.g. a product auxiliary that is not the exact product of its factors
    #[error("Solution invariant violated: {0}")]
    Invariant(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using PlanError.
pub type PlanResult<T> = Result<T, PlanError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for PlanError {
    fn from(err: anyhow::Error) -> Self {
        PlanError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for PlanError {
    fn from(s: String) -> Self {
        PlanError::Other(s)
    }
}

impl From<&str> for PlanError {
    fn from(s: &str) -> Self {
        PlanError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanError::Solver("no incumbent".into());
        assert!(err.to_string().contains("Solver error"));
        assert!(err.to_string().contains("no incumbent"));
    }

    #[test]
    fn test_missing_entry_display() {
        let err = PlanError::MissingEntry {
            entity: "tour",
            key: "w7".into(),
        };
        assert_eq!(err.to_string(), "Missing tour entry for `w7`");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlanError = io_err.into();
        assert!(matches!(err, PlanError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> PlanResult<()> {
            Err(PlanError::Catalog("empty tour table".into()))
        }

        fn outer() -> PlanResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
