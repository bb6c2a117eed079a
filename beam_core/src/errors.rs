//! # Error Types
//!
//! Structured error types for beam_core. Every failure in the analysis
//! pipeline surfaces as one of these variants, carrying enough context
//! (role names, candidate columns, row/column positions) for a host to
//! show the message directly to the person who uploaded the table.
//!
//! ## Example
//!
//! ```rust
//! use beam_core::errors::{CalcError, CalcResult};
//!
//! fn validate_length(length: f64) -> CalcResult<()> {
//!     if length <= 0.0 {
//!         return Err(CalcError::invalid_value(
//!             "length",
//!             length.to_string(),
//!             "Beam length must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for beam_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for analysis operations.
///
/// The first four variants are data errors raised by the pipeline
/// components; the remaining ones come from file handling around it.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A semantic role required by every candidate mode has no column
    #[error("Missing column for role '{role}'. Need [position, load] or [position, shear, moment]. Found: [{}]", .found_columns.join(", "))]
    MissingColumn {
        role: String,
        found_columns: Vec<String>,
    },

    /// More than one column could stand for the same role
    #[error("Ambiguous columns for role '{role}': [{}]", .candidates.join(", "))]
    AmbiguousColumn {
        role: String,
        candidates: Vec<String>,
    },

    /// A cell, the table as a whole, or a scalar input is unusable
    #[error("Invalid data{}: '{value}' - {reason}", location(.column, .row))]
    InvalidData {
        column: Option<String>,
        /// 1-based data row (header row excluded)
        row: Option<usize>,
        value: String,
        reason: String,
    },

    /// A point load lies outside the beam
    #[error("Load position {position} is outside the beam [0, {length}]")]
    OutOfRangeLoad { position: f64, length: f64 },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON or CSV (de)serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

fn location(column: &Option<String>, row: &Option<usize>) -> String {
    match (column, row) {
        (Some(c), Some(r)) => format!(" in column '{}' at row {}", c, r),
        (Some(c), None) => format!(" in column '{}'", c),
        (None, Some(r)) => format!(" at row {}", r),
        (None, None) => String::new(),
    }
}

impl CalcError {
    /// Create a MissingColumn error
    pub fn missing_column(role: impl Into<String>, found_columns: &[String]) -> Self {
        CalcError::MissingColumn {
            role: role.into(),
            found_columns: found_columns.to_vec(),
        }
    }

    /// Create an AmbiguousColumn error
    pub fn ambiguous_column(role: impl Into<String>, candidates: Vec<String>) -> Self {
        CalcError::AmbiguousColumn {
            role: role.into(),
            candidates,
        }
    }

    /// Create an InvalidData error for a single table cell
    pub fn invalid_cell(
        column: impl Into<String>,
        row: usize,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidData {
            column: Some(column.into()),
            row: Some(row),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidData error for a named scalar input (no row context)
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidData {
            column: Some(field.into()),
            row: None,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidData error about the table as a whole
    pub fn invalid_table(reason: impl Into<String>) -> Self {
        CalcError::InvalidData {
            column: None,
            row: None,
            value: String::new(),
            reason: reason.into(),
        }
    }

    /// Create an OutOfRangeLoad error
    pub fn out_of_range_load(position: f64, length: f64) -> Self {
        CalcError::OutOfRangeLoad { position, length }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// True for errors caused by the submitted data rather than the environment.
    ///
    /// Hosts map these to a "bad request" style response.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CalcError::MissingColumn { .. }
                | CalcError::AmbiguousColumn { .. }
                | CalcError::InvalidData { .. }
                | CalcError::OutOfRangeLoad { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::MissingColumn { .. } => "MISSING_COLUMN",
            CalcError::AmbiguousColumn { .. } => "AMBIGUOUS_COLUMN",
            CalcError::InvalidData { .. } => "INVALID_DATA",
            CalcError::OutOfRangeLoad { .. } => "OUT_OF_RANGE_LOAD",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<csv::Error> for CalcError {
    fn from(e: csv::Error) -> Self {
        let row = e.position().map(|p| p.line() as usize);
        CalcError::InvalidData {
            column: None,
            row,
            value: String::new(),
            reason: format!("Unreadable CSV: {}", e),
        }
    }
}
