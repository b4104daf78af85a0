//! Error taxonomy for the analysis core.
//!
//! Three categories cover every failure the engine can surface:
//!
//! - [`ValidationError`] — a malformed input record. Recoverable: the caller
//!   decides whether to skip the record or abort the batch.
//! - [`ConfigurationError`] — invalid thresholds or parameters. Fatal, and
//!   always raised before any record is processed.
//! - [`OutOfBoundsError`] — a coordinate outside the terrain grid. Fatal for
//!   that simulation run, recoverable at the batch level by skipping the event.
//!
//! The core never retries and never silently discards data: every error
//! carries the offending field or value so the surrounding layer can log or
//! report it.

use std::fmt;

/// A raw detection record failed validation during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field (e.g. `"latitude"`).
    pub field: &'static str,
    /// Human-readable description including the rejected value.
    pub reason: String,
}

impl ValidationError {
    /// Create a validation error for a named field.
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid record field '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// A threshold or parameter is invalid. Raised before processing begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    /// Name of the offending parameter (e.g. `"spatial_radius_m"`).
    pub parameter: String,
    /// Human-readable description including the rejected value.
    pub reason: String,
}

impl ConfigurationError {
    /// Create a configuration error for a named parameter.
    pub fn new(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a parameter that must be strictly positive.
    pub fn not_positive(parameter: impl Into<String>, value: f64) -> Self {
        Self::new(parameter, format!("must be positive, got {value}"))
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid parameter '{}': {}", self.parameter, self.reason)
    }
}

impl std::error::Error for ConfigurationError {}

/// A grid coordinate fell outside the terrain bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBoundsError {
    /// Requested row.
    pub row: usize,
    /// Requested column.
    pub col: usize,
    /// Grid row count.
    pub rows: usize,
    /// Grid column count.
    pub cols: usize,
}

impl fmt::Display for OutOfBoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell ({}, {}) is outside the {}x{} terrain grid",
            self.row, self.col, self.rows, self.cols
        )
    }
}

impl std::error::Error for OutOfBoundsError {}

/// Umbrella error for operations that can fail in more than one category.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A record failed validation.
    Validation(ValidationError),
    /// A parameter or threshold is invalid.
    Configuration(ConfigurationError),
    /// A coordinate fell outside the terrain grid.
    OutOfBounds(OutOfBoundsError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Validation(e) => e.fmt(f),
            CoreError::Configuration(e) => e.fmt(f),
            CoreError::OutOfBounds(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::Validation(e) => Some(e),
            CoreError::Configuration(e) => Some(e),
            CoreError::OutOfBounds(e) => Some(e),
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(e: ValidationError) -> Self {
        CoreError::Validation(e)
    }
}

impl From<ConfigurationError> for CoreError {
    fn from(e: ConfigurationError) -> Self {
        CoreError::Configuration(e)
    }
}

impl From<OutOfBoundsError> for CoreError {
    fn from(e: OutOfBoundsError) -> Self {
        CoreError::OutOfBounds(e)
    }
}
