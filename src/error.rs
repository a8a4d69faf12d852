//! Error types.
//!
//! Two layers:
//!
//! - [`FitError`]: failures of the numerical core (series construction,
//!   linearization, fitting). Each variant is one specific failure kind; a fit
//!   either returns a complete result or exactly one of these.
//! - [`AppError`]: what the binary reports. It carries a process exit code:
//!   `2` input/config/IO problems, `3` not enough data, `4` numerical failure.

use thiserror::Error;

/// Failures raised by the fitting core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// A row or point is malformed (wrong arity, non-finite, negative sigma).
    #[error("Invalid data at row {index}: {reason}")]
    InvalidData {
        /// Zero-based row / point index.
        index: usize,
        reason: String,
    },

    /// Fewer usable points than the fit needs.
    #[error("Insufficient data: need at least {required} points, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// The weighted normal matrix cannot be inverted (e.g. all x identical).
    #[error("Singular fit: the weighted normal matrix is degenerate")]
    SingularFit,

    /// The logarithm precondition `y > 0` is violated.
    #[error("Non-positive value {value} at point {index}: logarithm undefined")]
    NonPositiveValue { index: usize, value: f64 },

    /// The bounded solver hit its iteration cap before meeting tolerance.
    #[error(
        "Bounded fit did not converge after {iterations} iterations (last relative change {relative_change:e})"
    )]
    Convergence {
        iterations: usize,
        relative_change: f64,
    },

    /// The fit configuration itself is malformed.
    #[error("Invalid fit configuration: {0}")]
    InvalidConfig(String),
}

impl FitError {
    /// Exit code used when this error escapes to the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::InvalidData { .. } | FitError::InvalidConfig(_) => 2,
            FitError::InsufficientData { .. } => 3,
            FitError::SingularFit | FitError::NonPositiveValue { .. } | FitError::Convergence { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_error_maps_to_exit_codes() {
        let insufficient: AppError = FitError::InsufficientData {
            required: 2,
            available: 1,
        }
        .into();
        assert_eq!(insufficient.exit_code(), 3);
        assert!(insufficient.to_string().contains("got 1"));

        let singular: AppError = FitError::SingularFit.into();
        assert_eq!(singular.exit_code(), 4);

        let invalid: AppError = FitError::InvalidConfig("lo > hi".into()).into();
        assert_eq!(invalid.exit_code(), 2);
    }
}
