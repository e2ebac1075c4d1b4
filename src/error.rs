//! Error types.
//!
//! - `BackgroundError`: typed failures of the numerical engine (library API).
//! - `AppError`: exit code + message, used at the binary boundary.

use thiserror::Error;

/// Failures raised while building or querying a background table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackgroundError {
    /// Malformed sample table (too few points, non-increasing abscissas, NaNs).
    #[error("domain error: {0}")]
    Domain(String),

    /// Query outside the tabulated domain; no extrapolation is performed.
    #[error("{x} is outside the tabulated range [{min}, {max}]")]
    OutOfRange { x: f64, min: f64, max: f64 },

    /// The adaptive ODE stepper could not meet its tolerance.
    #[error("growth ODE diverged: {0}")]
    NumericalDivergence(String),

    /// χ(z) is not strictly increasing, so z(χ) cannot be built.
    #[error("comoving distance is not strictly increasing: {0}")]
    NonMonotoneInverse(String),

    /// A computed background value is NaN or infinite.
    #[error("non-finite {quantity} at z={z}")]
    NonFiniteResult { quantity: String, z: f64 },

    /// Parameters rejected before any numerical work starts.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl BackgroundError {
    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    pub fn non_finite(quantity: impl Into<String>, z: f64) -> Self {
        Self::NonFiniteResult {
            quantity: quantity.into(),
            z,
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

impl From<BackgroundError> for AppError {
    fn from(err: BackgroundError) -> Self {
        let exit_code = match err {
            BackgroundError::Domain(_) | BackgroundError::InvalidParameters(_) => 2,
            BackgroundError::OutOfRange { .. } => 3,
            BackgroundError::NumericalDivergence(_)
            | BackgroundError::NonMonotoneInverse(_)
            | BackgroundError::NonFiniteResult { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
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
    fn background_errors_map_to_exit_codes() {
        let e: AppError = BackgroundError::OutOfRange { x: 16.0, min: 0.0, max: 15.0 }.into();
        assert_eq!(e.exit_code(), 3);
        let e: AppError = BackgroundError::NumericalDivergence("step underflow".into()).into();
        assert_eq!(e.exit_code(), 4);
        let e: AppError = BackgroundError::domain("too few points").into();
        assert_eq!(e.exit_code(), 2);
    }
}
