// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for the Trust Simulation Kernel.
///
/// Scoring never fails: engines substitute safe defaults for malformed
/// numbers. These variants are only produced at parameter boundaries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrustSimError {
    /// Invalid caller-supplied parameters (generator ranges, preset names).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error (policy or kernel constants).
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in a parameter that cannot be substituted).
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type TrustSimResult<T> = Result<T, TrustSimError>;
