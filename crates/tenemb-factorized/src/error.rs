//! Error taxonomy for factorized tensors
//!
//! Every public operation in this crate fails with one of three kinds of
//! error. Errors coming from the decomposition back-ends are folded into the
//! same taxonomy: rank and shape problems become
//! [`FactorizedError::InvalidArgument`], failed SVDs and least-squares solves
//! become [`FactorizedError::NumericalFailure`].

use tenemb_decomp::{CpError, TTError, TuckerError};
use thiserror::Error;

/// Errors raised by factorized tensors and the embedding layer built on them
#[derive(Error, Debug)]
pub enum FactorizedError {
    /// Bad shape/rank combination, conflicting options, out-of-range index
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown factorization scheme name
    #[error("Unsupported factorization scheme: {0}")]
    UnsupportedScheme(String),

    /// Decomposition failed or produced non-finite values
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FactorizedError>;

impl FactorizedError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FactorizedError::InvalidArgument(msg.into())
    }

    pub(crate) fn numerical(msg: impl Into<String>) -> Self {
        FactorizedError::NumericalFailure(msg.into())
    }
}

impl From<CpError> for FactorizedError {
    fn from(err: CpError) -> Self {
        match err {
            CpError::LinalgError(e) => FactorizedError::numerical(format!("CP-ALS: {}", e)),
            CpError::SvdError(msg) => FactorizedError::numerical(format!("CP-ALS: {}", msg)),
            other => FactorizedError::invalid(format!("CP-ALS: {}", other)),
        }
    }
}

impl From<TuckerError> for FactorizedError {
    fn from(err: TuckerError) -> Self {
        match err {
            TuckerError::SvdError(msg) => FactorizedError::numerical(format!("Tucker: {}", msg)),
            other => FactorizedError::invalid(format!("Tucker: {}", other)),
        }
    }
}

impl From<TTError> for FactorizedError {
    fn from(err: TTError) -> Self {
        match err {
            TTError::SvdError(msg) => FactorizedError::numerical(format!("TT-SVD: {}", msg)),
            other => FactorizedError::invalid(format!("TT-SVD: {}", other)),
        }
    }
}

/// Kernel errors only arise from inconsistent shapes or indices
impl From<anyhow::Error> for FactorizedError {
    fn from(err: anyhow::Error) -> Self {
        FactorizedError::InvalidArgument(err.to_string())
    }
}
