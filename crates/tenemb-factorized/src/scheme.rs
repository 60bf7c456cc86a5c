//! Factorization schemes

use crate::error::FactorizedError;
use std::fmt;
use std::str::FromStr;

/// Decomposition used to store a tensorized table
///
/// Scheme names parse case-insensitively:
///
/// ```
/// use tenemb_factorized::Scheme;
///
/// assert_eq!("BlockTT".parse::<Scheme>().unwrap(), Scheme::BlockTt);
/// assert_eq!("cp".parse::<Scheme>().unwrap(), Scheme::Cp);
/// assert!("hierarchical".parse::<Scheme>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scheme {
    /// Canonical polyadic: one (Iₙ × R) factor per mode plus R weights
    Cp,
    /// Tucker: one (Iₙ × Rₙ) factor per mode plus a dense core
    Tucker,
    /// Tensor train over the row modes followed by the column modes
    #[default]
    BlockTt,
}

impl Scheme {
    /// Canonical name of the scheme
    pub fn name(self) -> &'static str {
        match self {
            Scheme::Cp => "CP",
            Scheme::Tucker => "Tucker",
            Scheme::BlockTt => "BlockTT",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = FactorizedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cp" | "parafac" | "candecomp" => Ok(Scheme::Cp),
            "tucker" => Ok(Scheme::Tucker),
            "blocktt" | "block_tt" | "block-tt" | "tt" => Ok(Scheme::BlockTt),
            _ => Err(FactorizedError::UnsupportedScheme(s.to_string())),
        }
    }
}
