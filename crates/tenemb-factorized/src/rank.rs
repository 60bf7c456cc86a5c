//! Rank specifications and their per-scheme resolution
//!
//! A [`Rank`] is what the caller asks for; [`Rank::resolve`] turns it into the
//! concrete integers a scheme stores:
//!
//! | Scheme  | Resolved rank                                   |
//! |---------|-------------------------------------------------|
//! | CP      | `[R]`                                           |
//! | Tucker  | `[R₁, ..., R_N]`, one per mode, `Rₙ ≤ Iₙ`        |
//! | BlockTT | `[1, r₁, ..., r_{N-1}, 1]`, `rₖ` bounded by the k-th unfolding |
//!
//! Uniform and heuristic ranks are clamped to these bounds; explicit per-mode
//! ranks that violate them are rejected.

use crate::error::{FactorizedError, Result};
use crate::scheme::Scheme;
use std::fmt;
use std::str::FromStr;

/// Requested rank of a factorized tensor
///
/// # Examples
///
/// ```
/// use tenemb_factorized::{Rank, Scheme};
///
/// let rank: Rank = "4".parse().unwrap();
/// assert_eq!(rank.resolve(Scheme::BlockTt, &[10, 10, 10, 8, 8]).unwrap(), vec![1, 4, 4, 4, 4, 1]);
///
/// // Uniform Tucker ranks are clamped to the mode sizes
/// assert_eq!(Rank::Uniform(4).resolve(Scheme::Tucker, &[3, 5]).unwrap(), vec![3, 4]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rank {
    /// Same rank for every mode (or every internal TT bond)
    Uniform(usize),
    /// Explicit ranks, one per mode (Tucker) or per internal bond (BlockTT)
    PerMode(Vec<usize>),
    /// As many parameters as the dense table
    Same,
    /// Parameter count of roughly this fraction of the dense table
    Fraction(f64),
}

impl Default for Rank {
    fn default() -> Self {
        Rank::Uniform(8)
    }
}

impl From<usize> for Rank {
    fn from(rank: usize) -> Self {
        Rank::Uniform(rank)
    }
}

impl From<Vec<usize>> for Rank {
    fn from(ranks: Vec<usize>) -> Self {
        Rank::PerMode(ranks)
    }
}

impl From<f64> for Rank {
    fn from(fraction: f64) -> Self {
        Rank::Fraction(fraction)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Uniform(r) => write!(f, "{}", r),
            Rank::PerMode(ranks) => {
                let parts: Vec<String> = ranks.iter().map(|r| r.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Rank::Same => write!(f, "same"),
            Rank::Fraction(x) => write!(f, "{:?}", x),
        }
    }
}

impl FromStr for Rank {
    type Err = FactorizedError;

    /// Parse `"8"`, `"2,3,4"`, `"same"` or `"0.5"`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = |what: &str| FactorizedError::invalid(format!("Cannot parse rank {:?}: {}", s, what));

        if s.eq_ignore_ascii_case("same") {
            return Ok(Rank::Same);
        }
        if s.contains(',') {
            let ranks = s
                .split(',')
                .map(|part| part.trim().parse::<usize>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| bad(&e.to_string()))?;
            return Ok(Rank::PerMode(ranks));
        }
        if s.contains(['.', 'e', 'E']) {
            let fraction = s.parse::<f64>().map_err(|e| bad(&e.to_string()))?;
            return Ok(Rank::Fraction(fraction));
        }
        s.parse::<usize>()
            .map(Rank::Uniform)
            .map_err(|e| bad(&e.to_string()))
    }
}

impl Rank {
    /// Resolve to concrete ranks for `scheme` on a tensor with mode sizes `dims`
    ///
    /// # Errors
    ///
    /// Fails with [`FactorizedError::InvalidArgument`] on zero ranks,
    /// non-positive fractions, wrong per-mode lengths, or explicit ranks
    /// beyond the scheme's bounds.
    pub fn resolve(&self, scheme: Scheme, dims: &[usize]) -> Result<Vec<usize>> {
        if dims.len() < 2 || dims.contains(&0) {
            return Err(FactorizedError::invalid(format!(
                "Factorized tensors need at least 2 non-empty modes, got {:?}",
                dims
            )));
        }
        match self {
            Rank::Uniform(0) => return Err(FactorizedError::invalid("Rank must be positive, got 0")),
            Rank::PerMode(ranks) if ranks.contains(&0) => {
                return Err(FactorizedError::invalid(format!(
                    "Ranks must be positive, got {:?}",
                    ranks
                )))
            }
            _ => {}
        }

        match scheme {
            Scheme::Cp => self.resolve_cp(dims).map(|r| vec![r]),
            Scheme::Tucker => self.resolve_tucker(dims),
            Scheme::BlockTt => self.resolve_tt(dims),
        }
    }

    /// Target parameter count for `Same`/`Fraction`
    fn parameter_budget(&self, dims: &[usize]) -> Result<f64> {
        let dense = dims.iter().product::<usize>() as f64;
        match self {
            Rank::Same => Ok(dense),
            Rank::Fraction(f) if f.is_finite() && *f > 0.0 => Ok(f * dense),
            Rank::Fraction(f) => Err(FactorizedError::invalid(format!(
                "Rank fraction must be positive and finite, got {}",
                f
            ))),
            explicit => Err(FactorizedError::invalid(format!(
                "Rank {} is explicit and has no parameter budget",
                explicit
            ))),
        }
    }

    fn resolve_cp(&self, dims: &[usize]) -> Result<usize> {
        match self {
            Rank::Uniform(r) => Ok(*r),
            Rank::PerMode(ranks) if ranks.len() == 1 => Ok(ranks[0]),
            Rank::PerMode(ranks) => Err(FactorizedError::invalid(format!(
                "CP uses a single rank shared by all modes, got {:?}",
                ranks
            ))),
            Rank::Same | Rank::Fraction(_) => {
                let budget = self.parameter_budget(dims)?;
                // R weights plus R columns per mode
                let per_component = (dims.iter().sum::<usize>() + 1) as f64;
                Ok(((budget / per_component).round() as usize).max(1))
            }
        }
    }

    fn resolve_tucker(&self, dims: &[usize]) -> Result<Vec<usize>> {
        match self {
            Rank::Uniform(r) => Ok(dims.iter().map(|&d| (*r).min(d)).collect()),
            Rank::PerMode(ranks) => {
                if ranks.len() != dims.len() {
                    return Err(FactorizedError::invalid(format!(
                        "Tucker needs one rank per mode ({}), got {:?}",
                        dims.len(),
                        ranks
                    )));
                }
                for (mode, (&r, &d)) in ranks.iter().zip(dims.iter()).enumerate() {
                    if r > d {
                        return Err(FactorizedError::invalid(format!(
                            "Tucker rank {} for mode {} exceeds its size {}",
                            r, mode, d
                        )));
                    }
                }
                Ok(ranks.clone())
            }
            Rank::Same | Rank::Fraction(_) => {
                Ok(tucker_ranks_for_budget(dims, self.parameter_budget(dims)?))
            }
        }
    }

    fn resolve_tt(&self, dims: &[usize]) -> Result<Vec<usize>> {
        let bounds = tt_rank_bounds(dims);

        let internal: Vec<usize> = match self {
            Rank::Uniform(r) => bounds.iter().map(|&b| (*r).min(b)).collect(),
            Rank::PerMode(ranks) => {
                let internal = match ranks.len() {
                    n if n == bounds.len() => ranks.clone(),
                    n if n == bounds.len() + 2 => {
                        if ranks[0] != 1 || ranks[n - 1] != 1 {
                            return Err(FactorizedError::invalid(format!(
                                "BlockTT boundary ranks must be 1, got {:?}",
                                ranks
                            )));
                        }
                        ranks[1..n - 1].to_vec()
                    }
                    _ => {
                        return Err(FactorizedError::invalid(format!(
                            "BlockTT over {} modes needs {} internal ranks, got {:?}",
                            dims.len(),
                            bounds.len(),
                            ranks
                        )))
                    }
                };
                for (k, (&r, &b)) in internal.iter().zip(bounds.iter()).enumerate() {
                    if r > b {
                        return Err(FactorizedError::invalid(format!(
                            "BlockTT rank {} at bond {} exceeds the unfolding bound {}",
                            r,
                            k + 1,
                            b
                        )));
                    }
                }
                internal
            }
            Rank::Same | Rank::Fraction(_) => {
                let r = tt_uniform_rank_for_budget(dims, self.parameter_budget(dims)?);
                bounds.iter().map(|&b| r.min(b)).collect()
            }
        };

        let mut chain = Vec::with_capacity(dims.len() + 1);
        chain.push(1);
        chain.extend(internal);
        chain.push(1);
        Ok(chain)
    }
}

/// Largest useful TT rank at each internal bond: `min(Π dims[..k], Π dims[k..])`
pub fn tt_rank_bounds(dims: &[usize]) -> Vec<usize> {
    (1..dims.len())
        .map(|k| {
            let left: usize = dims[..k].iter().product();
            let right: usize = dims[k..].iter().product();
            left.min(right)
        })
        .collect()
}

/// Uniform TT rank whose parameter count `r(d₁ + d_N) + r² Σ d_mid` meets `budget`
fn tt_uniform_rank_for_budget(dims: &[usize], budget: f64) -> usize {
    let n = dims.len();
    let a: f64 = dims[1..n - 1].iter().sum::<usize>() as f64;
    let b = (dims[0] + dims[n - 1]) as f64;
    let r = if a == 0.0 {
        budget / b
    } else {
        (-b + (b * b + 4.0 * a * budget).sqrt()) / (2.0 * a)
    };
    (r.floor() as usize).max(1)
}

/// Tucker ranks `round(α·Iₙ)` for the largest α whose core + factors fit `budget`
fn tucker_ranks_for_budget(dims: &[usize], budget: f64) -> Vec<usize> {
    let ranks_at = |alpha: f64| -> Vec<usize> {
        dims.iter()
            .map(|&d| ((alpha * d as f64).round() as usize).clamp(1, d))
            .collect()
    };
    let params = |ranks: &[usize]| -> f64 {
        let core: f64 = ranks.iter().map(|&r| r as f64).product();
        let factors: f64 = ranks.iter().zip(dims.iter()).map(|(&r, &d)| (r * d) as f64).sum();
        core + factors
    };

    if params(&ranks_at(1.0)) <= budget {
        return dims.to_vec();
    }
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    for _ in 0..60 {
        let mid = 0.5 * (lo + hi);
        if params(&ranks_at(mid)) <= budget {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    ranks_at(lo)
}
