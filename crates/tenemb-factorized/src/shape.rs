//! Tensorized shapes and automatic shape suggestion
//!
//! A (rows × cols) table is stored as a tensor whose modes are the row modes
//! followed by the column modes:
//!
//! ```text
//! rows = r₁ · r₂ · ... · rₐ        cols = c₁ · c₂ · ... · c_b
//! tensor shape = (r₁, ..., rₐ, c₁, ..., c_b)
//! ```
//!
//! [`suggest_shape`] picks the row (or column) modes when the caller only
//! knows the table size.

use crate::error::{FactorizedError, Result};
use std::fmt;
use tenemb_core::Shape;

/// Row-mode and column-mode groups of a tensorized table
///
/// # Examples
///
/// ```
/// use tenemb_factorized::TensorizedShape;
///
/// let shape = TensorizedShape::new(&[10, 10, 10], &[8, 8]).unwrap();
/// assert_eq!(shape.num_rows(), 1000);
/// assert_eq!(shape.num_cols(), 64);
/// assert_eq!(shape.modes().as_slice(), &[10, 10, 10, 8, 8]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorizedShape {
    rows: Shape,
    cols: Shape,
}

impl TensorizedShape {
    /// Create a shape from its row modes and column modes
    ///
    /// # Errors
    ///
    /// Fails if either group is empty or contains a zero.
    pub fn new(row_modes: &[usize], col_modes: &[usize]) -> Result<Self> {
        for (name, group) in [("row", row_modes), ("column", col_modes)] {
            if group.is_empty() {
                return Err(FactorizedError::invalid(format!(
                    "Tensorized {} shape must have at least one mode",
                    name
                )));
            }
            if group.contains(&0) {
                return Err(FactorizedError::invalid(format!(
                    "Tensorized {} shape {:?} contains a zero mode",
                    name, group
                )));
            }
        }
        Ok(Self {
            rows: Shape::from_slice(row_modes),
            cols: Shape::from_slice(col_modes),
        })
    }

    /// Modes of the row axis
    pub fn row_modes(&self) -> &[usize] {
        &self.rows
    }

    /// Modes of the column axis
    pub fn col_modes(&self) -> &[usize] {
        &self.cols
    }

    /// Number of table rows (product of row modes)
    pub fn num_rows(&self) -> usize {
        self.rows.iter().product()
    }

    /// Number of table columns (product of column modes)
    pub fn num_cols(&self) -> usize {
        self.cols.iter().product()
    }

    /// Number of row modes
    pub fn num_row_modes(&self) -> usize {
        self.rows.len()
    }

    /// Total number of tensor modes
    pub fn order(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    /// Full tensor shape: row modes followed by column modes
    pub fn modes(&self) -> Shape {
        self.rows.iter().chain(self.cols.iter()).copied().collect()
    }
}

impl fmt::Display for TensorizedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} x {:?}", self.rows.as_slice(), self.cols.as_slice())
    }
}

/// Suggest `d` balanced factors whose product is at least `n`
///
/// `n` is rounded up to multiples of 10ᵏ for every k below its number of
/// decimal digits. Each candidate is split into the most balanced ascending
/// `d`-tuple of divisors (padding with 1s when needed), and the candidate
/// whose split is most balanced wins. Balance is the entropy of the
/// normalized log-factors `ln fᵢ / ln m`; ties go to the smaller candidate.
///
/// # Errors
///
/// Fails with [`FactorizedError::InvalidArgument`] if `n` or `d` is zero.
///
/// # Examples
///
/// ```
/// use tenemb_factorized::suggest_shape;
///
/// assert_eq!(suggest_shape(1000, 3).unwrap().as_slice(), &[10, 10, 10]);
/// assert_eq!(suggest_shape(37, 2).unwrap().as_slice(), &[5, 8]);
/// assert_eq!(suggest_shape(64, 2).unwrap().as_slice(), &[8, 8]);
/// ```
pub fn suggest_shape(n: usize, d: usize) -> Result<Shape> {
    if n == 0 {
        return Err(FactorizedError::invalid(
            "Cannot tensorize a dimension of size 0",
        ));
    }
    if d == 0 {
        return Err(FactorizedError::invalid(
            "Number of tensorized modes must be at least 1",
        ));
    }
    if n == 1 || d == 1 {
        let mut shape = Shape::from_elem(1, d);
        shape[d - 1] = n;
        return Ok(shape);
    }

    let mut best: Option<(f64, Shape)> = None;
    for m in rounding_candidates(n) {
        let (score, factors) = most_balanced_split(m, d);
        let better = match &best {
            Some((best_score, _)) => score > best_score + 1e-12,
            None => true,
        };
        if better {
            best = Some((score, factors));
        }
    }

    best.map(|(_, shape)| shape)
        .ok_or_else(|| FactorizedError::invalid(format!("No factorization found for {}", n)))
}

/// `n` rounded up to multiples of 1, 10, 100, ... in increasing order
fn rounding_candidates(n: usize) -> Vec<usize> {
    let digits = n.to_string().len();
    let mut candidates = Vec::with_capacity(digits);
    let mut step = 1usize;
    for _ in 0..digits {
        let m = n.div_ceil(step) * step;
        if candidates.last() != Some(&m) {
            candidates.push(m);
        }
        step = step.saturating_mul(10);
    }
    candidates.sort_unstable();
    candidates.dedup();
    candidates
}

/// Most balanced ascending `d`-tuple with product exactly `m`
fn most_balanced_split(m: usize, d: usize) -> (f64, Shape) {
    let mut current = Shape::new();
    let mut best = (f64::NEG_INFINITY, Shape::new());
    search_splits(m, d, 1, m, &mut current, &mut best);
    best
}

fn search_splits(
    remaining: usize,
    parts_left: usize,
    min_factor: usize,
    total: usize,
    current: &mut Shape,
    best: &mut (f64, Shape),
) {
    if parts_left == 1 {
        if remaining >= min_factor {
            current.push(remaining);
            let score = balance_score(current, total);
            if score > best.0 + 1e-12 {
                *best = (score, current.clone());
            }
            current.pop();
        }
        return;
    }

    let mut f = min_factor;
    while fits_power(f, parts_left, remaining) {
        if remaining % f == 0 {
            current.push(f);
            search_splits(remaining / f, parts_left - 1, f, total, current, best);
            current.pop();
        }
        f += 1;
    }
}

/// Whether `f^k <= limit`
fn fits_power(f: usize, k: usize, limit: usize) -> bool {
    u32::try_from(k)
        .ok()
        .and_then(|k| f.checked_pow(k))
        .is_some_and(|p| p <= limit)
}

/// Entropy of `ln fᵢ / ln m`; larger is more balanced
fn balance_score(factors: &[usize], m: usize) -> f64 {
    let log_m = (m as f64).ln();
    factors
        .iter()
        .map(|&f| (f as f64).ln() / log_m)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}
