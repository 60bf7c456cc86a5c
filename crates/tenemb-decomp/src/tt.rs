//! Tensor Train decomposition (TT-SVD)
//!
//! The Tensor Train (TT) decomposition represents an N-way tensor as a sequence
//! of 3-way tensors (TT-cores):
//!
//! X(i₁, i₂, ..., iₙ) = G₁\[i₁\] × G₂\[i₂\] × ... × Gₙ\[iₙ\]
//!
//! Where:
//! - Gₖ is a TT-core with shape (rₖ₋₁, iₖ, rₖ)
//! - r₀ = rₙ = 1 (boundary conditions)
//! - r₁, r₂, ..., rₙ₋₁ are TT-ranks
//!
//! # Algorithms
//!
//! ## TT-SVD
//! Computes TT decomposition via sequential SVD with rank truncation.
//! Time: O(N × I³ × R²) where I = max mode size, R = max TT-rank
//!
//! [`TTDecomp::pad_to_ranks`] zero-pads a truncated result back to a fixed
//! rank chain, which keeps core shapes stable when the numerical rank of the
//! data is lower than the requested one.
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.
//! SVD operations use the one-sided Jacobi [`thin_svd`](crate::thin_svd).

use anyhow::Result;
use scirs2_core::ndarray_ext::{s, Array2, Array3, Axis};
use crate::svd::thin_svd;
use tenemb_core::{DenseND, Element};
use tenemb_kernels::tt_to_tensor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TTError {
    #[error("Invalid ranks: {0}")]
    InvalidRanks(String),

    #[error("SVD failed: {0}")]
    SvdError(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid tensor: {0}")]
    InvalidTensor(String),
}

/// Tensor Train decomposition result
///
/// Each core Gₖ has shape (rₖ₋₁, iₖ, rₖ) with r₀ = rₙ = 1.
#[derive(Clone)]
pub struct TTDecomp<T> {
    /// TT-cores: each core is a 3-way tensor (r_{k-1}, I_k, r_k)
    pub cores: Vec<Array3<T>>,

    /// Internal TT-ranks: [r₁, r₂, ..., rₙ₋₁]
    pub ranks: Vec<usize>,

    /// Original tensor shape
    pub shape: Vec<usize>,

    /// Relative reconstruction error, if computed
    pub error: Option<T>,
}

impl<T> TTDecomp<T>
where
    T: Element,
{
    /// Reconstruct the full tensor by contracting the core chain
    ///
    /// # Complexity
    ///
    /// Time: O(∏ᵢ Iᵢ × R²) where R = max TT-rank
    /// Space: O(∏ᵢ Iᵢ)
    pub fn reconstruct(&self) -> Result<DenseND<T>> {
        let views: Vec<_> = self.cores.iter().map(|c| c.view()).collect();
        Ok(DenseND::from_array(tt_to_tensor(&views)?))
    }

    /// Compute and store ||X - X_reconstructed|| / ||X||
    pub fn compute_error(&mut self, original: &DenseND<T>) -> Result<T> {
        let reconstructed = self.reconstruct()?;
        let error = reconstructed.relative_error(original)?;
        self.error = Some(error);
        Ok(error)
    }

    /// Number of scalars stored across all cores
    pub fn num_parameters(&self) -> usize {
        self.cores.iter().map(|core| core.len()).sum()
    }

    /// Zero-pad every core to the internal rank chain `ranks`
    ///
    /// The represented tensor is unchanged: the added right-rank slices of
    /// core k and left-rank slices of core k+1 are zero.
    ///
    /// # Errors
    ///
    /// Returns error if `ranks` has the wrong length or any target rank is
    /// smaller than the current one.
    pub fn pad_to_ranks(&self, ranks: &[usize]) -> Result<TTDecomp<T>, TTError> {
        if ranks.len() != self.ranks.len() {
            return Err(TTError::InvalidRanks(format!(
                "Expected {} internal ranks, got {}",
                self.ranks.len(),
                ranks.len()
            )));
        }
        for (k, (&target, &current)) in ranks.iter().zip(self.ranks.iter()).enumerate() {
            if target < current {
                return Err(TTError::InvalidRanks(format!(
                    "Cannot pad rank {} from {} down to {}",
                    k, current, target
                )));
            }
        }

        let n = self.cores.len();
        let mut chain = Vec::with_capacity(n + 1);
        chain.push(1);
        chain.extend_from_slice(ranks);
        chain.push(1);

        let cores = self
            .cores
            .iter()
            .enumerate()
            .map(|(k, core)| {
                let (r_left, i_k, r_right) = core.dim();
                let mut padded = Array3::<T>::zeros((chain[k], i_k, chain[k + 1]));
                padded
                    .slice_mut(s![..r_left, .., ..r_right])
                    .assign(core);
                padded
            })
            .collect();

        Ok(TTDecomp {
            cores,
            ranks: ranks.to_vec(),
            shape: self.shape.clone(),
            error: self.error,
        })
    }
}

/// Compute TT-SVD decomposition with rank truncation
///
/// * `max_ranks` - Maximum TT-ranks [r₁, r₂, ..., rₙ₋₁]
/// * `tol` - Truncation tolerance (keep singular values > tol * σ_max)
///
/// At least one singular direction is always kept per step.
///
/// # Errors
///
/// Returns error if:
/// - Tensor has less than 2 modes
/// - Max ranks are invalid
/// - SVD computation fails
///
/// # Examples
///
/// ```
/// use tenemb_core::DenseND;
/// use tenemb_decomp::tt_svd;
///
/// let tensor = DenseND::<f64>::ones(&[4, 4, 4]);
/// let tt = tt_svd(&tensor, &[3, 3], 1e-12).unwrap();
/// assert_eq!(tt.ranks, vec![1, 1]);
/// assert_eq!(tt.cores.len(), 3);
/// ```
pub fn tt_svd<T>(tensor: &DenseND<T>, max_ranks: &[usize], tol: f64) -> Result<TTDecomp<T>, TTError>
where
    T: Element,
{
    let shape = tensor.shape().to_vec();
    let n_modes = shape.len();

    if n_modes < 2 {
        return Err(TTError::InvalidTensor(format!(
            "Tensor must have at least 2 modes, got {}",
            n_modes
        )));
    }

    if max_ranks.len() != n_modes - 1 {
        return Err(TTError::InvalidRanks(format!(
            "Expected {} max ranks, got {}",
            n_modes - 1,
            max_ranks.len()
        )));
    }

    for (k, &r) in max_ranks.iter().enumerate() {
        if r == 0 {
            return Err(TTError::InvalidRanks(format!("Max rank {} is zero", k)));
        }
    }

    let mut cores = Vec::with_capacity(n_modes);
    let mut actual_ranks = Vec::with_capacity(n_modes - 1);
    let threshold_scale = T::from(tol).unwrap_or_else(T::zero);

    let mut c_data = tensor.view().iter().cloned().collect::<Vec<_>>();
    let mut r_left = 1;

    for k in 0..n_modes - 1 {
        let i_k = shape[k];
        let cols: usize = shape[k + 1..].iter().product();
        let rows = r_left * i_k;

        let c_matrix = Array2::from_shape_vec((rows, cols), c_data)
            .map_err(|e| TTError::ShapeMismatch(format!("Matrix reshape failed: {}", e)))?;

        let (u, sigma, vt) = thin_svd(&c_matrix.view())
            .map_err(|e| TTError::SvdError(format!("SVD failed at mode {}: {}", k, e)))?;

        let max_r = max_ranks[k].min(sigma.len());
        let threshold = threshold_scale * sigma[0];

        let kept = sigma
            .iter()
            .take(max_r)
            .take_while(|&&value| value > threshold)
            .count();
        let r_right = kept.max(1);
        actual_ranks.push(r_right);

        let u_trunc = u.slice(s![.., ..r_right]).to_owned();
        let core_data: Vec<T> = u_trunc.iter().cloned().collect();
        let core_3d = Array3::from_shape_vec((r_left, i_k, r_right), core_data)
            .map_err(|e| TTError::ShapeMismatch(format!("Core reshape failed: {}", e)))?;
        cores.push(core_3d);

        // C = diag(S[:r]) · Vᵀ[:r, :]
        let mut c_next = vt.slice(s![..r_right, ..]).to_owned();
        for (mut row, &value) in c_next
            .axis_iter_mut(Axis(0))
            .zip(sigma.slice(s![..r_right]).iter())
        {
            row.mapv_inplace(|v| v * value);
        }

        c_data = c_next.iter().cloned().collect();
        r_left = r_right;
    }

    let last_cols = shape[n_modes - 1];
    if c_data.len() != r_left * last_cols {
        return Err(TTError::ShapeMismatch(format!(
            "Final core size mismatch: expected {}, got {}",
            r_left * last_cols,
            c_data.len()
        )));
    }

    let last_core = Array3::from_shape_vec((r_left, last_cols, 1), c_data)
        .map_err(|e| TTError::ShapeMismatch(format!("Last core reshape failed: {}", e)))?;
    cores.push(last_core);

    Ok(TTDecomp {
        cores,
        ranks: actual_ranks,
        shape,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tensor() -> DenseND<f64> {
        let data: Vec<f64> = (0..48).map(|x| ((x * 5) % 13) as f64 - 6.0).collect();
        DenseND::from_vec(data, &[2, 4, 3, 2]).unwrap()
    }

    #[test]
    fn test_tt_svd_core_shapes() {
        let tensor = sample_tensor();
        let tt = tt_svd(&tensor, &[2, 3, 2], 1e-12).unwrap();

        assert_eq!(tt.cores.len(), 4);
        assert_eq!(tt.cores[0].shape()[0], 1);
        assert_eq!(tt.cores[3].shape()[2], 1);
        for k in 0..3 {
            assert_eq!(tt.cores[k].shape()[2], tt.cores[k + 1].shape()[0]);
        }
    }

    #[test]
    fn test_full_ranks_are_exact() {
        // Unfolding bounds for [2, 4, 3, 2]: min(2, 24), min(8, 6), min(24, 2)
        let tensor = sample_tensor();
        let mut tt = tt_svd(&tensor, &[2, 6, 2], 0.0).unwrap();
        assert!(tt.compute_error(&tensor).unwrap() < 1e-10);
    }

    #[test]
    fn test_pad_to_ranks_preserves_tensor() {
        let tensor = DenseND::<f64>::ones(&[3, 3, 3]);
        let tt = tt_svd(&tensor, &[3, 3], 1e-10).unwrap();
        assert_eq!(tt.ranks, vec![1, 1]);

        let padded = tt.pad_to_ranks(&[3, 2]).unwrap();
        assert_eq!(padded.cores[0].shape(), &[1, 3, 3]);
        assert_eq!(padded.cores[1].shape(), &[3, 3, 2]);
        assert_eq!(padded.cores[2].shape(), &[2, 3, 1]);

        let recon = padded.reconstruct().unwrap();
        assert!(recon.max_abs_diff(&tensor).unwrap() < 1e-10);
    }

    #[test]
    fn test_full_ranks_exact_on_tensorized_table() {
        // 160 x 16 table tensorized as [10, 4, 4, 4]; unfoldings are 10 x 64,
        // 40 x 16 and 16 x 4 at the bounds [10, 16, 4]
        let data: Vec<f64> = (0..640)
            .map(|x| ((x as f64) * 0.37).sin() + ((x % 7) as f64) * 0.1)
            .collect();
        let tensor = DenseND::from_vec(data, &[10, 4, 4, 4]).unwrap();
        let mut tt = tt_svd(&tensor, &[10, 16, 4], 0.0).unwrap();
        assert!(tt.compute_error(&tensor).unwrap() < 1e-12);
    }

    #[test]
    fn test_relative_truncation_drops_roundoff_ranks() {
        let tensor = DenseND::<f64>::ones(&[4, 16]);
        let tt = tt_svd(&tensor, &[4], 1e-10).unwrap();
        assert_eq!(tt.ranks, vec![1]);

        let scaled = DenseND::<f64>::from_elem(&[4, 4, 4], 1e-6);
        let tt = tt_svd(&scaled, &[4, 4], 1e-10).unwrap();
        assert_eq!(tt.ranks, vec![1, 1]);
    }

    #[test]
    fn test_pad_to_smaller_rank_fails() {
        let tensor = sample_tensor();
        let tt = tt_svd(&tensor, &[2, 3, 2], 0.0).unwrap();
        assert!(tt.pad_to_ranks(&[1, 1, 1]).is_err());
        assert!(tt.pad_to_ranks(&[2, 3]).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        let vector = DenseND::<f64>::ones(&[5]);
        assert!(matches!(
            tt_svd(&vector, &[], 0.0),
            Err(TTError::InvalidTensor(_))
        ));
        let tensor = DenseND::<f64>::ones(&[2, 2, 2]);
        assert!(matches!(
            tt_svd(&tensor, &[2], 0.0),
            Err(TTError::InvalidRanks(_))
        ));
        assert!(matches!(
            tt_svd(&tensor, &[0, 2], 0.0),
            Err(TTError::InvalidRanks(_))
        ));
    }
}
