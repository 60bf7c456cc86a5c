//! Tucker decomposition (HOSVD and HOOI)
//!
//! The Tucker decomposition factorizes a tensor X into a core tensor G and factor matrices:
//!
//! X ≈ G ×₁ U₁ ×₂ U₂ ×₃ ... ×ₙ Uₙ
//!
//! Where:
//! - G is the core tensor with shape (R₁, R₂, ..., Rₙ)
//! - Uᵢ are factor matrices with shape (Iᵢ, Rᵢ) and orthonormal columns
//! - ×ᵢ denotes the i-mode product
//!
//! # Algorithms
//!
//! ## HOSVD (Higher-Order SVD)
//! One-pass algorithm based on SVD of mode-n unfoldings. Fast but suboptimal.
//!
//! ## HOOI (Higher-Order Orthogonal Iteration)
//! Iterative refinement of HOSVD using ALS-like updates. Better approximation.
//!
//! Requested ranks are honored exactly: when an unfolding has fewer singular
//! directions than the requested rank, the missing factor columns are zero,
//! so the core always has shape (R₁, ..., Rₙ).
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.
//! SVD operations use the one-sided Jacobi [`thin_svd`](crate::thin_svd).

use anyhow::Result;
use scirs2_core::ndarray_ext::{s, Array2};
use crate::svd::thin_svd;
use tenemb_core::{DenseND, Element};
use tenemb_kernels::nmode_product;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TuckerError {
    #[error("Invalid ranks: {0}")]
    InvalidRanks(String),

    #[error("Invalid tolerance: {0}")]
    InvalidTolerance(f64),

    #[error("SVD failed: {0}")]
    SvdError(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Tucker decomposition result
///
/// Represents a tensor as G ×₁ U₁ ×₂ U₂ ×₃ ... ×ₙ Uₙ
#[derive(Clone)]
pub struct TuckerDecomp<T> {
    /// Core tensor with shape (R₁, R₂, ..., Rₙ)
    pub core: DenseND<T>,

    /// Factor matrices, one per mode, each of shape (Iᵢ, Rᵢ)
    pub factors: Vec<Array2<T>>,

    /// Relative reconstruction error, if computed
    pub error: Option<T>,

    /// Number of HOOI sweeps (0 for plain HOSVD)
    pub iters: usize,

    /// Whether HOOI stopped on the tolerance rather than the sweep cap
    pub converged: bool,
}

impl<T> TuckerDecomp<T>
where
    T: Element,
{
    /// Reconstruct the tensor: X ≈ G ×₁ U₁ ×₂ U₂ ×₃ ... ×ₙ Uₙ
    ///
    /// # Complexity
    ///
    /// Time: O(N × ∏ᵢ Rᵢ × Iᵢ)
    /// Space: O(∏ᵢ Iᵢ)
    pub fn reconstruct(&self) -> Result<DenseND<T>> {
        let mut result = self.core.clone();

        for (mode, factor) in self.factors.iter().enumerate() {
            let reconstructed = nmode_product(&result.view(), &factor.view(), mode)
                .map_err(|e| anyhow::anyhow!("N-mode product failed: {}", e))?;
            result = DenseND::from_array(reconstructed);
        }

        Ok(result)
    }

    /// Compute and store ||X - X_reconstructed|| / ||X||
    pub fn compute_error(&mut self, original: &DenseND<T>) -> Result<T> {
        let reconstructed = self.reconstruct()?;
        let error = reconstructed.relative_error(original)?;
        self.error = Some(error);
        Ok(error)
    }
}

/// Compute Tucker-HOSVD decomposition
///
/// # Errors
///
/// Returns error if the number of ranks differs from the tensor order, a rank
/// is zero or exceeds its mode size, or an SVD fails.
///
/// # Examples
///
/// ```
/// use tenemb_core::DenseND;
/// use tenemb_decomp::tucker_hosvd;
///
/// let tensor = DenseND::<f64>::ones(&[4, 5, 6]);
/// let tucker = tucker_hosvd(&tensor, &[2, 3, 3]).unwrap();
/// assert_eq!(tucker.core.shape(), &[2, 3, 3]);
/// ```
pub fn tucker_hosvd<T>(tensor: &DenseND<T>, ranks: &[usize]) -> Result<TuckerDecomp<T>, TuckerError>
where
    T: Element,
{
    let shape = tensor.shape();
    let n_modes = tensor.rank();

    if ranks.len() != n_modes {
        return Err(TuckerError::InvalidRanks(format!(
            "Expected {} ranks, got {}",
            n_modes,
            ranks.len()
        )));
    }

    for (i, (&rank, &mode_size)) in ranks.iter().zip(shape.iter()).enumerate() {
        if rank == 0 {
            return Err(TuckerError::InvalidRanks(format!("Rank {} is zero", i)));
        }
        if rank > mode_size {
            return Err(TuckerError::InvalidRanks(format!(
                "Rank {} ({}) exceeds mode-{} size ({})",
                i, rank, i, mode_size
            )));
        }
    }

    let mut factors = Vec::with_capacity(n_modes);
    for (mode, &rank) in ranks.iter().enumerate() {
        let unfolded = tensor
            .unfold(mode)
            .map_err(|e| TuckerError::ShapeMismatch(format!("Unfold failed: {}", e)))?;
        factors.push(leading_left_singular_vectors(&unfolded, rank, mode)?);
    }

    let core = compute_core_tensor(tensor, &factors)?;

    Ok(TuckerDecomp {
        core,
        factors,
        error: None,
        iters: 0,
        converged: true,
    })
}

/// Compute Tucker-HOOI decomposition
///
/// Starts from HOSVD and refines each factor with the leading singular
/// vectors of the tensor projected on every other factor, until the relative
/// error changes by less than `tol` or `max_iters` sweeps have run.
///
/// # Examples
///
/// ```
/// use tenemb_core::DenseND;
/// use tenemb_decomp::tucker_hooi;
///
/// let data: Vec<f64> = (0..60).map(|x| (x as f64 * 0.37).sin()).collect();
/// let tensor = DenseND::from_vec(data, &[3, 4, 5]).unwrap();
/// let tucker = tucker_hooi(&tensor, &[2, 2, 2], 10, 1e-6).unwrap();
/// assert_eq!(tucker.factors[2].shape(), &[5, 2]);
/// ```
pub fn tucker_hooi<T>(
    tensor: &DenseND<T>,
    ranks: &[usize],
    max_iters: usize,
    tol: f64,
) -> Result<TuckerDecomp<T>, TuckerError>
where
    T: Element,
{
    if !(0.0..1.0).contains(&tol) {
        return Err(TuckerError::InvalidTolerance(tol));
    }

    let mut decomp = tucker_hosvd(tensor, ranks)?;
    let n_modes = tensor.rank();
    let tol_t = T::from(tol).unwrap_or_else(T::epsilon);

    let mut prev_error = decomp
        .compute_error(tensor)
        .map_err(|e| TuckerError::ShapeMismatch(format!("Error computation failed: {}", e)))?;

    let mut actual_iters = 0;
    let mut converged = prev_error <= T::epsilon();
    if !converged {
        for iter in 0..max_iters {
            actual_iters = iter + 1;

            for mode in 0..n_modes {
                let y = compute_mode_unfolding_contraction(tensor, &decomp.factors, mode)?;
                let y_unfolded = y
                    .unfold(mode)
                    .map_err(|e| TuckerError::ShapeMismatch(format!("Unfold failed: {}", e)))?;
                decomp.factors[mode] = leading_left_singular_vectors(&y_unfolded, ranks[mode], mode)?;
            }

            decomp.core = compute_core_tensor(tensor, &decomp.factors)?;

            let error = decomp.compute_error(tensor).map_err(|e| {
                TuckerError::ShapeMismatch(format!("Error computation failed: {}", e))
            })?;

            let error_change = if prev_error > T::zero() {
                (prev_error - error).abs() / prev_error
            } else {
                T::zero()
            };
            prev_error = error;
            if error_change < tol_t {
                converged = true;
                break;
            }
        }
    }

    decomp.iters = actual_iters;
    decomp.converged = converged;
    Ok(decomp)
}

/// First `rank` left singular vectors of `matrix`, zero-padded to `rank` columns
fn leading_left_singular_vectors<T>(
    matrix: &Array2<T>,
    rank: usize,
    mode: usize,
) -> Result<Array2<T>, TuckerError>
where
    T: Element,
{
    let (u, _s, _vt) = thin_svd(&matrix.view())
        .map_err(|e| TuckerError::SvdError(format!("SVD failed for mode {}: {}", mode, e)))?;
    Ok(extract_columns(&u, rank))
}

/// First `k` columns of `matrix`; columns past its width are zero
fn extract_columns<T>(matrix: &Array2<T>, k: usize) -> Array2<T>
where
    T: Element,
{
    let rows = matrix.shape()[0];
    let available = k.min(matrix.shape()[1]);

    let mut result = Array2::<T>::zeros((rows, k));
    result
        .slice_mut(s![.., ..available])
        .assign(&matrix.slice(s![.., ..available]));
    result
}

/// G = X ×₁ U₁ᵀ ×₂ U₂ᵀ ... ×ₙ Uₙᵀ
fn compute_core_tensor<T>(
    tensor: &DenseND<T>,
    factors: &[Array2<T>],
) -> Result<DenseND<T>, TuckerError>
where
    T: Element,
{
    let mut result = tensor.clone();

    for (mode, factor) in factors.iter().enumerate() {
        let contracted = nmode_product(&result.view(), &factor.t(), mode)
            .map_err(|e| TuckerError::ShapeMismatch(format!("N-mode product failed: {}", e)))?;
        result = DenseND::from_array(contracted);
    }

    Ok(result)
}

/// Y = X ×₁ U₁ᵀ ... ×ₘ₋₁ Uₘ₋₁ᵀ ×ₘ₊₁ Uₘ₊₁ᵀ ... ×ₙ Uₙᵀ (skip mode m)
fn compute_mode_unfolding_contraction<T>(
    tensor: &DenseND<T>,
    factors: &[Array2<T>],
    skip_mode: usize,
) -> Result<DenseND<T>, TuckerError>
where
    T: Element,
{
    let mut result = tensor.clone();

    for (mode, factor) in factors.iter().enumerate() {
        if mode == skip_mode {
            continue;
        }

        // nmode_product keeps the mode count, so mode indices never shift
        let contracted = nmode_product(&result.view(), &factor.t(), mode)
            .map_err(|e| TuckerError::ShapeMismatch(format!("Contraction failed: {}", e)))?;
        result = DenseND::from_array(contracted);
    }

    Ok(result)
}
