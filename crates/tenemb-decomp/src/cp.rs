//! CP-ALS (Canonical Polyadic decomposition via Alternating Least Squares)
//!
//! The CP decomposition factorizes a tensor X into a sum of rank-1 tensors:
//!
//! X ≈ Σᵣ λᵣ (u₁ᵣ ⊗ u₂ᵣ ⊗ ... ⊗ uₙᵣ)
//!
//! Where:
//! - R is the CP rank
//! - λᵣ are weights (absorbed into the factors until [`CpDecomp::extract_weights`])
//! - uᵢᵣ are factor vectors forming factor matrices Uᵢ ∈ ℝ^(Iᵢ×R)
//!
//! The ALS algorithm alternates between updating each factor matrix while
//! keeping others fixed using MTTKRP and solving a least-squares problem.
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.
//! Linear algebra operations use `scirs2_linalg`.

use anyhow::Result;
use scirs2_core::ndarray_ext::{Array1, Array2};
use scirs2_core::random::{thread_rng, Distribution, RandNormal as Normal, Rng};
use crate::svd::thin_svd;
use scirs2_linalg::{lstsq, LinalgError};
use tenemb_core::{DenseND, Element};
use tenemb_kernels::{khatri_rao_chain, mttkrp};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CpError {
    #[error("Invalid rank: {0}")]
    InvalidRank(usize),

    #[error("Invalid tolerance: {0}")]
    InvalidTolerance(f64),

    #[error("Linear algebra error: {0}")]
    LinalgError(#[from] LinalgError),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("SVD failed: {0}")]
    SvdError(String),
}

/// Initialization strategy for CP-ALS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStrategy {
    /// Random initialization from uniform distribution [0, 1]
    Random,
    /// Random initialization from normal distribution N(0, 1)
    RandomNormal,
    /// Leading left singular vectors of each mode unfolding
    Svd,
}

/// CP decomposition result
#[derive(Debug, Clone)]
pub struct CpDecomp<T> {
    /// Factor matrices, one per mode, each of shape (Iₙ, R)
    pub factors: Vec<Array2<T>>,

    /// Per-component weights, `None` while absorbed into the factors
    pub weights: Option<Array1<T>>,

    /// Final fit: 1 - ||X - X_reconstructed|| / ||X||
    pub fit: T,

    /// Number of iterations performed
    pub iters: usize,

    /// Whether the fit change dropped below the tolerance before `max_iters`
    pub converged: bool,
}

impl<T> CpDecomp<T>
where
    T: Element,
{
    /// CP rank (number of components)
    pub fn rank(&self) -> usize {
        self.factors.first().map_or(0, |f| f.shape()[1])
    }

    /// Reconstruct the full tensor
    ///
    /// Computes `U₁ diag(λ) (U₂ ⊙ ... ⊙ Uₙ)ᵀ` and folds it to the mode sizes.
    ///
    /// # Complexity
    ///
    /// Time: O(R × ∏ᵢ Iᵢ)
    /// Space: O(∏ᵢ Iᵢ)
    pub fn reconstruct(&self) -> Result<DenseND<T>> {
        let (first, rest) = self
            .factors
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("CP decomposition has no factors"))?;
        let shape: Vec<usize> = self.factors.iter().map(|f| f.shape()[0]).collect();

        let mut lead = first.to_owned();
        if let Some(weights) = &self.weights {
            for mut row in lead.rows_mut() {
                row *= weights;
            }
        }

        if rest.is_empty() {
            let summed = lead.sum_axis(scirs2_core::ndarray_ext::Axis(1));
            return DenseND::from_vec(summed.to_vec(), &shape);
        }

        let views: Vec<_> = rest.iter().map(|f| f.view()).collect();
        let kr = khatri_rao_chain(&views)?;
        let flat = lead.dot(&kr.t());
        DenseND::from_vec(flat.iter().cloned().collect(), &shape)
    }

    /// Normalize factor columns to unit length, accumulating norms as weights
    ///
    /// Columns whose norm is below machine epsilon are left unscaled.
    pub fn extract_weights(&mut self) {
        let rank = self.rank();
        let mut weights = self
            .weights
            .take()
            .unwrap_or_else(|| Array1::<T>::ones(rank));

        for factor in &mut self.factors {
            for (r, mut column) in factor.columns_mut().into_iter().enumerate() {
                let norm = column.iter().fold(T::zero(), |acc, &v| acc + v * v).sqrt();
                if norm > T::epsilon() {
                    weights[r] *= norm;
                    column.mapv_inplace(|v| v / norm);
                }
            }
        }

        self.weights = Some(weights);
    }
}

/// Compute CP-ALS decomposition of a tensor using the thread-local RNG
///
/// # Errors
///
/// Returns error if:
/// - Rank is zero
/// - Tolerance is invalid (negative or >= 1)
/// - The tensor has fewer than two modes
/// - Linear algebra operations fail
///
/// # Complexity
///
/// Time: O(R × ∏ᵢ Iᵢ) per mode per iteration
/// Space: O(N × Imax × R) for factor matrices
///
/// # Examples
///
/// ```
/// use tenemb_core::DenseND;
/// use tenemb_decomp::{cp_als, InitStrategy};
///
/// let tensor = DenseND::<f64>::ones(&[4, 5, 6]);
/// let cp = cp_als(&tensor, 2, 20, 1e-6, InitStrategy::Svd).unwrap();
/// assert_eq!(cp.factors.len(), 3);
/// assert!(cp.fit > 0.99);
/// ```
pub fn cp_als<T>(
    tensor: &DenseND<T>,
    rank: usize,
    max_iters: usize,
    tol: f64,
    init: InitStrategy,
) -> Result<CpDecomp<T>, CpError>
where
    T: Element,
{
    let mut rng = thread_rng();
    cp_als_with_rng(tensor, rank, max_iters, tol, init, &mut rng)
}

/// CP-ALS with an explicit random number generator
///
/// Identical to [`cp_als`], but every random draw (random initialization
/// and the filler columns of SVD initialization) comes from `rng`, so a
/// seeded generator makes the fit reproducible.
pub fn cp_als_with_rng<T, R>(
    tensor: &DenseND<T>,
    rank: usize,
    max_iters: usize,
    tol: f64,
    init: InitStrategy,
    rng: &mut R,
) -> Result<CpDecomp<T>, CpError>
where
    T: Element,
    R: Rng,
{
    let n_modes = tensor.rank();

    if rank == 0 {
        return Err(CpError::InvalidRank(rank));
    }

    if !(0.0..1.0).contains(&tol) {
        return Err(CpError::InvalidTolerance(tol));
    }

    if n_modes < 2 {
        return Err(CpError::ShapeMismatch(format!(
            "CP-ALS needs at least 2 modes, got {}",
            n_modes
        )));
    }

    let mut factors = initialize_factors(tensor, rank, init, rng)?;

    let tensor_norm_sq = compute_norm_squared(tensor);
    if tensor_norm_sq == T::zero() {
        // Zero tensor: zero factors are an exact fit
        for factor in &mut factors {
            factor.fill(T::zero());
        }
        return Ok(CpDecomp {
            factors,
            weights: None,
            fit: T::one(),
            iters: 0,
            converged: true,
        });
    }

    let tol_t = T::from(tol).unwrap_or_else(T::epsilon);
    let mut prev_fit = T::zero();
    let mut fit = T::zero();
    let mut iters = 0;
    let mut converged = false;

    for iter in 0..max_iters {
        iters = iter + 1;

        for mode in 0..n_modes {
            let factor_views: Vec<_> = factors.iter().map(|f| f.view()).collect();
            let mttkrp_result = mttkrp(&tensor.view(), &factor_views, mode)
                .map_err(|e| CpError::ShapeMismatch(e.to_string()))?;

            let gram = compute_gram_hadamard(&factors, mode);

            factors[mode] = solve_least_squares(&mttkrp_result, &gram)?;
        }

        fit = compute_fit(tensor, &factors, tensor_norm_sq)?;

        let fit_change = (fit - prev_fit).abs();
        if iter > 0 && fit_change < tol_t {
            converged = true;
            break;
        }

        prev_fit = fit;
    }

    Ok(CpDecomp {
        factors,
        weights: None,
        fit,
        iters,
        converged,
    })
}

fn sample<T, D, R>(dist: &D, rng: &mut R) -> T
where
    T: Element,
    D: Distribution<f64>,
    R: Rng,
{
    T::from(dist.sample(rng)).unwrap_or_else(T::zero)
}

fn initialize_factors<T, R>(
    tensor: &DenseND<T>,
    rank: usize,
    init: InitStrategy,
    rng: &mut R,
) -> Result<Vec<Array2<T>>, CpError>
where
    T: Element,
    R: Rng,
{
    let shape = tensor.shape();
    let mut factors = Vec::with_capacity(shape.len());

    match init {
        InitStrategy::Random => {
            for &mode_size in shape.iter() {
                let factor = Array2::from_shape_fn((mode_size, rank), |_| {
                    T::from(rng.random::<f64>()).unwrap_or_else(T::zero)
                });
                factors.push(factor);
            }
        }
        InitStrategy::RandomNormal => {
            let normal = Normal::new(0.0, 1.0)
                .map_err(|e| CpError::ShapeMismatch(format!("Normal distribution: {}", e)))?;
            for &mode_size in shape.iter() {
                let factor = Array2::from_shape_fn((mode_size, rank), |_| sample(&normal, rng));
                factors.push(factor);
            }
        }
        InitStrategy::Svd => {
            let filler = Normal::new(0.0, 0.01)
                .map_err(|e| CpError::ShapeMismatch(format!("Normal distribution: {}", e)))?;

            for (mode, &mode_size) in shape.iter().enumerate() {
                let unfolded = tensor
                    .unfold(mode)
                    .map_err(|e| CpError::ShapeMismatch(format!("Unfold failed: {}", e)))?;

                let (u, _s, _vt) = thin_svd(&unfolded.view()).map_err(|e| {
                    CpError::SvdError(format!("SVD failed for mode {}: {}", mode, e))
                })?;

                let actual_rank = rank.min(u.shape()[1]);
                let mut factor = Array2::<T>::zeros((mode_size, rank));
                for i in 0..mode_size {
                    for j in 0..actual_rank {
                        factor[[i, j]] = u[[i, j]];
                    }
                }

                // Columns beyond the unfolding's rank get small random values
                for j in actual_rank..rank {
                    for i in 0..mode_size {
                        factor[[i, j]] = sample(&filler, rng);
                    }
                }

                factors.push(factor);
            }
        }
    }

    Ok(factors)
}

/// Hadamard product of the Gram matrices of every factor except `skip_mode`
///
/// G = (U₁ᵀU₁) ⊙ ... ⊙ (Uₙ₋₁ᵀUₙ₋₁) ⊙ (Uₙ₊₁ᵀUₙ₊₁) ⊙ ... ⊙ (UₙᵀUₙ)
fn compute_gram_hadamard<T>(factors: &[Array2<T>], skip_mode: usize) -> Array2<T>
where
    T: Element,
{
    let rank = factors[0].shape()[1];
    let mut gram = Array2::<T>::ones((rank, rank));

    for (i, factor) in factors.iter().enumerate() {
        if i == skip_mode {
            continue;
        }
        gram = gram * factor.t().dot(factor);
    }

    gram
}

/// Solve `factor · gram = mttkrp` row by row
///
/// Falls back to a ridge-regularized system when the plain solve fails.
fn solve_least_squares<T>(mttkrp_result: &Array2<T>, gram: &Array2<T>) -> Result<Array2<T>, CpError>
where
    T: Element,
{
    let (rows, rank) = (mttkrp_result.shape()[0], mttkrp_result.shape()[1]);
    let gram_t = gram.t().to_owned();
    let mut result = Array2::<T>::zeros((rows, rank));

    for i in 0..rows {
        let b = mttkrp_result.row(i).to_owned();

        let solution = match lstsq(&gram_t.view(), &b.view(), None) {
            Ok(solution) => solution,
            Err(_) => {
                let scale = T::from(rank * 10).unwrap_or_else(T::one);
                let eps = T::epsilon() * scale;
                let mut gram_reg = gram_t.clone();
                for k in 0..rank.min(gram_reg.shape()[0]) {
                    gram_reg[[k, k]] += eps;
                }
                lstsq(&gram_reg.view(), &b.view(), None)?
            }
        };

        for j in 0..rank {
            result[[i, j]] = solution.x[j];
        }
    }

    Ok(result)
}

fn compute_norm_squared<T>(tensor: &DenseND<T>) -> T
where
    T: Element,
{
    tensor.view().iter().fold(T::zero(), |acc, &v| acc + v * v)
}

/// Fit `1 - ||X - X_recon|| / ||X||` without materializing the reconstruction
///
/// Uses ||X - X_recon||² = ||X||² + ||X_recon||² - 2⟨X, X_recon⟩.
fn compute_fit<T>(tensor: &DenseND<T>, factors: &[Array2<T>], tensor_norm_sq: T) -> Result<T, CpError>
where
    T: Element,
{
    let recon_norm_sq = compute_reconstruction_norm_squared(factors);
    let inner_product = compute_inner_product(tensor, factors)?;

    let two = T::one() + T::one();
    let error_sq = tensor_norm_sq + recon_norm_sq - two * inner_product;
    let error = error_sq.max(T::zero()).sqrt();

    let fit = T::one() - error / tensor_norm_sq.sqrt();
    Ok(fit.max(T::zero()).min(T::one()))
}

/// ||X_recon||² = Σ_{r,s} Π_modes ⟨U[:,r], U[:,s]⟩
fn compute_reconstruction_norm_squared<T>(factors: &[Array2<T>]) -> T
where
    T: Element,
{
    let rank = factors[0].shape()[1];
    let mut cross = Array2::<T>::ones((rank, rank));
    for factor in factors {
        cross = cross * factor.t().dot(factor);
    }
    cross.sum()
}

/// ⟨X, X_recon⟩ via the mode-0 MTTKRP
fn compute_inner_product<T>(tensor: &DenseND<T>, factors: &[Array2<T>]) -> Result<T, CpError>
where
    T: Element,
{
    let factor_views: Vec<_> = factors.iter().map(|f| f.view()).collect();
    let mttkrp_result = mttkrp(&tensor.view(), &factor_views, 0)
        .map_err(|e| CpError::ShapeMismatch(e.to_string()))?;

    Ok((&mttkrp_result * &factors[0]).sum())
}
