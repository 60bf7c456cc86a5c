//! # tenemb-decomp
//!
//! Decomposition back-ends that fit factorized embedding tables to dense
//! data. Each algorithm works on a dense N-way tensor (`DenseND`) and returns
//! its factors in the layout the factorized tensor stores them in.
//!
//! ### CP Decomposition (Canonical Polyadic)
//!
//! ```text
//! X ≈ Σᵣ λᵣ (a₁ᵣ ⊗ a₂ᵣ ⊗ ... ⊗ aₙᵣ)
//! ```
//!
//! - [`cp_als`] / [`cp_als_with_rng`]: alternating least squares with fit-based
//!   convergence detection
//!
//! ### Tucker Decomposition
//!
//! ```text
//! X ≈ G ×₁ U₁ ×₂ U₂ ×₃ ... ×ₙ Uₙ
//! ```
//!
//! - [`tucker_hosvd`]: one-pass SVD of every mode unfolding
//! - [`tucker_hooi`]: iterative refinement starting from HOSVD
//!
//! ### Tensor Train (TT) Decomposition
//!
//! ```text
//! X(i₁,...,iₙ) = G₁[i₁] × G₂[i₂] × ... × Gₙ[iₙ]
//! ```
//!
//! - [`tt_svd`]: sequential SVD with rank truncation, plus
//!   [`TTDecomp::pad_to_ranks`] to restore a fixed rank chain
//!
//! ## Quick Start
//!
//! ```
//! use tenemb_core::DenseND;
//! use tenemb_decomp::{cp_als, tt_svd, tucker_hosvd, InitStrategy};
//!
//! let data: Vec<f64> = (0..64).map(|x| (x as f64 * 0.1).cos()).collect();
//! let tensor = DenseND::from_vec(data, &[4, 4, 4]).unwrap();
//!
//! let cp = cp_als(&tensor, 3, 50, 1e-6, InitStrategy::Svd).unwrap();
//! let tucker = tucker_hosvd(&tensor, &[2, 2, 2]).unwrap();
//! let tt = tt_svd(&tensor, &[2, 2], 1e-10).unwrap();
//!
//! assert_eq!(cp.factors.len(), 3);
//! assert_eq!(tucker.core.shape(), &[2, 2, 2]);
//! assert_eq!(tt.cores.len(), 3);
//! ```
//!
//! ## SciRS2 Integration
//!
//! Arrays come from `scirs2_core::ndarray_ext` and least squares from
//! `scirs2_linalg`. Singular value decompositions go through [`thin_svd`], a
//! one-sided Jacobi SVD that stays accurate on the very tall and wide
//! unfoldings tensorized tables produce.

pub mod cp;
pub mod svd;
pub mod tt;
pub mod tucker;


pub use cp::{cp_als, cp_als_with_rng, CpDecomp, CpError, InitStrategy};
pub use svd::thin_svd;
pub use tt::{tt_svd, TTDecomp, TTError};
pub use tucker::{tucker_hooi, tucker_hosvd, TuckerDecomp, TuckerError};
