//! MTTKRP (Matricized Tensor Times Khatri-Rao Product)
//!
//! For tensor X and factor matrices {U₁, ..., Uₙ}, computes
//!
//! V = X_(mode) × (U₁ ⊙ ... ⊙ U_(mode-1) ⊙ U_(mode+1) ⊙ ... ⊙ Uₙ)
//!
//! This is the dominant cost of every CP-ALS sweep.
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.

use crate::khatri_rao::khatri_rao_chain;
use anyhow::Result;
use scirs2_core::ndarray_ext::{Array2, ArrayView, ArrayView2, IxDyn};
use tenemb_core::Element;

/// Compute MTTKRP for one mode
///
/// Result has shape (I_mode, R) where R is the shared factor column count.
///
/// # Errors
///
/// Returns error if:
/// - Mode is out of bounds
/// - Factor matrix shapes don't match tensor dimensions
/// - Factor matrices have different numbers of columns (rank)
/// - The tensor has a single mode
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::{Array, Array2};
/// use tenemb_kernels::mttkrp;
///
/// let tensor = Array::from_shape_vec(
///     vec![2, 3, 4],
///     (0..24).map(|x| x as f64).collect()
/// ).unwrap();
///
/// let u1 = Array2::<f64>::ones((2, 2));
/// let u2 = Array2::<f64>::ones((3, 2));
/// let u3 = Array2::<f64>::ones((4, 2));
///
/// let result = mttkrp(&tensor.view(), &[u1.view(), u2.view(), u3.view()], 1).unwrap();
/// assert_eq!(result.shape(), &[3, 2]);
/// ```
pub fn mttkrp<T>(
    tensor: &ArrayView<T, IxDyn>,
    factors: &[ArrayView2<T>],
    mode: usize,
) -> Result<Array2<T>>
where
    T: Element,
{
    let tensor_shape = tensor.shape();
    let rank_tensor = tensor_shape.len();

    if mode >= rank_tensor {
        anyhow::bail!(
            "Mode {} out of bounds for tensor with rank {}",
            mode,
            rank_tensor
        );
    }

    if factors.len() != rank_tensor {
        anyhow::bail!(
            "Number of factor matrices ({}) must match tensor rank ({})",
            factors.len(),
            rank_tensor
        );
    }

    let cp_rank = factors[0].shape()[1];
    for (i, factor) in factors.iter().enumerate() {
        if factor.shape()[1] != cp_rank {
            anyhow::bail!(
                "Factor matrix {} has {} columns, expected {}",
                i,
                factor.shape()[1],
                cp_rank
            );
        }
        if factor.shape()[0] != tensor_shape[i] {
            anyhow::bail!(
                "Factor matrix {} has {} rows, expected {} (tensor mode-{} size)",
                i,
                factor.shape()[0],
                tensor_shape[i],
                i
            );
        }
    }

    let unfolded = unfold_tensor(tensor, mode)?;

    // Forward order over the remaining modes matches the unfolding's columns
    let others: Vec<ArrayView2<T>> = factors
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != mode)
        .map(|(_, f)| f.view())
        .collect();
    if others.is_empty() {
        anyhow::bail!("Need at least 2 factor matrices for MTTKRP");
    }
    let kr = khatri_rao_chain(&others)?;

    Ok(unfolded.dot(&kr))
}

fn unfold_tensor<T>(tensor: &ArrayView<T, IxDyn>, mode: usize) -> Result<Array2<T>>
where
    T: Element,
{
    let shape = tensor.shape();
    let mode_size = shape[mode];
    let other_size: usize = shape
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != mode)
        .map(|(_, &s)| s)
        .product();

    let mut perm: Vec<usize> = Vec::with_capacity(shape.len());
    perm.push(mode);
    perm.extend((0..shape.len()).filter(|&i| i != mode));

    let permuted = tensor.clone().permuted_axes(IxDyn(&perm));
    let contiguous = permuted.as_standard_layout().into_owned();
    let unfolded = contiguous.into_shape_with_order((mode_size, other_size))?;

    Ok(unfolded)
}
