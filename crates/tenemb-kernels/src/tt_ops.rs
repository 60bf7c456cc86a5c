//! Tensor-train core contractions.
//!
//! A tensor of shape n₁ × ... × nₐ in TT format is a chain of 3-index cores
//! Gₖ of shape (r_{k-1}, nₖ, rₖ):
//!
//! ```text
//! X(i₁, ..., iₐ) = G₁(i₁) · G₂(i₂) · ... · Gₐ(iₐ)
//! ```
//!
//! Embedding lookups only ever need two contractions: a batch of slice
//! products over the row-mode cores ([`tt_select_rows`]) and a merge of the
//! column-mode cores into a single wide core ([`tt_merge`]).
//!
//! # References
//!
//! - Oseledets, I. V. (2011). "Tensor-Train Decomposition"

use anyhow::Result;
use scirs2_core::ndarray_ext::{s, Array, Array1, Array2, Array3, ArrayView2, ArrayView3, IxDyn};
use tenemb_core::{unravel_index, Element};

/// Check that consecutive cores agree on their shared rank
pub fn validate_tt_cores<T>(cores: &[ArrayView3<T>]) -> Result<()> {
    if cores.is_empty() {
        anyhow::bail!("TT chain must contain at least one core");
    }
    for (k, pair) in cores.windows(2).enumerate() {
        let r_right = pair[0].shape()[2];
        let r_left = pair[1].shape()[0];
        if r_right != r_left {
            anyhow::bail!(
                "TT rank mismatch between core {} (right rank {}) and core {} (left rank {})",
                k,
                r_right,
                k + 1,
                r_left
            );
        }
    }
    Ok(())
}

/// Contract selected slices of a TT chain
///
/// `rows` are flat row-major indices over the chain's mode sizes. Row `b` of
/// the output is the row vector `G₁(i₁) · ... · Gₐ(iₐ)` for the multi-index
/// of `rows[b]`, so the output has shape (B, r_last). The first core must
/// have left rank 1.
///
/// # Complexity
///
/// Time: O(B × d × r²) for d cores of maximum rank r
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::Array3;
/// use tenemb_kernels::tt_select_rows;
///
/// let g1 = Array3::<f64>::ones((1, 4, 2));
/// let g2 = Array3::<f64>::ones((2, 3, 5));
/// let picked = tt_select_rows(&[g1.view(), g2.view()], &[0, 11]).unwrap();
/// assert_eq!(picked.shape(), &[2, 5]);
/// assert_eq!(picked[[1, 0]], 2.0);
/// ```
pub fn tt_select_rows<T>(cores: &[ArrayView3<T>], rows: &[usize]) -> Result<Array2<T>>
where
    T: Element,
{
    validate_tt_cores(cores)?;
    if cores[0].shape()[0] != 1 {
        anyhow::bail!(
            "First TT core must have left rank 1, got {}",
            cores[0].shape()[0]
        );
    }

    let dims: Vec<usize> = cores.iter().map(|c| c.shape()[1]).collect();
    let r_last = cores[cores.len() - 1].shape()[2];
    let mut multi = vec![0usize; dims.len()];
    let mut result = Array2::<T>::zeros((rows.len(), r_last));

    for (b, &row) in rows.iter().enumerate() {
        unravel_index(row, &dims, &mut multi)?;

        let mut v: Array1<T> = cores[0].slice(s![0, multi[0], ..]).to_owned();
        for (core, &i) in cores.iter().zip(multi.iter()).skip(1) {
            let slice: ArrayView2<T> = core.slice(s![.., i, ..]);
            v = v.dot(&slice);
        }
        result.row_mut(b).assign(&v);
    }

    Ok(result)
}

/// Merge a TT chain into a single core
///
/// Returns an array of shape (r₀, ∏ nₖ, r_last) whose middle index is the
/// row-major flattening of the chain's mode indices.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::Array3;
/// use tenemb_kernels::tt_merge;
///
/// let g1 = Array3::<f64>::ones((3, 2, 2));
/// let g2 = Array3::<f64>::ones((2, 5, 1));
/// let merged = tt_merge(&[g1.view(), g2.view()]).unwrap();
/// assert_eq!(merged.shape(), &[3, 10, 1]);
/// assert_eq!(merged[[0, 0, 0]], 2.0);
/// ```
pub fn tt_merge<T>(cores: &[ArrayView3<T>]) -> Result<Array3<T>>
where
    T: Element,
{
    validate_tt_cores(cores)?;

    let mut merged = cores[0].as_standard_layout().into_owned();
    for core in &cores[1..] {
        let (r0, n_acc, r_mid) = merged.dim();
        let (_, n_k, r_k) = core.dim();

        // (r0 * n_acc, r_mid) · (r_mid, n_k * r_k)
        let left = merged.into_shape_with_order((r0 * n_acc, r_mid))?;
        let right = core
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order((r_mid, n_k * r_k))?;
        let product = left.dot(&right);

        merged = product.into_shape_with_order((r0, n_acc * n_k, r_k))?;
    }

    Ok(merged)
}

/// Reconstruct the full tensor represented by a TT chain with boundary ranks 1
pub fn tt_to_tensor<T>(cores: &[ArrayView3<T>]) -> Result<Array<T, IxDyn>>
where
    T: Element,
{
    let merged = tt_merge(cores)?;
    let (r0, _, r_last) = merged.dim();
    if r0 != 1 || r_last != 1 {
        anyhow::bail!(
            "Boundary TT ranks must be 1, got {} and {}",
            r0,
            r_last
        );
    }
    let shape: Vec<usize> = cores.iter().map(|c| c.shape()[1]).collect();
    Ok(merged.into_shape_with_order(IxDyn(&shape))?)
}
