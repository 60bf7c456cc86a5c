//! N-mode product implementation (TTM - Tensor Times Matrix)
//!
//! For tensor X ∈ ℝ^(I₁×...×Iₙ) and matrix M ∈ ℝ^(J×Iₖ), the result
//! Y = X ×ₖ M has shape (I₁×...×Iₖ₋₁×J×Iₖ₊₁×...×Iₙ).
//!
//! Used by Tucker fitting (HOSVD/HOOI core projection) and by Tucker row
//! lookups, which expand the column modes of a partially contracted core.
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.

use anyhow::Result;
use scirs2_core::ndarray_ext::{Array, Array2, ArrayView, ArrayView2, IxDyn};
use tenemb_core::Element;

/// Compute the N-mode product of a tensor and a matrix
///
/// # Algorithm
///
/// 1. Unfold tensor X along mode k to get X_(k) of shape (Iₖ, ∏ᵢ≠ₖ Iᵢ)
/// 2. Compute Y_(k) = M · X_(k) with shape (J, ∏ᵢ≠ₖ Iᵢ)
/// 3. Fold Y_(k) back to tensor Y with the new shape
///
/// The returned array is a permuted view of the folded product made owned,
/// so it is generally not in standard layout.
///
/// # Errors
///
/// Returns error if:
/// - Mode is out of bounds
/// - Matrix columns don't match tensor mode size
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::{Array, array};
/// use tenemb_kernels::nmode_product;
///
/// let tensor = Array::from_shape_vec(
///     vec![2, 3, 4],
///     (0..24).map(|x| x as f64).collect()
/// ).unwrap();
///
/// let matrix = array![[1.0, 0.0, 0.0],
///                      [0.0, 1.0, 0.0],
///                      [0.0, 0.0, 1.0],
///                      [1.0, 1.0, 0.0],
///                      [0.0, 1.0, 1.0]];
///
/// let result = nmode_product(&tensor.view(), &matrix.view(), 1).unwrap();
/// assert_eq!(result.shape(), &[2, 5, 4]);
/// ```
pub fn nmode_product<T>(
    tensor: &ArrayView<T, IxDyn>,
    matrix: &ArrayView2<T>,
    mode: usize,
) -> Result<Array<T, IxDyn>>
where
    T: Element,
{
    let tensor_shape = tensor.shape();
    let rank = tensor_shape.len();

    if mode >= rank {
        anyhow::bail!("Mode {} out of bounds for tensor with rank {}", mode, rank);
    }

    let mode_size = tensor_shape[mode];
    let (matrix_rows, matrix_cols) = (matrix.shape()[0], matrix.shape()[1]);

    if matrix_cols != mode_size {
        anyhow::bail!(
            "Matrix columns ({}) must match tensor mode-{} size ({})",
            matrix_cols,
            mode,
            mode_size
        );
    }

    let unfolded = unfold_tensor(tensor, mode)?;
    let result_unfolded = matrix.dot(&unfolded);

    let mut new_shape: Vec<usize> = tensor_shape.to_vec();
    new_shape[mode] = matrix_rows;

    fold_matrix(result_unfolded, &new_shape, mode)
}

/// Apply several N-mode products in sequence
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::{Array, array};
/// use tenemb_kernels::nmode_products_seq;
///
/// let tensor = Array::from_shape_vec(
///     vec![2, 3, 4],
///     (0..24).map(|x| x as f64).collect()
/// ).unwrap();
///
/// let m1 = array![[1.0, 0.0], [0.0, 1.0]];
/// let m2 = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
///
/// let result = nmode_products_seq(
///     &tensor.view(),
///     &[(m1.view(), 0), (m2.view(), 1)]
/// ).unwrap();
/// assert_eq!(result.shape(), &[2, 2, 4]);
/// ```
pub fn nmode_products_seq<T>(
    tensor: &ArrayView<T, IxDyn>,
    products: &[(ArrayView2<T>, usize)],
) -> Result<Array<T, IxDyn>>
where
    T: Element,
{
    let mut current = tensor.to_owned();
    for (matrix, mode) in products {
        current = nmode_product(&current.view(), matrix, *mode)?;
    }
    Ok(current)
}

/// Reconstruct a full tensor from a Tucker core and one factor per mode
///
/// Computes `G ×₁ U₁ ×₂ U₂ ... ×ₙ Uₙ` where factor `Uₖ` has shape
/// (Iₖ, Rₖ).
pub fn tucker_reconstruct<T>(
    core: &ArrayView<T, IxDyn>,
    factors: &[ArrayView2<T>],
) -> Result<Array<T, IxDyn>>
where
    T: Element,
{
    if factors.len() != core.ndim() {
        anyhow::bail!(
            "Number of factors ({}) must match core rank ({})",
            factors.len(),
            core.ndim()
        );
    }

    let products: Vec<(ArrayView2<T>, usize)> = factors
        .iter()
        .enumerate()
        .map(|(mode, f)| (f.view(), mode))
        .collect();
    nmode_products_seq(core, &products)
}

/// Unfold a tensor along `mode` into a (Iₖ, ∏ᵢ≠ₖ Iᵢ) matrix
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

/// Inverse of [`unfold_tensor`]
fn fold_matrix<T>(matrix: Array2<T>, shape: &[usize], mode: usize) -> Result<Array<T, IxDyn>>
where
    T: Element,
{
    let mut inter_shape = Vec::with_capacity(shape.len());
    inter_shape.push(shape[mode]);
    inter_shape.extend(
        shape
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != mode)
            .map(|(_, &s)| s),
    );

    let matrix = if matrix.is_standard_layout() {
        matrix
    } else {
        matrix.as_standard_layout().into_owned()
    };
    let inter = matrix.into_shape_with_order(IxDyn(&inter_shape))?;

    let mut inv_perm = vec![0; shape.len()];
    let mut idx = 1;
    for (i, item) in inv_perm.iter_mut().enumerate() {
        if i != mode {
            *item = idx;
            idx += 1;
        }
    }

    Ok(inter.permuted_axes(IxDyn(&inv_perm)))
}
