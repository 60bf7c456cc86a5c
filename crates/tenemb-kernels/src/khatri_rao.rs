//! Khatri-Rao product (column-wise Kronecker product)
//!
//! For matrices A (I × K) and B (J × K), the Khatri-Rao product C = A ⊙ B has
//! size (I*J × K) where each column k of C is the Kronecker product of column k
//! of A and column k of B. Row `a * J + b` of C is the element-wise product of
//! row `a` of A and row `b` of B, which is what makes row lookups into a CP
//! factorization cheap: see [`khatri_rao_rows`].
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.

use anyhow::Result;
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use scirs2_core::numeric::Num;
use tenemb_core::unravel_index;

/// Compute the Khatri-Rao product of two matrices
///
/// # Errors
///
/// Returns error if the number of columns in A and B don't match.
///
/// # Complexity
///
/// Time: O(I * J * K)
/// Space: O(I * J * K)
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use tenemb_kernels::khatri_rao;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];  // 2×2
/// let b = array![[5.0, 6.0], [7.0, 8.0]];  // 2×2
/// let c = khatri_rao(&a.view(), &b.view()).unwrap();  // 4×2
/// assert_eq!(c.shape(), &[4, 2]);
///
/// // First column: [1*5, 1*7, 3*5, 3*7] = [5, 7, 15, 21]
/// assert_eq!(c[[0, 0]], 5.0);
/// assert_eq!(c[[1, 0]], 7.0);
/// assert_eq!(c[[2, 0]], 15.0);
/// assert_eq!(c[[3, 0]], 21.0);
/// ```
pub fn khatri_rao<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> Result<Array2<T>>
where
    T: Clone + Num,
{
    let (i, k1) = (a.shape()[0], a.shape()[1]);
    let (j, k2) = (b.shape()[0], b.shape()[1]);

    if k1 != k2 {
        anyhow::bail!(
            "Number of columns must match: A has {} columns, B has {} columns",
            k1,
            k2
        );
    }

    let k = k1;
    let mut result = Array2::<T>::zeros((i * j, k));

    for col_idx in 0..k {
        let a_col = a.column(col_idx);
        let b_col = b.column(col_idx);

        for (row_a_idx, a_val) in a_col.iter().enumerate() {
            for (row_b_idx, b_val) in b_col.iter().enumerate() {
                let result_row = row_a_idx * j + row_b_idx;
                result[[result_row, col_idx]] = a_val.clone() * b_val.clone();
            }
        }
    }

    Ok(result)
}

/// Khatri-Rao product of a sequence of matrices, first to last
///
/// The first matrix varies slowest in the row index, matching the row-major
/// flattening of the corresponding tensor modes.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::Array2;
/// use tenemb_kernels::khatri_rao_chain;
///
/// let a = Array2::<f64>::ones((2, 3));
/// let b = Array2::<f64>::ones((4, 3));
/// let c = Array2::<f64>::ones((5, 3));
/// let kr = khatri_rao_chain(&[a.view(), b.view(), c.view()]).unwrap();
/// assert_eq!(kr.shape(), &[40, 3]);
/// ```
pub fn khatri_rao_chain<T>(factors: &[ArrayView2<T>]) -> Result<Array2<T>>
where
    T: Clone + Num,
{
    let (first, rest) = factors
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Khatri-Rao chain needs at least one matrix"))?;

    let mut result = first.to_owned();
    for factor in rest {
        result = khatri_rao(&result.view(), factor)?;
    }
    Ok(result)
}

/// Selected rows of the Khatri-Rao chain of `factors`
///
/// Row `b` of the output equals row `rows[b]` of
/// `khatri_rao_chain(factors)`, computed as the element-wise product of one
/// row per factor without materializing the chain.
///
/// # Errors
///
/// Returns error if the factors disagree on the number of columns or if a
/// requested row is out of range.
///
/// # Complexity
///
/// Time: O(B * N * K) for B rows and N factors
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use tenemb_kernels::{khatri_rao, khatri_rao_rows};
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[5.0, 6.0], [7.0, 8.0], [9.0, 10.0]];
/// let full = khatri_rao(&a.view(), &b.view()).unwrap();
/// let picked = khatri_rao_rows(&[a.view(), b.view()], &[4, 0]).unwrap();
/// assert_eq!(picked.row(0), full.row(4));
/// assert_eq!(picked.row(1), full.row(0));
/// ```
pub fn khatri_rao_rows<T>(factors: &[ArrayView2<T>], rows: &[usize]) -> Result<Array2<T>>
where
    T: Clone + Num,
{
    if factors.is_empty() {
        anyhow::bail!("Khatri-Rao row selection needs at least one matrix");
    }

    let k = factors[0].shape()[1];
    for (i, factor) in factors.iter().enumerate() {
        if factor.shape()[1] != k {
            anyhow::bail!(
                "Factor matrix {} has {} columns, expected {}",
                i,
                factor.shape()[1],
                k
            );
        }
    }

    let dims: Vec<usize> = factors.iter().map(|f| f.shape()[0]).collect();
    let mut multi = vec![0usize; dims.len()];
    let mut result = Array2::<T>::ones((rows.len(), k));

    for (b, &row) in rows.iter().enumerate() {
        unravel_index(row, &dims, &mut multi)?;
        let mut out = result.row_mut(b);
        for (factor, &i) in factors.iter().zip(multi.iter()) {
            for (o, v) in out.iter_mut().zip(factor.row(i).iter()) {
                *o = o.clone() * v.clone();
            }
        }
    }

    Ok(result)
}
