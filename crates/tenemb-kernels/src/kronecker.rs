//! Kronecker product
//!
//! For matrices A (m × n) and B (p × q), A ⊗ B has shape (mp × nq). Row
//! `a * p + b` of A ⊗ B is the Kronecker product of row `a` of A and row `b`
//! of B, so a Tucker factorization can produce selected rows of its row-mode
//! factor product with [`kronecker_rows`].
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.

use anyhow::Result;
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use scirs2_core::numeric::Num;
use tenemb_core::unravel_index;

/// Compute the Kronecker product of two matrices
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use tenemb_kernels::kronecker;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[0.0, 5.0], [6.0, 7.0]];
/// let c = kronecker(&a.view(), &b.view());
/// assert_eq!(c.shape(), &[4, 4]);
/// assert_eq!(c[[0, 1]], 5.0);   // 1*5
/// assert_eq!(c[[3, 3]], 28.0);  // 4*7
/// ```
pub fn kronecker<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> Array2<T>
where
    T: Clone + Num,
{
    let (m, n) = (a.shape()[0], a.shape()[1]);
    let (p, q) = (b.shape()[0], b.shape()[1]);

    let mut result = Array2::<T>::zeros((m * p, n * q));

    for (i, row_a) in a.rows().into_iter().enumerate() {
        for (j, a_val) in row_a.iter().enumerate() {
            let block_row = i * p;
            let block_col = j * q;

            for (bi, row_b) in b.rows().into_iter().enumerate() {
                for (bj, b_val) in row_b.iter().enumerate() {
                    result[[block_row + bi, block_col + bj]] = a_val.clone() * b_val.clone();
                }
            }
        }
    }

    result
}

/// Selected rows of the Kronecker chain `factors[0] ⊗ factors[1] ⊗ ...`
///
/// Row `b` of the output is row `rows[b]` of the full chain, built from one
/// row per factor. The output has `Π cols(factors[k])` columns ordered with
/// the first factor varying slowest.
///
/// # Errors
///
/// Returns error if `factors` is empty or a requested row is out of range.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use tenemb_kernels::{kronecker, kronecker_rows};
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[5.0], [6.0], [7.0]];
/// let full = kronecker(&a.view(), &b.view());
/// let picked = kronecker_rows(&[a.view(), b.view()], &[5]).unwrap();
/// assert_eq!(picked.row(0), full.row(5));
/// ```
pub fn kronecker_rows<T>(factors: &[ArrayView2<T>], rows: &[usize]) -> Result<Array2<T>>
where
    T: Clone + Num,
{
    if factors.is_empty() {
        anyhow::bail!("Kronecker row selection needs at least one matrix");
    }

    let dims: Vec<usize> = factors.iter().map(|f| f.shape()[0]).collect();
    let width: usize = factors.iter().map(|f| f.shape()[1]).product();
    let mut multi = vec![0usize; dims.len()];
    let mut result = Array2::<T>::zeros((rows.len(), width));

    let mut acc: Vec<T> = Vec::with_capacity(width);
    let mut next: Vec<T> = Vec::with_capacity(width);

    for (b, &row) in rows.iter().enumerate() {
        unravel_index(row, &dims, &mut multi)?;

        acc.clear();
        acc.push(T::one());
        for (factor, &i) in factors.iter().zip(multi.iter()) {
            next.clear();
            for a_val in acc.iter() {
                for f_val in factor.row(i).iter() {
                    next.push(a_val.clone() * f_val.clone());
                }
            }
            std::mem::swap(&mut acc, &mut next);
        }

        for (o, v) in result.row_mut(b).iter_mut().zip(acc.drain(..)) {
            *o = v;
        }
    }

    Ok(result)
}
