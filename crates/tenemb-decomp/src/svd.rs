//! Thin SVD by one-sided Jacobi rotations
//!
//! Mode unfoldings of tensorized tables are extremely tall or wide (10 × 6400
//! for the first TT step of a 1000 × 64 table). The one-sided Jacobi method
//! orthogonalizes the columns of the narrow side directly, so singular values
//! and vectors stay accurate to working precision on such shapes and exact
//! zeros come out as exact zeros.
//!
//! The input is rotated in place until every column pair is orthogonal to
//! machine precision; column norms are then the singular values.

use anyhow::Result;
use scirs2_core::ndarray_ext::{Array1, Array2, ArrayView2, Axis};
use std::cmp::Ordering;
use tenemb_core::Element;

/// Upper bound on full sweeps over all column pairs
const MAX_SWEEPS: usize = 60;

/// Thin SVD `A = U · diag(σ) · Vᵀ` with σ sorted in descending order
///
/// For an (m × n) input with k = min(m, n), returns U (m × k), σ (k) and
/// Vᵀ (k × n). Singular vectors paired with a zero singular value may be
/// zero rather than unit length.
///
/// # Errors
///
/// Fails if the input contains NaN or infinite values.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::Array2;
/// use tenemb_decomp::thin_svd;
///
/// let ones = Array2::<f64>::ones((4, 16));
/// let (u, sigma, vt) = thin_svd(&ones.view()).unwrap();
/// assert_eq!(u.dim(), (4, 4));
/// assert_eq!(vt.dim(), (4, 16));
/// assert!((sigma[0] - 8.0).abs() < 1e-12);
/// assert!(sigma.iter().skip(1).all(|&s| s < 1e-12));
/// ```
pub fn thin_svd<T>(a: &ArrayView2<T>) -> Result<(Array2<T>, Array1<T>, Array2<T>)>
where
    T: Element,
{
    anyhow::ensure!(
        a.iter().all(|v| v.is_finite()),
        "SVD input contains NaN or infinite values"
    );

    let (m, n) = a.dim();
    if m >= n {
        Ok(jacobi_svd(a.to_owned()))
    } else {
        // Aᵀ = U' Σ V'ᵀ  ⇒  A = V' Σ U'ᵀ
        let (u, sigma, vt) = jacobi_svd(a.t().as_standard_layout().into_owned());
        Ok((
            vt.reversed_axes().as_standard_layout().into_owned(),
            sigma,
            u.reversed_axes().as_standard_layout().into_owned(),
        ))
    }
}

/// One-sided Jacobi on a matrix with at least as many rows as columns
fn jacobi_svd<T: Element>(mut work: Array2<T>) -> (Array2<T>, Array1<T>, Array2<T>) {
    let (m, n) = work.dim();
    let mut v = Array2::<T>::eye(n);
    let eps = T::epsilon();
    let two = T::one() + T::one();

    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;
        for p in 0..n {
            for q in p + 1..n {
                let (mut alpha, mut beta, mut gamma) = (T::zero(), T::zero(), T::zero());
                for i in 0..m {
                    let (xp, xq) = (work[[i, p]], work[[i, q]]);
                    alpha += xp * xp;
                    beta += xq * xq;
                    gamma += xp * xq;
                }
                if gamma == T::zero() || gamma.abs() <= eps * (alpha * beta).sqrt() {
                    continue;
                }

                // Rotation that zeroes the (p, q) entry of the column Gram matrix
                let zeta = (beta - alpha) / (two * gamma);
                let t = zeta.signum() / (zeta.abs() + (T::one() + zeta * zeta).sqrt());
                let c = T::one() / (T::one() + t * t).sqrt();
                let s = c * t;
                if s == T::zero() {
                    continue;
                }
                rotate_columns(&mut work, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
                rotated = true;
            }
        }
        if !rotated {
            break;
        }
    }

    let norms: Vec<T> = (0..n)
        .map(|j| work.column(j).iter().map(|&x| x * x).sum::<T>().sqrt())
        .collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| norms[b].partial_cmp(&norms[a]).unwrap_or(Ordering::Equal));

    let mut u = Array2::<T>::zeros((m, n));
    let mut vt = Array2::<T>::zeros((n, n));
    let mut sigma = Array1::<T>::zeros(n);
    for (dst, &src) in order.iter().enumerate() {
        let norm = norms[src];
        sigma[dst] = norm;
        if norm > T::zero() {
            for i in 0..m {
                u[[i, dst]] = work[[i, src]] / norm;
            }
        }
        for j in 0..n {
            vt[[dst, j]] = v[[j, src]];
        }
    }
    (u, sigma, vt)
}

/// `[x_p, x_q] ← [c·x_p − s·x_q, s·x_p + c·x_q]` on every row
fn rotate_columns<T: Element>(matrix: &mut Array2<T>, p: usize, q: usize, c: T, s: T) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let (xp, xq) = (row[p], row[q]);
        row[p] = c * xp - s * xq;
        row[q] = s * xp + c * xq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(u: &Array2<f64>, sigma: &Array1<f64>, vt: &Array2<f64>) -> Array2<f64> {
        let mut scaled = u.clone();
        for (mut col, &s) in scaled.axis_iter_mut(Axis(1)).zip(sigma.iter()) {
            col.mapv_inplace(|x| x * s);
        }
        scaled.dot(vt)
    }

    fn relative_error(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        let diff: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
        let norm: f64 = a.iter().map(|x| x * x).sum();
        (diff / norm).sqrt()
    }

    fn dense(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| {
            ((i * 7 + j * 3) % 11) as f64 - 5.0 + ((i * j) as f64 * 0.37).sin()
        })
    }

    #[test]
    fn test_tall_and_wide_unfoldings_reconstruct() {
        for (rows, cols) in [(10, 160), (100, 16), (16, 4), (7, 7)] {
            let a = dense(rows, cols);
            let (u, sigma, vt) = thin_svd(&a.view()).unwrap();
            let k = rows.min(cols);
            assert_eq!(u.dim(), (rows, k));
            assert_eq!(sigma.len(), k);
            assert_eq!(vt.dim(), (k, cols));
            let err = relative_error(&a, &reconstruct(&u, &sigma, &vt));
            assert!(err < 1e-12, "{}x{} error {}", rows, cols, err);
        }
    }

    #[test]
    fn test_singular_values_sorted_and_vectors_orthonormal() {
        let a = dense(30, 6);
        let (u, sigma, vt) = thin_svd(&a.view()).unwrap();
        let values = sigma.to_vec();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));

        let utu = u.t().dot(&u);
        let vvt = vt.dot(&vt.t());
        for i in 0..6 {
            for j in 0..6 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((utu[[i, j]] - expected).abs() < 1e-12);
                assert!((vvt[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_rank_one_has_single_nonzero_value() {
        let a = Array2::<f64>::ones((4, 16));
        let (_, sigma, _) = thin_svd(&a.view()).unwrap();
        assert!((sigma[0] - 8.0).abs() < 1e-12);
        assert!(sigma.iter().skip(1).all(|&s| s <= 1e-12 * sigma[0]));
    }

    #[test]
    fn test_zero_matrix() {
        let a = Array2::<f64>::zeros((5, 3));
        let (u, sigma, vt) = thin_svd(&a.view()).unwrap();
        assert!(sigma.iter().all(|&s| s == 0.0));
        assert!(u.iter().all(|&x| x == 0.0));
        assert_eq!(vt.dim(), (3, 3));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut a = Array2::<f64>::ones((3, 3));
        a[[1, 2]] = f64::NAN;
        assert!(thin_svd(&a.view()).is_err());
    }
}
