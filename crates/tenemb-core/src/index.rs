//! Mixed-radix index conversion
//!
//! A flat row index of a table whose row axis is tensorized as
//! `(n₁, n₂, ..., n_d)` maps to the multi-index `(i₁, ..., i_d)` with
//! `flat = ((i₁ · n₂ + i₂) · n₃ + ...) · n_d + i_d`, i.e. row-major order
//! with the last mode varying fastest.

/// Decompose a flat index into a multi-index over `dims` (row-major).
///
/// # Errors
///
/// Fails if `out.len() != dims.len()` or if `flat` is not smaller than the
/// product of `dims`.
///
/// # Examples
///
/// ```
/// use tenemb_core::unravel_index;
///
/// let mut multi = [0usize; 3];
/// unravel_index(23, &[2, 3, 4], &mut multi).unwrap();
/// assert_eq!(multi, [1, 2, 3]);
/// ```
pub fn unravel_index(flat: usize, dims: &[usize], out: &mut [usize]) -> anyhow::Result<()> {
    anyhow::ensure!(
        out.len() == dims.len(),
        "Output buffer has {} slots but shape {:?} has {} modes",
        out.len(),
        dims,
        dims.len()
    );
    let total: usize = dims.iter().product();
    anyhow::ensure!(
        flat < total,
        "Flat index {} out of range for shape {:?} (size {})",
        flat,
        dims,
        total
    );

    let mut remaining = flat;
    for (slot, &dim) in out.iter_mut().zip(dims.iter()).rev() {
        *slot = remaining % dim;
        remaining /= dim;
    }
    Ok(())
}

/// Compose a multi-index over `dims` into a flat row-major index.
///
/// Inverse of [`unravel_index`], used to check it.
#[cfg(test)]
pub(crate) fn ravel_index(multi: &[usize], dims: &[usize]) -> anyhow::Result<usize> {
    anyhow::ensure!(
        multi.len() == dims.len(),
        "Multi-index {:?} does not match shape {:?}",
        multi,
        dims
    );
    let mut flat = 0usize;
    for (mode, (&i, &dim)) in multi.iter().zip(dims.iter()).enumerate() {
        anyhow::ensure!(
            i < dim,
            "Index {} out of range for mode {} of size {}",
            i,
            mode,
            dim
        );
        flat = flat * dim + i;
    }
    Ok(flat)
}
