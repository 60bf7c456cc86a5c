//! Norms and numerical health checks

use super::types::DenseND;
use scirs2_core::numeric::Float;

impl<T> DenseND<T>
where
    T: Float,
{
    /// Frobenius norm: `sqrt(Σ x²)`
    ///
    /// # Examples
    ///
    /// ```
    /// use tenemb_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::ones(&[2, 3]);
    /// assert!((tensor.frobenius_norm() - 6.0_f64.sqrt()).abs() < 1e-12);
    /// ```
    pub fn frobenius_norm(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &x| acc + x * x)
            .sqrt()
    }

    /// Relative distance `||self - other|| / ||other||`
    ///
    /// Returns the absolute distance when `other` is identically zero.
    pub fn relative_error(&self, other: &Self) -> anyhow::Result<T> {
        anyhow::ensure!(
            self.shape() == other.shape(),
            "Shape mismatch: {:?} vs {:?}",
            self.shape(),
            other.shape()
        );

        let mut diff_sq = T::zero();
        let mut norm_sq = T::zero();
        for (&a, &b) in self.data.iter().zip(other.data.iter()) {
            let d = a - b;
            diff_sq = diff_sq + d * d;
            norm_sq = norm_sq + b * b;
        }

        if norm_sq > T::zero() {
            Ok((diff_sq / norm_sq).sqrt())
        } else {
            Ok(diff_sq.sqrt())
        }
    }

    /// Check that no entry is NaN or infinite
    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Largest absolute entry-wise difference
    pub fn max_abs_diff(&self, other: &Self) -> anyhow::Result<T> {
        anyhow::ensure!(
            self.shape() == other.shape(),
            "Shape mismatch: {:?} vs {:?}",
            self.shape(),
            other.shape()
        );
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc.max((a - b).abs())))
    }
}
