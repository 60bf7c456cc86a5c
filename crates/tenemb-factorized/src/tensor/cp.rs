//! CP factors: `X = Σ_r λ_r · u¹_r ∘ u²_r ∘ ... ∘ u^N_r`

use super::fill_normal;
use crate::error::Result;
use crate::slice::CpRows;
use scirs2_core::ndarray_ext::{Array1, Array2};
use scirs2_core::random::Rng;
use tenemb_core::Element;
use tenemb_kernels::{khatri_rao_chain, khatri_rao_rows};

/// Weights and per-mode factor matrices of a CP tensor
#[derive(Debug, Clone)]
pub struct CpFactors<T> {
    pub(crate) weights: Array1<T>,
    pub(crate) factors: Vec<Array2<T>>,
}

impl<T> CpFactors<T>
where
    T: Element,
{
    pub(crate) fn zeros(dims: &[usize], rank: usize) -> Self {
        Self {
            weights: Array1::ones(rank),
            factors: dims.iter().map(|&d| Array2::zeros((d, rank))).collect(),
        }
    }

    /// Component weights λ, length R
    pub fn weights(&self) -> &Array1<T> {
        &self.weights
    }

    /// Factor matrices, one (Iₙ × R) matrix per mode
    pub fn factors(&self) -> &[Array2<T>] {
        &self.factors
    }

    /// CP rank
    pub fn rank(&self) -> usize {
        self.weights.len()
    }

    pub(crate) fn num_parameters(&self) -> usize {
        self.weights.len() + self.factors.iter().map(|f| f.len()).sum::<usize>()
    }

    /// Unit weights, factor entries with std `(σ / √R)^(1/N)`
    pub(crate) fn fill_normal<R: Rng>(&mut self, std: f64, rng: &mut R) -> Result<()> {
        let order = self.factors.len() as f64;
        let factor_std = (std / (self.rank() as f64).sqrt()).powf(1.0 / order);
        self.weights.fill(T::one());
        for factor in &mut self.factors {
            fill_normal(factor, factor_std, rng)?;
        }
        Ok(())
    }

    pub(crate) fn select_rows(&self, split: usize, rows: &[usize]) -> Result<CpRows<'_, T>> {
        let row_views: Vec<_> = self.factors[..split].iter().map(|f| f.view()).collect();
        let mut coefficients = khatri_rao_rows(&row_views, rows)?;
        for mut row in coefficients.rows_mut() {
            row *= &self.weights;
        }
        let col_views = self.factors[split..].iter().map(|f| f.view()).collect();
        Ok(CpRows::new(coefficients, col_views))
    }

    pub(crate) fn to_matrix(&self, split: usize) -> Result<Array2<T>> {
        let row_views: Vec<_> = self.factors[..split].iter().map(|f| f.view()).collect();
        let col_views: Vec<_> = self.factors[split..].iter().map(|f| f.view()).collect();

        let mut left = khatri_rao_chain(&row_views)?;
        for mut row in left.rows_mut() {
            row *= &self.weights;
        }
        let right = khatri_rao_chain(&col_views)?;
        Ok(left.dot(&right.t()))
    }
}
