//! Tucker factors: `X = G ×₁ U₁ ×₂ U₂ ... ×_N U_N`

use super::fill_normal;
use crate::error::Result;
use scirs2_core::ndarray_ext::{Array2, IxDyn};
use scirs2_core::random::Rng;
use tenemb_core::{DenseND, Element};
use tenemb_kernels::{kronecker_rows, nmode_product, tucker_reconstruct};

/// Core tensor and per-mode factor matrices of a Tucker tensor
#[derive(Debug, Clone)]
pub struct TuckerFactors<T> {
    pub(crate) core: DenseND<T>,
    pub(crate) factors: Vec<Array2<T>>,
}

impl<T> TuckerFactors<T>
where
    T: Element,
{
    pub(crate) fn zeros(dims: &[usize], ranks: &[usize]) -> Self {
        Self {
            core: DenseND::zeros(ranks),
            factors: dims
                .iter()
                .zip(ranks.iter())
                .map(|(&d, &r)| Array2::zeros((d, r)))
                .collect(),
        }
    }

    /// Core tensor of shape (R₁, ..., R_N)
    pub fn core(&self) -> &DenseND<T> {
        &self.core
    }

    /// Factor matrices, one (Iₙ × Rₙ) matrix per mode
    pub fn factors(&self) -> &[Array2<T>] {
        &self.factors
    }

    pub(crate) fn num_parameters(&self) -> usize {
        self.core.len() + self.factors.iter().map(|f| f.len()).sum::<usize>()
    }

    /// Core and factor entries all with std `(σ / √ΠRₙ)^(1/(N+1))`
    pub(crate) fn fill_normal<R: Rng>(&mut self, std: f64, rng: &mut R) -> Result<()> {
        let order = self.factors.len() as f64;
        let core_size = self.core.len() as f64;
        let entry_std = (std / core_size.sqrt()).powf(1.0 / (order + 1.0));

        fill_normal(self.core.as_array_mut(), entry_std, rng)?;
        for factor in &mut self.factors {
            fill_normal(factor, entry_std, rng)?;
        }
        Ok(())
    }

    /// Rows as a (B, c₁, ..., c_b) tensor
    ///
    /// The selected row-factor rows are combined with a Kronecker product and
    /// contracted with the core unfolded as (ΠR_row × ΠR_col); the column
    /// factors are then applied mode by mode.
    pub(crate) fn select_rows(&self, split: usize, rows: &[usize]) -> Result<DenseND<T>> {
        let row_views: Vec<_> = self.factors[..split].iter().map(|f| f.view()).collect();
        let selected = kronecker_rows(&row_views, rows)?;

        let ranks = self.core.shape();
        let row_rank: usize = ranks[..split].iter().product();
        let col_rank: usize = ranks[split..].iter().product();
        let core_matrix = self.core.reshape(&[row_rank, col_rank])?.to_matrix()?;

        let mut shape = Vec::with_capacity(1 + ranks.len() - split);
        shape.push(rows.len());
        shape.extend_from_slice(&ranks[split..]);

        let mut partial = selected
            .dot(&core_matrix)
            .into_shape_with_order(IxDyn(&shape))
            .map_err(anyhow::Error::from)?;
        for (offset, factor) in self.factors[split..].iter().enumerate() {
            partial = nmode_product(&partial.view(), &factor.view(), offset + 1)?;
        }

        Ok(DenseND::from_array(partial))
    }

    pub(crate) fn to_matrix(&self, num_rows: usize, num_cols: usize) -> Result<Array2<T>> {
        let views: Vec<_> = self.factors.iter().map(|f| f.view()).collect();
        let full = tucker_reconstruct(&self.core.view(), &views)?;
        let matrix = full
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order((num_rows, num_cols))
            .map_err(anyhow::Error::from)?;
        Ok(matrix)
    }
}
