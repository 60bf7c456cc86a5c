//! Block tensor-train cores
//!
//! The chain runs over the row modes followed by the column modes. A row
//! lookup contracts the selected slices of the row cores into a (B × r_a)
//! matrix and multiplies it by the column cores merged into one
//! (r_a × cols) block.

use super::fill_normal;
use crate::error::Result;
use scirs2_core::ndarray_ext::{Array2, Array3};
use scirs2_core::random::Rng;
use tenemb_core::Element;
use tenemb_kernels::{tt_merge, tt_select_rows};

/// TT cores Gₖ of shape (r_{k-1}, Iₖ, rₖ) with r₀ = r_N = 1
#[derive(Debug, Clone)]
pub struct TtCores<T> {
    pub(crate) cores: Vec<Array3<T>>,
}

impl<T> TtCores<T>
where
    T: Element,
{
    pub(crate) fn zeros(dims: &[usize], chain: &[usize]) -> Self {
        Self {
            cores: dims
                .iter()
                .enumerate()
                .map(|(k, &d)| Array3::zeros((chain[k], d, chain[k + 1])))
                .collect(),
        }
    }

    /// The cores, row modes first
    pub fn cores(&self) -> &[Array3<T>] {
        &self.cores
    }

    pub(crate) fn num_parameters(&self) -> usize {
        self.cores.iter().map(|c| c.len()).sum()
    }

    /// Core entries with std `(σ / √Π rₖ)^(1/N)`
    pub(crate) fn fill_normal<R: Rng>(&mut self, std: f64, rng: &mut R) -> Result<()> {
        let order = self.cores.len() as f64;
        let bond_product: f64 = self.cores[1..]
            .iter()
            .map(|c| c.shape()[0] as f64)
            .product();
        let core_std = (std / bond_product.sqrt()).powf(1.0 / order);
        for core in &mut self.cores {
            fill_normal(core, core_std, rng)?;
        }
        Ok(())
    }

    pub(crate) fn select_rows(&self, split: usize, rows: &[usize]) -> Result<Array2<T>> {
        let views: Vec<_> = self.cores.iter().map(|c| c.view()).collect();
        let left = tt_select_rows(&views[..split], rows)?;

        let merged = tt_merge(&views[split..])?;
        let (bond, width, _) = merged.dim();
        let right = merged
            .into_shape_with_order((bond, width))
            .map_err(anyhow::Error::from)?;

        Ok(left.dot(&right))
    }

    pub(crate) fn to_matrix(&self, num_rows: usize, num_cols: usize) -> Result<Array2<T>> {
        let views: Vec<_> = self.cores.iter().map(|c| c.view()).collect();
        let merged = tt_merge(&views)?;
        let matrix = merged
            .into_shape_with_order((num_rows, num_cols))
            .map_err(anyhow::Error::from)?;
        Ok(matrix)
    }
}
