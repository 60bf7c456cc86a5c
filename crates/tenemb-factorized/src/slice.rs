//! Results of row lookups on factorized tensors
//!
//! Each scheme returns its rows in the cheapest form it can produce:
//!
//! - BlockTT contracts straight to a dense (B × cols) matrix
//! - CP returns per-row coefficients over the shared column factors, which
//!   must be expanded with [`CpRows::to_matrix`]
//! - Tucker returns a (B, c₁, ..., c_b) tensor that is not in standard
//!   layout and must be copied into a contiguous matrix
//!
//! [`RowSlice::into_matrix`] applies whichever step is needed.

use crate::error::Result;
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use tenemb_core::{DenseND, Element};
use tenemb_kernels::khatri_rao_chain;

/// Rows selected from a factorized tensor
#[derive(Debug, Clone)]
pub enum RowSlice<'a, T> {
    /// Already dense rows, shape (B, cols)
    Dense(Array2<T>),
    /// CP rows still in factored form
    Cp(CpRows<'a, T>),
    /// Tucker rows of shape (B, c₁, ..., c_b), generally non-contiguous
    Tucker(DenseND<T>),
}

impl<'a, T> RowSlice<'a, T>
where
    T: Element,
{
    /// Number of selected rows
    pub fn batch_size(&self) -> usize {
        match self {
            RowSlice::Dense(m) => m.nrows(),
            RowSlice::Cp(rows) => rows.batch_size(),
            RowSlice::Tucker(t) => t.shape()[0],
        }
    }

    /// Whether the rows are already a dense matrix
    pub fn is_dense(&self) -> bool {
        matches!(self, RowSlice::Dense(_))
    }

    /// Materialize the rows as a contiguous (B, cols) matrix
    pub fn into_matrix(self) -> Result<Array2<T>> {
        match self {
            RowSlice::Dense(m) => Ok(m),
            RowSlice::Cp(rows) => rows.to_matrix(),
            RowSlice::Tucker(t) => {
                let batch = t.shape()[0];
                let width: usize = t.shape()[1..].iter().product();
                let matrix = t
                    .into_array()
                    .as_standard_layout()
                    .into_owned()
                    .into_shape_with_order((batch, width))
                    .map_err(anyhow::Error::from)?;
                Ok(matrix)
            }
        }
    }
}

/// A batch of CP rows: `row_b = Σ_r coefficients[b, r] · (c¹_r ⊗ ... ⊗ c^b_r)`
///
/// `coefficients` already carries the CP weights and the product of the
/// selected row-factor entries; the column factors are borrowed from the
/// tensor.
#[derive(Debug, Clone)]
pub struct CpRows<'a, T> {
    coefficients: Array2<T>,
    col_factors: Vec<ArrayView2<'a, T>>,
}

impl<'a, T> CpRows<'a, T>
where
    T: Element,
{
    pub(crate) fn new(coefficients: Array2<T>, col_factors: Vec<ArrayView2<'a, T>>) -> Self {
        Self {
            coefficients,
            col_factors,
        }
    }

    /// Per-row weights of each rank-one component, shape (B, R)
    pub fn coefficients(&self) -> ArrayView2<'_, T> {
        self.coefficients.view()
    }

    /// Column-mode factor matrices
    pub fn col_factors(&self) -> &[ArrayView2<'a, T>] {
        &self.col_factors
    }

    /// Number of rows in the batch
    pub fn batch_size(&self) -> usize {
        self.coefficients.nrows()
    }

    /// CP rank
    pub fn rank(&self) -> usize {
        self.coefficients.ncols()
    }

    /// Length of each expanded row
    pub fn num_cols(&self) -> usize {
        self.col_factors.iter().map(|f| f.nrows()).product()
    }

    /// Expand to a dense (B, cols) matrix
    ///
    /// Time: O(B × R × cols)
    pub fn to_matrix(&self) -> Result<Array2<T>> {
        let kr = khatri_rao_chain(&self.col_factors)?;
        Ok(self.coefficients.dot(&kr.t()))
    }
}
