//! Factorized tensors
//!
//! A [`FactorizedTensor`] stores a tensorized (rows × cols) table under one of
//! three schemes and answers row lookups without materializing the table.
//!
//! # Layout
//!
//! The tensor modes are the row modes followed by the column modes. Row `i`
//! of the table is the multi-index obtained by unraveling `i` over the row
//! modes in row-major order (last mode fastest), and likewise for columns.
//!
//! # Lifecycle
//!
//! [`FactorizedTensor::new`] allocates zero-filled factors (CP weights start
//! at one). Fill them with [`FactorizedTensor::normal_`] or fit them to an
//! existing table with [`FactorizedTensor::init_from_matrix`].

mod block_tt;
mod cp;
mod tucker;

pub use block_tt::TtCores;
pub use cp::CpFactors;
pub use tucker::TuckerFactors;

use crate::error::{FactorizedError, Result};
use crate::rank::Rank;
use crate::scheme::Scheme;
use crate::shape::TensorizedShape;
use crate::slice::RowSlice;
use scirs2_core::ndarray_ext::{Array, Array2, Dimension};
use scirs2_core::random::{thread_rng, Rng};
use tenemb_core::{ComputeContext, DenseND, Element};
use tracing::debug;

/// Scheme-specific factor storage
#[derive(Debug, Clone)]
pub enum Factors<T> {
    /// CP weights and factor matrices
    Cp(CpFactors<T>),
    /// Tucker core and factor matrices
    Tucker(TuckerFactors<T>),
    /// Tensor-train cores
    BlockTt(TtCores<T>),
}

/// A tensorized table stored in factored form
///
/// # Examples
///
/// ```
/// use scirs2_core::random::{rngs::StdRng, SeedableRng};
/// use tenemb_core::ComputeContext;
/// use tenemb_factorized::{FactorizedTensor, Rank, Scheme, TensorizedShape};
///
/// let shape = TensorizedShape::new(&[10, 10, 10], &[8, 8]).unwrap();
/// let mut tensor = FactorizedTensor::<f64>::new(
///     shape,
///     &Rank::Uniform(4),
///     Scheme::BlockTt,
///     ComputeContext::for_element::<f64>(),
/// )
/// .unwrap();
/// tensor.normal_with_rng(0.0, 0.02, &mut StdRng::seed_from_u64(0)).unwrap();
///
/// let rows = tensor.lookup(&[0, 999, 0]).unwrap();
/// assert_eq!(rows.shape(), &[3, 64]);
/// assert_eq!(rows.row(0), rows.row(2));
/// ```
#[derive(Debug, Clone)]
pub struct FactorizedTensor<T> {
    shape: TensorizedShape,
    rank: Vec<usize>,
    context: ComputeContext,
    factors: Factors<T>,
}

impl<T> FactorizedTensor<T>
where
    T: Element,
{
    /// Allocate a factorized tensor of the given shape, rank and scheme
    ///
    /// `context` must describe element type `T`.
    ///
    /// # Errors
    ///
    /// Fails with [`FactorizedError::InvalidArgument`] if the rank cannot be
    /// resolved for this shape and scheme, or if `context` names another dtype.
    pub fn new(
        shape: TensorizedShape,
        rank: &Rank,
        scheme: Scheme,
        context: ComputeContext,
    ) -> Result<Self> {
        context
            .ensure_element::<T>()
            .map_err(|e| FactorizedError::invalid(e.to_string()))?;

        let dims = shape.modes();
        let resolved = rank.resolve(scheme, &dims)?;
        let factors = match scheme {
            Scheme::Cp => Factors::Cp(CpFactors::zeros(&dims, resolved[0])),
            Scheme::Tucker => Factors::Tucker(TuckerFactors::zeros(&dims, &resolved)),
            Scheme::BlockTt => Factors::BlockTt(TtCores::zeros(&dims, &resolved)),
        };

        let tensor = Self {
            shape,
            rank: resolved,
            context,
            factors,
        };
        debug!(
            scheme = %scheme,
            shape = %tensor.shape,
            rank = ?tensor.rank,
            parameters = tensor.num_parameters(),
            "allocated factorized tensor"
        );
        Ok(tensor)
    }

    /// Tensorized shape (row modes, column modes)
    pub fn shape(&self) -> &TensorizedShape {
        &self.shape
    }

    /// Resolved rank: `[R]` for CP, per-mode ranks for Tucker, the full
    /// `[1, r₁, ..., 1]` chain for BlockTT
    pub fn rank(&self) -> &[usize] {
        &self.rank
    }

    /// Factorization scheme
    pub fn scheme(&self) -> Scheme {
        match self.factors {
            Factors::Cp(_) => Scheme::Cp,
            Factors::Tucker(_) => Scheme::Tucker,
            Factors::BlockTt(_) => Scheme::BlockTt,
        }
    }

    /// Compute context the factors were created for
    pub fn context(&self) -> ComputeContext {
        self.context
    }

    /// Scheme-specific factors
    pub fn factors(&self) -> &Factors<T> {
        &self.factors
    }

    /// Number of table rows
    pub fn num_rows(&self) -> usize {
        self.shape.num_rows()
    }

    /// Number of table columns
    pub fn num_cols(&self) -> usize {
        self.shape.num_cols()
    }

    /// Number of stored scalars across all factors
    pub fn num_parameters(&self) -> usize {
        match &self.factors {
            Factors::Cp(f) => f.num_parameters(),
            Factors::Tucker(f) => f.num_parameters(),
            Factors::BlockTt(f) => f.num_parameters(),
        }
    }

    /// Dense table size divided by the number of stored scalars
    pub fn compression_ratio(&self) -> f64 {
        (self.num_rows() * self.num_cols()) as f64 / self.num_parameters() as f64
    }

    /// Re-draw every factor from a zero-mean normal distribution
    ///
    /// Factor standard deviations are chosen so that entries of the
    /// reconstructed table have standard deviation `std`.
    ///
    /// # Errors
    ///
    /// Fails with [`FactorizedError::InvalidArgument`] if `mean` is not zero
    /// or `std` is negative or not finite.
    pub fn normal_(&mut self, mean: f64, std: f64) -> Result<()> {
        let mut rng = thread_rng();
        self.normal_with_rng(mean, std, &mut rng)
    }

    /// [`normal_`](Self::normal_) with an explicit random number generator
    pub fn normal_with_rng<R: Rng>(&mut self, mean: f64, std: f64, rng: &mut R) -> Result<()> {
        if mean != 0.0 {
            return Err(FactorizedError::invalid(format!(
                "Only zero-mean initialization is supported for factorized tensors, got mean {}",
                mean
            )));
        }
        if !std.is_finite() || std < 0.0 {
            return Err(FactorizedError::invalid(format!(
                "Standard deviation must be finite and non-negative, got {}",
                std
            )));
        }

        match &mut self.factors {
            Factors::Cp(f) => f.fill_normal(std, rng),
            Factors::Tucker(f) => f.fill_normal(std, rng),
            Factors::BlockTt(f) => f.fill_normal(std, rng),
        }
    }

    /// Select table rows by flat index
    ///
    /// Output row `b` is table row `rows[b]`; duplicate indices are computed
    /// independently. See [`RowSlice`] for the per-scheme result forms.
    ///
    /// # Errors
    ///
    /// Fails with [`FactorizedError::InvalidArgument`] if any index is not
    /// below [`num_rows`](Self::num_rows).
    pub fn index_rows(&self, rows: &[usize]) -> Result<RowSlice<'_, T>> {
        let num_rows = self.num_rows();
        if let Some(&bad) = rows.iter().find(|&&r| r >= num_rows) {
            return Err(FactorizedError::invalid(format!(
                "Row index {} out of range for a table with {} rows",
                bad, num_rows
            )));
        }

        let split = self.shape.num_row_modes();
        match &self.factors {
            Factors::Cp(f) => f.select_rows(split, rows).map(RowSlice::Cp),
            Factors::Tucker(f) => f.select_rows(split, rows).map(RowSlice::Tucker),
            Factors::BlockTt(f) => f.select_rows(split, rows).map(RowSlice::Dense),
        }
    }

    /// Select table rows as a dense (B × cols) matrix
    pub fn lookup(&self, rows: &[usize]) -> Result<Array2<T>> {
        self.index_rows(rows)?.into_matrix()
    }

    /// Single table entry
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        if col >= self.num_cols() {
            return Err(FactorizedError::invalid(format!(
                "Column index {} out of range for a table with {} columns",
                col,
                self.num_cols()
            )));
        }
        let rows = self.lookup(&[row])?;
        Ok(rows[[0, col]])
    }

    /// Reconstruct the full (rows × cols) table
    ///
    /// Costs O(rows × cols) memory; avoid on large tables.
    pub fn to_matrix(&self) -> Result<Array2<T>> {
        let (rows, cols) = (self.num_rows(), self.num_cols());
        match &self.factors {
            Factors::Cp(f) => f.to_matrix(self.shape.num_row_modes()),
            Factors::Tucker(f) => f.to_matrix(rows, cols),
            Factors::BlockTt(f) => f.to_matrix(rows, cols),
        }
    }

    /// Reconstruct the full table as a 2-D dense tensor
    pub fn densify(&self) -> Result<DenseND<T>> {
        Ok(DenseND::from_matrix(self.to_matrix()?))
    }

    /// Reconstruct the full table in its tensorized shape
    pub fn to_tensor(&self) -> Result<DenseND<T>> {
        Ok(self.densify()?.into_shape(&self.shape.modes())?)
    }

    pub(crate) fn factors_mut(&mut self) -> &mut Factors<T> {
        &mut self.factors
    }
}

/// Overwrite `array` with draws from `N(0, std²)`
fn fill_normal<T, D, R>(array: &mut Array<T, D>, std: f64, rng: &mut R) -> Result<()>
where
    T: Element,
    D: Dimension,
    R: Rng,
{
    if std == 0.0 {
        array.fill(T::zero());
        return Ok(());
    }
    let fresh = DenseND::<T>::random_normal(array.shape(), 0.0, std, rng)?;
    for (dst, &src) in array.iter_mut().zip(fresh.view().iter()) {
        *dst = src;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::random::{rngs::StdRng, SeedableRng};

    fn build(scheme: Scheme, rank: Rank) -> FactorizedTensor<f64> {
        let shape = TensorizedShape::new(&[4, 5], &[2, 3]).unwrap();
        let mut tensor =
            FactorizedTensor::new(shape, &rank, scheme, ComputeContext::for_element::<f64>())
                .unwrap();
        tensor
            .normal_with_rng(0.0, 1.0, &mut StdRng::seed_from_u64(3))
            .unwrap();
        tensor
    }

    fn all_schemes() -> Vec<FactorizedTensor<f64>> {
        vec![
            build(Scheme::Cp, Rank::Uniform(3)),
            build(Scheme::Tucker, Rank::Uniform(2)),
            build(Scheme::BlockTt, Rank::Uniform(3)),
        ]
    }

    #[test]
    fn test_factor_shapes() {
        let cp = build(Scheme::Cp, Rank::Uniform(3));
        assert_eq!(cp.rank(), &[3]);
        assert_eq!(cp.num_parameters(), 3 + 3 * (4 + 5 + 2 + 3));

        let tucker = build(Scheme::Tucker, Rank::Uniform(3));
        assert_eq!(tucker.rank(), &[3, 3, 2, 3]);
        match tucker.factors() {
            Factors::Tucker(f) => assert_eq!(f.core().shape(), &[3, 3, 2, 3]),
            other => panic!("unexpected factors {:?}", other),
        }

        let tt = build(Scheme::BlockTt, Rank::Uniform(3));
        assert_eq!(tt.rank(), &[1, 3, 3, 3, 1]);
        match tt.factors() {
            Factors::BlockTt(f) => {
                let shapes: Vec<_> = f.cores().iter().map(|c| c.shape().to_vec()).collect();
                assert_eq!(
                    shapes,
                    vec![vec![1, 4, 3], vec![3, 5, 3], vec![3, 2, 3], vec![3, 3, 1]]
                );
            }
            other => panic!("unexpected factors {:?}", other),
        }
    }

    #[test]
    fn test_index_rows_matches_to_matrix() {
        for tensor in all_schemes() {
            let full = tensor.to_matrix().unwrap();
            assert_eq!(full.shape(), &[20, 6]);

            let rows: Vec<usize> = (0..20).rev().collect();
            let picked = tensor.lookup(&rows).unwrap();
            for (b, &r) in rows.iter().enumerate() {
                for c in 0..6 {
                    assert!(
                        (picked[[b, c]] - full[[r, c]]).abs() < 1e-10,
                        "{} row {} col {}",
                        tensor.scheme(),
                        r,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_slice_forms_per_scheme() {
        let [cp, tucker, tt]: [FactorizedTensor<f64>; 3] = all_schemes().try_into().unwrap();
        assert!(matches!(cp.index_rows(&[1]).unwrap(), RowSlice::Cp(_)));
        assert!(matches!(tt.index_rows(&[1]).unwrap(), RowSlice::Dense(_)));
        match tucker.index_rows(&[1, 2]).unwrap() {
            RowSlice::Tucker(t) => assert_eq!(t.shape(), &[2, 2, 3]),
            other => panic!("unexpected slice {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_rows() {
        for tensor in all_schemes() {
            assert!(matches!(
                tensor.index_rows(&[0, 20]),
                Err(FactorizedError::InvalidArgument(_))
            ));
            assert!(tensor.get(0, 6).is_err());
        }
    }

    #[test]
    fn test_zero_std_gives_zero_table() {
        for mut tensor in all_schemes() {
            tensor.normal_(0.0, 0.0).unwrap();
            assert!(tensor.to_matrix().unwrap().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_nonzero_mean_rejected() {
        let mut tensor = build(Scheme::BlockTt, Rank::Uniform(2));
        assert!(tensor.normal_(1.0, 0.5).is_err());
        assert!(tensor.normal_(0.0, -1.0).is_err());
        assert!(tensor.normal_(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_context_must_match_element() {
        let shape = TensorizedShape::new(&[4], &[4]).unwrap();
        let result = FactorizedTensor::<f64>::new(
            shape,
            &Rank::Uniform(2),
            Scheme::Cp,
            ComputeContext::for_element::<f32>(),
        );
        assert!(matches!(result, Err(FactorizedError::InvalidArgument(_))));
    }

    #[test]
    fn test_to_tensor_shape() {
        let tensor = build(Scheme::Tucker, Rank::Uniform(2));
        let full = tensor.to_tensor().unwrap();
        assert_eq!(full.shape(), &[4, 5, 2, 3]);
        assert!((full[&[1, 2, 1, 0][..]] - tensor.get(7, 3).unwrap()).abs() < 1e-12);
    }
}
