//! Fitting factorized tensors to dense tables
//!
//! [`FactorizedTensor::init_from_matrix`] reshapes a dense (rows × cols)
//! table into the tensor's mode shape and fits the scheme's factors in place:
//!
//! | Scheme  | Back-end                                  |
//! |---------|-------------------------------------------|
//! | CP      | CP-ALS, weights extracted from column norms |
//! | Tucker  | HOSVD followed by HOOI sweeps             |
//! | BlockTT | TT-SVD truncated to the resolved chain, zero-padded where the data has lower rank |
//!
//! The tensor is left untouched if fitting fails.

use crate::error::{FactorizedError, Result};
use crate::scheme::Scheme;
use crate::tensor::{Factors, FactorizedTensor};
use scirs2_core::ndarray_ext::{Array1, ArrayView2};
use scirs2_core::random::{rngs::StdRng, SeedableRng};
use tenemb_core::{DenseND, Element};
use tenemb_decomp::{cp_als, cp_als_with_rng, tt_svd, tucker_hooi, InitStrategy};
use tracing::{debug, info, warn};

/// Initialization of iterative decompositions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitInit {
    /// Leading singular vectors of each mode unfolding
    #[default]
    Svd,
    /// Standard normal draws
    Random,
}

/// Options for [`FactorizedTensor::init_from_matrix`]
///
/// # Examples
///
/// ```
/// use tenemb_factorized::{FitInit, FitOptions};
///
/// let options = FitOptions::default()
///     .with_max_iterations(50)
///     .with_tolerance(1e-8)
///     .with_init(FitInit::Random)
///     .with_seed(7);
/// assert!(options.validate().is_ok());
/// assert!(FitOptions::default().with_tolerance(1.5).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitOptions {
    /// Upper bound on ALS/HOOI sweeps (unused by the one-pass TT-SVD)
    pub max_iterations: usize,
    /// Stop once the change in fit between sweeps drops below this
    pub tolerance: f64,
    /// Starting point of CP-ALS
    pub init: FitInit,
    /// Seed for random draws; `None` uses the thread-local generator
    pub seed: Option<u64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            init: FitInit::Svd,
            seed: None,
        }
    }
}

impl FitOptions {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_init(mut self, init: FitInit) -> Self {
        self.init = init;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that the iteration cap is positive and the tolerance lies in [0, 1)
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(FactorizedError::invalid(
                "max_iterations must be at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.tolerance) {
            return Err(FactorizedError::invalid(format!(
                "tolerance must lie in [0, 1), got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

impl<T> FactorizedTensor<T>
where
    T: Element,
{
    /// Fit the factors to approximate `dense` and overwrite them in place
    ///
    /// `dense` must have shape (rows, cols) of this tensor.
    ///
    /// # Errors
    ///
    /// - [`FactorizedError::InvalidArgument`] for a wrongly shaped table or
    ///   invalid options
    /// - [`FactorizedError::NumericalFailure`] if the table holds NaN/Inf, a
    ///   factorization step fails, or the fitted factors are non-finite
    pub fn init_from_matrix(&mut self, dense: &ArrayView2<T>, options: &FitOptions) -> Result<()> {
        options.validate()?;
        let expected = (self.num_rows(), self.num_cols());
        if dense.dim() != expected {
            return Err(FactorizedError::invalid(format!(
                "Dense table has shape {:?}, expected {:?}",
                dense.dim(),
                expected
            )));
        }
        if dense.iter().any(|v| !v.is_finite()) {
            return Err(FactorizedError::numerical(
                "Dense table contains NaN or infinite values",
            ));
        }

        let modes = self.shape().modes();
        let tensor = DenseND::from_matrix(dense.to_owned()).into_shape(&modes)?;
        let scheme = self.scheme();
        let rank = self.rank().to_vec();
        debug!(scheme = %scheme, shape = %self.shape(), rank = ?rank, "fitting factorized tensor");

        let fitted = match scheme {
            Scheme::Cp => fit_cp(&tensor, rank[0], options)?,
            Scheme::Tucker => fit_tucker(&tensor, &rank, options)?,
            Scheme::BlockTt => fit_tt(&tensor, &rank)?,
        };
        check_finite(&fitted)?;

        *self.factors_mut() = fitted;
        Ok(())
    }

    /// Relative reconstruction error `‖dense - X‖ / ‖dense‖`
    pub fn relative_error(&self, dense: &ArrayView2<T>) -> Result<T> {
        let reconstructed = self.densify()?;
        let reference = DenseND::from_matrix(dense.to_owned());
        Ok(reconstructed.relative_error(&reference)?)
    }
}

fn fit_cp<T: Element>(tensor: &DenseND<T>, rank: usize, options: &FitOptions) -> Result<Factors<T>> {
    let init = match options.init {
        FitInit::Svd => InitStrategy::Svd,
        FitInit::Random => InitStrategy::RandomNormal,
    };
    let mut cp = match options.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            cp_als_with_rng(tensor, rank, options.max_iterations, options.tolerance, init, &mut rng)?
        }
        None => cp_als(tensor, rank, options.max_iterations, options.tolerance, init)?,
    };
    cp.extract_weights();

    if cp.converged {
        info!(iterations = cp.iters, fit = %cp.fit, "CP-ALS converged");
    } else {
        warn!(
            iterations = cp.iters,
            fit = %cp.fit,
            "CP-ALS stopped at the iteration cap before reaching the tolerance"
        );
    }

    let weights = cp.weights.take().unwrap_or_else(|| Array1::ones(rank));
    Ok(Factors::Cp(crate::tensor::CpFactors {
        weights,
        factors: cp.factors,
    }))
}

fn fit_tucker<T: Element>(
    tensor: &DenseND<T>,
    ranks: &[usize],
    options: &FitOptions,
) -> Result<Factors<T>> {
    let tucker = tucker_hooi(tensor, ranks, options.max_iterations, options.tolerance)?;

    if tucker.converged {
        info!(iterations = tucker.iters, error = ?tucker.error, "Tucker-HOOI converged");
    } else {
        warn!(
            iterations = tucker.iters,
            error = ?tucker.error,
            "Tucker-HOOI stopped at the iteration cap before reaching the tolerance"
        );
    }

    if tucker.core.shape() != ranks {
        return Err(FactorizedError::numerical(format!(
            "Tucker core has shape {:?}, expected {:?}",
            tucker.core.shape(),
            ranks
        )));
    }
    Ok(Factors::Tucker(crate::tensor::TuckerFactors {
        core: tucker.core,
        factors: tucker.factors,
    }))
}

fn fit_tt<T: Element>(tensor: &DenseND<T>, chain: &[usize]) -> Result<Factors<T>> {
    let internal = &chain[1..chain.len() - 1];
    let tt = tt_svd(tensor, internal, 0.0)?;
    let truncated = tt.ranks.clone();
    let padded = tt.pad_to_ranks(internal)?;

    info!(
        ranks = ?truncated,
        parameters = padded.num_parameters(),
        "TT-SVD finished"
    );
    if truncated != internal {
        debug!(
            numerical = ?truncated,
            requested = ?internal,
            "zero-padded TT cores to the requested ranks"
        );
    }

    Ok(Factors::BlockTt(crate::tensor::TtCores {
        cores: padded.cores,
    }))
}

fn check_finite<T: Element>(factors: &Factors<T>) -> Result<()> {
    let finite = match factors {
        Factors::Cp(f) => {
            f.weights.iter().all(|v| v.is_finite())
                && f.factors.iter().all(|m| m.iter().all(|v| v.is_finite()))
        }
        Factors::Tucker(f) => {
            f.core.all_finite() && f.factors.iter().all(|m| m.iter().all(|v| v.is_finite()))
        }
        Factors::BlockTt(f) => f.cores.iter().all(|c| c.iter().all(|v| v.is_finite())),
    };
    if finite {
        Ok(())
    } else {
        Err(FactorizedError::numerical(
            "Decomposition produced NaN or infinite factors",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::Rank;
    use crate::shape::TensorizedShape;
    use scirs2_core::ndarray_ext::Array2;
    use tenemb_core::ComputeContext;

    fn empty(scheme: Scheme, rank: Rank) -> FactorizedTensor<f64> {
        let shape = TensorizedShape::new(&[3, 4], &[2, 3]).unwrap();
        FactorizedTensor::new(shape, &rank, scheme, ComputeContext::for_element::<f64>()).unwrap()
    }

    /// Separable over all four modes, so rank one for every scheme
    fn rank_one_table() -> Array2<f64> {
        Array2::from_shape_fn((12, 6), |(i, j)| {
            let (i1, i2) = (i / 4, i % 4);
            let (j1, j2) = (j / 3, j % 3);
            (i1 as f64 + 1.0) * (i2 as f64 - 1.5) * (j1 as f64 + 1.0) * (0.5 - j2 as f64)
        })
    }

    #[test]
    fn test_fit_options_validation() {
        assert!(FitOptions::default().validate().is_ok());
        assert!(FitOptions::default().with_max_iterations(0).validate().is_err());
        assert!(FitOptions::default().with_tolerance(-0.1).validate().is_err());
        assert!(FitOptions::default().with_tolerance(1.0).validate().is_err());
    }

    #[test]
    fn test_rank_one_table_fits_every_scheme() {
        let table = rank_one_table();
        let options = FitOptions::default().with_seed(1).with_tolerance(1e-10);
        for (scheme, rank) in [
            (Scheme::Cp, Rank::Uniform(1)),
            (Scheme::Tucker, Rank::Uniform(1)),
            (Scheme::BlockTt, Rank::Uniform(1)),
        ] {
            let mut tensor = empty(scheme, rank);
            tensor.init_from_matrix(&table.view(), &options).unwrap();
            let err = tensor.relative_error(&table.view()).unwrap();
            assert!(err < 1e-8, "{} error {}", scheme, err);
        }
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let mut tensor = empty(Scheme::BlockTt, Rank::Uniform(2));
        let table = Array2::<f64>::zeros((6, 12));
        let err = tensor
            .init_from_matrix(&table.view(), &FitOptions::default())
            .unwrap_err();
        assert!(matches!(err, FactorizedError::InvalidArgument(_)));
    }

    #[test]
    fn test_non_finite_table_rejected() {
        let mut table = rank_one_table();
        table[[3, 2]] = f64::NAN;
        for scheme in [Scheme::Cp, Scheme::Tucker, Scheme::BlockTt] {
            let mut tensor = empty(scheme, Rank::Uniform(2));
            let err = tensor
                .init_from_matrix(&table.view(), &FitOptions::default())
                .unwrap_err();
            assert!(matches!(err, FactorizedError::NumericalFailure(_)), "{}", scheme);
        }

        table[[3, 2]] = f64::INFINITY;
        let mut tensor = empty(Scheme::Cp, Rank::Uniform(2));
        let err = tensor
            .init_from_matrix(&table.view(), &FitOptions::default())
            .unwrap_err();
        assert!(matches!(err, FactorizedError::NumericalFailure(_)));
    }

    #[test]
    fn test_non_finite_factors_detected() {
        let mut tensor = empty(Scheme::BlockTt, Rank::Uniform(2));
        tensor
            .init_from_matrix(&rank_one_table().view(), &FitOptions::default())
            .unwrap();
        assert!(check_finite(tensor.factors()).is_ok());

        if let Factors::BlockTt(f) = tensor.factors_mut() {
            f.cores[1][[0, 1, 0]] = f64::NAN;
        }
        let err = check_finite(tensor.factors()).unwrap_err();
        assert!(matches!(err, FactorizedError::NumericalFailure(_)));
        assert!(err.to_string().contains("NaN or infinite"));
    }

    #[test]
    fn test_tt_padding_keeps_core_shapes() {
        // Rank-one data, rank-3 request
        let mut tensor = empty(Scheme::BlockTt, Rank::Uniform(3));
        let table = rank_one_table();
        tensor
            .init_from_matrix(&table.view(), &FitOptions::default())
            .unwrap();
        assert_eq!(tensor.rank(), &[1, 3, 3, 3, 1]);
        match tensor.factors() {
            Factors::BlockTt(f) => assert_eq!(f.cores()[1].shape(), &[3, 4, 3]),
            other => panic!("unexpected factors {:?}", other),
        }
        assert!(tensor.relative_error(&table.view()).unwrap() < 1e-10);
    }
}
