//! # tenemb-factorized
//!
//! Factorized storage for large (rows × cols) tables.
//!
//! A table is tensorized into row modes and column modes and stored under one
//! of three schemes:
//!
//! - **CP**: R weights and one (Iₙ × R) factor per mode
//! - **Tucker**: a (R₁ × ... × R_N) core and one (Iₙ × Rₙ) factor per mode
//! - **BlockTT**: a tensor train of cores (r_{k-1} × Iₖ × rₖ)
//!
//! Rows are looked up directly from the factors ([`FactorizedTensor::index_rows`]),
//! so the dense table is only built when asked for
//! ([`FactorizedTensor::to_matrix`]).
//!
//! ## Quick Start
//!
//! ```
//! use scirs2_core::ndarray_ext::Array2;
//! use tenemb_core::ComputeContext;
//! use tenemb_factorized::{suggest_shape, FactorizedTensor, FitOptions, Rank, Scheme, TensorizedShape};
//!
//! let rows = suggest_shape(100, 2).unwrap();
//! let cols = suggest_shape(16, 2).unwrap();
//! let shape = TensorizedShape::new(&rows, &cols).unwrap();
//!
//! let mut tensor = FactorizedTensor::<f64>::new(
//!     shape,
//!     &"same".parse::<Rank>().unwrap(),
//!     Scheme::BlockTt,
//!     ComputeContext::for_element::<f64>(),
//! )
//! .unwrap();
//!
//! let table = Array2::from_shape_fn((100, 16), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
//! tensor.init_from_matrix(&table.view(), &FitOptions::default()).unwrap();
//! let rows = tensor.lookup(&[3, 42]).unwrap();
//! assert_eq!(rows.shape(), &[2, 16]);
//! ```
//!
//! ## Errors
//!
//! All operations return [`FactorizedError`]: `InvalidArgument`,
//! `UnsupportedScheme` or `NumericalFailure`. Shapes and ranks are validated
//! when a tensor is built; lookups only re-check index bounds.

pub mod decompose;
pub mod error;
pub mod rank;
pub mod scheme;
pub mod shape;
pub mod slice;
pub mod tensor;


pub use decompose::{FitInit, FitOptions};
pub use error::{FactorizedError, Result};
pub use rank::{tt_rank_bounds, Rank};
pub use scheme::Scheme;
pub use shape::{suggest_shape, TensorizedShape};
pub use slice::{CpRows, RowSlice};
pub use tensor::{CpFactors, FactorizedTensor, Factors, TtCores, TuckerFactors};
