//! # tenemb - Factorized Embedding Tables
//!
//! Memory-efficient embedding lookup tables stored as low-rank tensor
//! factorizations.
//!
//! This is the **meta crate**: it provides the [`FactorizedEmbedding`] layer
//! and re-exports the component crates.
//!
//! ## Quick Start
//!
//! ```
//! use tenemb::prelude::*;
//!
//! let layer = FactorizedEmbedding::<f64>::new(
//!     EmbeddingConfig::new(10_000, 64).with_d(2, 2).with_rank(8).with_seed(1),
//! )?;
//! assert!(layer.compression_ratio() > 10.0);
//!
//! let rows = layer.forward_flat(&[0, 9_999])?;
//! assert_eq!(rows.shape(), &[2, 64]);
//! # Ok::<(), FactorizedError>(())
//! ```
//!
//! ## Components
//!
//! - [`core`]: dense tensors, element trait, compute-context token
//! - [`kernels`]: Khatri-Rao, Kronecker, n-mode products, TT contractions
//! - [`decomp`]: CP-ALS, Tucker HOSVD/HOOI, TT-SVD
//! - [`factorized`]: shape suggestion, ranks, factorized tensors, fitting
//!
//! ## Initializing from a dense table
//!
//! ```
//! use scirs2_core::ndarray_ext::Array2;
//! use tenemb::prelude::*;
//!
//! let table = Array2::from_shape_fn((100, 16), |(i, j)| ((i % 10) as f64) * ((j % 4) as f64));
//! let layer = FactorizedEmbedding::from_dense(
//!     &table.view(),
//!     EmbeddingConfig::new(0, 0).with_d(2, 2).with_rank(4),
//!     WeightInit::Decompose(FitOptions::default()),
//! )?;
//! assert_eq!(layer.weight_shape(), (100, 16));
//! # Ok::<(), FactorizedError>(())
//! ```
//!
//! ## Features
//!
//! - `tracing`: install a `tracing-subscriber` via [`tracing_support::init_tracing`]
//! - `serde`: serialize schemes, ranks, fit options and dtype tokens
//! - `full`: all of the above

pub mod embedding;
pub mod tracing_support;


pub use tenemb_core as core;
pub use tenemb_decomp as decomp;
pub use tenemb_factorized as factorized;
pub use tenemb_kernels as kernels;

pub use embedding::{EmbeddingConfig, FactorizedEmbedding, Initialization, Reshape, WeightInit};
pub use tenemb_factorized::{FactorizedError, FitInit, FitOptions, Rank, Result, Scheme};

pub mod prelude {
    //! Prelude module for convenient imports

    pub use crate::core::{ComputeContext, DenseND, Device, Dtype, Element};
    pub use crate::embedding::{
        EmbeddingConfig, FactorizedEmbedding, Initialization, Reshape, WeightInit,
    };
    pub use crate::factorized::{
        suggest_shape, FactorizedError, FactorizedTensor, FitInit, FitOptions, Rank, RowSlice,
        Scheme, TensorizedShape,
    };
}
