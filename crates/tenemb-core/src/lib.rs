//! # tenemb-core
//!
//! Core tensor types for the tenemb factorized-embedding stack.
//!
//! This crate provides the building blocks shared by every other tenemb crate:
//!
//! - **Dense tensor representation** ([`DenseND`]) with views, reshape and
//!   matricization (unfold/fold)
//! - **Element trait** ([`Element`]) bundling the numeric bounds required by the
//!   decomposition kernels, implemented for `f32` and `f64`
//! - **Compute context** ([`ComputeContext`]) an explicit dtype/device token that
//!   is threaded through every construction call
//! - **Mixed-radix indexing** ([`unravel_index`]) used to map
//!   flat table rows onto tensorized modes
//!
//! ## SciRS2 Integration
//!
//! All array, numeric and random-number operations go through `scirs2-core`
//! (`scirs2_core::ndarray_ext`, `scirs2_core::numeric`, `scirs2_core::random`).
//!
//! ## Quick Start
//!
//! ```
//! use tenemb_core::{DenseND, unravel_index};
//!
//! let table = DenseND::<f64>::zeros(&[6, 4]);
//! let tensorized = table.reshape(&[2, 3, 2, 2]).unwrap();
//! assert_eq!(tensorized.shape(), &[2, 3, 2, 2]);
//!
//! // Row 5 of a (2 x 3)-tensorized axis is the multi-index (1, 2)
//! let mut multi = [0usize; 2];
//! unravel_index(5, &[2, 3], &mut multi).unwrap();
//! assert_eq!(multi, [1, 2]);
//! ```
//!
//! ## Memory Layout
//!
//! Tensors are C-contiguous (row-major). The last mode varies fastest, which is
//! the convention every tensorized reshape in tenemb relies on.

pub mod dense;
pub mod index;
pub mod types;


pub use dense::DenseND;
pub use index::unravel_index;
#[cfg(test)]
pub(crate) use index::ravel_index;
pub use types::{ComputeContext, Device, Dtype, Element, Shape};
