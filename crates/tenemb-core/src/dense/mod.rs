//! Dense tensor implementation and operations
//!
//! The type lives in [`types`]; operations are grouped by functionality.

pub mod types;

mod creation;
mod densend_traits;
mod norms;
mod shape_ops;

pub use types::DenseND;
