//! # tenemb-kernels
//!
//! Tensor kernels shared by the tenemb decomposition and lookup paths.
//!
//! - **Khatri-Rao product** ([`khatri_rao`], [`khatri_rao_chain`]) and direct
//!   row selection from the chain ([`khatri_rao_rows`]) for CP
//! - **Kronecker product** ([`kronecker`]) and row selection
//!   ([`kronecker_rows`]) for Tucker
//! - **N-mode products** ([`nmode_product`], [`nmode_products_seq`],
//!   [`tucker_reconstruct`])
//! - **MTTKRP** ([`mttkrp`]), the inner kernel of CP-ALS
//! - **Tensor-train contractions** ([`tt_select_rows`], [`tt_merge`],
//!   [`tt_to_tensor`])
//!
//! ## Quick Start
//!
//! ```rust
//! use scirs2_core::ndarray_ext::Array2;
//! use tenemb_core::DenseND;
//! use tenemb_kernels::{khatri_rao, mttkrp, nmode_product};
//!
//! let a = Array2::<f64>::ones((10, 5));
//! let b = Array2::<f64>::ones((8, 5));
//! let kr = khatri_rao(&a.view(), &b.view()).unwrap();
//! assert_eq!(kr.shape(), &[80, 5]);
//!
//! let tensor = DenseND::<f64>::ones(&[3, 4, 5]);
//! let matrix = Array2::<f64>::ones((2, 3));
//! let result = nmode_product(&tensor.view(), &matrix.view(), 0).unwrap();
//! assert_eq!(result.shape(), &[2, 4, 5]);
//!
//! let factors = vec![
//!     Array2::<f64>::ones((3, 2)),
//!     Array2::<f64>::ones((4, 2)),
//!     Array2::<f64>::ones((5, 2)),
//! ];
//! let views: Vec<_> = factors.iter().map(|f| f.view()).collect();
//! let v = mttkrp(&tensor.view(), &views, 1).unwrap();
//! assert_eq!(v.shape(), &[4, 2]);
//! ```
//!
//! ## SciRS2 Integration
//!
//! All array operations go through `scirs2_core::ndarray_ext`.

pub mod khatri_rao;
pub mod kronecker;
pub mod mttkrp;
pub mod nmode;
pub mod tt_ops;


pub use khatri_rao::{khatri_rao, khatri_rao_chain, khatri_rao_rows};
pub use kronecker::{kronecker, kronecker_rows};
pub use mttkrp::mttkrp;
pub use nmode::{nmode_product, nmode_products_seq, tucker_reconstruct};
pub use tt_ops::{tt_merge, tt_select_rows, tt_to_tensor, validate_tt_cores};
