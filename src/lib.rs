//! Reverse-mode differentiation through the Cholesky decomposition.
//!
//! Given the lower triangular factor $L$ of a symmetric positive definite matrix $K = LL^\top$, and
//! the gradient $\bar L = \partial f / \partial L$ of some scalar objective $f$, the routines in
//! [`llt`] compute $\bar K = \partial f / \partial K$ by walking the unblocked factorization in
//! reverse, one column at a time, from the last column to the first. Neither $K$ nor any inverse
//! is ever formed.
//!
//! Matrices are [`faer`] matrices of `f64`, stored in column-major order. Only the lower triangle
//! (diagonal included) of each operand is read, and the result is stored in the lower triangle.
//! An off-diagonal entry of the result is the combined sensitivity to $K_{ij}$ and $K_{ji}$; see
//! [`llt::symmetric`] to expand it into a full symmetric matrix.
//!
//! The same result is available from two schedules, selected by [`Parallelism`]:
//! - [`Parallelism::None`] runs the reference sweep sequentially,
//! - `Parallelism::Rayon(n)` regroups the inner update of each column by row, so that rows are
//!   processed independently on the rayon thread pool.
//!
//! # Example
//! ```
//! use faer::{Mat, Parallelism};
//! use faer_cholesky_grad::llt::compute::cholesky_grad;
//!
//! // K = [[4, 2], [2, 5]], L = [[2, 0], [1, 2]]
//! let l = Mat::from_fn(2, 2, |i, j| [[2.0, 0.0], [1.0, 2.0]][i][j]);
//! let grad_l = Mat::from_fn(2, 2, |i, j| if i >= j { 1.0 } else { 0.0 });
//!
//! let grad_k = cholesky_grad(l.as_ref(), grad_l.as_ref(), Parallelism::None).unwrap();
//! assert_eq!(grad_k.read(1, 1), 0.25);
//! assert_eq!(grad_k.read(0, 1), 0.0);
//! ```

#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(non_snake_case)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(feature = "std"), no_std)]

pub use dyn_stack;
pub use faer::Parallelism;

pub mod llt;
pub mod utils;
