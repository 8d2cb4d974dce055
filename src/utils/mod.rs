//! Scheduling helpers shared by the gradient kernels.

/// Thread-level parallelism helpers.
pub mod thread;
