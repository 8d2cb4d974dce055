//! Reverse-mode rule for the Cholesky decomposition $K = LL^\top$ of a symmetric positive
//! definite matrix.
//!
//! The forward factorization computes each column of $L$ from the lower triangle of $K$ with a
//! dot product subtraction, a division by the pivot, and a square root. The gradient kernel walks
//! those steps backwards from the last column to the first. Right before column $k$ is processed,
//! every column $j > k$ of the adjoint already holds its final value, so a single sweep suffices.

/// Computing the gradient.
pub mod compute;
/// Expanding the gradient into a full symmetric matrix.
pub mod symmetric;

/// This error signifies that the gradient could not be computed because the inputs do not
/// describe a valid Cholesky factor and a matching adjoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LltGradError {
    /// The Cholesky factor is not square, or the adjoint does not have the same shape.
    DimensionMismatch {
        /// Number of rows of the Cholesky factor.
        factor_nrows: usize,
        /// Number of columns of the Cholesky factor.
        factor_ncols: usize,
        /// Number of rows of the adjoint.
        adjoint_nrows: usize,
        /// Number of columns of the adjoint.
        adjoint_ncols: usize,
    },
    /// A diagonal entry of the Cholesky factor is not strictly positive.
    InvalidFactor {
        /// Index of the first offending diagonal entry.
        index: usize,
        /// Its value.
        value: f64,
    },
}

impl core::fmt::Display for LltGradError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            LltGradError::DimensionMismatch {
                factor_nrows,
                factor_ncols,
                adjoint_nrows,
                adjoint_ncols,
            } => write!(
                f,
                "dimension mismatch: cholesky factor is {factor_nrows}x{factor_ncols}, adjoint is {adjoint_nrows}x{adjoint_ncols}",
            ),
            LltGradError::InvalidFactor { index, value } => write!(
                f,
                "invalid cholesky factor: diagonal entry {index} is {value}, expected a positive value",
            ),
        }
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl std::error::Error for LltGradError {}

/// Gradient tuning parameters.
#[derive(Copy, Clone, Debug)]
pub struct LltGradParams {
    /// Diagonal entries of the Cholesky factor that are positive but smaller than this value are
    /// reported as ill-conditioned. The computation still proceeds.
    ///
    /// A value of `0.0` disables the check.
    pub degeneracy_threshold: f64,
}

impl Default for LltGradParams {
    #[inline]
    fn default() -> Self {
        Self {
            degeneracy_threshold: 0.0,
        }
    }
}

/// Info about the result of the gradient computation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LltGradInfo {
    /// Number of diagonal entries of the Cholesky factor that fell below
    /// [`LltGradParams::degeneracy_threshold`].
    pub degenerate_pivot_count: usize,
}
