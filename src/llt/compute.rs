use super::{LltGradError, LltGradInfo, LltGradParams};
use crate::{utils::thread::for_each_chunk_mut, Parallelism};
use dyn_stack::{PodStack, SizeOverflow, StackReq};
use equator::debug_assert;
use faer::{reborrow::*, MatMut, MatRef};

#[cfg(feature = "std")]
use dyn_stack::GlobalPodBuffer;
#[cfg(feature = "std")]
use faer::Mat;

const LOG_TARGET: &str = "faer_cholesky_grad";

/// Computes the size and alignment of required workspace for computing the gradient with respect
/// to the original matrix, given the gradient with respect to its Cholesky factor.
pub fn cholesky_grad_req(dim: usize, parallelism: Parallelism) -> Result<StackReq, SizeOverflow> {
    match parallelism {
        Parallelism::None => Ok(StackReq::default()),
        // staging buffer for the row-parallel unwind of one column
        _ => StackReq::try_new::<f64>(dim),
    }
}

fn check_inputs(
    adjoint: MatRef<'_, f64>,
    cholesky_factor: MatRef<'_, f64>,
) -> Result<(), LltGradError> {
    let n = cholesky_factor.nrows();
    if cholesky_factor.ncols() != n || adjoint.nrows() != n || adjoint.ncols() != n {
        return Err(LltGradError::DimensionMismatch {
            factor_nrows: cholesky_factor.nrows(),
            factor_ncols: cholesky_factor.ncols(),
            adjoint_nrows: adjoint.nrows(),
            adjoint_ncols: adjoint.ncols(),
        });
    }

    for k in 0..n {
        let pivot = cholesky_factor.read(k, k);
        // also rejects NaN
        if !(pivot > 0.0) {
            return Err(LltGradError::InvalidFactor {
                index: k,
                value: pivot,
            });
        }
    }
    Ok(())
}

fn count_degenerate_pivots(cholesky_factor: MatRef<'_, f64>, params: LltGradParams) -> usize {
    let threshold = params.degeneracy_threshold;
    let mut count = 0usize;
    for k in 0..cholesky_factor.nrows() {
        let pivot = cholesky_factor.read(k, k);
        if pivot < threshold {
            log::warn!(
                target: LOG_TARGET,
                "ill-conditioned pivot: L[{k}, {k}] = {pivot:e} is below the degeneracy threshold {threshold:e}",
            );
            count += 1;
        }
    }
    count
}

// A[i, k] -= A[i, j] * L[j, k]
// A[j, k] -= A[i, j] * L[i, k]
// for k < j <= i, in the same order as the reverse of the forward elimination.
// when i == j, both updates hit A[j, k] one after the other.
fn unwind_column_seq(k: usize, adjoint: MatMut<'_, f64>, cholesky_factor: MatRef<'_, f64>) {
    let mut a = adjoint;
    let l = cholesky_factor;
    let n = l.nrows();

    for j in k + 1..n {
        let l_jk = l.read(j, k);
        for i in j..n {
            let a_ij = a.read(i, j);
            a.write(i, k, a.read(i, k) - a_ij * l_jk);
            a.write(j, k, a.read(j, k) - a_ij * l.read(i, k));
        }
    }
}

// same updates as `unwind_column_seq`, regrouped by destination row. row `i` collects
// - A[i, j] * L[j, k] for j in k + 1..=i, where it is the row of the read cell,
// - A[j, i] * L[j, k] for j in i..n, where it is the column of the read cell.
// both sums include j == i. every read is in a column > k, which is final, so rows are
// independent and each one writes a single cell of the staging buffer.
fn unwind_column_par(
    k: usize,
    adjoint: MatMut<'_, f64>,
    cholesky_factor: MatRef<'_, f64>,
    staging: &mut [f64],
    parallelism: Parallelism,
) {
    let mut a = adjoint;
    let l = cholesky_factor;
    let n = l.nrows();

    debug_assert!(staging.len() >= n - k - 1);
    let staging = &mut staging[..n - k - 1];

    {
        let a = a.rb();
        for_each_chunk_mut(
            staging,
            move |offset, chunk| {
                for (idx, dst) in chunk.iter_mut().enumerate() {
                    let i = k + 1 + offset + idx;
                    let mut acc = a.read(i, k);
                    for j in k + 1..i + 1 {
                        acc -= a.read(i, j) * l.read(j, k);
                    }
                    for j in i..n {
                        acc -= a.read(j, i) * l.read(j, k);
                    }
                    *dst = acc;
                }
            },
            parallelism,
        );
    }

    for (idx, &value) in staging.iter().enumerate() {
        a.write(k + 1 + idx, k, value);
    }
}

// undoes the division by L[k, k] of the sub-diagonal part of column k, then the square root
// that produced L[k, k].
fn close_column(k: usize, adjoint: MatMut<'_, f64>, cholesky_factor: MatRef<'_, f64>) {
    let mut a = adjoint;
    let l = cholesky_factor;
    let n = l.nrows();
    let l_kk = l.read(k, k);

    for j in k + 1..n {
        let a_jk = a.read(j, k) / l_kk;
        a.write(j, k, a_jk);
        a.write(k, k, a.read(k, k) - l.read(j, k) * a_jk);
    }
    a.write(k, k, a.read(k, k) / (2.0 * l_kk));
}

/// Computes the gradient of a scalar objective with respect to a symmetric positive definite
/// matrix $K$, given its Cholesky factor $L$ and the gradient of the objective with respect to
/// $L$.
///
/// On entry, `adjoint` contains $\partial f / \partial L$. Only its lower triangular part is
/// read, and its strictly upper triangular part is overwritten with zeros. On success, the lower
/// triangular part of `adjoint` contains $\partial f / \partial K$, where each strictly lower
/// entry is the combined sensitivity to $K_{ij}$ and $K_{ji}$.
///
/// Only the lower triangular part of `cholesky_factor` is read.
///
/// With [`Parallelism::None`], the columns are unwound by the reference sequential sweep.
/// Otherwise, the update of each column is split by rows between the threads of the given
/// parallelism. The two only differ in the order of floating point operations.
///
/// # Errors
///
/// - Returns [`LltGradError::DimensionMismatch`] if `cholesky_factor` is not square, or if
///   `adjoint` does not have the same shape.
/// - Returns [`LltGradError::InvalidFactor`] if a diagonal entry of `cholesky_factor` is not
///   strictly positive.
///
/// Inputs are validated before anything is written, so `adjoint` is untouched when an error is
/// returned.
///
/// # Panics
///
/// This can panic if the provided memory in `stack` is insufficient (see
/// [`cholesky_grad_req`]).
#[track_caller]
pub fn cholesky_grad_in_place(
    adjoint: MatMut<'_, f64>,
    cholesky_factor: MatRef<'_, f64>,
    parallelism: Parallelism,
    stack: PodStack<'_>,
    params: LltGradParams,
) -> Result<LltGradInfo, LltGradError> {
    let mut adjoint = adjoint;
    let l = cholesky_factor;

    check_inputs(adjoint.rb(), l)?;
    let degenerate_pivot_count = count_degenerate_pivots(l, params);
    let info = LltGradInfo {
        degenerate_pivot_count,
    };

    let n = l.nrows();
    if n == 0 {
        return Ok(info);
    }

    for j in 1..n {
        for i in 0..j {
            adjoint.write(i, j, 0.0);
        }
    }

    match parallelism {
        Parallelism::None => {
            log::debug!(target: LOG_TARGET, "sequential cholesky gradient, dim = {n}");
            for k in (0..n).rev() {
                unwind_column_seq(k, adjoint.rb_mut(), l);
                close_column(k, adjoint.rb_mut(), l);
            }
        }
        _ => {
            log::debug!(
                target: LOG_TARGET,
                "row-parallel cholesky gradient, dim = {n}, parallelism = {parallelism:?}",
            );
            let (staging, _) = stack.make_raw::<f64>(n);
            for k in (0..n).rev() {
                unwind_column_par(k, adjoint.rb_mut(), l, staging, parallelism);
                close_column(k, adjoint.rb_mut(), l);
            }
        }
    }

    Ok(info)
}

/// Computes the gradient of a scalar objective with respect to a symmetric positive definite
/// matrix $K$, given its Cholesky factor $L$ and the gradient `grad_l` of the objective with
/// respect to $L$, and returns it in a newly allocated matrix.
///
/// Only the lower triangular parts of the inputs are read. The result is stored in the lower
/// triangular part of the output, and its strictly upper triangular part is zero.
///
/// See [`cholesky_grad_in_place`] for the errors that can be returned.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
#[track_caller]
pub fn cholesky_grad(
    cholesky_factor: MatRef<'_, f64>,
    grad_l: MatRef<'_, f64>,
    parallelism: Parallelism,
) -> Result<Mat<f64>, LltGradError> {
    let mut adjoint = grad_l.to_owned();
    let dim = cholesky_factor.nrows();

    cholesky_grad_in_place(
        adjoint.as_mut(),
        cholesky_factor,
        parallelism,
        PodStack::new(&mut GlobalPodBuffer::new(
            cholesky_grad_req(dim, parallelism).unwrap(),
        )),
        Default::default(),
    )?;
    Ok(adjoint)
}
