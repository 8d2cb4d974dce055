use equator::assert;
use faer::MatMut;

#[cfg(feature = "std")]
use faer::{Mat, MatRef};

/// Expands a gradient stored in the lower triangular part of `grad`, as produced by
/// [`super::compute::cholesky_grad_in_place`], into the full symmetric gradient.
///
/// Each strictly lower entry holds the combined sensitivity to $K_{ij}$ and $K_{ji}$. It is split
/// evenly between the two positions, so that for any symmetric direction $E$, the sum of
/// $G_{ij} E_{ij}$ over all $i, j$ is the directional derivative of the objective along $E$.
/// The diagonal is left unchanged.
///
/// # Panics
///
/// Panics if `grad` is not a square matrix.
#[track_caller]
pub fn symmetrize_in_place(grad: MatMut<'_, f64>) {
    let mut grad = grad;
    assert!(grad.nrows() == grad.ncols());

    let n = grad.nrows();
    for j in 0..n {
        for i in j + 1..n {
            let half = grad.read(i, j) * 0.5;
            grad.write(i, j, half);
            grad.write(j, i, half);
        }
    }
}

/// Returns the full symmetric gradient corresponding to the lower triangular gradient `grad`.
///
/// See [`symmetrize_in_place`].
///
/// # Panics
///
/// Panics if `grad` is not a square matrix.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
#[track_caller]
pub fn symmetrize(grad: MatRef<'_, f64>) -> Mat<f64> {
    let mut out = grad.to_owned();
    symmetrize_in_place(out.as_mut());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetrize() {
        let grad = Mat::from_fn(3, 3, |i, j| if i >= j { (1 + i + 3 * j) as f64 } else { 9.0 });
        let sym = symmetrize(grad.as_ref());

        for j in 0..3 {
            assert_eq!(sym.read(j, j), grad.read(j, j));
            for i in j + 1..3 {
                assert_eq!(sym.read(i, j), grad.read(i, j) / 2.0);
                assert_eq!(sym.read(j, i), grad.read(i, j) / 2.0);
            }
        }
    }

    #[test]
    #[should_panic]
    fn test_symmetrize_non_square() {
        symmetrize_in_place(Mat::<f64>::zeros(2, 3).as_mut());
    }
}
