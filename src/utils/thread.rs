use crate::Parallelism;

/// The amount of threads that should ideally execute an operation with the given parallelism.
#[inline]
pub fn parallelism_degree(parallelism: Parallelism) -> usize {
    match parallelism {
        Parallelism::None => 1,
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(0) => rayon::current_num_threads(),
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(n_threads) => n_threads,
        #[allow(unreachable_patterns)]
        _ => 1,
    }
}

/// Returns the length of the chunks used to split `n` items between at most `chunk_count`
/// consumers.
#[inline]
pub fn chunk_len(n: usize, chunk_count: usize) -> usize {
    let chunk_count = Ord::max(chunk_count, 1);
    let len = n / chunk_count + (n % chunk_count != 0) as usize;
    Ord::max(len, 1)
}

/// Splits `dst` into contiguous chunks, one per thread of the given parallelism (and never more
/// than one per element), then calls `op(offset, chunk)` for each of them, possibly in parallel.
///
/// `offset` is the index in `dst` of the first element of `chunk`. Distinct calls receive
/// disjoint chunks, and the call returns once every chunk has been processed.
#[inline]
pub fn for_each_chunk_mut<T: Send>(
    dst: &mut [T],
    op: impl Send + Sync + Fn(usize, &mut [T]),
    parallelism: Parallelism,
) {
    fn implementation<T: Send>(
        dst: &mut [T],
        op: &(dyn Send + Sync + Fn(usize, &mut [T])),
        parallelism: Parallelism,
    ) {
        let n = dst.len();
        if n == 0 {
            return;
        }

        let chunk_count = Ord::min(parallelism_degree(parallelism), n);
        if chunk_count == 1 {
            op(0, dst);
            return;
        }

        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            let chunk_size = chunk_len(n, chunk_count);
            dst.par_chunks_mut(chunk_size)
                .enumerate()
                .for_each(|(idx, chunk)| op(idx * chunk_size, chunk));
        }
        #[cfg(not(feature = "rayon"))]
        {
            op(0, dst);
        }
    }
    implementation(dst, &op, parallelism);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_chunk_len() {
        assert_eq!(chunk_len(10, 3), 4);
        assert_eq!(chunk_len(9, 3), 3);
        assert_eq!(chunk_len(2, 8), 1);
        assert_eq!(chunk_len(0, 4), 1);
        assert_eq!(chunk_len(5, 0), 5);
    }

    #[test]
    fn test_sequential_degree() {
        assert_eq!(parallelism_degree(Parallelism::None), 1);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_rayon_degree() {
        assert_eq!(parallelism_degree(Parallelism::Rayon(3)), 3);
        assert_eq!(
            parallelism_degree(Parallelism::Rayon(0)),
            rayon::current_num_threads(),
        );
    }

    fn check_cover(n: usize, parallelism: Parallelism) {
        let mut dst = vec![usize::MAX; n];
        let calls = AtomicUsize::new(0);
        for_each_chunk_mut(
            &mut dst,
            |offset, chunk| {
                calls.fetch_add(1, Ordering::Relaxed);
                for (idx, x) in chunk.iter_mut().enumerate() {
                    assert_eq!(*x, usize::MAX);
                    *x = offset + idx;
                }
            },
            parallelism,
        );
        for (idx, x) in dst.iter().enumerate() {
            assert_eq!(*x, idx);
        }
        assert!(calls.load(Ordering::Relaxed) <= Ord::max(n, 1));
    }

    #[test]
    fn test_cover_sequential() {
        for n in 0..17 {
            check_cover(n, Parallelism::None);
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_cover_rayon() {
        for n in 0..17 {
            for n_threads in [0, 1, 2, 3, 8, 64] {
                check_cover(n, Parallelism::Rayon(n_threads));
            }
        }
    }
}
