#![allow(non_snake_case)]

use diol::prelude::*;
use dyn_stack::{GlobalPodBuffer, PodStack};
use faer::{Mat, Parallelism, Side};
use faer_cholesky_grad::llt::compute::{cholesky_grad_in_place, cholesky_grad_req};
use rand::prelude::*;

fn random_spd(rng: &mut StdRng, n: usize) -> Mat<f64> {
    let A = Mat::from_fn(n, n, |_, _| rng.gen::<f64>());
    Mat::from_fn(n, n, |i, j| {
        let mut acc = if i == j { 1.0 } else { 0.0 };
        for k in 0..n {
            acc += A.read(k, i) * A.read(k, j);
        }
        acc
    })
}

fn bench_with(bencher: Bencher, n: usize, par: Parallelism) {
    let rng = &mut StdRng::seed_from_u64(0);
    let K = random_spd(rng, n);
    let L = K.cholesky(Side::Lower).unwrap().compute_l();
    let G = Mat::from_fn(n, n, |_, _| rng.gen::<f64>());

    let mut adjoint = G.clone();
    let mut mem = GlobalPodBuffer::new(cholesky_grad_req(n, par).unwrap());
    bencher.bench(|| {
        adjoint.copy_from(G.as_ref());
        cholesky_grad_in_place(
            adjoint.as_mut(),
            L.as_ref(),
            par,
            PodStack::new(&mut mem),
            Default::default(),
        )
        .unwrap();
    })
}

fn sequential(bencher: Bencher, PlotArg(n): PlotArg) {
    bench_with(bencher, n, Parallelism::None)
}

fn parallel(bencher: Bencher, PlotArg(n): PlotArg) {
    bench_with(bencher, n, Parallelism::Rayon(0))
}

fn main() -> std::io::Result<()> {
    let mut bench = Bench::new(BenchConfig::from_args()?);
    bench.register_many(
        list![sequential, parallel],
        [4, 8, 16, 32, 64, 128, 256, 512].map(PlotArg),
    );
    bench.run()?;

    Ok(())
}
