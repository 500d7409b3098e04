use criterion::{Criterion, black_box, criterion_group, criterion_main};

use backprop_mlp::{Matrix, Network};

fn batch(rows: usize, cols: usize) -> Matrix {
    let data = (0..rows * cols)
        .map(|i| ((i % 17) as f64 - 8.0) / 8.0)
        .collect();
    Matrix::from_flat(data, cols).unwrap()
}

fn network_forward_bench(c: &mut Criterion) {
    let mut net = Network::new_with_seed(64, &[128, 128, 10], 0).unwrap();
    let x = batch(200, 64);

    c.bench_function("network_forward_b200_64_128_128_10", |b| {
        b.iter(|| {
            let out = net.forward(black_box(&x)).unwrap();
            black_box(out);
        })
    });
}

fn network_update_bench(c: &mut Criterion) {
    let mut net = Network::new_with_seed(64, &[128, 128, 10], 0).unwrap();
    let x = batch(200, 64);
    let y: Vec<usize> = (0..200).map(|i| i % 10).collect();

    c.bench_function("network_update_b200_64_128_128_10", |b| {
        b.iter(|| {
            let report = net.update(black_box(&x), black_box(&y), 1e-3).unwrap();
            black_box(report);
        })
    });
}

criterion_group!(benches, network_forward_bench, network_update_bench);
criterion_main!(benches);
