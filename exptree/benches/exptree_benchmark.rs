use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exptree::Tree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn bench_put<const N: usize>(c: &mut Criterion, id: &str) {
    let mut group = c.benchmark_group(format!("Put - {id}"));
    group.sample_size(if N >= 100_000 { 10 } else { 50 });

    group.bench_function("sequential_insert", |b| {
        b.iter(|| {
            let mut t = Tree::<i64, i64>::new();
            for i in 0..N as i64 {
                black_box(t.put(i, i).unwrap());
            }
            black_box(t.bytes_used());
        });
    });

    group.bench_function("random_insert", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        let keys: Vec<i64> = (0..N).map(|_| rng.gen()).collect();
        b.iter(|| {
            let mut t = Tree::<i64, i64>::new();
            for &k in &keys {
                black_box(t.put(k, k).unwrap());
            }
            black_box(t.bytes_used());
        });
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("Get - warm tree");
    group.sample_size(50);

    const N: usize = 10_000;
    let mut t = Tree::<i64, i64>::new();
    for i in 0..N as i64 {
        t.put(i, i).unwrap();
    }

    group.bench_function("point_lookup_hit", |b| {
        b.iter(|| {
            for i in 0..N as i64 {
                black_box(t.get(&i));
            }
        });
    });

    group.bench_function("point_lookup_miss", |b| {
        b.iter(|| {
            for i in N as i64..(2 * N as i64) {
                black_box(t.get(&i));
            }
        });
    });

    group.finish();
}

fn exptree_benchmarks(c: &mut Criterion) {
    bench_put::<1_000>(c, "1k");
    bench_put::<10_000>(c, "10k");
    bench_put::<100_000>(c, "100k");
    bench_get(c);
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(std::time::Duration::from_secs(10));
    targets = exptree_benchmarks
}
criterion_main!(benches);
