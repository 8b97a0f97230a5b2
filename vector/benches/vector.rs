use criterion::{black_box, criterion_group, criterion_main, Criterion};
use steady_vector::Vector;

const LEN: usize = 10000;

pub fn collect(c: &mut Criterion) {
    let input = vec![0; LEN];
    let mut group = c.benchmark_group("collect");

    group.bench_function("ours 10000, N=8", |b| {
        b.iter(|| black_box(input.iter().copied().collect::<Vector<i32, 8>>()))
    });

    group.bench_function("ours 10000, N=32", |b| {
        b.iter(|| black_box(input.iter().copied().collect::<Vector<i32, 32>>()))
    });

    group.bench_function("ours 10000, N=64", |b| {
        b.iter(|| black_box(input.iter().copied().collect::<Vector<i32, 64>>()))
    });

    group.bench_function("rpds 10000", |b| {
        b.iter(|| black_box(input.iter().copied().collect::<rpds::Vector<i32>>()))
    });
}

pub fn count(c: &mut Criterion) {
    let input = vec![0; LEN];
    let vec8: Vector<u32, 8> = input.iter().copied().collect();
    let vec32: Vector<u32, 32> = input.iter().copied().collect();
    let vec64: Vector<u32, 64> = input.iter().copied().collect();
    let rpds: rpds::Vector<u32> = input.iter().copied().collect();
    let mut group = c.benchmark_group("iter");

    group.bench_function("ours 10000, N=8", |b| {
        b.iter(|| black_box(vec8.iter().count()));
    });

    group.bench_function("ours 10000, N=32", |b| {
        b.iter(|| black_box(vec32.iter().count()));
    });

    group.bench_function("ours 10000, N=64", |b| {
        b.iter(|| black_box(vec64.iter().count()));
    });

    group.bench_function("ours leaves 10000, N=32", |b| {
        b.iter(|| black_box(vec32.leaves().map(<[u32]>::len).sum::<usize>()));
    });

    group.bench_function("rpds 10000", |b| {
        b.iter(|| black_box(rpds.iter().count()));
    });
}

pub fn get(c: &mut Criterion) {
    let input = vec![0; LEN];
    let vec8: Vector<u32, 8> = input.iter().copied().collect();
    let vec32: Vector<u32, 32> = input.iter().copied().collect();
    let vec64: Vector<u32, 64> = input.iter().copied().collect();
    let rpds: rpds::Vector<u32> = input.iter().copied().collect();
    let mut group = c.benchmark_group("get");

    group.bench_function("ours 10000, N=8", |b| {
        b.iter(|| {
            for i in 0..LEN {
                black_box(vec8.get(i));
            }
        });
    });

    group.bench_function("ours 10000, N=32", |b| {
        b.iter(|| {
            for i in 0..LEN {
                black_box(vec32.get(i));
            }
        });
    });

    group.bench_function("ours 10000, N=64", |b| {
        b.iter(|| {
            for i in 0..LEN {
                black_box(vec64.get(i));
            }
        });
    });

    group.bench_function("rpds 10000", |b| {
        b.iter(|| {
            for i in 0..LEN {
                black_box(rpds.get(i));
            }
        });
    });
}

pub fn push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_back");

    group.bench_function("ours 10000, N=8", |b| {
        b.iter(|| {
            let mut vec = Vector::<u32, 8>::new();
            for i in 0..LEN as u32 {
                vec = vec.push_back(i);
            }
            black_box(vec)
        });
    });

    group.bench_function("ours 10000, N=32", |b| {
        b.iter(|| {
            let mut vec = Vector::<u32, 32>::new();
            for i in 0..LEN as u32 {
                vec = vec.push_back(i);
            }
            black_box(vec)
        });
    });

    group.bench_function("ours batch 10000, N=32", |b| {
        b.iter(|| black_box(Vector::<u32, 32>::new().append_batch(0..LEN as u32)));
    });

    group.bench_function("rpds 10000", |b| {
        b.iter(|| {
            let mut vec = rpds::Vector::<u32>::new();
            for i in 0..LEN as u32 {
                vec = vec.push_back(i);
            }
            black_box(vec)
        });
    });
}

pub fn assoc(c: &mut Criterion) {
    let vec8: Vector<u32, 8> = (0..LEN as u32).collect();
    let vec32: Vector<u32, 32> = (0..LEN as u32).collect();
    let rpds: rpds::Vector<u32> = (0..LEN as u32).collect();
    let mut group = c.benchmark_group("assoc");

    group.bench_function("ours 10000, N=8", |b| {
        b.iter(|| {
            for i in (0..LEN).step_by(7) {
                black_box(vec8.assoc(i, 0));
            }
        });
    });

    group.bench_function("ours 10000, N=32", |b| {
        b.iter(|| {
            for i in (0..LEN).step_by(7) {
                black_box(vec32.assoc(i, 0));
            }
        });
    });

    group.bench_function("rpds 10000", |b| {
        b.iter(|| {
            for i in (0..LEN).step_by(7) {
                black_box(rpds.set(i, 0));
            }
        });
    });
}

pub fn concat(c: &mut Criterion) {
    let left: Vector<u32, 32> = (0..LEN as u32).collect();
    let right: Vector<u32, 32> = (0..LEN as u32).collect();
    let aligned: Vector<u32, 32> = (0..1024).collect();
    let mut group = c.benchmark_group("concat");

    group.bench_function("ours 10000 + 10000, N=32", |b| {
        b.iter(|| black_box(left.concat(&right)));
    });

    group.bench_function("ours aligned 1024 + 10000, N=32", |b| {
        b.iter(|| black_box(aligned.concat(&right)));
    });
}

criterion_group!(benches, collect, count, get, push_back, assoc, concat);
criterion_main!(benches);
