use criterion::{Criterion, criterion_group, criterion_main};
use listpool::{Pool, PoolConfiguration};
use std::hint::black_box;
use std::io;

fn buffer_pool(min: usize, max: usize) -> Pool<Vec<u8>> {
    Pool::new(
        PoolConfiguration::new()
            .with_min_count(min)
            .with_max_count(max)
            .with_factory(|| Ok::<_, io::Error>(Vec::with_capacity(4096)))
            .with_destroy(|_| Ok::<_, io::Error>(())),
    )
    .unwrap()
}

fn bench_get_put(c: &mut Criterion) {
    let pool = buffer_pool(8, 8);

    c.bench_function("get_put", |b| {
        b.iter(|| {
            let buf = pool.get().unwrap();
            black_box(buf.capacity());
            pool.put(buf).unwrap();
        })
    });

    c.bench_function("get_guarded", |b| {
        b.iter(|| {
            let buf = pool.get_guarded().unwrap();
            black_box(buf.capacity());
        })
    });
}

fn bench_create_close(c: &mut Criterion) {
    let pool = buffer_pool(0, 1);

    c.bench_function("create_close", |b| {
        b.iter(|| {
            let buf = pool.get().unwrap();
            pool.close(buf).unwrap();
        })
    });
}

criterion_group!(benches, bench_get_put, bench_create_close);
criterion_main!(benches);
