use {
    criterion::{black_box, criterion_group, criterion_main, Criterion},
    std::{sync::Arc, thread},
    uid64::{Snowflake, StaticNodeId, SystemClock},
};

fn bench_new(c: &mut Criterion) {
    c.bench_function("bench_new", |b| {
        b.iter(|| {
            let node_id = 1;
            let _ = black_box(Snowflake::with_node_id(node_id).unwrap());
        });
    });
}

fn bench_builder(c: &mut Criterion) {
    c.bench_function("bench_builder", |b| {
        b.iter(|| {
            let epoch = 1_609_459_200_000; // 2021-01-01 00:00:00.000 UTC

            let _ = black_box(
                Snowflake::builder()
                    .with_clock(SystemClock::with_epoch(epoch).unwrap())
                    .with_node_id_provider(StaticNodeId(1))
                    .build()
                    .unwrap(),
            );
        });
    });
}

fn bench_next_id(c: &mut Criterion) {
    let snowflake = Snowflake::with_node_id(1).unwrap();
    c.bench_function("bench_next_id", |b| {
        b.iter(|| {
            let _ = black_box(snowflake.next_id().unwrap());
        });
    });
}

fn bench_next_id_contended(c: &mut Criterion) {
    const THREADS: usize = 4;
    const IDS_PER_THREAD: usize = 4_096;

    let snowflake = Arc::new(Snowflake::with_node_id(1).unwrap());
    c.bench_function("bench_next_id_contended", |b| {
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0 .. THREADS {
                    s.spawn(|| {
                        for _ in 0 .. IDS_PER_THREAD {
                            black_box(snowflake.next_id().unwrap());
                        }
                    });
                }
            });
        });
    });
}

criterion_group!(benches, bench_new, bench_builder, bench_next_id, bench_next_id_contended);
criterion_main!(benches);
