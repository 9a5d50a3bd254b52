//! Throughput Benchmark for lindafs
//!
//! Measures the engine's filesystem transactions under various workloads.
//! Every operation here pays for real syscalls (directory scan, create,
//! rename, unlink), so numbers track the backing filesystem as much as the
//! engine.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lindafs::{OutOptions, ReadMode, SpaceConfig, TupleSpace};

fn bench_out(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let space = TupleSpace::open(SpaceConfig::at(dir.path())).unwrap();

    let mut group = c.benchmark_group("out");
    group.throughput(Throughput::Elements(1));

    group.bench_function("out_small", |b| {
        let payload = Bytes::from("small_value");
        b.iter(|| {
            space.out("bench", payload.clone()).unwrap();
        });
    });

    group.bench_function("out_medium", |b| {
        let payload = Bytes::from(vec![b'x'; 1024]); // 1KB payload
        b.iter(|| {
            space.out("bench", payload.clone()).unwrap();
        });
    });

    group.bench_function("out_replacing", |b| {
        let payload = Bytes::from("slot_value");
        let rep = OutOptions {
            replace: true,
            ..Default::default()
        };
        b.iter(|| {
            space.out_with("slot", payload.clone(), rep).unwrap();
        });
    });

    group.finish();
}

fn bench_out_sequenced(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let space = TupleSpace::open(SpaceConfig::at(dir.path())).unwrap();

    let mut group = c.benchmark_group("out_seq");
    group.throughput(Throughput::Elements(1));

    // Each publication pays for one lock acquisition and a counter rewrite.
    group.bench_function("out_sequenced", |b| {
        let payload = Bytes::from("queued");
        let seq = OutOptions {
            sequenced: true,
            ..Default::default()
        };
        b.iter(|| {
            space.out_with("queue", payload.clone(), seq).unwrap();
        });
    });

    group.finish();
}

fn bench_rd(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let space = TupleSpace::open(SpaceConfig::at(dir.path())).unwrap();

    // Pre-populate with tuples under several names
    for i in 0..100 {
        space
            .out(&format!("item{i}"), Bytes::from(format!("value{i}")))
            .unwrap();
    }

    let mut group = c.benchmark_group("rd");
    group.throughput(Throughput::Elements(1));

    group.bench_function("rd_existing", |b| {
        b.iter(|| {
            black_box(space.rd("item50", ReadMode::Once).unwrap());
        });
    });

    group.bench_function("rd_missing", |b| {
        b.iter(|| {
            black_box(space.rd("absent", ReadMode::Once).is_err());
        });
    });

    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let space = TupleSpace::open(SpaceConfig::at(dir.path())).unwrap();

    let mut group = c.benchmark_group("roundtrip");
    group.throughput(Throughput::Elements(1));

    group.bench_function("out_then_inp", |b| {
        let payload = Bytes::from("job payload");
        b.iter(|| {
            space.out("job", payload.clone()).unwrap();
            black_box(space.inp("job", ReadMode::Once).unwrap());
        });
    });

    group.finish();
}

fn bench_ls(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let space = TupleSpace::open(SpaceConfig::at(dir.path())).unwrap();

    // Pre-populate with several logical names
    for i in 0..500 {
        space
            .out(&format!("name{}", i % 20), Bytes::from("payload"))
            .unwrap();
    }

    let mut group = c.benchmark_group("ls");

    group.bench_function("ls_all", |b| {
        b.iter(|| {
            black_box(space.ls("").unwrap());
        });
    });

    group.bench_function("ls_prefix", |b| {
        b.iter(|| {
            black_box(space.ls("name1*").unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_out,
    bench_out_sequenced,
    bench_rd,
    bench_roundtrip,
    bench_ls,
);

criterion_main!(benches);
