use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use corelib::{HashRing, MembershipSnapshot, RingConfig};

fn cluster(n: usize) -> MembershipSnapshot {
    MembershipSnapshot::from_addresses((0..n).map(|i| format!("http://node-{i}:8080"))).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let config = RingConfig::default();
    let mut group = c.benchmark_group("ring_build");
    for nodes in [3usize, 10, 50] {
        let snapshot = cluster(nodes);
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &snapshot, |b, s| {
            b.iter(|| HashRing::from_snapshot(black_box(s), &config))
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let ring = HashRing::from_snapshot(&cluster(50), &RingConfig::default());
    let keys: Vec<String> = (0..1024).map(|i| format!("mac:{i:012x}")).collect();
    let mut i = 0usize;

    c.bench_function("ring_lookup_50_nodes", |b| {
        b.iter(|| {
            i = (i + 1) % keys.len();
            ring.lookup(black_box(keys[i].as_bytes())).ok()
        })
    });
}

criterion_group!(benches, bench_build, bench_lookup);
criterion_main!(benches);
