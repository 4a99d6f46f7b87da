//! CRDT hot paths: local edit application and remote merge throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use agrama_crdt::{CollabDocument, LocalEdit};

fn bench_local_edits(c: &mut Criterion) {
    c.bench_function("apply_local_insert_1k", |b| {
        b.iter(|| {
            let mut doc = CollabDocument::new("bench.txt", "");
            for i in 0..1_000 {
                doc.apply_local(
                    "agent-1",
                    LocalEdit::Insert {
                        offset: i,
                        text: "x".into(),
                    },
                )
                .unwrap();
            }
            black_box(doc.snapshot().0.len())
        })
    });
}

fn bench_merge_remote(c: &mut Criterion) {
    // Pre-generate one agent's op stream, then measure replay.
    let mut source = CollabDocument::new("bench.txt", "");
    let ops: Vec<_> = (0..1_000)
        .map(|i| {
            source
                .apply_local(
                    "agent-1",
                    LocalEdit::Insert {
                        offset: i,
                        text: "y".into(),
                    },
                )
                .unwrap()
        })
        .collect();

    c.bench_function("merge_remote_1k", |b| {
        b.iter(|| {
            let mut replica = CollabDocument::new("bench.txt", "");
            for op in &ops {
                replica.merge_remote(op.clone()).unwrap();
            }
            black_box(replica.snapshot().0.len())
        })
    });
}

criterion_group!(benches, bench_local_edits, bench_merge_remote);
criterion_main!(benches);
