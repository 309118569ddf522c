//! Performance benchmarks for the note store.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deaddrop::{NoteStore, NoteStoreConfig};
use tempfile::TempDir;

fn create_store(dir: &TempDir) -> NoteStore {
    NoteStore::create(NoteStoreConfig {
        path: dir.path().join("storage"),
        ..Default::default()
    })
    .unwrap()
}

/// Benchmark note creation (counter commit + two synced records)
fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");

    for body_size in [16usize, 1024, 4096] {
        group.bench_with_input(
            BenchmarkId::new("body_bytes", body_size),
            &body_size,
            |b, &size| {
                let dir = TempDir::new().unwrap();
                let store = create_store(&dir);
                let body = vec![0xabu8; size];

                b.iter(|| {
                    black_box(store.create_note("bench", &body, false).unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark directory-scan listing as the note count grows
fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("list");
    group.sample_size(20);

    for note_count in [10usize, 100, 500] {
        group.bench_with_input(
            BenchmarkId::new("notes", note_count),
            &note_count,
            |b, &count| {
                let dir = TempDir::new().unwrap();
                let store = create_store(&dir);
                for i in 0..count {
                    store
                        .create_note(&format!("note {}", i), b"body", false)
                        .unwrap();
                }

                b.iter(|| {
                    black_box(store.list_notes(usize::MAX).unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark reading a single note
fn bench_read(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = create_store(&dir);
    let id = store.create_note("read me", &[1u8; 4096], true).unwrap();

    c.bench_function("read_note", |b| {
        b.iter(|| {
            black_box(store.read_note(id).unwrap());
        });
    });
}

criterion_group!(benches, bench_create, bench_list, bench_read);
criterion_main!(benches);
