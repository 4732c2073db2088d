use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use oxmon::storage::{ArchiveStore, Fingerprint};
use oxmon::watch::{ScanLoop, WatchSettings};
use std::fs;
use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn populate(dir: &Path, count: usize) {
    for i in 0..count {
        let path = dir.join(format!("d{}/file_{i}.txt", i % 8));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("watched file number {i}")).unwrap();
    }
}

fn benchmark_fingerprint(c: &mut Criterion) {
    let small = vec![b'a'; 1024]; // 1KB
    let medium = vec![b'b'; 1024 * 100]; // 100KB
    let large = vec![b'c'; 1024 * 1024 * 10]; // 10MB

    let mut group = c.benchmark_group("fingerprint");

    group.bench_function("md5_1kb", |b| b.iter(|| Fingerprint::of(black_box(&small))));
    group.bench_function("md5_100kb", |b| {
        b.iter(|| Fingerprint::of(black_box(&medium)));
    });
    group.bench_function("md5_10mb", |b| {
        b.iter(|| Fingerprint::of(black_box(&large)));
    });

    group.finish();
}

fn benchmark_record(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = ArchiveStore::open(dir.path()).unwrap();
    let content = vec![b'x'; 4096];
    let fp = Fingerprint::of(&content);
    let observed = PathBuf::from("docs/notes.txt");

    let mut group = c.benchmark_group("archive_record");

    // The first call writes the blob; every later one only appends provenance.
    group.bench_function("ensure_and_record_existing", |b| {
        b.iter(|| store.ensure_and_record(black_box(fp), black_box(&content), &observed));
    });

    group.finish();
}

fn benchmark_scan_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_cycle");
    group.sample_size(20);

    for threads in &[1usize, 4] {
        let watch = tempdir().unwrap();
        let archive = tempdir().unwrap();
        populate(watch.path(), 200);

        let mut settings = WatchSettings::new(watch.path(), archive.path());
        settings.interval = Duration::ZERO;
        settings.threads = *threads;
        let mut scan = ScanLoop::new(settings).unwrap();

        group.bench_with_input(BenchmarkId::new("files_200", threads), threads, |b, _| {
            b.iter(|| scan.run_cycle());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_fingerprint,
    benchmark_record,
    benchmark_scan_cycle
);
criterion_main!(benches);
