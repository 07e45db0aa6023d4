use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use flatrec::{formats::Bed, open_as, Config, Parser};
use rand::{rngs::SmallRng, Rng, SeedableRng};

// Random BED6 text with a track line up front
fn create_test_data(record_count: usize) -> Vec<u8> {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut text = String::from("track name=bench description=\"random features\"\n");
    for i in 0..record_count {
        let chrom = rng.random_range(1..=22);
        let start: u64 = rng.random_range(0..250_000_000);
        let len: u64 = rng.random_range(1..10_000);
        let strand = if rng.random_bool(0.5) { '+' } else { '-' };
        text.push_str(&format!(
            "chr{chrom}\t{start}\t{}\tfeat{i}\t{}\t{strand}\n",
            start + len,
            rng.random_range(0..1000)
        ));
    }
    text.into_bytes()
}

fn bench_io(c: &mut Criterion) {
    let mut group = c.benchmark_group("io");
    let num_records = 100_000;
    let data = create_test_data(num_records);
    group.throughput(Throughput::Bytes(data.len() as u64));

    // engine with a concrete plugin
    group.bench_function("bed_advance", |b| {
        b.iter(|| {
            let mut parser = Parser::open(Bed::new(data.clone()), Config::default()).unwrap();
            let mut count = 0;
            while parser.advance().unwrap() {
                black_box(parser.record());
                count += 1;
            }
            assert_eq!(count, num_records);
        });
    });

    // dispatch through the identifier lookup and iterator
    group.bench_function("bed_iter_dispatch", |b| {
        b.iter(|| {
            let parser = open_as("bed", data.clone(), Config::default().parse_metadata(false)).unwrap();
            let records = parser.collect::<flatrec::Result<Vec<_>>>().unwrap();
            assert_eq!(records.len(), num_records);
            black_box(records)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_io);
criterion_main!(benches);
