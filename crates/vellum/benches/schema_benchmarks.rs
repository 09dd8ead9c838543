//! Ingestion pipeline benchmarks.
//!
//! Measures parsing, schema building and loading into the in-memory store.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vellum::{
    InMemoryStore, IngestConfig, IngestionOrchestrator, Parser, SchemaBuilder, UploadedFile,
    VectorizerPolicy,
};

/// Generate synthetic CSV data with the specified number of rows and columns.
fn generate_csv_data(rows: usize, cols: usize) -> String {
    let mut data = String::new();

    let header: Vec<String> = (0..cols).map(|i| format!("Column {}", i + 1)).collect();
    data.push_str(&header.join(","));
    data.push('\n');

    for row in 0..rows {
        let cells: Vec<String> = (0..cols)
            .map(|col| match col % 4 {
                0 => format!("SITE_{:06}", row),
                1 => format!("{:.2}", row as f64 * 1.5),
                2 if row % 7 == 0 => String::new(),
                2 => format!("{}", row % 1000),
                3 => format!("Region_{}", row % 10),
                _ => unreachable!(),
            })
            .collect();
        data.push_str(&cells.join(","));
        data.push('\n');
    }

    data
}

/// Benchmark parsing plus schema building.
fn bench_build_schema(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_schema");

    for rows in [100, 1_000, 10_000].iter() {
        let file = UploadedFile::new("sites.csv", generate_csv_data(*rows, 10));

        group.throughput(Throughput::Bytes(file.bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &file, |b, file| {
            let parser = Parser::new();
            let builder = SchemaBuilder::new();
            b.iter(|| {
                let (table, _) = parser.parse(file).unwrap();
                black_box(builder.build("sites", &table).unwrap())
            })
        });
    }

    group.finish();
}

/// Benchmark a full ingestion run into the in-memory store.
fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for files in [1, 4, 16].iter() {
        let batch: Vec<UploadedFile> = (0..*files)
            .map(|i| UploadedFile::new(format!("file_{}.csv", i), generate_csv_data(1_000, 8)))
            .collect();

        for parallel in [false, true] {
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, files), &batch, |b, batch| {
                b.iter(|| {
                    let store = Arc::new(InMemoryStore::new());
                    let config = IngestConfig {
                        parallel,
                        ..Default::default()
                    };
                    let orchestrator =
                        IngestionOrchestrator::new(store, VectorizerPolicy::default(), config);
                    black_box(orchestrator.ingest(batch).unwrap())
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_build_schema, bench_ingest);
criterion_main!(benches);
