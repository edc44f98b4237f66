use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use equipment_datasets::ingestion::csv::parse_and_validate;
use equipment_datasets::processing::compute_summary;
use equipment_datasets::types::REQUIRED_COLUMNS;

const TYPES: [&str; 6] = ["Pump", "Valve", "Compressor", "Reactor", "Condenser", "HeatExchanger"];

fn synthetic_csv(rows: usize) -> String {
    let mut out = String::from("Equipment Name,Type,Flowrate,Pressure,Temperature\n");
    for i in 0..rows {
        let t = TYPES[i % TYPES.len()];
        out.push_str(&format!(
            "{t}-{i},{t},{:.1},{:.2},{:.1}\n",
            50.0 + (i % 100) as f64,
            3.0 + (i % 17) as f64 * 0.4,
            90.0 + (i % 40) as f64
        ));
    }
    out
}

fn bench_parse_and_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("upload");
    for rows in [100usize, 10_000] {
        let csv = synthetic_csv(rows);
        group.bench_with_input(BenchmarkId::new("parse_and_validate", rows), &csv, |b, csv| {
            b.iter(|| parse_and_validate(black_box(csv.as_bytes()), &REQUIRED_COLUMNS).unwrap())
        });

        let parsed = parse_and_validate(csv.as_bytes(), &REQUIRED_COLUMNS).unwrap();
        group.bench_with_input(BenchmarkId::new("compute_summary", rows), &parsed, |b, parsed| {
            b.iter(|| compute_summary(black_box(parsed)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_and_summarize);
criterion_main!(benches);
