//! Benchmarks pour l'inférence de schéma

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geojson::Feature;
use geoschema::{infer_schema, InferenceOptions, NumericParsing};
use serde_json::json;

fn make_features(count: usize) -> Vec<Feature> {
    (0..count)
        .map(|i| {
            let properties = json!({
                "id": i,
                "code": format!("{:05}", i),
                "surface": i as f64 * 1.5,
                "label": if i % 7 == 0 { json!(null) } else { json!(format!("parcelle {}", i)) },
                "updated": "2024-01-15T10:00:00Z",
            });
            Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: properties.as_object().cloned(),
                foreign_members: None,
            }
        })
        .collect()
}

fn bench_infer(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_schema");

    for count in [1_000usize, 10_000] {
        let features = make_features(count);
        group.throughput(Throughput::Elements(count as u64));

        for (label, numbers) in [
            ("prefix", NumericParsing::LeadingPrefix),
            ("strict", NumericParsing::Strict),
        ] {
            let options = InferenceOptions {
                numbers,
                ..Default::default()
            };
            group.bench_with_input(
                BenchmarkId::new(label, count),
                &features,
                |b, features| {
                    b.iter(|| {
                        let schema = infer_schema(black_box(features), options).unwrap();
                        black_box(schema)
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_infer);
criterion_main!(benches);
