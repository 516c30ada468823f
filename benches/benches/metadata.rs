use std::time::Duration;

use admkit_metadata::MetadataExtractor;
use admkit_tests::{object_block, SceneBuilder};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn scene(objects: u32, blocks: u64) -> SceneBuilder {
    let mut scene = SceneBuilder::new();
    for object in 0..objects {
        let timeline = (0..blocks)
            .map(|index| object_block(index * 20, 20, object as f64))
            .collect();
        scene.object(0x1001 + object, "Object", timeline);
    }
    let hoa_times: Vec<u64> = (0..blocks).map(|index| index * 40).collect();
    let channels: Vec<(i8, i8, &[u64])> = [(0, 0), (1, -1), (1, 0), (1, 1)]
        .into_iter()
        .map(|(order, degree)| (order, degree, hoa_times.as_slice()))
        .collect();
    scene.hoa(0x2001, "Room", &channels);
    scene
}

fn discovery_and_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("metadata");
    group.measurement_time(Duration::from_secs(10));
    let (document, table) = scene(64, 100).build();

    group.bench_function("discover_64_objects", |b| {
        b.iter(|| {
            let mut extractor = MetadataExtractor::new();
            black_box(extractor.discover(&document, &table));
        });
    });

    group.bench_function("stream_64_objects_100_blocks", |b| {
        b.iter(|| {
            let mut extractor = MetadataExtractor::new();
            extractor.discover(&document, &table);
            let mut sent = 0usize;
            while let Some(block) = extractor.next_block(&document) {
                black_box(&block);
                sent += 1;
            }
            black_box(sent);
        });
    });

    group.finish();
}

criterion_group!(benches, discovery_and_streaming);
criterion_main!(benches);
