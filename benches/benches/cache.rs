use std::time::Duration;

use admkit_audio::{CacheConfig, FrameBounds, WindowedBlockCache};
use admkit_tests::ramp_source;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const RATE: u32 = 48_000;
const CHANNELS: usize = 16;
const BLOCK: usize = 512;
const SECONDS: usize = 10;

fn cache_requests(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    group.measurement_time(Duration::from_secs(10));
    let selectors: Vec<i32> = (0..CHANNELS as i32).collect();
    let mut out = vec![0.0f32; BLOCK * CHANNELS];

    group.bench_function("sequential_16ch_block512", |b| {
        let source = ramp_source(RATE, CHANNELS, RATE as usize * SECONDS);
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), source);
        let mut start = 0i64;
        b.iter(|| {
            cache
                .read_block_into(start, BLOCK, &selectors, FrameBounds::unbounded(), &mut out)
                .expect("read block");
            start = (start + BLOCK as i64) % (RATE as i64 * (SECONDS as i64 - 1));
            black_box(&out);
        });
    });

    group.bench_function("scattered_16ch_block512", |b| {
        let source = ramp_source(RATE, CHANNELS, RATE as usize * SECONDS);
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), source);
        let mut start = 0i64;
        b.iter(|| {
            // Jumps further than the look-ahead, so every request refills.
            cache
                .read_block_into(start, BLOCK, &selectors, FrameBounds::unbounded(), &mut out)
                .expect("read block");
            start = (start + RATE as i64 * 2) % (RATE as i64 * (SECONDS as i64 - 1));
            black_box(&out);
        });
    });

    group.finish();
}

criterion_group!(benches, cache_requests);
criterion_main!(benches);
