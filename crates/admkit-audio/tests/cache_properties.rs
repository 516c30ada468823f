use admkit_audio::{CacheConfig, FrameBounds, MemorySource, WindowedBlockCache};
use proptest::prelude::*;

const RATE: u32 = 1_000;
const CHANNELS: usize = 3;

fn config() -> CacheConfig {
    CacheConfig {
        look_behind_seconds: 0.05,
        look_ahead_seconds: 0.2,
    }
}

fn source(frames: usize) -> MemorySource {
    let samples = (0..frames * CHANNELS).map(|index| index as f32 * 0.5 + 1.0).collect();
    MemorySource::new(RATE, CHANNELS, samples)
}

/// What a request should return, computed straight from the source.
fn expected(
    source: &MemorySource,
    start: i64,
    frames: usize,
    selectors: &[i32],
    bounds: FrameBounds,
) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames * selectors.len());
    for offset in 0..frames as i64 {
        let frame = start + offset;
        for &selector in selectors {
            let sample = if bounds.contains(frame) && frame >= 0 && selector >= 0 {
                source.sample(frame as u64, selector as usize).unwrap_or(0.0)
            } else {
                0.0
            };
            out.push(sample);
        }
    }
    out
}

proptest! {
    #[test]
    fn contained_requests_reuse_the_window(
        total in 1usize..400,
        first_start in -300i64..500,
        first_frames in 1usize..150,
        offset in 0i64..400,
        second_frames in 1usize..150,
        selectors in prop::collection::vec(-1i32..4, 1..5),
    ) {
        let reference = source(total);
        let mut cache = WindowedBlockCache::with_source(config(), source(total));
        let bounds = FrameBounds::new(i64::MIN, i64::MAX);
        cache.read_block(first_start, first_frames, &selectors, bounds).unwrap();
        let window = cache.cached_range().unwrap();
        let reads = cache.source().unwrap().read_count();

        let second_start = window.start + offset;
        prop_assume!(second_start + second_frames as i64 <= window.end);

        let out = cache.read_block(second_start, second_frames, &selectors, bounds).unwrap();
        prop_assert_eq!(cache.source().unwrap().read_count(), reads);
        prop_assert_eq!(cache.stats().hits, 1);
        prop_assert_eq!(out, expected(&reference, second_start, second_frames, &selectors, bounds));
    }

    #[test]
    fn any_request_matches_the_source(
        total in 0usize..300,
        requests in prop::collection::vec((-400i64..700, 0usize..120, -50i64..350, 0i64..400), 1..8),
        selectors in prop::collection::vec(-2i32..5, 1..4),
    ) {
        let reference = source(total);
        let mut cache = WindowedBlockCache::with_source(config(), source(total));
        for (start, frames, lower, span) in requests {
            let bounds = FrameBounds::new(lower, lower + span);
            let out = cache.read_block(start, frames, &selectors, bounds).unwrap();
            prop_assert_eq!(out, expected(&reference, start, frames, &selectors, bounds));
        }
    }
}
