//! Audio access for ADM renderers
//! ==============================
//! [`WindowedBlockCache`] serves frame-range requests for arbitrary channel
//! selections out of one padded window, so neighbouring requests do not touch
//! the underlying [`SampleSource`] again.

pub mod cache;
pub mod config;
pub mod decode;
pub mod error;
pub mod source;
pub mod wav;

pub use cache::{CacheStats, FrameBounds, WindowedBlockCache};
pub use config::CacheConfig;
pub use decode::{decode_reader, decode_to_memory, open_source};
pub use error::AudioError;
pub use source::{MemorySource, SampleSource};
pub use wav::WavSource;

/// Replays a byte string as a sequence of cache requests against a small
/// in-memory source.
#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_cache_requests(data: &[u8]) {
    let frames = usize::from(data.first().copied().unwrap_or(0));
    let samples = (0..frames * 2).map(|index| index as f32).collect();
    let source = MemorySource::new(100, 2, samples);
    let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), source);

    for request in data.get(1..).unwrap_or_default().chunks_exact(5) {
        let start = i64::from(i16::from_le_bytes([request[0], request[1]]));
        let count = usize::from(request[2] % 64);
        let selectors = [i32::from(request[3] as i8 % 4), 0];
        let bounds = FrameBounds::new(i64::from(request[4] as i8), i64::from(request[4]) * 2);
        if let Ok(out) = cache.read_block(start, count, &selectors, bounds) {
            assert_eq!(out.len(), count * selectors.len());
        }
    }
}
