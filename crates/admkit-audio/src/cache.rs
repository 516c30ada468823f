//! Windowed block cache.
//!
//! One window of interleaved frames is kept around the most recent request,
//! padded by the configured look-behind and look-ahead. A request falling
//! inside the window is served from memory; anything else refills the window
//! with one seek and one contiguous read. Frames outside the source are
//! silence, and callers can clamp the audible range further with
//! [`FrameBounds`].

use std::ops::Range;

use serde::Serialize;

use crate::config::CacheConfig;
use crate::error::{AudioError, Result};
use crate::source::SampleSource;

/// Inclusive range of absolute frames allowed to carry audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    pub lower: i64,
    pub upper: i64,
}

impl FrameBounds {
    pub const fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    /// Everything from frame 0 onward.
    pub const fn unbounded() -> Self {
        Self::new(0, i64::MAX)
    }

    pub fn contains(&self, frame: i64) -> bool {
        self.lower <= frame && frame <= self.upper
    }
}

impl Default for FrameBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: i64,
    frames: usize,
}

impl Window {
    fn end(&self) -> i64 {
        self.start + self.frames as i64
    }

    fn covers(&self, start: i64, end: i64) -> bool {
        self.start <= start && end <= self.end()
    }
}

pub struct WindowedBlockCache<S = Box<dyn SampleSource + Send>> {
    config: CacheConfig,
    source: Option<S>,
    buffer: Vec<f32>,
    window: Option<Window>,
    stats: CacheStats,
}

impl<S: SampleSource> WindowedBlockCache<S> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            source: None,
            buffer: Vec::new(),
            window: None,
            stats: CacheStats::default(),
        }
    }

    pub fn with_source(config: CacheConfig, source: S) -> Self {
        let mut cache = Self::new(config);
        cache.source = Some(source);
        cache
    }

    /// Replaces the source, returning the previous one. The cached window is
    /// dropped.
    pub fn attach(&mut self, source: S) -> Option<S> {
        self.window = None;
        self.source.replace(source)
    }

    pub fn detach(&mut self) -> Option<S> {
        self.window = None;
        self.source.take()
    }

    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Absolute frames currently held.
    pub fn cached_range(&self) -> Option<Range<i64>> {
        self.window.map(|window| window.start..window.end())
    }

    /// Allocating form of [`read_block_into`](Self::read_block_into).
    pub fn read_block(
        &mut self,
        start: i64,
        frames: usize,
        selectors: &[i32],
        bounds: FrameBounds,
    ) -> Result<Vec<f32>> {
        let mut out = vec![0.0; frames * selectors.len()];
        self.read_block_into(start, frames, selectors, bounds, &mut out)?;
        Ok(out)
    }

    /// Writes `frames` frames starting at absolute frame `start` into `out`,
    /// frame-major with one sample per selector in the order given. Samples
    /// outside `bounds`, outside the source, or for selectors naming no
    /// channel are 0.0.
    pub fn read_block_into(
        &mut self,
        start: i64,
        frames: usize,
        selectors: &[i32],
        bounds: FrameBounds,
        out: &mut [f32],
    ) -> Result<()> {
        if self.source.is_none() {
            return Err(AudioError::NoSource);
        }
        let required = frames * selectors.len();
        if out.len() < required {
            return Err(AudioError::OutputTooShort {
                required,
                available: out.len(),
            });
        }
        if required == 0 {
            return Ok(());
        }
        let end = i64::try_from(frames)
            .ok()
            .and_then(|count| start.checked_add(count))
            .ok_or(AudioError::FrameOverflow { start, frames })?;

        let window = match self.window {
            Some(window) if window.covers(start, end) => {
                self.stats.hits += 1;
                tracing::trace!(start, frames, hits = self.stats.hits, "cache hit");
                window
            }
            _ => {
                self.stats.misses += 1;
                let window = self.refill(start, end)?;
                tracing::trace!(
                    start,
                    frames,
                    window_start = window.start,
                    window_frames = window.frames,
                    misses = self.stats.misses,
                    "cache refilled"
                );
                window
            }
        };

        let channels = self.source.as_ref().map_or(0, |source| source.channel_count());
        for (offset, row) in out[..required].chunks_exact_mut(selectors.len()).enumerate() {
            let frame = start + offset as i64;
            let base = (frame - window.start) as usize * channels;
            let audible = bounds.contains(frame);
            for (sample, &selector) in row.iter_mut().zip(selectors) {
                *sample = match usize::try_from(selector) {
                    Ok(channel) if audible && channel < channels => self.buffer[base + channel],
                    _ => 0.0,
                };
            }
        }
        Ok(())
    }

    /// Loads the window around `[start, end)`. Frames the source cannot
    /// provide are zeroed.
    fn refill(&mut self, start: i64, end: i64) -> Result<Window> {
        self.window = None;
        let Some(source) = self.source.as_mut() else {
            return Err(AudioError::NoSource);
        };

        self.config.validate()?;
        let rate = source.sample_rate();
        let too_large = || AudioError::WindowTooLarge { start };
        let window_start = start
            .checked_sub(self.config.look_behind_frames(rate))
            .ok_or_else(too_large)?;
        let window_end = start
            .checked_add(self.config.look_ahead_frames(rate))
            .ok_or_else(too_large)?
            .max(end);
        let frames = window_end
            .checked_sub(window_start)
            .and_then(|frames| usize::try_from(frames).ok())
            .ok_or_else(too_large)?;
        let window = Window {
            start: window_start,
            frames,
        };

        let channels = source.channel_count();
        let needed = frames.checked_mul(channels).ok_or_else(too_large)?;
        if self.buffer.len() < needed {
            self.buffer.resize(needed, 0.0);
        }
        let buffer = &mut self.buffer[..needed];

        let total = i64::try_from(source.total_frames()).unwrap_or(i64::MAX);
        let read_start = window_start.max(0).min(window_end);
        let read_end = window_end.min(total).max(read_start);
        let head = (read_start - window_start) as usize * channels;
        let tail = (read_end - window_start) as usize * channels;
        buffer[..head].fill(0.0);

        let mut filled = head;
        if read_end > read_start {
            let count = (read_end - read_start) as usize;
            source.seek(read_start as u64)?;
            let read = source.read_interleaved(&mut buffer[head..tail], count)?;
            if read < count {
                tracing::warn!(expected = count, read, "short read from audio source");
            }
            filled = head + read * channels;
        }
        buffer[filled..].fill(0.0);

        self.window = Some(window);
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn ramp(frames: usize, channels: usize) -> MemorySource {
        let samples = (0..frames * channels)
            .map(|index| {
                let (frame, channel) = (index / channels, index % channels);
                frame as f32 + channel as f32 * 1000.0
            })
            .collect();
        MemorySource::new(48_000, channels, samples)
    }

    #[test]
    fn requires_a_source() {
        let mut cache: WindowedBlockCache<MemorySource> =
            WindowedBlockCache::new(CacheConfig::default());
        let err = cache
            .read_block(0, 4, &[0], FrameBounds::unbounded())
            .unwrap_err();
        assert!(matches!(err, AudioError::NoSource));
    }

    #[test]
    fn concrete_hundred_frame_scenario() {
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), ramp(100, 1));
        let first = cache
            .read_block(50, 10, &[0], FrameBounds::new(0, 99))
            .unwrap();
        assert_eq!(first, (50..60).map(|f| f as f32).collect::<Vec<_>>());
        assert_eq!(cache.cached_range(), Some(-9_550..48_050));

        let second = cache
            .read_block(55, 5, &[0], FrameBounds::new(0, 99))
            .unwrap();
        assert_eq!(second, (55..60).map(|f| f as f32).collect::<Vec<_>>());

        let source = cache.source().unwrap();
        assert_eq!((source.seek_count(), source.read_count()), (1, 1));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn pads_outside_the_source_with_silence() {
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), ramp(10, 2));
        let out = cache
            .read_block(-2, 4, &[1, 0], FrameBounds::new(i64::MIN, i64::MAX))
            .unwrap();
        assert_eq!(out, vec![0.0, 0.0, 0.0, 0.0, 1000.0, 0.0, 1001.0, 1.0]);

        let out = cache
            .read_block(9, 3, &[0], FrameBounds::new(i64::MIN, i64::MAX))
            .unwrap();
        assert_eq!(out, vec![9.0, 0.0, 0.0]);
    }

    #[test]
    fn selectors_repeat_and_out_of_range_are_silent() {
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), ramp(8, 2));
        let out = cache
            .read_block(3, 1, &[1, 1, -1, 2, 0], FrameBounds::unbounded())
            .unwrap();
        assert_eq!(out, vec![1003.0, 1003.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn bounds_clamp_to_a_single_frame() {
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), ramp(20, 1));
        let out = cache
            .read_block(4, 6, &[0], FrameBounds::new(7, 7))
            .unwrap();
        assert_eq!(out, vec![0.0, 0.0, 0.0, 7.0, 0.0, 0.0]);
    }

    #[test]
    fn attaching_drops_the_window() {
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), ramp(20, 1));
        cache.read_block(0, 4, &[0], FrameBounds::unbounded()).unwrap();
        assert!(cache.cached_range().is_some());

        let previous = cache.attach(ramp(5, 1));
        assert_eq!(previous.map(|source| source.read_count()), Some(1));
        assert!(cache.cached_range().is_none());
        let out = cache.read_block(3, 3, &[0], FrameBounds::unbounded()).unwrap();
        assert_eq!(out, vec![3.0, 4.0, 0.0]);

        assert!(cache.detach().is_some());
        assert!(cache.read_block(0, 1, &[0], FrameBounds::unbounded()).is_err());
    }

    #[test]
    fn short_output_is_rejected() {
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), ramp(20, 1));
        let mut out = [0.0; 3];
        let err = cache
            .read_block_into(0, 2, &[0, 0], FrameBounds::unbounded(), &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            AudioError::OutputTooShort {
                required: 4,
                available: 3
            }
        ));
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn windows_entirely_outside_the_source_read_nothing() {
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), ramp(10, 1));
        let out = cache
            .read_block(-60_000, 4, &[0], FrameBounds::new(i64::MIN, i64::MAX))
            .unwrap();
        assert_eq!(out, vec![0.0; 4]);
        let out = cache
            .read_block(60_000, 2, &[0], FrameBounds::unbounded())
            .unwrap();
        assert_eq!(out, vec![0.0; 2]);
        assert_eq!(cache.source().unwrap().read_count(), 0);
    }

    #[test]
    fn oversized_margins_fail_instead_of_allocating() {
        let config = CacheConfig {
            look_behind_seconds: 1e30,
            look_ahead_seconds: 1.0,
        };
        let mut cache = WindowedBlockCache::with_source(config, ramp(100, 1));
        let mut out = [1.0; 4];
        let err = cache
            .read_block_into(0, 4, &[0], FrameBounds::unbounded(), &mut out)
            .unwrap_err();
        assert!(matches!(err, AudioError::InvalidMargin { .. }));
        assert_eq!(out, [1.0; 4]);
        assert!(cache.cached_range().is_none());
        assert_eq!(cache.source().unwrap().read_count(), 0);
    }

    #[test]
    fn windows_near_the_frame_limit_are_rejected() {
        let mut cache = WindowedBlockCache::with_source(CacheConfig::default(), ramp(10, 1));
        let err = cache
            .read_block(i64::MIN + 5, 2, &[0], FrameBounds::unbounded())
            .unwrap_err();
        assert!(matches!(err, AudioError::WindowTooLarge { .. }));
        let err = cache
            .read_block(i64::MAX - 10, 2, &[0], FrameBounds::unbounded())
            .unwrap_err();
        assert!(matches!(err, AudioError::WindowTooLarge { .. }));
    }

    #[test]
    fn requests_past_the_window_refill() {
        let config = CacheConfig {
            look_behind_seconds: 0.0,
            look_ahead_seconds: 0.0,
        };
        let mut cache = WindowedBlockCache::with_source(config, ramp(100, 1));
        cache.read_block(0, 10, &[0], FrameBounds::unbounded()).unwrap();
        cache.read_block(5, 10, &[0], FrameBounds::unbounded()).unwrap();
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
        assert_eq!(cache.source().unwrap().seek_count(), 2);
    }
}
