//! Seekable multichannel sample sources.

use crate::error::{AudioError, Result};

/// Random access to interleaved `f32` frames.
pub trait SampleSource {
    fn sample_rate(&self) -> u32;
    fn total_frames(&self) -> u64;
    fn channel_count(&self) -> usize;

    /// Positions the read cursor at `frame`. Seeking to `total_frames()` is
    /// allowed.
    fn seek(&mut self, frame: u64) -> Result<()>;

    /// Reads up to `frames` frames into `out`, interleaved. Returns the
    /// number of whole frames read, which is lower than requested only at
    /// the end of the source.
    fn read_interleaved(&mut self, out: &mut [f32], frames: usize) -> Result<usize>;
}

impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn total_frames(&self) -> u64 {
        (**self).total_frames()
    }

    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }

    fn seek(&mut self, frame: u64) -> Result<()> {
        (**self).seek(frame)
    }

    fn read_interleaved(&mut self, out: &mut [f32], frames: usize) -> Result<usize> {
        (**self).read_interleaved(out, frames)
    }
}

/// Interleaved samples held in memory. Counts seeks and reads so callers can
/// check how often the backing store was touched.
#[derive(Debug, Clone)]
pub struct MemorySource {
    sample_rate: u32,
    channels: usize,
    samples: Vec<f32>,
    position: u64,
    seeks: usize,
    reads: usize,
}

impl MemorySource {
    /// `samples` is interleaved; a trailing partial frame is dropped.
    pub fn new(sample_rate: u32, channels: usize, mut samples: Vec<f32>) -> Self {
        let channels = channels.max(1);
        samples.truncate(samples.len() - samples.len() % channels);
        Self {
            sample_rate,
            channels,
            samples,
            position: 0,
            seeks: 0,
            reads: 0,
        }
    }

    /// Interleaves per-channel buffers, padding short channels with silence.
    pub fn from_channels(sample_rate: u32, channels: &[Vec<f32>]) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels.len());
        for frame in 0..frames {
            for channel in channels {
                samples.push(channel.get(frame).copied().unwrap_or(0.0));
            }
        }
        Self::new(sample_rate, channels.len(), samples)
    }

    pub fn seek_count(&self) -> usize {
        self.seeks
    }

    pub fn read_count(&self) -> usize {
        self.reads
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at an absolute frame, or `None` outside the source.
    pub fn sample(&self, frame: u64, channel: usize) -> Option<f32> {
        if channel >= self.channels {
            return None;
        }
        let index = usize::try_from(frame).ok()? * self.channels + channel;
        self.samples.get(index).copied()
    }
}

impl SampleSource for MemorySource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_frames(&self) -> u64 {
        (self.samples.len() / self.channels) as u64
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn seek(&mut self, frame: u64) -> Result<()> {
        let total = self.total_frames();
        if frame > total {
            return Err(AudioError::SeekOutOfRange { frame, total });
        }
        self.seeks += 1;
        self.position = frame;
        Ok(())
    }

    fn read_interleaved(&mut self, out: &mut [f32], frames: usize) -> Result<usize> {
        self.reads += 1;
        let remaining = (self.total_frames() - self.position) as usize;
        let frames = frames.min(remaining).min(out.len() / self.channels);
        let start = self.position as usize * self.channels;
        let len = frames * self.channels;
        out[..len].copy_from_slice(&self.samples[start..start + len]);
        self.position += frames as u64;
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaves_planar_channels() {
        let source = MemorySource::from_channels(48_000, &[vec![1.0, 2.0, 3.0], vec![-1.0, -2.0]]);
        assert_eq!(source.total_frames(), 3);
        assert_eq!(source.samples(), &[1.0, -1.0, 2.0, -2.0, 3.0, 0.0]);
        assert_eq!(source.sample(2, 0), Some(3.0));
        assert_eq!(source.sample(3, 0), None);
        assert_eq!(source.sample(0, 2), None);
    }

    #[test]
    fn reads_stop_at_the_end() {
        let mut source = MemorySource::new(8_000, 2, (0..10).map(|v| v as f32).collect());
        source.seek(3).unwrap();
        let mut out = [0.0; 8];
        assert_eq!(source.read_interleaved(&mut out, 4).unwrap(), 2);
        assert_eq!(&out[..4], &[6.0, 7.0, 8.0, 9.0]);
        assert_eq!((source.seek_count(), source.read_count()), (1, 1));
        assert!(source.seek(6).is_err());
    }

    #[test]
    fn boxed_sources_delegate() {
        let mut boxed: Box<dyn SampleSource + Send> =
            Box::new(MemorySource::new(44_100, 1, vec![0.5; 4]));
        assert_eq!(boxed.sample_rate(), 44_100);
        assert_eq!(boxed.total_frames(), 4);
        boxed.seek(1).unwrap();
        let mut out = [0.0; 4];
        assert_eq!(boxed.read_interleaved(&mut out, 4).unwrap(), 3);
    }
}
