//! Streaming WAV source backed by `hound`.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec};

use crate::error::{AudioError, Result};
use crate::source::SampleSource;

/// Reads frames straight from a WAV stream on demand. Integer PCM is scaled
/// into `[-1.0, 1.0)`.
pub struct WavSource<R = BufReader<File>> {
    reader: WavReader<R>,
    spec: WavSpec,
    total_frames: u64,
}

impl WavSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_wav_reader(WavReader::open(path)?))
    }
}

impl<R: Read + Seek> WavSource<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        Ok(Self::from_wav_reader(WavReader::new(reader)?))
    }

    fn from_wav_reader(reader: WavReader<R>) -> Self {
        let spec = reader.spec();
        let total_frames = u64::from(reader.duration());
        Self {
            reader,
            spec,
            total_frames,
        }
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }
}

impl<R: Read + Seek> SampleSource for WavSource<R> {
    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn channel_count(&self) -> usize {
        usize::from(self.spec.channels)
    }

    fn seek(&mut self, frame: u64) -> Result<()> {
        if frame > self.total_frames {
            return Err(AudioError::SeekOutOfRange {
                frame,
                total: self.total_frames,
            });
        }
        // bounded by total_frames, which came from a u32
        self.reader.seek(frame as u32)?;
        Ok(())
    }

    fn read_interleaved(&mut self, out: &mut [f32], frames: usize) -> Result<usize> {
        let channels = self.channel_count().max(1);
        let wanted = frames.min(out.len() / channels) * channels;
        let mut written = 0;
        match self.spec.sample_format {
            SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(wanted) {
                    out[written] = sample?;
                    written += 1;
                }
            }
            SampleFormat::Int => {
                let bits = u32::from(self.spec.bits_per_sample.clamp(1, 32));
                let scale = 1.0 / (1u64 << (bits - 1)) as f32;
                for sample in self.reader.samples::<i32>().take(wanted) {
                    out[written] = sample? as f32 * scale;
                    written += 1;
                }
            }
        }
        Ok(written / channels)
    }
}
