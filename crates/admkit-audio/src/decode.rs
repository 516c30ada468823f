//! Opening audio files as sample sources.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Channels, SampleBuffer, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{AudioError, Result};
use crate::source::{MemorySource, SampleSource};
use crate::wav::WavSource;

/// Opens `path` as a boxed source. WAV files are streamed; anything else is
/// decoded into memory.
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<Box<dyn SampleSource + Send>> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if is_wav {
        match WavSource::open(path) {
            Ok(source) => return Ok(Box::new(source)),
            Err(err) => {
                tracing::debug!(?err, path = %path.display(), "streaming wav open failed, decoding instead");
            }
        }
    }
    Ok(Box::new(decode_to_memory(path)?))
}

/// Decodes a whole file with symphonia.
pub fn decode_to_memory<P: AsRef<Path>>(path: P) -> Result<MemorySource> {
    let file = File::open(path.as_ref())?;
    decode_reader(file, Some(path.as_ref()))
}

pub fn decode_reader<R>(reader: R, hint_path: Option<&Path>) -> Result<MemorySource>
where
    R: MediaSource + 'static,
{
    let mss = MediaSourceStream::new(Box::new(reader), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = hint_path
        .and_then(|path| path.extension())
        .and_then(|ext| ext.to_str())
    {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;
    let (codec_params, track_id) = {
        let track = format
            .default_track()
            .ok_or(AudioError::NoSupportedTracks)?;
        (track.codec_params.clone(), track.id)
    };

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let channel_count = codec_params
        .channels
        .unwrap_or(Channels::FRONT_LEFT)
        .count();
    let sample_rate = codec_params.sample_rate.unwrap_or(48_000);
    let mut channel_data = vec![Vec::new(); channel_count];
    let mut sample_buffer: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet)? {
            AudioBufferRef::F32(buffer) => {
                for (index, channel) in channel_data.iter_mut().enumerate() {
                    channel.extend_from_slice(buffer.chan(index));
                }
            }
            other => {
                let buf = sample_buffer.get_or_insert_with(|| {
                    SampleBuffer::<f32>::new(other.capacity() as u64, *other.spec())
                });
                buf.copy_interleaved_ref(other);
                let samples = buf.samples();
                for (index, channel) in channel_data.iter_mut().enumerate() {
                    channel.extend(samples[index..].iter().step_by(channel_count).copied());
                }
            }
        }
    }

    tracing::debug!(
        sample_rate,
        channels = channel_count,
        frames = channel_data.first().map_or(0, Vec::len),
        "decoded audio into memory"
    );
    Ok(MemorySource::from_channels(sample_rate, &channel_data))
}
