use symphonia::core::errors::Error as SymphoniaError;

use crate::config::MAX_MARGIN_SECONDS;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio source attached")]
    NoSource,
    #[error("output holds {available} samples but the request needs {required}")]
    OutputTooShort { required: usize, available: usize },
    #[error("request of {frames} frames at frame {start} overflows the frame range")]
    FrameOverflow { start: i64, frames: usize },
    #[error("{field} must lie within 0..={max} seconds, got {seconds}", max = MAX_MARGIN_SECONDS)]
    InvalidMargin { field: &'static str, seconds: f64 },
    #[error("cache window around frame {start} does not fit in memory")]
    WindowTooLarge { start: i64 },
    #[error("seek to frame {frame} past the end of the source ({total} frames)")]
    SeekOutOfRange { frame: u64, total: u64 },
    #[error("no supported audio tracks found in source")]
    NoSupportedTracks,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Hound(#[from] hound::Error),
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),
}

pub type Result<T> = std::result::Result<T, AudioError>;
