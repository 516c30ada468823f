//! Fixed-capacity parameter blocks handed to renderers.

use arrayvec::{ArrayString, ArrayVec};
use serde::Serialize;

use admkit_document::{
    AdmTime, DirectSpeakersBlock, HoaBlock, ObjectPosition, ObjectsBlock, TypeDefinition,
};

pub const MAX_CHANNELS: usize = 64;
pub const MAX_PROGRAMMES: usize = 16;
pub const NAME_CAPACITY: usize = 100;
pub const PACK_FORMAT_ID_CAPACITY: usize = 12;
pub const SPEAKER_LABEL_CAPACITY: usize = 64;
pub const NORMALIZATION_CAPACITY: usize = 8;

pub const DEFAULT_NORMALIZATION: &str = "SN3D";

/// Copies as much of `text` as fits, stopping on a character boundary.
pub fn truncated<const CAP: usize>(text: &str) -> ArrayString<CAP> {
    let mut out = ArrayString::new();
    for ch in text.chars() {
        if out.try_push(ch).is_err() {
            break;
        }
    }
    out
}

fn seconds(time: Option<AdmTime>) -> Option<f64> {
    time.map(AdmTime::as_seconds)
}

/// One timestamped parameter snapshot of a renderable item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedParameterBlock {
    pub item_id: u64,
    pub type_definition: TypeDefinition,
    /// 0-based source channels feeding this block.
    pub channels: ArrayVec<u32, MAX_CHANNELS>,
    pub name: ArrayString<NAME_CAPACITY>,
    pub audio_start_time: f64,
    pub audio_end_time: f64,
    pub pack_format_id: ArrayString<PACK_FORMAT_ID_CAPACITY>,
    pub programme_ids: ArrayVec<u16, MAX_PROGRAMMES>,
    pub rtime: f64,
    pub duration: f64,
    /// NaN when undeclared.
    pub absolute_distance: f64,
    pub low_pass: f64,
    pub high_pass: f64,
    pub payload: BlockPayload,
}

impl TimedParameterBlock {
    pub fn type_code(&self) -> u8 {
        self.type_definition.code()
    }

    pub(crate) fn push_programme(&mut self, number: u16) {
        if self.programme_ids.try_push(number).is_err() {
            tracing::warn!(
                item = self.item_id,
                capacity = MAX_PROGRAMMES,
                "programme list full, dropping programme"
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum BlockPayload {
    Objects(ObjectsParameters),
    DirectSpeakers(DirectSpeakersParameters),
    Hoa(HoaParameters),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "coordinates", rename_all = "snake_case")]
pub enum Position {
    Cartesian { x: f64, y: f64, z: f64 },
    Polar { azimuth: f64, elevation: f64, distance: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectsParameters {
    pub jump_position: bool,
    pub interpolation_length: f64,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub gain: f64,
    pub diffuse: f64,
    pub divergence: f64,
    pub divergence_azimuth_range: f64,
    pub divergence_position_range: f64,
    pub channel_lock: bool,
    pub channel_lock_max_distance: f64,
    pub screen_ref: bool,
}

impl ObjectsParameters {
    pub fn from_block(block: &ObjectsBlock) -> Self {
        let (jump_position, interpolation_length) = match block.jump_position {
            Some(jump) if jump.flag => (true, seconds(jump.interpolation_length).unwrap_or(0.0)),
            _ => (false, 0.0),
        };
        let position = match block.position {
            ObjectPosition::Cartesian { x, y, z } => Position::Cartesian { x, y, z },
            ObjectPosition::Spherical {
                azimuth,
                elevation,
                distance,
            } => Position::Polar {
                azimuth,
                elevation,
                distance: distance.unwrap_or(1.0),
            },
        };
        let divergence = block.divergence.unwrap_or_default();
        let (channel_lock, channel_lock_max_distance) = match block.channel_lock {
            Some(lock) if lock.flag => (true, lock.max_distance.unwrap_or(f64::INFINITY)),
            _ => (false, f64::INFINITY),
        };

        Self {
            jump_position,
            interpolation_length,
            position,
            width: block.width.unwrap_or(0.0),
            height: block.height.unwrap_or(0.0),
            depth: block.depth.unwrap_or(0.0),
            gain: block.gain.unwrap_or(1.0),
            diffuse: block.diffuse.unwrap_or(0.0),
            divergence: divergence.divergence.unwrap_or(0.0),
            divergence_azimuth_range: divergence.azimuth_range.unwrap_or(0.0),
            divergence_position_range: divergence.position_range.unwrap_or(0.0),
            channel_lock,
            channel_lock_max_distance,
            screen_ref: block.screen_ref.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectSpeakersParameters {
    pub azimuth: f64,
    pub elevation: f64,
    pub distance: f64,
    pub gain: f64,
    pub speaker_label: ArrayString<SPEAKER_LABEL_CAPACITY>,
}

impl DirectSpeakersParameters {
    pub fn from_block(block: &DirectSpeakersBlock) -> Self {
        Self {
            azimuth: block.position.azimuth,
            elevation: block.position.elevation,
            distance: block.position.distance.unwrap_or(1.0),
            gain: 1.0,
            speaker_label: block
                .speaker_labels
                .first()
                .map(|label| truncated(label))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoaParameters {
    pub orders: ArrayVec<i8, MAX_CHANNELS>,
    pub degrees: ArrayVec<i8, MAX_CHANNELS>,
    pub normalization: ArrayString<NORMALIZATION_CAPACITY>,
    pub nfc_ref_dist: f64,
    pub screen_ref: bool,
    pub gain: f64,
}

impl HoaParameters {
    /// Set-wide fields come from the block that triggered the emission.
    pub fn from_reference(block: &HoaBlock) -> Self {
        Self {
            orders: ArrayVec::new(),
            degrees: ArrayVec::new(),
            normalization: truncated(
                block
                    .normalization
                    .as_deref()
                    .unwrap_or(DEFAULT_NORMALIZATION),
            ),
            nfc_ref_dist: block.nfc_ref_dist.unwrap_or(0.0),
            screen_ref: block.screen_ref.unwrap_or(false),
            gain: 1.0,
        }
    }
}

/// Relative start and duration of a document block, in seconds.
pub(crate) fn block_timing(rtime: Option<AdmTime>, duration: Option<AdmTime>) -> (f64, f64) {
    (
        seconds(rtime).unwrap_or(0.0),
        seconds(duration).unwrap_or(f64::INFINITY),
    )
}
