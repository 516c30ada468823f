//! Timed audioBlockFormat payloads, one flavour per type definition.

use serde::{Deserialize, Serialize};

use crate::time::AdmTime;

/// A single audioBlockFormat within an audioChannelFormat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AudioBlockFormat {
    DirectSpeakers(DirectSpeakersBlock),
    Matrix(TimingBlock),
    Objects(ObjectsBlock),
    #[serde(rename = "HOA")]
    Hoa(HoaBlock),
    Binaural(TimingBlock),
}

impl AudioBlockFormat {
    pub fn rtime(&self) -> Option<AdmTime> {
        match self {
            AudioBlockFormat::DirectSpeakers(block) => block.rtime,
            AudioBlockFormat::Matrix(block) | AudioBlockFormat::Binaural(block) => block.rtime,
            AudioBlockFormat::Objects(block) => block.rtime,
            AudioBlockFormat::Hoa(block) => block.rtime,
        }
    }
}

/// Typed view over [`AudioBlockFormat`] used to walk the blocks of a single
/// type within a channel format.
pub trait TypedBlock: Sized {
    fn from_block(block: &AudioBlockFormat) -> Option<&Self>;
}

macro_rules! typed_block {
    ($ty:ty, $variant:ident) => {
        impl TypedBlock for $ty {
            fn from_block(block: &AudioBlockFormat) -> Option<&Self> {
                match block {
                    AudioBlockFormat::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

typed_block!(ObjectsBlock, Objects);
typed_block!(DirectSpeakersBlock, DirectSpeakers);
typed_block!(HoaBlock, Hoa);

/// Block carrying only timing (Matrix, Binaural).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingBlock {
    #[serde(default)]
    pub rtime: Option<AdmTime>,
    #[serde(default)]
    pub duration: Option<AdmTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectsBlock {
    #[serde(default)]
    pub rtime: Option<AdmTime>,
    #[serde(default)]
    pub duration: Option<AdmTime>,
    #[serde(default)]
    pub jump_position: Option<JumpPosition>,
    pub position: ObjectPosition,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub gain: Option<f64>,
    #[serde(default)]
    pub diffuse: Option<f64>,
    #[serde(default)]
    pub divergence: Option<ObjectDivergence>,
    #[serde(default)]
    pub channel_lock: Option<ChannelLock>,
    #[serde(default)]
    pub screen_ref: Option<bool>,
}

impl ObjectsBlock {
    pub fn new(position: ObjectPosition) -> Self {
        Self {
            rtime: None,
            duration: None,
            jump_position: None,
            position,
            width: None,
            height: None,
            depth: None,
            gain: None,
            diffuse: None,
            divergence: None,
            channel_lock: None,
            screen_ref: None,
        }
    }

    pub fn with_timing(mut self, rtime: AdmTime, duration: AdmTime) -> Self {
        self.rtime = Some(rtime);
        self.duration = Some(duration);
        self
    }
}

/// Object position, either cartesian or spherical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectPosition {
    Cartesian {
        x: f64,
        y: f64,
        z: f64,
    },
    Spherical {
        azimuth: f64,
        elevation: f64,
        #[serde(default)]
        distance: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpPosition {
    pub flag: bool,
    #[serde(default)]
    pub interpolation_length: Option<AdmTime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDivergence {
    #[serde(default)]
    pub divergence: Option<f64>,
    #[serde(default)]
    pub azimuth_range: Option<f64>,
    #[serde(default)]
    pub position_range: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLock {
    pub flag: bool,
    #[serde(default)]
    pub max_distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeakerPosition {
    pub azimuth: f64,
    pub elevation: f64,
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectSpeakersBlock {
    #[serde(default)]
    pub rtime: Option<AdmTime>,
    #[serde(default)]
    pub duration: Option<AdmTime>,
    pub position: SpeakerPosition,
    #[serde(default)]
    pub speaker_labels: Vec<String>,
}

/// Higher-order ambisonics block. Order and degree are mandatory in ADM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoaBlock {
    #[serde(default)]
    pub rtime: Option<AdmTime>,
    #[serde(default)]
    pub duration: Option<AdmTime>,
    pub order: i8,
    pub degree: i8,
    #[serde(default)]
    pub normalization: Option<String>,
    #[serde(default)]
    pub nfc_ref_dist: Option<f64>,
    #[serde(default)]
    pub screen_ref: Option<bool>,
}

impl HoaBlock {
    pub fn new(order: i8, degree: i8) -> Self {
        Self {
            rtime: None,
            duration: None,
            order,
            degree,
            normalization: None,
            nfc_ref_dist: None,
            screen_ref: None,
        }
    }

    pub fn at(mut self, rtime: AdmTime) -> Self {
        self.rtime = Some(rtime);
        self
    }
}
