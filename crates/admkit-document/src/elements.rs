//! ADM element definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blocks::{AudioBlockFormat, TypedBlock};
use crate::ids::{
    AudioChannelFormatId, AudioContentId, AudioObjectId, AudioPackFormatId, AudioProgrammeId,
    AudioStreamFormatId, AudioTrackFormatId, AudioTrackUidId,
};
use crate::time::AdmTime;

/// ADM typeDefinition of a pack or channel format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeDefinition {
    #[default]
    Undefined,
    DirectSpeakers,
    Matrix,
    Objects,
    Hoa,
    Binaural,
}

impl TypeDefinition {
    /// Numeric typeLabel as used by ADM (`0001`..`0005`).
    pub fn code(self) -> u8 {
        match self {
            TypeDefinition::Undefined => 0,
            TypeDefinition::DirectSpeakers => 1,
            TypeDefinition::Matrix => 2,
            TypeDefinition::Objects => 3,
            TypeDefinition::Hoa => 4,
            TypeDefinition::Binaural => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeDefinition::Undefined => "Undefined",
            TypeDefinition::DirectSpeakers => "DirectSpeakers",
            TypeDefinition::Matrix => "Matrix",
            TypeDefinition::Objects => "Objects",
            TypeDefinition::Hoa => "HOA",
            TypeDefinition::Binaural => "Binaural",
        }
    }

    /// Accepts either the typeDefinition name or the four digit typeLabel.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "directspeakers" | "0001" => TypeDefinition::DirectSpeakers,
            "matrix" | "0002" => TypeDefinition::Matrix,
            "objects" | "0003" => TypeDefinition::Objects,
            "hoa" | "0004" => TypeDefinition::Hoa,
            "binaural" | "0005" => TypeDefinition::Binaural,
            _ => TypeDefinition::Undefined,
        }
    }
}

impl From<String> for TypeDefinition {
    fn from(value: String) -> Self {
        TypeDefinition::from_label(&value)
    }
}

impl From<TypeDefinition> for String {
    fn from(value: TypeDefinition) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioProgramme {
    pub id: AudioProgrammeId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contents: Vec<AudioContentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioContent {
    pub id: AudioContentId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub objects: Vec<AudioObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioObject {
    pub id: AudioObjectId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start: Option<AdmTime>,
    #[serde(default)]
    pub duration: Option<AdmTime>,
    /// Nested audioObjects.
    #[serde(default)]
    pub objects: Vec<AudioObjectId>,
    #[serde(default)]
    pub pack_formats: Vec<AudioPackFormatId>,
    #[serde(default)]
    pub track_uids: Vec<AudioTrackUidId>,
}

impl AudioObject {
    pub fn new(id: AudioObjectId) -> Self {
        Self {
            id,
            name: None,
            start: None,
            duration: None,
            objects: Vec::new(),
            pack_formats: Vec::new(),
            track_uids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioPackFormat {
    pub id: AudioPackFormatId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_definition: TypeDefinition,
    #[serde(default)]
    pub absolute_distance: Option<f64>,
    #[serde(default)]
    pub channel_formats: Vec<AudioChannelFormatId>,
    /// Nested audioPackFormats.
    #[serde(default)]
    pub pack_formats: Vec<AudioPackFormatId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    #[serde(default)]
    pub low_pass: Option<f64>,
    #[serde(default)]
    pub high_pass: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChannelFormat {
    pub id: AudioChannelFormatId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_definition: TypeDefinition,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub blocks: Vec<AudioBlockFormat>,
}

impl AudioChannelFormat {
    /// Blocks of one flavour, in document order.
    pub fn blocks_of<'a, T: TypedBlock + 'a>(&'a self) -> impl Iterator<Item = &'a T> + 'a {
        self.blocks.iter().filter_map(T::from_block)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioStreamFormat {
    pub id: AudioStreamFormatId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channel_format: Option<AudioChannelFormatId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrackFormat {
    pub id: AudioTrackFormatId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stream_format: Option<AudioStreamFormatId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrackUid {
    pub id: AudioTrackUidId,
    #[serde(default)]
    pub track_format: Option<AudioTrackFormatId>,
    #[serde(default)]
    pub pack_format: Option<AudioPackFormatId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_definition_accepts_names_and_labels() {
        assert_eq!(TypeDefinition::from_label("Objects"), TypeDefinition::Objects);
        assert_eq!(TypeDefinition::from_label("0004"), TypeDefinition::Hoa);
        assert_eq!(TypeDefinition::from_label("HOA").code(), 4);
        assert_eq!(
            TypeDefinition::from_label("Surround"),
            TypeDefinition::Undefined
        );
    }
}
