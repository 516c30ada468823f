//! Scene files: a document plus the channel table of the audio it describes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chna::ChannelTable;
use crate::document::AdmDocument;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    pub document: AdmDocument,
    #[serde(default)]
    pub channels: ChannelTable,
}

impl SceneFile {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut json = Vec::new();
        file.read_to_end(&mut json)?;
        Self::from_slice(&json)
    }

    /// Splits the scene, first copying table-only track refs into the
    /// document.
    pub fn into_parts(self) -> (AdmDocument, ChannelTable) {
        let SceneFile {
            mut document,
            channels,
        } = self;
        channels.reflect_into(&mut document);
        (document, channels)
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_parse_scene(data: &[u8]) {
    if let Ok(scene) = SceneFile::from_slice(data) {
        let (document, _) = scene.into_parts();
        let _ = document.leaf_reference_count();
    }
}
