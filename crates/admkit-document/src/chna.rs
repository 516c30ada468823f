//! Channel allocation table mapping track UIDs onto tracks of the audio file.

use serde::{Deserialize, Serialize};

use crate::document::AdmDocument;
use crate::elements::{AudioTrackFormat, AudioTrackUid};
use crate::ids::{AudioPackFormatId, AudioTrackFormatId, AudioTrackUidId};

/// Resolves a track UID to the 0-based channel carrying its audio.
pub trait ChannelResolver {
    fn channel_for(&self, uid: &AudioTrackUidId) -> Option<usize>;
}

impl<F> ChannelResolver for F
where
    F: Fn(&AudioTrackUidId) -> Option<usize>,
{
    fn channel_for(&self, uid: &AudioTrackUidId) -> Option<usize> {
        self(uid)
    }
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAllocation {
    /// 1-based track index within the file.
    pub track_index: u16,
    pub uid: AudioTrackUidId,
    #[serde(default)]
    pub track_format: Option<AudioTrackFormatId>,
    #[serde(default)]
    pub pack_format: Option<AudioPackFormatId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelTable {
    rows: Vec<ChannelAllocation>,
}

impl ChannelTable {
    pub fn new(rows: Vec<ChannelAllocation>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ChannelAllocation] {
        &self.rows
    }

    pub fn push(&mut self, row: ChannelAllocation) {
        self.rows.push(row);
    }

    /// Copies track-format references held only by the table into the
    /// document. Rows naming an unknown UID or track format are skipped, as
    /// are UIDs that already carry a reference. Returns how many UIDs changed.
    pub fn reflect_into(&self, document: &mut AdmDocument) -> usize {
        let mut updated = 0;
        for row in &self.rows {
            let Some(track_format) = &row.track_format else {
                continue;
            };
            let Some(uid) = document.lookup::<AudioTrackUid>(&row.uid) else {
                continue;
            };
            if uid.track_format.is_some() {
                continue;
            }
            if document
                .lookup::<AudioTrackFormat>(track_format)
                .is_none()
            {
                continue;
            }
            if document
                .set_track_format(&row.uid, track_format.clone())
                .is_ok()
            {
                updated += 1;
            }
        }
        if updated > 0 {
            tracing::debug!(updated, "reflected channel table track refs into document");
        }
        updated
    }
}

impl ChannelResolver for ChannelTable {
    fn channel_for(&self, uid: &AudioTrackUidId) -> Option<usize> {
        self.rows
            .iter()
            .find(|row| &row.uid == uid)
            .and_then(|row| usize::from(row.track_index).checked_sub(1))
    }
}
