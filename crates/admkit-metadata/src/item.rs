//! Renderable items and the channels they group.

use std::collections::BTreeMap;
use std::fmt;

use admkit_document::{
    leaf_identity, AudioChannelFormatId, AudioContentId, AudioObjectId, AudioPackFormatId,
    AudioProgrammeId, AudioStreamFormatId, AudioTrackFormatId, AudioTrackUidId, TypeDefinition,
};
use serde::Serialize;

const UNKNOWN_NAME: &str = "(Unknown)";
const NAME_SEPARATOR: &str = " -> ";

/// Identity of a leaf channel: owning object in the high 32 bits, track UID
/// in the low 32 bits. Stable across discovery runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemChannelId(pub u64);

impl ItemChannelId {
    pub fn new(object: Option<&AudioObjectId>, uid: &AudioTrackUidId) -> Self {
        Self(leaf_identity(object, Some(uid)))
    }
}

impl fmt::Display for ItemChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Identity of a renderable item. Independent-channel types include the
/// track UID; HOA sets are identified by their object alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(pub u64);

impl ItemId {
    pub fn independent(object: &AudioObjectId, uid: &AudioTrackUidId) -> Self {
        Self(leaf_identity(Some(object), Some(uid)))
    }

    pub fn grouped(object: &AudioObjectId) -> Self {
        Self(leaf_identity(Some(object), None))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One resolved track UID reference.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableItemChannel {
    pub id: ItemChannelId,
    /// Owning item, looked up by identity.
    pub item: Option<ItemId>,
    pub track_uid: AudioTrackUidId,
    pub track_format: Option<AudioTrackFormatId>,
    pub stream_format: Option<AudioStreamFormatId>,
    pub channel_format: Option<AudioChannelFormatId>,
    /// Pack formats from the object's reference down to the pack holding the
    /// channel format.
    pub pack_format_tree: Vec<AudioPackFormatId>,
    pub type_definition: TypeDefinition,
    /// 0-based channel in the audio source.
    pub source_channel: Option<usize>,
    pub low_pass: Option<f64>,
    pub high_pass: Option<f64>,
    pub absolute_distance: Option<f64>,
    pub valid: bool,
    pub(crate) cursor: Option<usize>,
}

impl RenderableItemChannel {
    /// The pack format that directly holds this channel's channel format.
    pub fn pack_format(&self) -> Option<&AudioPackFormatId> {
        self.pack_format_tree.last()
    }

    /// Index of the last block already streamed for this channel.
    pub fn last_sent_block(&self) -> Option<usize> {
        self.cursor
    }
}

/// A (programme, content) path through which an item is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTree {
    pub programme: Option<AudioProgrammeId>,
    pub content: Option<AudioContentId>,
    pub programme_number: u16,
    pub content_number: u16,
}

impl ItemTree {
    pub fn new(programme: Option<&AudioProgrammeId>, content: Option<&AudioContentId>) -> Self {
        Self {
            programme: programme.cloned(),
            content: content.cloned(),
            programme_number: programme.map_or(0, |id| id.value() as u16),
            content_number: content.map_or(0, |id| id.value() as u16),
        }
    }

    pub fn matches(
        &self,
        programme: Option<&AudioProgrammeId>,
        content: Option<&AudioContentId>,
    ) -> bool {
        self.programme.as_ref() == programme && self.content.as_ref() == content
    }
}

/// A unit of audio rendered as a whole: one object channel, one direct
/// speaker feed or one HOA set.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableItem {
    pub id: ItemId,
    pub type_definition: TypeDefinition,
    pub object_tree: Vec<AudioObjectId>,
    pub presented_name: String,
    pub start_time: f64,
    pub duration: f64,
    pub end_time: f64,
    pub trees: Vec<ItemTree>,
    /// Member channels, ordered by identity, mapped to their slot in the
    /// owning graph.
    pub(crate) channels: BTreeMap<ItemChannelId, usize>,
}

impl RenderableItem {
    pub fn channel_ids(&self) -> impl Iterator<Item = ItemChannelId> + '_ {
        self.channels.keys().copied()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Numbers of the programmes this item is reachable from.
    pub fn programme_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.trees
            .iter()
            .filter(|tree| tree.programme.is_some())
            .map(|tree| tree.programme_number)
    }
}

/// Builds the display name of an item. Pack and channel format names only
/// contribute for independent-channel types, and a level is skipped when it
/// repeats the name above it.
pub fn presented_name(
    object_name: Option<&str>,
    pack_name: Option<&str>,
    channel_name: Option<&str>,
    type_definition: TypeDefinition,
) -> String {
    let object_name = object_name.unwrap_or_default();
    let (pack_name, channel_name) = match type_definition {
        TypeDefinition::Objects | TypeDefinition::DirectSpeakers => (
            pack_name.unwrap_or_default(),
            channel_name.unwrap_or_default(),
        ),
        _ => ("", ""),
    };

    let mut name = String::from(object_name);
    let mut append = |part: &str| {
        if !name.is_empty() {
            name.push_str(NAME_SEPARATOR);
        }
        name.push_str(part);
    };
    if !pack_name.is_empty() && pack_name != object_name {
        append(pack_name);
    }
    if !channel_name.is_empty() && channel_name != pack_name {
        append(channel_name);
    }

    if name.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_pack_object_and_uid() {
        let object: AudioObjectId = "AO_1001".parse().unwrap();
        let uid: AudioTrackUidId = "ATU_00000002".parse().unwrap();
        assert_eq!(ItemChannelId::new(Some(&object), &uid).0, 0x1001_0000_0002);
        assert_eq!(ItemChannelId::new(None, &uid).0, 2);
        assert_eq!(ItemId::independent(&object, &uid).0, 0x1001_0000_0002);
        assert_eq!(ItemId::grouped(&object).0, 0x1001_0000_0000);
    }

    #[test]
    fn presented_name_skips_repeated_levels() {
        let objects = TypeDefinition::Objects;
        assert_eq!(
            presented_name(Some("Dialogue"), Some("Dialogue"), Some("Centre"), objects),
            "Dialogue -> Centre"
        );
        assert_eq!(
            presented_name(Some("Music"), Some("Stereo"), Some("Stereo"), objects),
            "Music -> Stereo"
        );
        assert_eq!(
            presented_name(None, Some("Pack"), Some("Channel"), objects),
            "Pack -> Channel"
        );
        assert_eq!(presented_name(None, None, None, objects), "(Unknown)");
    }

    #[test]
    fn presented_name_for_hoa_uses_object_only() {
        assert_eq!(
            presented_name(Some("Ambience"), Some("HOA 1st"), Some("W"), TypeDefinition::Hoa),
            "Ambience"
        );
        assert_eq!(
            presented_name(None, Some("HOA 1st"), None, TypeDefinition::Hoa),
            "(Unknown)"
        );
    }

    #[test]
    fn tree_numbers_come_from_hex_payload() {
        let programme: AudioProgrammeId = "APR_1001".parse().unwrap();
        let content: AudioContentId = "ACO_100a".parse().unwrap();
        let tree = ItemTree::new(Some(&programme), Some(&content));
        assert_eq!(tree.programme_number, 0x1001);
        assert_eq!(tree.content_number, 0x100a);
        assert!(tree.matches(Some(&programme), Some(&content)));
        assert!(!tree.matches(None, Some(&content)));
    }
}
