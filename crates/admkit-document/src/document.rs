//! Append-only arena holding every element of an ADM document.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::elements::{
    AudioChannelFormat, AudioContent, AudioObject, AudioPackFormat, AudioProgramme,
    AudioStreamFormat, AudioTrackFormat, AudioTrackUid,
};
use crate::error::{DocumentError, Result};
use crate::ids::{
    leaf_identity, AudioChannelFormatId, AudioContentId, AudioObjectId, AudioPackFormatId,
    AudioProgrammeId, AudioStreamFormatId, AudioTrackFormatId, AudioTrackUidId, ElementKind,
};

/// An element stored in an [`AdmDocument`].
pub trait Element: Sized {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display;
    const KIND: ElementKind;

    fn id(&self) -> &Self::Id;
    fn table(document: &AdmDocument) -> &ElementTable<Self>;
    fn table_mut(document: &mut AdmDocument) -> &mut ElementTable<Self>;
}

/// Elements of one kind in insertion order, indexed by ID.
#[derive(Debug, Clone)]
pub struct ElementTable<E: Element> {
    elements: Vec<E>,
    index: HashMap<E::Id, usize>,
}

impl<E: Element> Default for ElementTable<E> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<E: Element> ElementTable<E> {
    fn insert(&mut self, element: E) -> Result<()> {
        let id = element.id().clone();
        if self.index.contains_key(&id) {
            return Err(DocumentError::Duplicate {
                kind: E::KIND,
                id: id.to_string(),
            });
        }
        self.index.insert(id, self.elements.len());
        self.elements.push(element);
        Ok(())
    }

    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.index.get(id).map(|&index| &self.elements[index])
    }

    fn get_mut(&mut self, id: &E::Id) -> Option<&mut E> {
        self.index.get(id).map(|&index| &mut self.elements[index])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

macro_rules! element {
    ($ty:ty, $id:ty, $field:ident) => {
        impl Element for $ty {
            type Id = $id;
            const KIND: ElementKind = <$id>::KIND;

            fn id(&self) -> &Self::Id {
                &self.id
            }

            fn table(document: &AdmDocument) -> &ElementTable<Self> {
                &document.$field
            }

            fn table_mut(document: &mut AdmDocument) -> &mut ElementTable<Self> {
                &mut document.$field
            }
        }
    };
}

element!(AudioProgramme, AudioProgrammeId, programmes);
element!(AudioContent, AudioContentId, contents);
element!(AudioObject, AudioObjectId, objects);
element!(AudioPackFormat, AudioPackFormatId, pack_formats);
element!(AudioChannelFormat, AudioChannelFormatId, channel_formats);
element!(AudioStreamFormat, AudioStreamFormatId, stream_formats);
element!(AudioTrackFormat, AudioTrackFormatId, track_formats);
element!(AudioTrackUid, AudioTrackUidId, track_uids);

/// Parsed ADM document.
///
/// Elements may be added at any time but never removed, so anything derived
/// from a document stays valid as the document grows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "DocumentData", into = "DocumentData")]
pub struct AdmDocument {
    programmes: ElementTable<AudioProgramme>,
    contents: ElementTable<AudioContent>,
    objects: ElementTable<AudioObject>,
    pack_formats: ElementTable<AudioPackFormat>,
    channel_formats: ElementTable<AudioChannelFormat>,
    stream_formats: ElementTable<AudioStreamFormat>,
    track_formats: ElementTable<AudioTrackFormat>,
    track_uids: ElementTable<AudioTrackUid>,
}

impl AdmDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element, rejecting duplicate IDs.
    pub fn add<E: Element>(&mut self, element: E) -> Result<()> {
        E::table_mut(self).insert(element)
    }

    pub fn lookup<E: Element>(&self, id: &E::Id) -> Option<&E> {
        E::table(self).get(id)
    }

    pub fn elements<E: Element>(&self) -> std::slice::Iter<'_, E> {
        E::table(self).iter()
    }

    pub fn count<E: Element>(&self) -> usize {
        E::table(self).len()
    }

    /// Sets the audioTrackFormat reference of a track UID.
    pub fn set_track_format(
        &mut self,
        uid: &AudioTrackUidId,
        track_format: AudioTrackFormatId,
    ) -> Result<()> {
        let entry = self
            .track_uids
            .get_mut(uid)
            .ok_or_else(|| DocumentError::NotFound {
                kind: ElementKind::TrackUid,
                id: uid.to_string(),
            })?;
        entry.track_format = Some(track_format);
        Ok(())
    }

    /// Appends a track UID reference to an existing object.
    pub fn link_track_uid(&mut self, object: &AudioObjectId, uid: AudioTrackUidId) -> Result<()> {
        let entry = self
            .objects
            .get_mut(object)
            .ok_or_else(|| DocumentError::NotFound {
                kind: ElementKind::Object,
                id: object.to_string(),
            })?;
        if !entry.track_uids.contains(&uid) {
            entry.track_uids.push(uid);
        }
        Ok(())
    }

    /// Number of distinct leaf track references: every (object, track UID)
    /// pair plus every track UID element on its own, counted by
    /// [`leaf_identity`]. Never decreases as the document grows.
    pub fn leaf_reference_count(&self) -> usize {
        let pairs = self.objects.iter().flat_map(|object| {
            object
                .track_uids
                .iter()
                .map(move |uid| leaf_identity(Some(&object.id), Some(uid)))
        });
        let strays = self
            .track_uids
            .iter()
            .map(|uid| leaf_identity(None, Some(&uid.id)));
        pairs.chain(strays).collect::<HashSet<u64>>().len()
    }
}

/// Flat serialized form of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentData {
    #[serde(default)]
    pub programmes: Vec<AudioProgramme>,
    #[serde(default)]
    pub contents: Vec<AudioContent>,
    #[serde(default)]
    pub objects: Vec<AudioObject>,
    #[serde(default)]
    pub pack_formats: Vec<AudioPackFormat>,
    #[serde(default)]
    pub channel_formats: Vec<AudioChannelFormat>,
    #[serde(default)]
    pub stream_formats: Vec<AudioStreamFormat>,
    #[serde(default)]
    pub track_formats: Vec<AudioTrackFormat>,
    #[serde(default)]
    pub track_uids: Vec<AudioTrackUid>,
}

impl TryFrom<DocumentData> for AdmDocument {
    type Error = DocumentError;

    fn try_from(data: DocumentData) -> Result<Self> {
        let mut document = AdmDocument::new();
        for element in data.programmes {
            document.add(element)?;
        }
        for element in data.contents {
            document.add(element)?;
        }
        for element in data.objects {
            document.add(element)?;
        }
        for element in data.pack_formats {
            document.add(element)?;
        }
        for element in data.channel_formats {
            document.add(element)?;
        }
        for element in data.stream_formats {
            document.add(element)?;
        }
        for element in data.track_formats {
            document.add(element)?;
        }
        for element in data.track_uids {
            document.add(element)?;
        }
        Ok(document)
    }
}

impl From<AdmDocument> for DocumentData {
    fn from(document: AdmDocument) -> Self {
        Self {
            programmes: document.programmes.elements,
            contents: document.contents.elements,
            objects: document.objects.elements,
            pack_formats: document.pack_formats.elements,
            channel_formats: document.channel_formats.elements,
            stream_formats: document.stream_formats.elements,
            track_formats: document.track_formats.elements,
            track_uids: document.track_uids.elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(text: &str) -> AudioTrackUid {
        AudioTrackUid {
            id: text.parse().unwrap(),
            track_format: None,
            pack_format: None,
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut document = AdmDocument::new();
        document.add(uid("ATU_00000001")).unwrap();
        let err = document.add(uid("ATU_00000001")).unwrap_err();
        assert!(matches!(err, DocumentError::Duplicate { .. }));
        assert_eq!(document.count::<AudioTrackUid>(), 1);
    }

    #[test]
    fn leaf_count_covers_pairs_and_uids() {
        let mut document = AdmDocument::new();
        document.add(uid("ATU_00000001")).unwrap();
        document.add(uid("ATU_00000002")).unwrap();
        document.add(uid("ATU_00000003")).unwrap();

        let mut first = AudioObject::new("AO_1001".parse().unwrap());
        first.track_uids = vec!["ATU_00000001".parse().unwrap()];
        let mut second = AudioObject::new("AO_1002".parse().unwrap());
        second.track_uids = vec![
            "ATU_00000001".parse().unwrap(),
            "ATU_00000002".parse().unwrap(),
        ];
        document.add(first).unwrap();
        document.add(second).unwrap();

        // (1001,1) (1002,1) (1002,2) + three uids
        assert_eq!(document.leaf_reference_count(), 6);

        document
            .link_track_uid(&"AO_1001".parse().unwrap(), "ATU_00000003".parse().unwrap())
            .unwrap();
        assert_eq!(document.leaf_reference_count(), 7);
        document
            .link_track_uid(&"AO_1001".parse().unwrap(), "ATU_00000003".parse().unwrap())
            .unwrap();
        assert_eq!(document.leaf_reference_count(), 7);
    }

    #[test]
    fn leaf_count_keys_on_numeric_identity() {
        let mut document = AdmDocument::new();
        document.add(uid("ATU_00000001")).unwrap();
        document.add(uid("ATU_1")).unwrap();

        let mut short = AudioObject::new("AO_1001".parse().unwrap());
        short.track_uids = vec!["ATU_00000001".parse().unwrap()];
        let mut padded = AudioObject::new("AO_01001".parse().unwrap());
        padded.track_uids = vec!["ATU_1".parse().unwrap()];
        document.add(short).unwrap();
        document.add(padded).unwrap();

        // one (0x1001, 1) pair plus UID 1 on its own
        assert_eq!(document.leaf_reference_count(), 2);
    }

    #[test]
    fn lookups_by_id() {
        let mut document = AdmDocument::new();
        document.add(uid("ATU_00000009")).unwrap();
        let id: AudioTrackUidId = "ATU_00000009".parse().unwrap();
        assert!(document.lookup::<AudioTrackUid>(&id).is_some());
        document
            .set_track_format(&id, "AT_00031001_01".parse().unwrap())
            .unwrap();
        assert!(document
            .lookup::<AudioTrackUid>(&id)
            .and_then(|uid| uid.track_format.as_ref())
            .is_some());
    }
}
