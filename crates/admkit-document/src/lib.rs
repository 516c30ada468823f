//! ADM document model
//! ==================
//! In-memory representation of an Audio Definition Model scene: typed element
//! IDs, the programme/content/object/pack/channel/stream/track reference graph,
//! timed block formats, and the channel allocation table tying track UIDs to
//! tracks of the accompanying audio.

pub mod blocks;
pub mod chna;
pub mod document;
pub mod elements;
pub mod error;
pub mod ids;
pub mod scene;
pub mod time;

pub use blocks::{
    AudioBlockFormat, ChannelLock, DirectSpeakersBlock, HoaBlock, JumpPosition, ObjectDivergence,
    ObjectPosition, ObjectsBlock, SpeakerPosition, TimingBlock, TypedBlock,
};
pub use chna::{ChannelAllocation, ChannelResolver, ChannelTable};
pub use document::{AdmDocument, DocumentData, Element, ElementTable};
pub use elements::{
    AudioChannelFormat, AudioContent, AudioObject, AudioPackFormat, AudioProgramme,
    AudioStreamFormat, AudioTrackFormat, AudioTrackUid, Frequency, TypeDefinition,
};
pub use error::DocumentError;
pub use ids::{
    leaf_identity, AudioChannelFormatId, AudioContentId, AudioObjectId, AudioPackFormatId,
    AudioProgrammeId, AudioStreamFormatId, AudioTrackFormatId, AudioTrackUidId, ElementKind,
};
pub use scene::SceneFile;
pub use time::AdmTime;
