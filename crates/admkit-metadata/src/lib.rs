//! Renderable items and timed metadata
//! ===================================
//! Resolves the reference graph of an [`admkit_document::AdmDocument`] into
//! renderable items (one object channel, one direct speaker feed, or one HOA
//! set) and streams their timed parameter blocks in round-robin order as
//! fixed-capacity [`TimedParameterBlock`]s.

pub mod block;
pub mod discovery;
pub mod extractor;
pub mod item;
pub mod stream;

pub use block::{
    BlockPayload, DirectSpeakersParameters, HoaParameters, ObjectsParameters, Position,
    TimedParameterBlock,
};
pub use discovery::ItemGraph;
pub use extractor::MetadataExtractor;
pub use item::{ItemChannelId, ItemId, ItemTree, RenderableItem, RenderableItemChannel};
pub use stream::MetadataStreamer;
