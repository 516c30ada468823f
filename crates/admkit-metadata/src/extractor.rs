//! Discovery and streaming over one document.

use admkit_document::{AdmDocument, ChannelResolver};

use crate::block::TimedParameterBlock;
use crate::discovery::ItemGraph;
use crate::stream::MetadataStreamer;

/// Item graph plus the streaming cursor over it.
#[derive(Debug, Default)]
pub struct MetadataExtractor {
    graph: ItemGraph,
    streamer: MetadataStreamer,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of newly resolved leaf channels.
    pub fn discover(&mut self, document: &AdmDocument, resolver: &dyn ChannelResolver) -> usize {
        self.graph.discover(document, resolver)
    }

    pub fn next_block(&mut self, document: &AdmDocument) -> Option<TimedParameterBlock> {
        self.streamer.next_block(&mut self.graph, document)
    }

    pub fn graph(&self) -> &ItemGraph {
        &self.graph
    }

    /// Forgets every item and rewinds streaming.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
