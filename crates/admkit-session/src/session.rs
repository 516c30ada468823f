use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use admkit_audio::{open_source, CacheStats, FrameBounds, SampleSource, WindowedBlockCache};
use admkit_document::{AdmDocument, ChannelTable, SceneFile};
use admkit_metadata::{MetadataExtractor, TimedParameterBlock};

use crate::config::SessionConfig;
use crate::error::SessionError;

pub type SharedSession = Arc<Mutex<Session>>;

/// A scene document and its audio, with the item graph and block cache
/// built over them.
///
/// Calls that cannot run because something is not attached record the error
/// (see [`last_error`](Self::last_error)) and return an empty result. Each
/// such call clears the previous error first.
pub struct Session {
    config: SessionConfig,
    document: Option<AdmDocument>,
    channels: ChannelTable,
    extractor: MetadataExtractor,
    cache: WindowedBlockCache,
    last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            cache: WindowedBlockCache::new(config.cache),
            config,
            document: None,
            channels: ChannelTable::default(),
            extractor: MetadataExtractor::new(),
            last_error: None,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Loads a scene file and its audio. On failure the session is left
    /// empty and the error is also kept as the last error.
    pub fn open(&mut self, scene_path: &Path, audio_path: &Path) -> Result<(), SessionError> {
        self.close();
        let opened = SceneFile::load_from_path(scene_path)
            .map_err(SessionError::from)
            .and_then(|scene| {
                let source = open_source(audio_path)?;
                Ok((scene, source))
            });
        match opened {
            Ok((scene, source)) => {
                let (document, channels) = scene.into_parts();
                self.install(document, channels, source);
                tracing::debug!(
                    scene = %scene_path.display(),
                    audio = %audio_path.display(),
                    "session opened"
                );
                Ok(())
            }
            Err(err) => {
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Attaches an in-process scene. Track format refs only present in the
    /// channel table are copied into the document.
    pub fn attach(
        &mut self,
        mut document: AdmDocument,
        channels: ChannelTable,
        source: Box<dyn SampleSource + Send>,
    ) {
        self.close();
        channels.reflect_into(&mut document);
        self.install(document, channels, source);
    }

    fn install(
        &mut self,
        document: AdmDocument,
        channels: ChannelTable,
        source: Box<dyn SampleSource + Send>,
    ) {
        self.document = Some(document);
        self.channels = channels;
        self.cache.attach(source);
        self.last_error = None;
        if self.config.discover_on_open {
            self.discover();
        }
    }

    /// Drops the scene, its audio and every derived item.
    pub fn close(&mut self) {
        self.document = None;
        self.channels = ChannelTable::default();
        self.extractor.reset();
        self.cache.detach();
    }

    /// Number of newly resolved leaf channels.
    pub fn discover(&mut self) -> usize {
        self.clear_error();
        let Some(document) = self.document.as_ref() else {
            self.record(&SessionError::NoDocument);
            return 0;
        };
        self.extractor.discover(document, &self.channels)
    }

    /// The next unseen parameter block. `None` also when every block has
    /// been sent, in which case the last error stays clear.
    pub fn next_block(&mut self) -> Option<TimedParameterBlock> {
        self.clear_error();
        let Some(document) = self.document.as_ref() else {
            self.record(&SessionError::NoDocument);
            return None;
        };
        self.extractor.next_block(document)
    }

    pub fn sample_rate(&mut self) -> Option<u32> {
        self.clear_error();
        match self.cache.source() {
            Some(source) => Some(source.sample_rate()),
            None => {
                self.record(&SessionError::NoAudio);
                None
            }
        }
    }

    pub fn total_frames(&mut self) -> Option<u64> {
        self.clear_error();
        match self.cache.source() {
            Some(source) => Some(source.total_frames()),
            None => {
                self.record(&SessionError::NoAudio);
                None
            }
        }
    }

    /// Fills `out` with `frames` frames of the selected channels, silent
    /// outside `lower..=upper`. Returns whether `out` was written.
    pub fn audio_block(
        &mut self,
        start: i64,
        frames: usize,
        selectors: &[i32],
        lower: i64,
        upper: i64,
        out: &mut [f32],
    ) -> bool {
        self.clear_error();
        if self.cache.source().is_none() {
            self.record(&SessionError::NoAudio);
            return false;
        }
        let bounds = FrameBounds::new(lower, upper);
        match self
            .cache
            .read_block_into(start, frames, selectors, bounds, out)
        {
            Ok(()) => true,
            Err(err) => {
                self.record(&SessionError::from(err));
                false
            }
        }
    }

    /// [`audio_block`](Self::audio_block) with everything from frame 0 on
    /// audible.
    pub fn audio_block_unbounded(
        &mut self,
        start: i64,
        frames: usize,
        selectors: &[i32],
        out: &mut [f32],
    ) -> bool {
        let bounds = FrameBounds::unbounded();
        self.audio_block(start, frames, selectors, bounds.lower, bounds.upper, out)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&AdmDocument> {
        self.document.as_ref()
    }

    /// For scenes that grow after opening; call [`discover`](Self::discover)
    /// afterwards to pick up new references.
    pub fn document_mut(&mut self) -> Option<&mut AdmDocument> {
        self.document.as_mut()
    }

    pub fn channel_table(&self) -> &ChannelTable {
        &self.channels
    }

    pub fn extractor(&self) -> &MetadataExtractor {
        &self.extractor
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn record(&mut self, err: &SessionError) {
        tracing::warn!(%err, "session call failed");
        self.last_error = Some(err.to_string());
    }
}
