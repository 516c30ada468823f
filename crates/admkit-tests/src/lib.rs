//! Scene fixtures shared by the integration tests and the benchmarks.
//!
//! [`SceneBuilder`] assembles complete reference chains (object, pack,
//! channel, stream, track format, track UID, channel table row) so scenarios
//! only spell out what they are about.

use admkit_audio::MemorySource;
use admkit_document::{
    AdmDocument, AdmTime, AudioBlockFormat, AudioChannelFormat, AudioChannelFormatId,
    AudioContent, AudioContentId, AudioObject, AudioObjectId, AudioPackFormat, AudioPackFormatId,
    AudioProgramme, AudioStreamFormat, AudioTrackFormat, AudioTrackUid, AudioTrackUidId,
    ChannelAllocation, ChannelTable, DirectSpeakersBlock, DocumentError, HoaBlock, ObjectPosition,
    ObjectsBlock, SpeakerPosition, TypeDefinition,
};

pub fn object_id(object: u32) -> AudioObjectId {
    parse(&format!("AO_{object:04X}"))
}

fn parse<T: std::str::FromStr>(text: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    match text.parse() {
        Ok(id) => id,
        Err(err) => panic!("fixture id {text} does not parse: {err:?}"),
    }
}

fn added(result: Result<(), DocumentError>) {
    if let Err(err) = result {
        panic!("fixture element rejected: {err}");
    }
}

/// Objects block at `rtime_ms` lasting `duration_ms`, positioned at `azimuth`.
pub fn object_block(rtime_ms: u64, duration_ms: u64, azimuth: f64) -> ObjectsBlock {
    ObjectsBlock::new(ObjectPosition::Spherical {
        azimuth,
        elevation: 0.0,
        distance: None,
    })
    .with_timing(AdmTime::from_millis(rtime_ms), AdmTime::from_millis(duration_ms))
}

/// Builds a document and channel table side by side. Track indices are handed
/// out in call order starting at 1.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    document: AdmDocument,
    table: ChannelTable,
    next_format: u32,
    next_track: u16,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of audio tracks the scene refers to.
    pub fn track_count(&self) -> usize {
        usize::from(self.next_track)
    }

    /// One object with a single Objects channel carrying `blocks`.
    pub fn object(&mut self, object: u32, name: &str, blocks: Vec<ObjectsBlock>) -> &mut Self {
        let blocks = blocks.into_iter().map(AudioBlockFormat::Objects).collect();
        let (channel, uid) = self.channel_chain(TypeDefinition::Objects, None, blocks);
        let pack = self.pack(TypeDefinition::Objects, None, vec![channel]);
        let mut element = AudioObject::new(object_id(object));
        element.name = Some(name.to_string());
        element.pack_formats = vec![pack];
        element.track_uids = vec![uid];
        added(self.document.add(element));
        self
    }

    /// One object holding a DirectSpeakers pack with a channel per label.
    pub fn direct_speakers(&mut self, object: u32, name: &str, labels: &[&str]) -> &mut Self {
        let mut channels = Vec::new();
        let mut uids = Vec::new();
        for (index, label) in labels.iter().enumerate() {
            let block = DirectSpeakersBlock {
                rtime: None,
                duration: None,
                position: SpeakerPosition {
                    azimuth: 30.0 - 60.0 * index as f64,
                    elevation: 0.0,
                    distance: None,
                },
                speaker_labels: vec![label.to_string()],
            };
            let (channel, uid) = self.channel_chain(
                TypeDefinition::DirectSpeakers,
                Some(label),
                vec![AudioBlockFormat::DirectSpeakers(block)],
            );
            channels.push(channel);
            uids.push(uid);
        }
        let pack = self.pack(TypeDefinition::DirectSpeakers, Some(name), channels);
        let mut element = AudioObject::new(object_id(object));
        element.name = Some(name.to_string());
        element.pack_formats = vec![pack];
        element.track_uids = uids;
        added(self.document.add(element));
        self
    }

    /// One HOA object; each entry is `(order, degree, block start times in ms)`.
    pub fn hoa(&mut self, object: u32, name: &str, channels: &[(i8, i8, &[u64])]) -> &mut Self {
        let mut formats = Vec::new();
        let mut uids = Vec::new();
        for &(order, degree, rtimes) in channels {
            let blocks = rtimes
                .iter()
                .map(|&ms| {
                    AudioBlockFormat::Hoa(HoaBlock::new(order, degree).at(AdmTime::from_millis(ms)))
                })
                .collect();
            let (channel, uid) = self.channel_chain(TypeDefinition::Hoa, None, blocks);
            formats.push(channel);
            uids.push(uid);
        }
        let pack = self.pack(TypeDefinition::Hoa, None, formats);
        let mut element = AudioObject::new(object_id(object));
        element.name = Some(name.to_string());
        element.pack_formats = vec![pack];
        element.track_uids = uids;
        added(self.document.add(element));
        self
    }

    /// A track UID no object refers to.
    pub fn stray_uid(&mut self) -> &mut Self {
        self.channel_chain(TypeDefinition::Objects, None, Vec::new());
        self
    }

    /// A programme with one content per entry, each listing the given objects.
    pub fn programme(&mut self, programme: u32, contents: &[(u32, &[u32])]) -> &mut Self {
        let mut content_ids = Vec::new();
        for &(content, objects) in contents {
            let id: AudioContentId = parse(&format!("ACO_{content:04X}"));
            added(self.document.add(AudioContent {
                id: id.clone(),
                name: None,
                objects: objects.iter().map(|&object| object_id(object)).collect(),
            }));
            content_ids.push(id);
        }
        added(self.document.add(AudioProgramme {
            id: parse(&format!("APR_{programme:04X}")),
            name: None,
            contents: content_ids,
        }));
        self
    }

    pub fn build(&self) -> (AdmDocument, ChannelTable) {
        (self.document.clone(), self.table.clone())
    }

    /// A ramp source with one channel per allocated track, see [`ramp_source`].
    pub fn source(&self, sample_rate: u32, frames: usize) -> MemorySource {
        ramp_source(sample_rate, self.track_count().max(1), frames)
    }

    fn channel_chain(
        &mut self,
        type_definition: TypeDefinition,
        name: Option<&str>,
        blocks: Vec<AudioBlockFormat>,
    ) -> (AudioChannelFormatId, AudioTrackUidId) {
        self.next_format += 1;
        self.next_track += 1;
        let suffix = format!("{:04X}{:04X}", type_definition.code(), self.next_format);
        let channel = parse(&format!("AC_{suffix}"));
        let track_format = parse(&format!("AT_{suffix}_01"));
        let uid: AudioTrackUidId = parse(&format!("ATU_{:08X}", self.next_track));

        let results = [
            self.document.add(AudioChannelFormat {
                id: parse(&format!("AC_{suffix}")),
                name: name.map(str::to_string),
                type_definition,
                frequency: None,
                blocks,
            }),
            self.document.add(AudioStreamFormat {
                id: parse(&format!("AS_{suffix}")),
                name: None,
                channel_format: Some(parse(&format!("AC_{suffix}"))),
            }),
            self.document.add(AudioTrackFormat {
                id: parse(&format!("AT_{suffix}_01")),
                name: None,
                stream_format: Some(parse(&format!("AS_{suffix}"))),
            }),
            self.document.add(AudioTrackUid {
                id: uid.clone(),
                track_format: Some(track_format),
                pack_format: None,
            }),
        ];
        for result in results {
            added(result);
        }
        self.table.push(ChannelAllocation {
            track_index: self.next_track,
            uid: uid.clone(),
            track_format: None,
            pack_format: None,
        });
        (channel, uid)
    }

    fn pack(
        &mut self,
        type_definition: TypeDefinition,
        name: Option<&str>,
        channel_formats: Vec<AudioChannelFormatId>,
    ) -> AudioPackFormatId {
        self.next_format += 1;
        let id: AudioPackFormatId =
            parse(&format!("AP_{:04X}{:04X}", type_definition.code(), self.next_format));
        added(self.document.add(AudioPackFormat {
            id: id.clone(),
            name: name.map(str::to_string),
            type_definition,
            absolute_distance: None,
            channel_formats,
            pack_formats: Vec::new(),
        }));
        id
    }
}

/// Interleaved ramp where the sample at (frame, channel) equals
/// `frame * channels + channel`.
pub fn ramp_source(sample_rate: u32, channels: usize, frames: usize) -> MemorySource {
    let samples = (0..frames * channels).map(|value| value as f32).collect();
    MemorySource::new(sample_rate, channels, samples)
}
