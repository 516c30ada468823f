//! Round-robin emission of timed parameter blocks.

use arrayvec::{ArrayString, ArrayVec};

use admkit_document::{
    AdmDocument, AdmTime, AudioChannelFormat, DirectSpeakersBlock, HoaBlock, ObjectsBlock,
    TypeDefinition, TypedBlock,
};

use crate::block::{
    block_timing, truncated, BlockPayload, DirectSpeakersParameters, HoaParameters,
    ObjectsParameters, TimedParameterBlock, MAX_CHANNELS,
};
use crate::discovery::ItemGraph;
use crate::item::{RenderableItem, RenderableItemChannel};

/// Timing and source of a block about to be emitted.
struct Emission {
    rtime: Option<AdmTime>,
    duration: Option<AdmTime>,
    channel_slot: usize,
    channels: ArrayVec<u32, MAX_CHANNELS>,
    payload: BlockPayload,
}

/// Walks the valid items of an [`ItemGraph`] in round-robin order, emitting
/// each block of each channel exactly once.
#[derive(Debug, Default)]
pub struct MetadataStreamer {
    last_sent: Option<usize>,
}

impl MetadataStreamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position in the valid-item list of the item that produced the last
    /// block.
    pub fn last_sent_item(&self) -> Option<usize> {
        self.last_sent
    }

    /// Returns the next unseen block, starting with the item after the one
    /// that produced the previous block. `None` once every valid item is
    /// exhausted.
    pub fn next_block(
        &mut self,
        graph: &mut ItemGraph,
        document: &AdmDocument,
    ) -> Option<TimedParameterBlock> {
        let count = graph.valid.len();
        if count == 0 {
            return None;
        }
        let start = self.last_sent.map_or(0, |last| (last + 1) % count);

        for step in 0..count {
            let position = (start + step) % count;
            let item_slot = graph.valid[position];
            let emission = match graph.items[item_slot].type_definition {
                TypeDefinition::Objects => {
                    single_block(graph, item_slot, document, |block: &ObjectsBlock| {
                        BlockPayload::Objects(ObjectsParameters::from_block(block))
                    })
                }
                TypeDefinition::DirectSpeakers => {
                    single_block(graph, item_slot, document, |block: &DirectSpeakersBlock| {
                        BlockPayload::DirectSpeakers(DirectSpeakersParameters::from_block(block))
                    })
                }
                TypeDefinition::Hoa => hoa_block(graph, item_slot, document),
                _ => None,
            };
            if let Some(emission) = emission {
                self.last_sent = Some(position);
                let item = &graph.items[item_slot];
                let channel = &graph.channels[emission.channel_slot];
                return Some(assemble(item, channel, emission));
            }
        }
        None
    }
}

fn channel_format<'a>(
    document: &'a AdmDocument,
    channel: &RenderableItemChannel,
) -> Option<&'a AudioChannelFormat> {
    channel
        .channel_format
        .as_ref()
        .and_then(|id| document.lookup::<AudioChannelFormat>(id))
}

fn source_channel(channel: &RenderableItemChannel) -> u32 {
    channel
        .source_channel
        .and_then(|index| u32::try_from(index).ok())
        .unwrap_or(u32::MAX)
}

trait TimedBlock: TypedBlock {
    fn timing(&self) -> (Option<AdmTime>, Option<AdmTime>);
}

impl TimedBlock for ObjectsBlock {
    fn timing(&self) -> (Option<AdmTime>, Option<AdmTime>) {
        (self.rtime, self.duration)
    }
}

impl TimedBlock for DirectSpeakersBlock {
    fn timing(&self) -> (Option<AdmTime>, Option<AdmTime>) {
        (self.rtime, self.duration)
    }
}

/// Next block of a single-channel item.
fn single_block<T: TimedBlock>(
    graph: &mut ItemGraph,
    item_slot: usize,
    document: &AdmDocument,
    payload: impl FnOnce(&T) -> BlockPayload,
) -> Option<Emission> {
    let &channel_slot = graph.items[item_slot].channels.values().next()?;
    let channel = &mut graph.channels[channel_slot];
    let next = channel.cursor.map_or(0, |cursor| cursor + 1);
    let block = channel_format(document, channel)?
        .blocks_of::<T>()
        .nth(next)?;
    channel.cursor = Some(next);

    let (rtime, duration) = block.timing();
    let mut channels = ArrayVec::new();
    channels.push(source_channel(channel));
    Some(Emission {
        rtime,
        duration,
        channel_slot,
        channels,
        payload: payload(block),
    })
}

/// Composite snapshot of an HOA set at the earliest pending block time.
fn hoa_block(graph: &mut ItemGraph, item_slot: usize, document: &AdmDocument) -> Option<Emission> {
    let item = &graph.items[item_slot];

    let mut reference: Option<(AdmTime, usize, &HoaBlock)> = None;
    for &slot in item.channels.values() {
        let channel = &graph.channels[slot];
        let next = channel.cursor.map_or(0, |cursor| cursor + 1);
        let Some(block) = channel_format(document, channel)
            .and_then(|format| format.blocks_of::<HoaBlock>().nth(next))
        else {
            continue;
        };
        let rtime = block.rtime.unwrap_or(AdmTime::ZERO);
        if reference.map_or(true, |(earliest, _, _)| rtime < earliest) {
            reference = Some((rtime, slot, block));
        }
    }
    let (reference_time, reference_slot, reference_block) = reference?;

    let mut parameters = HoaParameters::from_reference(reference_block);
    let mut channels = ArrayVec::new();
    let mut next_change: Option<AdmTime> = None;
    let mut advanced = Vec::with_capacity(item.channels.len());

    for &slot in item.channels.values() {
        let channel = &graph.channels[slot];
        let Some(format) = channel_format(document, channel) else {
            continue;
        };
        let mut relevant = None;
        for (index, block) in format
            .blocks_of::<HoaBlock>()
            .enumerate()
            .skip(channel.cursor.unwrap_or(0))
        {
            let rtime = block.rtime.unwrap_or(AdmTime::ZERO);
            if rtime <= reference_time {
                relevant = Some((index, block));
            } else {
                if next_change.map_or(true, |soonest| rtime < soonest) {
                    next_change = Some(rtime);
                }
                break;
            }
        }
        let Some((index, block)) = relevant else {
            continue;
        };
        advanced.push((slot, index));
        if channels.is_full() {
            tracing::warn!(
                item = %item.id,
                capacity = MAX_CHANNELS,
                "HOA set exceeds block capacity, dropping channel"
            );
            continue;
        }
        channels.push(source_channel(channel));
        parameters.orders.push(block.order);
        parameters.degrees.push(block.degree);
    }

    for (slot, index) in advanced {
        graph.channels[slot].cursor = Some(index);
    }

    let duration =
        next_change.map(|next| AdmTime::from_nanos(next.as_nanos() - reference_time.as_nanos()));
    Some(Emission {
        rtime: Some(reference_time),
        duration,
        channel_slot: reference_slot,
        channels,
        payload: BlockPayload::Hoa(parameters),
    })
}

fn assemble(
    item: &RenderableItem,
    channel: &RenderableItemChannel,
    emission: Emission,
) -> TimedParameterBlock {
    let (rtime, duration) = block_timing(emission.rtime, emission.duration);
    let mut block = TimedParameterBlock {
        item_id: item.id.0,
        type_definition: item.type_definition,
        channels: emission.channels,
        name: truncated(&item.presented_name),
        audio_start_time: item.start_time,
        audio_end_time: item.end_time,
        pack_format_id: channel
            .pack_format()
            .map(|id| truncated(id.as_str()))
            .unwrap_or_else(ArrayString::new),
        programme_ids: ArrayVec::new(),
        rtime,
        duration,
        absolute_distance: channel.absolute_distance.unwrap_or(f64::NAN),
        low_pass: channel.low_pass.unwrap_or(f64::NAN),
        high_pass: channel.high_pass.unwrap_or(f64::NAN),
        payload: emission.payload,
    };
    for number in item.programme_numbers() {
        block.push_programme(number);
    }
    block
}
