//! Resolution of an ADM document into renderable items.

use std::collections::{BTreeMap, HashMap, HashSet};

use admkit_document::{
    AdmDocument, AudioChannelFormat, AudioChannelFormatId, AudioContent, AudioContentId,
    AudioObject, AudioObjectId, AudioPackFormat, AudioPackFormatId, AudioProgramme,
    AudioStreamFormat, AudioTrackFormat, AudioTrackUid, AudioTrackUidId, ChannelResolver,
    TypeDefinition,
};

use crate::item::{
    presented_name, ItemChannelId, ItemId, ItemTree, RenderableItem, RenderableItemChannel,
};

/// Programme and content a traversal is currently under.
#[derive(Clone, Copy, Default)]
struct Path<'a> {
    programme: Option<&'a AudioProgramme>,
    content: Option<&'a AudioContent>,
}

struct Walk<'a> {
    document: &'a AdmDocument,
    resolver: &'a dyn ChannelResolver,
    reached: HashSet<&'a AudioObjectId>,
}

/// Deduplicated renderable items of a document.
///
/// Channels and items live in arenas that only grow; items refer to their
/// channels by slot and channels refer back to their item by identity.
#[derive(Debug, Default)]
pub struct ItemGraph {
    pub(crate) channels: Vec<RenderableItemChannel>,
    channel_index: HashMap<ItemChannelId, usize>,
    pub(crate) items: Vec<RenderableItem>,
    item_index: HashMap<ItemId, usize>,
    /// Slots of valid items, in the order they became valid.
    pub(crate) valid: Vec<usize>,
}

impl ItemGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every leaf track reference not seen before. Returns the
    /// number of newly created channels.
    ///
    /// Programmes are walked first, then contents no programme references,
    /// then objects no content reaches. Every track UID is finally registered
    /// on its own as an unowned, invalid channel so the leaf count of the
    /// document and the channel count of the graph stay in step.
    pub fn discover(&mut self, document: &AdmDocument, resolver: &dyn ChannelResolver) -> usize {
        let leaf_references = document.leaf_reference_count();
        if leaf_references == self.channels.len() {
            return 0;
        }
        if leaf_references < self.channels.len() {
            tracing::error!(
                leaf_references,
                known = self.channels.len(),
                "document has fewer leaf references than resolved channels"
            );
            return 0;
        }

        let mut walk = Walk {
            document,
            resolver,
            reached: HashSet::new(),
        };
        let before = self.channels.len();

        let mut listed: HashSet<&AudioContentId> = HashSet::new();
        for programme in document.elements::<AudioProgramme>() {
            for content_id in &programme.contents {
                if let Some(content) = document.lookup::<AudioContent>(content_id) {
                    listed.insert(&content.id);
                    let path = Path {
                        programme: Some(programme),
                        content: Some(content),
                    };
                    self.visit_content(&mut walk, path);
                }
            }
        }
        for content in document.elements::<AudioContent>() {
            if listed.contains(&content.id) {
                continue;
            }
            let path = Path {
                programme: None,
                content: Some(content),
            };
            self.visit_content(&mut walk, path);
        }

        let nested: HashSet<&AudioObjectId> = document
            .elements::<AudioObject>()
            .flat_map(|object| object.objects.iter())
            .collect();
        // Roots first so nested objects keep their full tree; objects only
        // reachable through a nesting loop are picked up afterwards.
        let roots = document
            .elements::<AudioObject>()
            .filter(|object| !nested.contains(&object.id));
        for object in roots.chain(document.elements::<AudioObject>()) {
            if walk.reached.contains(&object.id) {
                continue;
            }
            let mut tree = vec![object.id.clone()];
            self.visit_object(&mut walk, Path::default(), &mut tree);
        }

        for uid in document.elements::<AudioTrackUid>() {
            self.visit_track_uid(&walk, Path::default(), &[], &uid.id);
        }

        let created = self.channels.len() - before;
        tracing::debug!(
            created,
            channels = self.channels.len(),
            items = self.items.len(),
            valid = self.valid.len(),
            "discovery finished"
        );
        created
    }

    fn visit_content<'a>(&mut self, walk: &mut Walk<'a>, path: Path<'a>) {
        let Some(content) = path.content else {
            return;
        };
        for object_id in &content.objects {
            let mut tree = vec![object_id.clone()];
            self.visit_object(walk, path, &mut tree);
        }
    }

    fn visit_object<'a>(
        &mut self,
        walk: &mut Walk<'a>,
        path: Path<'a>,
        tree: &mut Vec<AudioObjectId>,
    ) {
        let document = walk.document;
        let Some(object) = tree
            .last()
            .and_then(|id| document.lookup::<AudioObject>(id))
        else {
            return;
        };
        walk.reached.insert(&object.id);

        for nested in &object.objects {
            if tree.contains(nested) {
                tracing::warn!(object = %nested, "object nests itself, skipping");
                continue;
            }
            tree.push(nested.clone());
            self.visit_object(walk, path, tree);
            tree.pop();
        }
        for uid in &object.track_uids {
            self.visit_track_uid(walk, path, tree, uid);
        }
    }

    fn visit_track_uid(
        &mut self,
        walk: &Walk<'_>,
        path: Path<'_>,
        tree: &[AudioObjectId],
        uid: &AudioTrackUidId,
    ) {
        let owner = tree
            .last()
            .and_then(|id| walk.document.lookup::<AudioObject>(id));
        let channel_id = ItemChannelId::new(owner.map(|object| &object.id), uid);

        let channel_slot = match self.channel_index.get(&channel_id) {
            Some(&slot) => slot,
            None => {
                let channel = resolve_channel(walk, owner, channel_id, uid);
                let slot = self.channels.len();
                self.channels.push(channel);
                self.channel_index.insert(channel_id, slot);
                slot
            }
        };

        let channel = &mut self.channels[channel_slot];
        let Some(owner) = owner else {
            channel.valid = false;
            return;
        };
        let item_id = match channel.type_definition {
            TypeDefinition::Objects | TypeDefinition::DirectSpeakers => {
                ItemId::independent(&owner.id, uid)
            }
            TypeDefinition::Hoa => ItemId::grouped(&owner.id),
            _ => {
                channel.valid = false;
                return;
            }
        };
        channel.item = Some(item_id);

        let item_slot = match self.item_index.get(&item_id) {
            Some(&slot) => slot,
            None => {
                let item = self.new_item(walk, item_id, owner, tree, channel_slot);
                let slot = self.items.len();
                self.items.push(item);
                self.item_index.insert(item_id, slot);
                slot
            }
        };

        let item = &mut self.items[item_slot];
        let programme = path.programme.map(|programme| &programme.id);
        let content = path.content.map(|content| &content.id);
        if !item
            .trees
            .iter()
            .any(|entry| entry.matches(programme, content))
        {
            item.trees.push(ItemTree::new(programme, content));
        }
        item.channels.insert(channel_id, channel_slot);

        self.refresh_validity(item_slot);
    }

    fn new_item(
        &self,
        walk: &Walk<'_>,
        id: ItemId,
        owner: &AudioObject,
        tree: &[AudioObjectId],
        channel_slot: usize,
    ) -> RenderableItem {
        let channel = &self.channels[channel_slot];
        let pack_name = channel
            .pack_format()
            .and_then(|id| walk.document.lookup::<AudioPackFormat>(id))
            .and_then(|pack| pack.name.as_deref());
        let channel_name = channel
            .channel_format
            .as_ref()
            .and_then(|id| walk.document.lookup::<AudioChannelFormat>(id))
            .and_then(|format| format.name.as_deref());

        let start_time = owner.start.map_or(0.0, |start| start.as_seconds());
        let duration = owner
            .duration
            .map_or(f64::INFINITY, |duration| duration.as_seconds());

        RenderableItem {
            id,
            type_definition: channel.type_definition,
            object_tree: tree.to_vec(),
            presented_name: presented_name(
                owner.name.as_deref(),
                pack_name,
                channel_name,
                channel.type_definition,
            ),
            start_time,
            duration,
            end_time: start_time + duration,
            trees: Vec::new(),
            channels: BTreeMap::new(),
        }
    }

    fn refresh_validity(&mut self, item_slot: usize) {
        let valid = self.items[item_slot]
            .channels
            .values()
            .all(|&slot| self.channels[slot].valid);
        let position = self.valid.iter().position(|&slot| slot == item_slot);
        match (valid, position) {
            (true, None) => self.valid.push(item_slot),
            (false, Some(position)) => {
                self.valid.remove(position);
            }
            _ => {}
        }
    }

    pub fn channel(&self, id: ItemChannelId) -> Option<&RenderableItemChannel> {
        self.channel_index.get(&id).map(|&slot| &self.channels[slot])
    }

    pub fn item(&self, id: ItemId) -> Option<&RenderableItem> {
        self.item_index.get(&id).map(|&slot| &self.items[slot])
    }

    /// Channels of an item in identity order.
    pub fn item_channels<'a>(
        &'a self,
        item: &'a RenderableItem,
    ) -> impl Iterator<Item = &'a RenderableItemChannel> + 'a {
        item.channels.values().map(move |&slot| &self.channels[slot])
    }

    pub fn channels(&self) -> impl Iterator<Item = &RenderableItemChannel> {
        self.channels.iter()
    }

    pub fn items(&self) -> impl Iterator<Item = &RenderableItem> {
        self.items.iter()
    }

    /// Valid items in the order they became valid.
    pub fn valid_items(&self) -> impl Iterator<Item = &RenderableItem> {
        self.valid.iter().map(move |&slot| &self.items[slot])
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }
}

fn resolve_channel(
    walk: &Walk<'_>,
    owner: Option<&AudioObject>,
    id: ItemChannelId,
    uid: &AudioTrackUidId,
) -> RenderableItemChannel {
    let document = walk.document;
    let track_format = document
        .lookup::<AudioTrackUid>(uid)
        .and_then(|uid| uid.track_format.clone());
    let stream_format = track_format
        .as_ref()
        .and_then(|id| document.lookup::<AudioTrackFormat>(id))
        .and_then(|format| format.stream_format.clone());
    let channel_format = stream_format
        .as_ref()
        .and_then(|id| document.lookup::<AudioStreamFormat>(id))
        .and_then(|format| format.channel_format.as_ref())
        .and_then(|id| document.lookup::<AudioChannelFormat>(id));

    let mut pack_format_tree = Vec::new();
    if let (Some(owner), Some(format)) = (owner, channel_format) {
        for pack in &owner.pack_formats {
            if trace_pack_path(document, pack, &format.id, &mut pack_format_tree) {
                break;
            }
        }
    }
    let pack = pack_format_tree
        .last()
        .and_then(|id| document.lookup::<AudioPackFormat>(id));

    let source_channel = walk.resolver.channel_for(uid);
    let frequency = channel_format.and_then(|format| format.frequency);

    RenderableItemChannel {
        id,
        item: None,
        track_uid: uid.clone(),
        track_format,
        stream_format,
        channel_format: channel_format.map(|format| format.id.clone()),
        type_definition: pack.map_or(TypeDefinition::Undefined, |pack| pack.type_definition),
        absolute_distance: pack.and_then(|pack| pack.absolute_distance),
        low_pass: frequency.and_then(|frequency| frequency.low_pass),
        high_pass: frequency.and_then(|frequency| frequency.high_pass),
        valid: channel_format.is_some() && pack.is_some() && source_channel.is_some(),
        pack_format_tree,
        source_channel,
        cursor: None,
    }
}

/// Depth-first search from `from` for a pack holding `target`. On success
/// `path` holds the packs from `from` down to the holder.
fn trace_pack_path(
    document: &AdmDocument,
    from: &AudioPackFormatId,
    target: &AudioChannelFormatId,
    path: &mut Vec<AudioPackFormatId>,
) -> bool {
    if path.contains(from) {
        return false;
    }
    let Some(pack) = document.lookup::<AudioPackFormat>(from) else {
        return false;
    };
    path.push(from.clone());
    if pack.channel_formats.contains(target) {
        return true;
    }
    for nested in &pack.pack_formats {
        if trace_pack_path(document, nested, target, path) {
            return true;
        }
    }
    path.pop();
    false
}
