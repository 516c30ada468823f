use admkit_document::{AdmDocument, ChannelTable, DocumentData};
use admkit_metadata::{ItemId, MetadataExtractor};
use admkit_tests::{object_block, object_id, SceneBuilder};
use pretty_assertions::assert_eq;

fn mixed_scene() -> SceneBuilder {
    let mut scene = SceneBuilder::new();
    scene
        .object(0x1001, "Dialogue", vec![object_block(0, 500, 0.0)])
        .object(0x1002, "Effects", vec![object_block(0, 500, 90.0)])
        .direct_speakers(0x1003, "Stereo", &["M+030", "M-030"])
        .hoa(0x1004, "Ambience", &[(0, 0, &[0]), (1, -1, &[0]), (1, 0, &[0]), (1, 1, &[0])])
        .programme(0x1001, &[(0x1001, &[0x1001, 0x1003]), (0x1002, &[0x1001, 0x1004])]);
    scene
}

fn valid_ids(extractor: &MetadataExtractor) -> Vec<ItemId> {
    extractor.graph().valid_items().map(|item| item.id).collect()
}

#[test]
fn repeated_discovery_is_a_no_op() {
    let (document, table) = mixed_scene().build();
    let mut extractor = MetadataExtractor::new();

    assert_eq!(extractor.discover(&document, &table), 16);
    let first = valid_ids(&extractor);
    assert_eq!(first.len(), 5);

    assert_eq!(extractor.discover(&document, &table), 0);
    assert_eq!(extractor.discover(&document, &table), 0);
    assert_eq!(valid_ids(&extractor), first);
}

#[test]
fn shared_objects_collapse_into_one_item_per_path() {
    let (document, table) = mixed_scene().build();
    let mut extractor = MetadataExtractor::new();
    extractor.discover(&document, &table);
    let graph = extractor.graph();

    let dialogue = graph
        .items()
        .find(|item| item.presented_name == "Dialogue")
        .unwrap();
    assert_eq!(dialogue.trees.len(), 2);
    assert_eq!(
        dialogue.trees.iter().map(|tree| tree.content_number).collect::<Vec<_>>(),
        vec![0x1001, 0x1002]
    );
    assert_eq!(dialogue.programme_numbers().collect::<Vec<_>>(), vec![0x1001, 0x1001]);

    let effects = graph
        .items()
        .find(|item| item.presented_name == "Effects")
        .unwrap();
    assert!(effects.trees.iter().all(|tree| tree.programme.is_none()));

    let ambience = graph.item(ItemId::grouped(&object_id(0x1004))).unwrap();
    assert_eq!(ambience.channel_count(), 4);

    let speakers: Vec<_> = graph
        .items()
        .filter(|item| item.presented_name.starts_with("Stereo"))
        .map(|item| item.presented_name.clone())
        .collect();
    assert_eq!(speakers, vec!["Stereo -> M+030", "Stereo -> M-030"]);
}

#[test]
fn unresolvable_references_stay_registered_but_invalid() {
    let mut scene = SceneBuilder::new();
    scene
        .object(0x1001, "Dialogue", vec![object_block(0, 500, 0.0)])
        .stray_uid();
    let (document, table) = scene.build();

    // The table only knows the stray UID, so the object channel has no source.
    let stray_only = ChannelTable::new(table.rows()[1..].to_vec());
    let mut extractor = MetadataExtractor::new();
    assert_eq!(extractor.discover(&document, &stray_only), 3);
    assert_eq!(extractor.graph().valid_count(), 0);
    assert!(extractor.graph().channels().all(|channel| !channel.valid));
    assert_eq!(extractor.discover(&document, &stray_only), 0);
}

#[test]
fn growing_documents_only_add_items() {
    let mut scene = SceneBuilder::new();
    scene.object(0x1001, "Dialogue", vec![object_block(0, 500, 0.0)]);
    let (document, table) = scene.build();
    let mut extractor = MetadataExtractor::new();
    // One (object, uid) pair plus the UID on its own.
    assert_eq!(extractor.discover(&document, &table), 2);
    let before = valid_ids(&extractor);

    // The builder keeps its elements, so the next snapshot is a superset.
    scene.object(0x1002, "Effects", vec![object_block(0, 500, 90.0)]);
    let (grown, grown_table) = scene.build();
    assert_eq!(extractor.discover(&grown, &grown_table), 2);
    let after = valid_ids(&extractor);
    assert_eq!(after.len(), 2);
    assert_eq!(after[..1], before[..]);
    assert_eq!(extractor.discover(&grown, &grown_table), 0);
}

#[test]
fn items_leave_the_stream_when_a_linked_channel_does_not_resolve() {
    let mut scene = SceneBuilder::new();
    scene.hoa(0x1004, "Room", &[(0, 0, &[0, 250]), (1, -1, &[0])]);
    let (full, table) = scene.build();
    // Only the first track is in the file.
    let first_track = ChannelTable::new(table.rows()[..1].to_vec());
    let mut data = DocumentData::from(full.clone());
    data.objects[0].track_uids.truncate(1);
    let partial = AdmDocument::try_from(data).unwrap();

    let mut extractor = MetadataExtractor::new();
    assert_eq!(extractor.discover(&partial, &first_track), 3);
    assert_eq!(extractor.graph().valid_count(), 1);
    assert!(extractor.next_block(&partial).is_some());

    assert_eq!(extractor.discover(&full, &first_track), 1);
    assert_eq!(extractor.graph().item_count(), 1);
    assert_eq!(extractor.graph().valid_count(), 0);
    assert!(valid_ids(&extractor).is_empty());
    assert!(extractor.next_block(&full).is_none());
}
