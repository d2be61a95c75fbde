use super::*;

fn unit(dimension: usize, hot: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimension];
    v[hot] = 1.0;
    v
}

fn record(source: &str) -> MetadataRecord {
    MetadataRecord::default().with_source(source).with_type("text")
}

#[test]
fn squared_l2_matches_hand_computation() {
    assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    assert_eq!(squared_l2(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
}

#[test]
fn index_rejects_wrong_dimension() {
    let mut index = VectorIndex::new(3);
    assert!(index.add(&[1.0, 2.0]).is_err());
    assert!(index.is_empty());

    index.add(&[1.0, 2.0, 3.0]).expect("matching dimension");
    assert_eq!(index.len(), 1);
    assert!(index.search(&[1.0], 1).is_err());
}

#[test]
fn index_returns_nearest_first() {
    let mut index = VectorIndex::new(2);
    index.add(&[10.0, 10.0]).expect("add");
    index.add(&[1.0, 1.0]).expect("add");
    index.add(&[5.0, 5.0]).expect("add");

    let neighbors = index.search(&[0.0, 0.0], 3).expect("search");
    let order: Vec<usize> = neighbors.iter().map(|n| n.index).collect();

    assert_eq!(order, vec![1, 2, 0]);
    assert_eq!(neighbors[0].distance, 2.0);
    assert!(neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn index_clamps_top_k() {
    let mut index = VectorIndex::new(2);
    index.add(&[1.0, 0.0]).expect("add");
    index.add(&[0.0, 1.0]).expect("add");

    assert_eq!(index.search(&[0.0, 0.0], 10).expect("search").len(), 2);
    assert!(index.search(&[0.0, 0.0], 0).expect("search").is_empty());
}

#[test]
fn equal_distances_keep_insertion_order() {
    let mut index = VectorIndex::new(2);
    index.add(&[1.0, 0.0]).expect("add");
    index.add(&[0.0, 1.0]).expect("add");
    index.add(&[-1.0, 0.0]).expect("add");

    let order: Vec<usize> = index
        .search(&[0.0, 0.0], 3)
        .expect("search")
        .iter()
        .map(|n| n.index)
        .collect();

    assert_eq!(order, vec![0, 1, 2]);
}

#[test]
fn rows_round_trip_through_from_rows() {
    let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
    let index = VectorIndex::from_rows(2, rows.clone()).expect("rows");

    assert_eq!(index.row(1), Some(&[3.0, 4.0][..]));
    assert_eq!(index.row(2), None);
    assert_eq!(index.rows().map(<[f32]>::to_vec).collect::<Vec<_>>(), rows);
}

#[test]
fn knowledge_base_keeps_sequences_parallel() {
    let mut kb = KnowledgeBase::new(4);
    kb.insert("first chunk".to_string(), record("a.txt"), &unit(4, 0))
        .expect("insert");
    kb.insert("second chunk".to_string(), record("b.txt"), &unit(4, 1))
        .expect("insert");

    assert!(
        kb.insert("bad".to_string(), record("c.txt"), &[1.0])
            .is_err()
    );

    assert_eq!(kb.len(), 2);
    assert_eq!(kb.index().len(), 2);
    assert_eq!(kb.documents().chunks().len(), 2);
    assert_eq!(kb.documents().metadata().len(), 2);
}

#[test]
fn knowledge_base_search_returns_chunks_with_metadata() {
    let mut kb = KnowledgeBase::new(4);
    kb.insert("hostel".to_string(), record("hostel.txt"), &unit(4, 0))
        .expect("insert");
    kb.insert("library".to_string(), record("library.txt"), &unit(4, 1))
        .expect("insert");

    let hits = kb.search(&unit(4, 1), 1).expect("search");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk, "library");
    assert_eq!(hits[0].metadata.source.as_deref(), Some("library.txt"));
    assert_eq!(hits[0].distance, 0.0);
}

#[test]
fn empty_knowledge_base_search_is_empty() {
    let kb = KnowledgeBase::new(4);
    assert!(kb.search(&unit(4, 0), 3).expect("search").is_empty());
}

#[test]
fn from_parts_rejects_mismatched_lengths() {
    let result = KnowledgeBase::from_parts(
        2,
        vec!["one".to_string(), "two".to_string()],
        vec![record("a.txt")],
        vec![vec![0.0, 1.0], vec![1.0, 0.0]],
    );
    assert!(result.is_err());

    let result = KnowledgeBase::from_parts(
        2,
        vec!["one".to_string()],
        vec![record("a.txt")],
        vec![vec![0.0, 1.0, 2.0]],
    );
    assert!(result.is_err());
}

#[test]
fn metadata_serializes_with_wire_names() {
    let meta = MetadataRecord::default()
        .with_source("prospectus.pdf")
        .with_type("pdf")
        .with_page(3)
        .with_extra("semester", 5_i64);
    let meta = MetadataRecord {
        chunk_index: Some(0),
        ..meta
    };

    let json = serde_json::to_value(&meta).expect("serialize");

    assert_eq!(
        json,
        serde_json::json!({
            "source": "prospectus.pdf",
            "type": "pdf",
            "page": 3,
            "chunk": 0,
            "semester": 5,
        })
    );

    let back: MetadataRecord = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, meta);
}

#[test]
fn metadata_unknown_keys_land_in_extra() {
    let meta: MetadataRecord = serde_json::from_value(serde_json::json!({
        "title": "Hostel Rules",
        "warden": "Dr. Rao",
    }))
    .expect("deserialize");

    assert_eq!(meta.title.as_deref(), Some("Hostel Rules"));
    assert_eq!(
        meta.extra.get("warden"),
        Some(&MetadataValue::Text("Dr. Rao".to_string()))
    );
}

#[test]
fn metadata_display_name_falls_back() {
    assert_eq!(MetadataRecord::titled("Library").display_name(), "Library");
    assert_eq!(record("a.txt").display_name(), "a.txt");
    assert_eq!(MetadataRecord::default().display_name(), "Unknown");
    assert!(MetadataRecord::default().with_type(IMAGE_TYPE).is_image());
    assert!(!record("a.txt").is_image());
}
