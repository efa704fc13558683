use docrag_core::traits::Embedder;
use docrag_core::types::{Chunk, SourceInfo};
use docrag_embed::HashEmbedder;
use docrag_index::VectorStore;

fn chunk(text: &str) -> Chunk {
    Chunk { text: text.to_string(), start: 0, end: text.len() }
}

fn store() -> VectorStore {
    VectorStore::new(Box::new(HashEmbedder::default()))
}

/// An embedder that must never be called. Used to prove that some code
/// paths short-circuit before embedding.
struct PanickingEmbedder;

impl Embedder for PanickingEmbedder {
    fn dim(&self) -> usize {
        8
    }

    fn model_name(&self) -> &str {
        "panicking"
    }

    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        panic!("embed_batch called on an empty index");
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize {
        8
    }

    fn model_name(&self) -> &str {
        "failing"
    }

    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model offline")
    }
}

#[test]
fn empty_index_search_never_embeds() {
    let store = VectorStore::new(Box::new(PanickingEmbedder));
    let results = store.search("anything", 5).expect("search");
    assert!(results.is_empty());
}

#[test]
fn empty_add_is_a_noop() {
    let mut store = VectorStore::new(Box::new(PanickingEmbedder));
    store.add(&[], None).expect("add");
    assert!(store.is_empty());
}

#[test]
fn failed_embedding_leaves_the_store_unchanged() {
    let mut store = VectorStore::new(Box::new(FailingEmbedder));
    let err = store.add(&[chunk("hello")], None).unwrap_err();
    assert!(err.to_string().contains("model offline"));
    assert!(store.is_empty());
}

#[test]
fn chunk_indices_are_assigned_in_insertion_order() {
    let mut store = store();
    store
        .add(&[chunk("first"), chunk("second")], None)
        .expect("add");
    store.add(&[chunk("third")], None).expect("add");

    let indices: Vec<usize> = store.entries().iter().map(|e| e.chunk_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn search_ranks_by_distance_and_derives_similarity() {
    let mut store = store();
    store
        .add(
            &[
                chunk("the cat sat on the mat"),
                chunk("rust borrow checker errors"),
                chunk("a cat and another cat"),
            ],
            None,
        )
        .expect("add");

    let results = store.search("the cat sat on the mat", 3).expect("search");
    assert_eq!(results.len(), 3);

    // Exact text match embeds identically, so distance 0, similarity 1.
    assert_eq!(results[0].text, "the cat sat on the mat");
    assert!(results[0].score.abs() <= 1e-6);
    assert!((results[0].similarity - 1.0).abs() <= 1e-6);

    for pair in results.windows(2) {
        assert!(pair[0].score <= pair[1].score, "ascending distance");
        assert!(pair[0].similarity >= pair[1].similarity, "descending similarity");
    }
    for r in &results {
        assert!((r.similarity - 1.0 / (1.0 + r.score)).abs() <= 1e-6);
    }
}

#[test]
fn top_k_is_capped_by_index_size() {
    let mut store = store();
    store
        .add(&[chunk("The cat sat. The dog ran.")], None)
        .expect("add");

    assert_eq!(store.get_stats().total_chunks, 1);
    let results = store.search("cat", 3).expect("search");
    assert_eq!(results.len(), 1);
}

#[test]
fn source_info_travels_into_results() {
    let mut store = store();
    let mut source = SourceInfo::new();
    source.insert("filename".to_string(), "notes.txt".to_string());

    store.add(&[chunk("tagged chunk")], Some(&source)).expect("add");
    let results = store.search("tagged chunk", 1).expect("search");
    assert_eq!(results[0].metadata.get("filename").map(String::as_str), Some("notes.txt"));
}

#[test]
fn stats_report_dimension_and_model() {
    let store = store();
    let stats = store.get_stats();
    assert_eq!(stats.total_chunks, 0);
    assert_eq!(stats.dimension, docrag_embed::HASH_DIM);
    assert_eq!(stats.model_name, "hash-embedder");
}

#[test]
fn snapshot_round_trip_restores_search() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vectors_path = dir.path().join("vectors.bin");
    let metadata_path = dir.path().join("metadata.json");

    let mut store = store();
    store
        .add(&[chunk("alpha beta gamma"), chunk("delta epsilon")], None)
        .expect("add");
    let before = store.search("alpha beta gamma", 2).expect("search");
    store.save(&vectors_path, &metadata_path).expect("save");

    store.clear();
    assert!(store.is_empty());

    store.load(&vectors_path, &metadata_path).expect("load");
    assert_eq!(store.get_stats().total_chunks, 2);

    let after = store.search("alpha beta gamma", 2).expect("search");
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.text, a.text);
        assert_eq!(b.chunk_index, a.chunk_index);
        assert!((b.score - a.score).abs() <= 1e-6);
    }
}

#[test]
fn loading_missing_files_is_a_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = store();
    store
        .load(&dir.path().join("vectors.bin"), &dir.path().join("metadata.json"))
        .expect("load");
    assert!(store.is_empty());
}

#[test]
fn mismatched_snapshot_halves_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vectors_path = dir.path().join("vectors.bin");
    let metadata_path = dir.path().join("metadata.json");

    let mut store = store();
    store.add(&[chunk("only one")], None).expect("add");
    store.save(&vectors_path, &metadata_path).expect("save");

    // Drop the vector half; the metadata alone must not load cleanly.
    std::fs::remove_file(&vectors_path).expect("remove");
    let mut fresh = store;
    fresh.clear();
    let err = fresh.load(&vectors_path, &metadata_path).unwrap_err();
    assert!(err.to_string().contains("mismatch"), "{err}");
}
