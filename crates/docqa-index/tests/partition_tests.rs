use tempfile::TempDir;

use docqa_core::error::Error;
use docqa_core::traits::{EmbeddingProvider, VectorStore};
use docqa_core::types::{DocFormat, DocumentChunk, PartitionId, ProviderKind, Topic};
use docqa_embed::FakeProvider;
use docqa_index::{open_db, LancePartition};

const DIM: usize = 64;

fn chunk(id: &str, filename: &str, content: &str) -> DocumentChunk {
    DocumentChunk {
        id: id.to_string(),
        filename: filename.to_string(),
        topic: Topic::People,
        format: DocFormat::PlainText,
        content: content.to_string(),
        chunk_index: 0,
        total_chunks: 1,
    }
}

async fn embed(texts: &[&str]) -> Vec<Vec<f32>> {
    let provider = FakeProvider::new(ProviderKind::Local, DIM);
    let texts: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
    provider.embed_batch(&texts).await.expect("embed")
}

async fn partition(tmp: &TempDir) -> LancePartition {
    let conn = open_db(&tmp.path().to_string_lossy()).await.expect("open db");
    LancePartition::new(conn, PartitionId::Local, DIM)
}

#[tokio::test]
async fn search_before_build_is_index_not_ready() {
    let tmp = TempDir::new().expect("tempdir");
    let store = partition(&tmp).await;
    assert!(!store.is_ready().await.expect("is_ready"));
    let query = embed(&["anything"]).await.remove(0);
    let err = store.search(&query, 3, None, None).await.unwrap_err();
    assert!(matches!(err, Error::IndexNotReady(PartitionId::Local)));
}

#[tokio::test]
async fn rebuild_then_search_ranks_by_ascending_distance() {
    let tmp = TempDir::new().expect("tempdir");
    let store = partition(&tmp).await;

    let chunks = vec![
        chunk("tesla.txt:0", "tesla.txt", "Nikola Tesla pioneered alternating current"),
        chunk("tesla.txt:1", "tesla.txt", "He experimented with wireless power"),
        chunk("curie.txt:0", "curie.txt", "Marie Curie studied radioactivity"),
    ];
    let vectors =
        embed(&[&chunks[0].content, &chunks[1].content, &chunks[2].content]).await;
    store.rebuild(&chunks, &vectors).await.expect("rebuild");
    assert!(store.is_ready().await.expect("is_ready"));
    assert_eq!(store.count().await.expect("count"), 3);

    let query = embed(&["Nikola Tesla pioneered alternating current"]).await.remove(0);
    let hits = store.search(&query, 3, None, None).await.expect("search");
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.id, "tesla.txt:0");
    assert!(hits[0].distance < 1e-3, "exact match has ~zero distance");
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance, "ascending distance order");
    }
}

#[tokio::test]
async fn filename_filter_restricts_hits_to_that_file() {
    let tmp = TempDir::new().expect("tempdir");
    let store = partition(&tmp).await;

    let chunks = vec![
        chunk("tesla.txt:0", "tesla.txt", "Nikola Tesla pioneered alternating current"),
        chunk("curie.txt:0", "curie.txt", "Nikola Tesla pioneered alternating current"),
    ];
    let vectors = embed(&[&chunks[0].content, &chunks[1].content]).await;
    store.rebuild(&chunks, &vectors).await.expect("rebuild");

    let query = embed(&["Nikola Tesla"]).await.remove(0);
    let hits = store.search(&query, 5, None, Some("curie.txt")).await.expect("search");
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.chunk.filename == "curie.txt"));
}

#[tokio::test]
async fn topic_filter_restricts_hits_to_that_topic() {
    let tmp = TempDir::new().expect("tempdir");
    let store = partition(&tmp).await;

    let mut chunks = vec![
        chunk("tesla.txt:0", "tesla.txt", "Nikola Tesla pioneered alternating current"),
        chunk("dune.txt:0", "dune.txt", "Nikola Tesla pioneered alternating current"),
    ];
    chunks[1].topic = Topic::Literature;
    let vectors = embed(&[&chunks[0].content, &chunks[1].content]).await;
    store.rebuild(&chunks, &vectors).await.expect("rebuild");

    let query = embed(&["Nikola Tesla"]).await.remove(0);
    let hits = store
        .search(&query, 5, Some(Topic::Literature), None)
        .await
        .expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.id, "dune.txt:0");

    // a topic with no chunks yields an empty result, not an error
    let none = store
        .search(&query, 5, Some(Topic::Science), None)
        .await
        .expect("search");
    assert!(none.is_empty());
}

#[tokio::test]
async fn failed_rebuild_leaves_prior_content_queryable() {
    let tmp = TempDir::new().expect("tempdir");
    let store = partition(&tmp).await;

    let chunks = vec![chunk("a.txt:0", "a.txt", "original content")];
    let vectors = embed(&["original content"]).await;
    store.rebuild(&chunks, &vectors).await.expect("first rebuild");

    // wrong dimensionality forces the rebuild to fail before the swap
    let bad_vectors = vec![vec![0.5f32; DIM + 1]];
    let err = store
        .rebuild(&[chunk("b.txt:0", "b.txt", "replacement")], &bad_vectors)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));

    let query = embed(&["original content"]).await.remove(0);
    let hits = store.search(&query, 3, None, None).await.expect("search after failed rebuild");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.id, "a.txt:0");
}

#[tokio::test]
async fn rebuild_replaces_previous_content() {
    let tmp = TempDir::new().expect("tempdir");
    let store = partition(&tmp).await;

    let first = vec![chunk("a.txt:0", "a.txt", "first generation")];
    store.rebuild(&first, &embed(&["first generation"]).await).await.expect("rebuild");

    let second = vec![
        chunk("b.txt:0", "b.txt", "second generation"),
        chunk("b.txt:1", "b.txt", "more of the second"),
    ];
    store
        .rebuild(&second, &embed(&["second generation", "more of the second"]).await)
        .await
        .expect("second rebuild");

    assert_eq!(store.count().await.expect("count"), 2);
    let query = embed(&["first generation"]).await.remove(0);
    let hits = store.search(&query, 5, None, None).await.expect("search");
    assert!(hits.iter().all(|h| h.chunk.filename == "b.txt"));
}

#[tokio::test]
async fn upsert_updates_existing_chunks_by_id() {
    let tmp = TempDir::new().expect("tempdir");
    let store = partition(&tmp).await;

    let original = vec![chunk("a.txt:0", "a.txt", "old text")];
    store.rebuild(&original, &embed(&["old text"]).await).await.expect("rebuild");

    let updated = vec![chunk("a.txt:0", "a.txt", "new text")];
    store.upsert(&updated, &embed(&["new text"]).await).await.expect("upsert");

    assert_eq!(store.count().await.expect("count"), 1);
    let query = embed(&["new text"]).await.remove(0);
    let hits = store.search(&query, 1, None, None).await.expect("search");
    assert_eq!(hits[0].chunk.content, "new text");
}
