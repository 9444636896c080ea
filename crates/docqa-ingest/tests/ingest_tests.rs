use std::fs;
use tempfile::TempDir;

use docqa_core::config::{ChunkingSettings, RoutingSettings};
use docqa_core::types::{DocFormat, Topic};
use docqa_ingest::ChunkStoreBuilder;

fn builder() -> ChunkStoreBuilder {
    ChunkStoreBuilder::new(ChunkingSettings::default(), RoutingSettings::default())
}

#[test]
fn topics_are_inherited_from_the_configured_format_map() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("tesla.txt"), "Nikola Tesla was an inventor.").unwrap();
    fs::write(
        tmp.path().join("climate.html"),
        "<html><body><p>Climate change impacts ecosystems.</p></body></html>",
    )
    .unwrap();

    let chunks = builder().build_chunks(tmp.path()).expect("build chunks");
    assert_eq!(chunks.len(), 2);

    let txt = chunks.iter().find(|c| c.filename == "tesla.txt").expect("txt chunk");
    assert_eq!(txt.topic, Topic::People);
    assert_eq!(txt.format, DocFormat::PlainText);

    let html = chunks.iter().find(|c| c.filename == "climate.html").expect("html chunk");
    assert_eq!(html.topic, Topic::Science);
    assert!(html.content.contains("Climate change"));
    assert!(!html.content.contains("<p>"));
}

#[test]
fn chunk_ids_and_indices_are_per_document() {
    let tmp = TempDir::new().unwrap();
    let long_doc = "A paragraph about someone notable.\n\n".repeat(60);
    fs::write(tmp.path().join("bio.txt"), &long_doc).unwrap();

    let chunks = builder().build_chunks(tmp.path()).expect("build chunks");
    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i);
        assert_eq!(chunk.id, format!("bio.txt:{i}"));
        assert_eq!(chunk.total_chunks, chunks.len());
        assert!(chunk.content.len() <= ChunkingSettings::default().chunk_size);
    }
}

#[test]
fn structured_markup_records_bypass_the_splitter() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("books.json"),
        r#"{"books":[
            {"title":"A","author":"X","genre":"G","publication_year":2001,
             "description":"First.","reviews":{"positive":"p","negative":"n"}},
            {"title":"B","author":"Y","genre":"G","publication_year":2002,
             "description":"Second.","reviews":{"positive":"p","negative":"n"}}
        ]}"#,
    )
    .unwrap();

    let chunks = builder().build_chunks(tmp.path()).expect("build chunks");
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| c.topic == Topic::Literature));
    assert!(chunks.iter().all(|c| c.format == DocFormat::StructuredMarkup));
    assert!(chunks[0].content.starts_with("Title: A"));
    assert!(chunks[1].content.starts_with("Title: B"));
}

#[test]
fn unsupported_files_are_skipped() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("notes.txt"), "kept").unwrap();
    fs::write(tmp.path().join("binary.bin"), [0u8, 1, 2]).unwrap();

    let docs = builder().scan_documents(tmp.path()).expect("scan");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].filename, "notes.txt");
}
