//! Chunk store builder: walks the document folder, resolves each file's
//! format, assigns its topic from the configured collection policy and
//! emits indexed chunks.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use docqa_core::config::{ChunkingSettings, RoutingSettings};
use docqa_core::error::Result;
use docqa_core::types::{DocFormat, DocumentChunk, Topic};

use crate::chunker::Chunker;
use crate::loader::{load_document, LoadedDocument};

/// A document discovered in the collection folder.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub filename: String,
    pub format: DocFormat,
    pub topic: Topic,
}

pub struct ChunkStoreBuilder {
    chunker: Chunker,
    routing: RoutingSettings,
}

impl ChunkStoreBuilder {
    pub fn new(chunking: ChunkingSettings, routing: RoutingSettings) -> Self {
        Self { chunker: Chunker::new(chunking), routing }
    }

    /// List supported documents under `docs_dir`, sorted by path for
    /// deterministic chunk ids. Files with unknown extensions are
    /// skipped with a warning.
    pub fn scan_documents(&self, docs_dir: &Path) -> Result<Vec<SourceDocument>> {
        let mut documents = Vec::new();
        for entry in WalkDir::new(docs_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path().to_path_buf();
            let Some(format) = DocFormat::from_path(&path) else {
                warn!(path = %path.display(), "skipping unsupported file type");
                continue;
            };
            let topic = self.routing.topic_for_format(format)?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            documents.push(SourceDocument { path, filename, format, topic });
        }
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(documents)
    }

    /// Load, split and tag every document in the folder.
    pub fn build_chunks(&self, docs_dir: &Path) -> Result<Vec<DocumentChunk>> {
        let documents = self.scan_documents(docs_dir)?;
        if documents.is_empty() {
            info!(dir = %docs_dir.display(), "no supported documents found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (i, doc) in documents.iter().enumerate() {
            debug!(file = %doc.filename, "processing document {}/{}", i + 1, documents.len());
            all_chunks.extend(self.chunk_document(doc)?);
        }
        info!(files = documents.len(), chunks = all_chunks.len(), "chunked collection");
        Ok(all_chunks)
    }

    pub fn chunk_document(&self, doc: &SourceDocument) -> Result<Vec<DocumentChunk>> {
        let texts = match load_document(&doc.path, doc.format)? {
            LoadedDocument::Body(body) => self.chunker.chunk(&body),
            // structured-markup records are already chunk-sized
            LoadedDocument::Records(records) => records,
        };
        let total_chunks = texts.len();
        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                id: format!("{}:{}", doc.filename, chunk_index),
                filename: doc.filename.clone(),
                topic: doc.topic,
                format: doc.format,
                content,
                chunk_index,
                total_chunks,
            })
            .collect())
    }
}
