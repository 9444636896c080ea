//! Domain types shared by the ingestion, index and query engines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

pub type ChunkId = String;

/// Source format of a document, resolved from its file extension.
///
/// The set is closed: a file with any other extension is rejected at
/// ingestion and an unresolvable filename restriction is rejected at
/// query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocFormat {
    PortableDocument,
    PlainText,
    StructuredMarkup,
    Hypertext,
}

impl DocFormat {
    pub const ALL: [DocFormat; 4] = [
        DocFormat::PortableDocument,
        DocFormat::PlainText,
        DocFormat::StructuredMarkup,
        DocFormat::Hypertext,
    ];

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocFormat::PortableDocument),
            "txt" => Some(DocFormat::PlainText),
            "json" => Some(DocFormat::StructuredMarkup),
            "html" | "htm" => Some(DocFormat::Hypertext),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocFormat::PortableDocument => "portable-document",
            DocFormat::PlainText => "plain-text",
            DocFormat::StructuredMarkup => "structured-markup",
            DocFormat::Hypertext => "hypertext",
        }
    }
}

impl FromStr for DocFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portable-document" | "pdf" => Ok(DocFormat::PortableDocument),
            "plain-text" | "txt" => Ok(DocFormat::PlainText),
            "structured-markup" | "json" => Ok(DocFormat::StructuredMarkup),
            "hypertext" | "html" => Ok(DocFormat::Hypertext),
            other => Err(Error::InvalidConfig(format!("unknown document format '{other}'"))),
        }
    }
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic label assigned to every document at ingestion, exactly one per
/// document and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Technology,
    Science,
    People,
    Literature,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::Technology,
        Topic::Science,
        Topic::People,
        Topic::Literature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Technology => "Technology",
            Topic::Science => "Science",
            Topic::People => "People",
            Topic::Literature => "Literature",
        }
    }
}

impl FromStr for Topic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technology" => Ok(Topic::Technology),
            "science" => Ok(Topic::Science),
            "people" => Ok(Topic::People),
            "literature" => Ok(Topic::Literature),
            other => Err(Error::InvalidInput(format!(
                "unknown topic '{other}' (expected one of Technology, Science, People, Literature)"
            ))),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two recognized question classes, driving which instruction block
/// is injected into the generation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    Factual,
    Interpretive,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Factual => "Factual",
            QuestionType::Interpretive => "Interpretive",
        }
    }
}

impl FromStr for QuestionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "factual" => Ok(QuestionType::Factual),
            "interpretive" => Ok(QuestionType::Interpretive),
            other => Err(Error::InvalidInput(format!(
                "unknown question type '{other}' (expected Factual or Interpretive)"
            ))),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies which embedding provider produced a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Remote,
    Local,
}

/// One of the two index partitions, keyed by the provider that built it.
/// Vectors from different providers are never compared in one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionId {
    Remote,
    Local,
}

impl PartitionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionId::Remote => "remote",
            PartitionId::Local => "local",
        }
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chunk of a source document that is independently embedded and
/// indexed.
///
/// - `id`: globally unique chunk identifier (`<filename>:<index>`)
/// - `filename`: base name of the source file
/// - `topic`: inherited from the document, immutable
/// - `format`: the source document's format
/// - `content`: the text payload
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub filename: String,
    pub topic: Topic,
    pub format: DocFormat,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A retrieval candidate: a chunk plus its cosine distance to the query
/// (1 - cosine similarity; lower is more similar).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub distance: f32,
}

/// Per-query classification, produced once and immutable thereafter.
/// Each axis is either user-supplied or model-inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub question_type: QuestionType,
    pub topic: Topic,
}

/// A user question plus optional constraints. An absent constraint
/// means "infer it", never an empty-string sentinel.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub text: String,
    pub filename: Option<String>,
    pub topic: Option<Topic>,
    pub question_type: Option<QuestionType>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }
}

/// Outcome of `answer_query`: either an answer grounded in retrieved
/// chunks, or the fallback message when nothing passed the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Grounded(String),
    Fallback(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            DocFormat::from_path(&PathBuf::from("paper.pdf")),
            Some(DocFormat::PortableDocument)
        );
        assert_eq!(
            DocFormat::from_path(&PathBuf::from("notes.TXT")),
            Some(DocFormat::PlainText)
        );
        assert_eq!(
            DocFormat::from_path(&PathBuf::from("page.htm")),
            Some(DocFormat::Hypertext)
        );
        assert_eq!(DocFormat::from_path(&PathBuf::from("archive.tar.gz")), None);
        assert_eq!(DocFormat::from_path(&PathBuf::from("noext")), None);
    }

    #[test]
    fn topic_parse_is_case_insensitive() {
        assert_eq!("literature".parse::<Topic>().ok(), Some(Topic::Literature));
        assert_eq!(" Science ".parse::<Topic>().ok(), Some(Topic::Science));
        assert!("Other".parse::<Topic>().is_err());
    }

    #[test]
    fn question_type_parse() {
        assert_eq!(
            "Factual".parse::<QuestionType>().ok(),
            Some(QuestionType::Factual)
        );
        assert!("Rhetorical".parse::<QuestionType>().is_err());
    }
}
