//! Per-format document loaders.
//!
//! Plain text is read directly (with a lossy fallback for stray
//! encodings). Hypertext is stripped to visible text. Portable documents
//! go through text extraction. Structured markup holds one record per
//! book and is returned pre-chunked, one formatted text per record.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use docqa_core::error::{Error, Result};
use docqa_core::types::DocFormat;

/// A loaded document body: either free text to be chunked, or records
/// that are already chunk-sized and bypass the splitter.
#[derive(Debug, Clone)]
pub enum LoadedDocument {
    Body(String),
    Records(Vec<String>),
}

pub fn load_document(path: &Path, format: DocFormat) -> Result<LoadedDocument> {
    match format {
        DocFormat::PlainText => Ok(LoadedDocument::Body(read_text(path)?)),
        DocFormat::Hypertext => {
            let raw = read_text(path)?;
            Ok(LoadedDocument::Body(strip_markup(&raw)))
        }
        DocFormat::PortableDocument => {
            let text = pdf_extract::extract_text(path)
                .map_err(|e| Error::InvalidInput(format!("failed to extract text from {}: {e}", path.display())))?;
            if text.trim().is_empty() {
                return Err(Error::InvalidInput(format!("no text extracted from {}", path.display())));
            }
            Ok(LoadedDocument::Body(text))
        }
        DocFormat::StructuredMarkup => {
            let raw = read_text(path)?;
            Ok(LoadedDocument::Records(parse_book_records(&raw)?))
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(path)
                .map_err(|e| Error::InvalidInput(format!("failed to read {}: {e}", path.display())))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}

/// Collect the visible text of an HTML page, paragraph-separated so the
/// chunker sees the same boundaries a text file would have.
fn strip_markup(raw: &str) -> String {
    let document = scraper::Html::parse_document(raw);
    let selector = scraper::Selector::parse("body").expect("static selector");
    let root = document.select(&selector).next();
    let texts: Vec<String> = match root {
        Some(body) => body
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        None => document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    };
    texts.join("\n\n")
}

#[derive(Debug, Deserialize)]
struct BookFile {
    books: Vec<BookRecord>,
}

#[derive(Debug, Deserialize)]
struct BookRecord {
    title: String,
    author: String,
    genre: String,
    publication_year: u32,
    description: String,
    #[serde(default)]
    reviews: Reviews,
}

#[derive(Debug, Deserialize, Default)]
struct Reviews {
    #[serde(default)]
    positive: String,
    #[serde(default)]
    negative: String,
}

/// Flatten each book record into one readable text block. Records are
/// already chunk-sized, so they skip the splitter.
fn parse_book_records(raw: &str) -> Result<Vec<String>> {
    let file: BookFile = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidInput(format!("malformed structured-markup file: {e}")))?;
    Ok(file
        .books
        .into_iter()
        .map(|b| {
            format!(
                "Title: {}\nAuthor: {}\nGenre: {}\nPublication Year: {}\nDescription: {}\nPositive Review: {}\nNegative Review: {}",
                b.title,
                b.author,
                b.genre,
                b.publication_year,
                b.description,
                b.reviews.positive,
                b.reviews.negative
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_markup_keeps_visible_text_only() {
        let html = "<html><head><title>t</title></head>\
                    <body><h1>Climate</h1><p>Warming <b>accelerates</b>.</p></body></html>";
        let text = strip_markup(html);
        assert!(text.contains("Climate"));
        assert!(text.contains("accelerates"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn book_records_are_pre_chunked() {
        let raw = r#"{"books":[{"title":"Dune","author":"Frank Herbert","genre":"SF",
            "publication_year":1965,"description":"Desert planet.",
            "reviews":{"positive":"Epic.","negative":"Dense."}}]}"#;
        let records = parse_book_records(raw).expect("records");
        assert_eq!(records.len(), 1);
        assert!(records[0].starts_with("Title: Dune"));
        assert!(records[0].contains("Publication Year: 1965"));
        assert!(records[0].contains("Negative Review: Dense."));
    }

    #[test]
    fn malformed_markup_is_invalid_input() {
        let err = parse_book_records("{\"books\": 3}").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
