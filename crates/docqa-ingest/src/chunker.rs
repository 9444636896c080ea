//! Paragraph-aware chunker with bounded size and overlap.
//!
//! Deterministic given the same parameters. Chunk boundaries never cross
//! document boundaries; the caller invokes this once per document body.

use docqa_core::config::ChunkingSettings;

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(settings: ChunkingSettings) -> Self {
        let overlap = settings.chunk_overlap.min(settings.chunk_size / 2);
        Self { chunk_size: settings.chunk_size.max(1), chunk_overlap: overlap }
    }

    /// Split a document body into chunks of at most `chunk_size`
    /// characters. Paragraphs are packed greedily; a paragraph longer
    /// than the budget is split on word boundaries with `chunk_overlap`
    /// characters carried between consecutive windows.
    pub fn chunk(&self, body: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in body.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if paragraph.len() > self.chunk_size {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                chunks.extend(self.split_with_overlap(paragraph));
                continue;
            }
            // +2 for the paragraph separator we re-insert
            if !current.is_empty() && current.len() + 2 + paragraph.len() > self.chunk_size {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    fn split_with_overlap(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < words.len() {
            let mut end = start;
            let mut len = 0usize;
            while end < words.len() {
                let add = words[end].len() + usize::from(len > 0);
                if len + add > self.chunk_size && end > start {
                    break;
                }
                len += add;
                end += 1;
            }
            chunks.push(words[start..end].join(" "));
            if end >= words.len() {
                break;
            }
            // back up far enough to carry ~chunk_overlap characters
            let mut carried = 0usize;
            let mut overlap_words = 0usize;
            while overlap_words < end - start - 1 && carried < self.chunk_overlap {
                carried += words[end - 1 - overlap_words].len() + 1;
                overlap_words += 1;
            }
            start = end - overlap_words;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkingSettings { chunk_size: size, chunk_overlap: overlap })
    }

    #[test]
    fn short_paragraphs_pack_into_one_chunk() {
        let chunks = chunker(200, 20).chunk("first paragraph\n\nsecond paragraph");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("first paragraph"));
        assert!(chunks[0].contains("second paragraph"));
    }

    #[test]
    fn chunks_respect_size_bound() {
        let body = "word ".repeat(500);
        let chunks = chunker(120, 30).chunk(&body);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.len() <= 120, "chunk of {} chars exceeds bound", c.len());
        }
    }

    #[test]
    fn consecutive_windows_overlap() {
        let body: String = (0..200).map(|i| format!("w{i} ")).collect();
        let chunks = chunker(100, 30).chunk(&body);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail_word = pair[0].split_whitespace().last().expect("tail");
            assert!(
                pair[1].split_whitespace().any(|w| w == tail_word),
                "next window should re-include the previous tail"
            );
        }
    }

    #[test]
    fn deterministic_for_same_input() {
        let body = "alpha beta gamma\n\n".repeat(50);
        let a = chunker(150, 40).chunk(&body);
        let b = chunker(150, 40).chunk(&body);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_body_yields_no_chunks() {
        assert!(chunker(100, 10).chunk("  \n\n \n\n").is_empty());
    }
}
