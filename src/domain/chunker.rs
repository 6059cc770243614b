use crate::domain::errors::ChunkingError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;

/// How far back from the tentative end the chunker looks for a sentence
/// terminator before giving up and cutting mid-sentence.
const SENTENCE_LOOKBACK: usize = 100;

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Splits text into overlapping, sentence-boundary-aware segments.
///
/// All positions are character positions, so multibyte input is safe. The
/// split is deterministic: the same input and settings always produce the
/// same chunks, and only ASCII `.`, `!`, `?` count as sentence ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// `overlap >= chunk_size` is allowed; forward progress is still
    /// guaranteed. Only a zero `chunk_size` is rejected.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::ChunkSizeZero);
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Walks the text start-to-end. Each chunk tentatively ends at
    /// `start + chunk_size`; if that lands before the end of the text, the
    /// end is pulled back to just past the nearest sentence terminator within
    /// [`SENTENCE_LOOKBACK`] characters. Chunks are trimmed and empty ones
    /// skipped. The next start is `max(start + 1, end - overlap)`, which
    /// keeps the scan moving even when the overlap swallows a whole chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        // Byte offset of every character, plus the end sentinel, so slices
        // below always land on char boundaries.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(at, _)| at)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = bounds.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < total {
            // May exceed the text length; only the slice below clamps it.
            // The advance at the bottom works on the unclamped value so the
            // final iteration jumps clear of the text instead of re-emitting
            // ever-shorter tails.
            let mut end = start + self.chunk_size;

            if end < total {
                let floor = end.saturating_sub(SENTENCE_LOOKBACK).max(start);
                for pos in (floor + 1..=end).rev() {
                    let c = text[bounds[pos]..bounds[pos + 1]]
                        .chars()
                        .next()
                        .unwrap_or('\0');
                    if is_sentence_end(c) {
                        end = pos + 1;
                        break;
                    }
                }
            }

            let piece = text[bounds[start]..bounds[end.min(total)]].trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            start = (start + 1).max(end.saturating_sub(self.overlap));
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_nothing() {
        let chunker = Chunker::default();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t  ").is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk("  A short note.  ");
        assert_eq!(chunks, vec!["A short note.".to_string()]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert_eq!(Chunker::new(0, 10), Err(ChunkingError::ChunkSizeZero));
        assert!(Chunker::new(1, 10).is_ok());
    }

    #[test]
    fn test_deterministic() {
        let chunker = Chunker::new(50, 10).unwrap();
        let text = "One sentence here. Another sentence follows! A question? \
                    Then more prose without any stop for quite a while longer.";
        assert_eq!(chunker.chunk(text), chunker.chunk(text));
    }

    #[test]
    fn test_prefers_sentence_boundaries() {
        let chunker = Chunker::new(20, 5).unwrap();
        let chunks = chunker.chunk("Sentence one. Sentence two. Sentence three.");

        assert_eq!(chunks[0], "Sentence one.");
        // Every chunk except possibly the last ends on a sentence terminator.
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(
                chunk.ends_with(['.', '!', '?']),
                "chunk {chunk:?} does not end on a sentence boundary"
            );
        }
    }

    #[test]
    fn test_chunk_length_within_slack() {
        let chunker = Chunker::new(30, 10).unwrap();
        let text = "Filler words pile up steadily. More filler arrives now. \
                    Even more filler text keeps coming without pause until done.";
        for chunk in chunker.chunk(text) {
            assert!(chunk.chars().count() <= 31, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn test_covers_whole_text() {
        let chunker = Chunker::new(25, 8).unwrap();
        let text = "abcdefghij klmnopqrst uvwxyz abcdefghij klmnopqrst uvwxyz";
        let chunks = chunker.chunk(text);

        // With no sentence terminators present, consecutive chunks overlap,
        // so stitching them covers every character of the input.
        assert!(chunks.concat().len() >= text.trim().len());
        assert!(chunks.iter().all(|c| text.contains(c.as_str())));
    }

    #[test]
    fn test_oversized_overlap_terminates() {
        let chunker = Chunker::new(10, 50).unwrap();
        let text = "plain text without boundaries repeated over and over again";
        let chunks = chunker.chunk(text);
        assert!(!chunks.is_empty());
        // Progress is one character per step in the degenerate case, so no
        // chunk set can exceed the character count.
        assert!(chunks.len() <= text.chars().count());
    }

    #[test]
    fn test_multibyte_text() {
        let chunker = Chunker::new(12, 4).unwrap();
        let text = "Ein größerer Text. Noch ein Satz! Und die Frage? Schluß jetzt.";
        let chunks = chunker.chunk(text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(text.contains(chunk.as_str()));
        }
    }

    #[test]
    fn test_unbroken_text_advances() {
        let chunker = Chunker::new(10, 3).unwrap();
        let text: String = std::iter::repeat('x').take(25).collect();
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }
}
