//! Overlapping text chunking

/// Splits text into overlapping chunks of a fixed character budget.
///
/// The 1000/500 defaults give each chunk a 50% overlap with its neighbor,
/// trading storage and embedding cost for retrieval recall at chunk
/// boundaries.
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. An overlap at or above the chunk size is clamped
    /// so the window always advances.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Split text into chunks of at most `chunk_size` characters, each
    /// overlapping the previous by `overlap` characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offsets of every char boundary, terminated by the text end,
        // so slicing stays valid for multi-byte input.
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        let total_chars = boundaries.len() - 1;

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            let slice = &text[boundaries[start]..boundaries[end]];
            let trimmed = slice.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            if end == total_chars {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = TextChunker::new(1000, 500);
        let chunks = chunker.split("Press and hold the reset button for five seconds.");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = TextChunker::new(1000, 500);
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   \n  ").is_empty());
    }

    #[test]
    fn chunks_overlap_by_half() {
        let chunker = TextChunker::new(100, 50);
        let text: String = (0..30).map(|i| format!("sentence {i} goes here. ")).collect();
        let chunks = chunker.split(&text);
        assert!(chunks.len() > 2);

        // Consecutive chunks share the second half of the former.
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(pair[0].chars().count().saturating_sub(30)).collect();
            assert!(
                pair[1].contains(tail.trim()),
                "chunk overlap missing between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn every_character_is_covered() {
        let chunker = TextChunker::new(100, 50);
        let text: String = (0..500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunker.split(&text);

        // With no whitespace to trim, concatenating the non-overlapping
        // heads reconstructs the input.
        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.push_str(&chunk[50..]);
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn multibyte_input_splits_on_char_boundaries() {
        let chunker = TextChunker::new(10, 5);
        let text = "héllo wörld ünïcode tèxt œuvre".repeat(4);
        // Must not panic on non-ASCII boundaries.
        let chunks = chunker.split(&text);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn excessive_overlap_is_clamped() {
        let chunker = TextChunker::new(10, 10);
        let chunks = chunker.split(&"x".repeat(50));
        assert!(!chunks.is_empty());
    }
}
