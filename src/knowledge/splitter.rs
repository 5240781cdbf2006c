//! Recursive character text splitting.
//!
//! Text is split on the coarsest separator present (paragraphs, then lines,
//! then words, then characters). Pieces that are still too long are split
//! again with the finer separators, and small pieces are merged back into
//! chunks of at most `chunk_size` characters that overlap by up to
//! `chunk_overlap` characters.

use crate::config::KnowledgeSettings;
use std::collections::VecDeque;

const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Splits documents into overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_settings(settings: &KnowledgeSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Split text into chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, finer) = pick_separator(text, separators);

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in splits {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }

            if finer.is_empty() {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }

        chunks.retain(|c| !c.is_empty());
        chunks
    }

    /// Merge small pieces into chunks, carrying an overlap between chunks.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                while let Some(front) = current.front() {
                    let joiner = if current.is_empty() { 0 } else { separator_len };
                    let over_overlap = total > self.chunk_overlap;
                    let still_too_long = total + len + joiner > self.chunk_size && total > 0;
                    if !(over_overlap || still_too_long) {
                        break;
                    }
                    let front_joiner = if current.len() > 1 { separator_len } else { 0 };
                    total -= char_len(front) + front_joiner;
                    current.pop_front();
                }
            }

            let joiner = if current.is_empty() { 0 } else { separator_len };
            current.push_back(piece);
            total += len + joiner;
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() || text.contains(separator.as_str()) {
            return (separator.as_str(), &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn push_joined(chunks: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::new(900, 100);
        assert_eq!(splitter.split("A short note."), vec!["A short note."]);
        assert!(splitter.split("   ").is_empty());
    }

    #[test]
    fn test_word_split_without_overlap() {
        let splitter = TextSplitter::new(10, 0);
        assert_eq!(splitter.split("aaaa bbbb cccc"), vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_word_split_with_overlap() {
        let splitter = TextSplitter::new(10, 5);
        assert_eq!(splitter.split("aaaa bbbb cccc"), vec!["aaaa bbbb", "bbbb cccc"]);
    }

    #[test]
    fn test_paragraphs_preferred_over_words() {
        let splitter = TextSplitter::new(20, 0);
        let chunks = splitter.split("First paragraph.\n\nSecond paragraph.");
        assert_eq!(chunks, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 0);
        let chunks = splitter.split("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = TextSplitter::new(50, 10);
        let text = "The mitochondria is the powerhouse of the cell. ".repeat(20);
        for chunk in splitter.split(&text) {
            assert!(chunk.chars().count() <= 50, "chunk too long: {:?}", chunk);
        }
    }
}
