//! Whitespace chunking of snippets ahead of embedding.

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 1000;

/// Greedy word-packing chunker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunker {
    max_chars: usize,
}

impl Chunker {
    /// Builds a chunker with the provided limit (clamped to at least one character).
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// Maximum characters per chunk.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Splits `snippet` into chunks no longer than the limit.
    ///
    /// Snippets that already fit are returned untouched. Longer ones are split on
    /// whitespace and re-joined with single spaces; a lone word longer than the
    /// limit becomes its own chunk.
    pub fn chunk(&self, snippet: &str) -> Vec<String> {
        if snippet.trim().is_empty() {
            return Vec::new();
        }
        if snippet.chars().count() <= self.max_chars {
            return vec![snippet.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in snippet.split_whitespace() {
            let word_len = word.chars().count();
            if current_len == 0 {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= self.max_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_snippet_is_returned_verbatim() {
        let chunker = Chunker::default();
        let snippet = "In 2016, the Cubs finished with a 103-58 record.";
        assert_eq!(chunker.chunk(snippet), vec![snippet.to_string()]);
    }

    #[test]
    fn snippet_at_exact_limit_is_one_chunk() {
        let chunker = Chunker::new(10);
        assert_eq!(chunker.chunk("abcde fghi"), vec!["abcde fghi".to_string()]);
    }

    #[test]
    fn blank_snippets_yield_nothing() {
        let chunker = Chunker::default();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn single_char_words_never_exceed_limit() {
        for limit in [1usize, 2, 3, 7, 10, 64] {
            let chunker = Chunker::new(limit);
            let snippet = vec!["x"; 500].join(" ");
            let chunks = chunker.chunk(&snippet);
            assert!(chunks.len() > 1, "limit {limit} should split");
            assert!(chunks.iter().all(|c| c.chars().count() <= limit));
            assert!(chunks.iter().all(|c| !c.is_empty()));
            let words: usize = chunks.iter().map(|c| c.split_whitespace().count()).sum();
            assert_eq!(words, 500);
        }
    }

    #[test]
    fn greedy_packing_flushes_remainder() {
        let chunker = Chunker::new(11);
        let chunks = chunker.chunk("aaa bbb ccc ddd eee");
        assert_eq!(chunks, vec!["aaa bbb ccc", "ddd eee"]);
    }

    #[test]
    fn oversized_word_stands_alone() {
        let chunker = Chunker::new(5);
        let chunks = chunker.chunk("ab abcdefghij cd");
        assert_eq!(chunks, vec!["ab", "abcdefghij", "cd"]);
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let chunker = Chunker::new(4);
        assert_eq!(chunker.chunk("éééé"), vec!["éééé".to_string()]);
    }
}
