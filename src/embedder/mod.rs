//! Embedding providers and the per-chunk embedding loop.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::chunk::Chunker;

pub mod openai;

/// Turns one piece of text into one vector.
pub trait Embedder {
    /// Requests a single embedding for `input`.
    fn embed(&self, input: &str) -> Result<Vec<f32>>;
}

/// A chunk and the vector computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingPair {
    /// Chunk text submitted to the model.
    pub text: String,
    /// Model embedding vector.
    pub vector: Vec<f32>,
}

/// Knobs for [`embed_snippets`].
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Chunker applied to every snippet.
    pub chunker: Chunker,
    /// Pause after each successful request.
    pub delay: Duration,
    /// Required vector length; anything else is dropped.
    pub dimensions: usize,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            chunker: Chunker::default(),
            delay: Duration::from_millis(100),
            dimensions: openai::DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

/// Chunks every snippet and embeds each chunk in order.
///
/// Failed or wrong-sized embeddings are logged and skipped; the loop never aborts.
pub fn embed_snippets<E, I, T>(embedder: &E, snippets: I, options: &EmbedOptions) -> Vec<EmbeddingPair>
where
    E: Embedder + ?Sized,
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut pairs = Vec::new();
    let mut failures = 0usize;
    for snippet in snippets {
        for chunk in options.chunker.chunk(snippet.as_ref()) {
            match embedder.embed(&chunk) {
                Ok(vector) if vector.len() == options.dimensions => {
                    pairs.push(EmbeddingPair {
                        text: chunk,
                        vector,
                    });
                    if pairs.len() % 100 == 0 {
                        info!("embedded {} chunks...", pairs.len());
                    }
                    if !options.delay.is_zero() {
                        thread::sleep(options.delay);
                    }
                }
                Ok(vector) => {
                    failures += 1;
                    warn!(
                        expected = options.dimensions,
                        got = vector.len(),
                        "embedding has unexpected dimensionality; skipping chunk"
                    );
                }
                Err(err) => {
                    failures += 1;
                    warn!("error creating embedding: {err:#}");
                }
            }
        }
    }
    if failures > 0 {
        warn!("{} chunk(s) skipped during embedding", failures);
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeEmbedder {
        dims: usize,
        fail_on: Option<&'static str>,
        seen: RefCell<Vec<String>>,
    }

    impl FakeEmbedder {
        fn new(dims: usize) -> Self {
            Self {
                dims,
                fail_on: None,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Embedder for FakeEmbedder {
        fn embed(&self, input: &str) -> Result<Vec<f32>> {
            self.seen.borrow_mut().push(input.to_string());
            if self.fail_on.is_some_and(|needle| input.contains(needle)) {
                anyhow::bail!("429 Too Many Requests");
            }
            Ok(vec![input.len() as f32; self.dims])
        }
    }

    fn options(max_chars: usize, dims: usize) -> EmbedOptions {
        EmbedOptions {
            chunker: Chunker::new(max_chars),
            delay: Duration::ZERO,
            dimensions: dims,
        }
    }

    #[test]
    fn pairs_follow_chunk_order_and_skip_blanks() {
        let embedder = FakeEmbedder::new(4);
        let snippets = ["first snippet", "   ", "aaa bbb ccc ddd"];
        let pairs = embed_snippets(&embedder, snippets, &options(8, 4));
        let texts: Vec<&str> = pairs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "snippet", "aaa bbb", "ccc ddd"]);
        assert!(pairs.iter().all(|p| p.vector.len() == 4));
        assert_eq!(embedder.seen.borrow().len(), 4);
    }

    #[test]
    fn failed_chunk_is_skipped_and_run_continues() {
        let mut embedder = FakeEmbedder::new(3);
        embedder.fail_on = Some("bad");
        let snippets = vec!["good one".to_string(), "bad one".to_string(), "fine".to_string()];
        let pairs = embed_snippets(&embedder, &snippets, &options(100, 3));
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].text, "good one");
        assert_eq!(pairs[1].text, "fine");
    }

    #[test]
    fn wrong_dimensionality_is_dropped() {
        let embedder = FakeEmbedder::new(2);
        let pairs = embed_snippets(&embedder, ["anything"], &options(100, 1536));
        assert!(pairs.is_empty());
        assert_eq!(embedder.seen.borrow().len(), 1);
    }
}
