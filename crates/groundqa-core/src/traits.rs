use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::types::SearchHit;

/// Maps text to fixed-length vectors. Must be stable: the same text always
/// yields the same vector.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Nearest-neighbour search over chunk embeddings.
pub trait DenseIndex: Send + Sync {
    /// Number of indexed chunks.
    fn len(&self) -> usize;
    /// At most `k` hits by decreasing similarity.
    fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

/// Keyword-relevance search over chunk text.
pub trait LexicalIndex: Send + Sync {
    /// Number of indexed chunks.
    fn len(&self) -> usize;
    /// At most `k` hits by decreasing relevance, ties in chunk order.
    fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

/// A language-model backend. No timeout is applied here; callers that need
/// bounded latency wrap the returned future.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send;
}

impl<G: Generator> Generator for Arc<G> {
    fn generate(&self, prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send {
        self.as_ref().generate(prompt)
    }
}
