use std::sync::Arc;

use tracing::debug;

use groundqa_core::error::{Error, Result, Stage};
use groundqa_core::traits::{DenseIndex, Embedder};
use groundqa_core::types::{Chunk, SearchHit, SourceKind};

/// Exact cosine-similarity index. Vectors are L2-normalised at build time so a
/// search is one dot product per chunk; equal scores keep chunk order, which
/// makes repeated searches return identical results.
pub struct FlatIndex {
    embedder: Arc<dyn Embedder>,
    vectors: Vec<Vec<f32>>,
    ordinals: Vec<usize>,
    dim: usize,
}

impl FlatIndex {
    pub fn build(chunks: &[Chunk], embedder: Arc<dyn Embedder>, batch_size: usize) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let dim = embedder.dim();
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).map_err(|e| Error::backend(Stage::Embedding, e))?;
            if embeddings.len() != texts.len() {
                return Err(Error::backend(
                    Stage::DenseIndex,
                    anyhow::anyhow!("embedder returned {} vectors for {} texts", embeddings.len(), texts.len()),
                ));
            }
            for mut v in embeddings {
                check_dim(&v, dim)?;
                normalize(&mut v);
                vectors.push(v);
            }
        }
        debug!(chunks = chunks.len(), dim, "built dense index");
        Ok(Self { embedder, vectors, ordinals: chunks.iter().map(|c| c.ordinal).collect(), dim })
    }

    /// Nearest neighbours of an already-embedded query.
    pub fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        check_dim(query_vec, self.dim)?;
        let mut q = query_vec.to_vec();
        normalize(&mut q);
        let mut hits: Vec<SearchHit> = self
            .vectors
            .iter()
            .zip(&self.ordinals)
            .map(|(v, &ordinal)| SearchHit { ordinal, score: dot(v, &q), source: SourceKind::Dense })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.ordinal.cmp(&b.ordinal)));
        hits.truncate(k);
        Ok(hits)
    }
}

impl DenseIndex for FlatIndex {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let q_vec = self
            .embedder
            .embed_batch(&[query.to_string()])
            .map_err(|e| Error::backend(Stage::Embedding, e))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::backend(Stage::Embedding, anyhow::anyhow!("embedder returned no vector for the query")))?;
        self.search_vec(&q_vec, k)
    }
}

fn check_dim(v: &[f32], dim: usize) -> Result<()> {
    if v.len() == dim {
        Ok(())
    } else {
        Err(Error::backend(Stage::DenseIndex, anyhow::anyhow!("expected {dim}-dimensional vector, got {}", v.len())))
    }
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
