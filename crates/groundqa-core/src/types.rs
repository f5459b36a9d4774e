//! Domain types shared by the indexes, the fusion retriever and the answer
//! generator.

use serde::{Deserialize, Serialize};

/// Position of a chunk inside its session's chunk set.
pub type ChunkId = usize;

/// An immutable slice of the loaded document.
///
/// - `ordinal`: 0-based position in the session chunk set
/// - `content`: the text payload, exactly `text[start..end]` in characters
/// - `start`/`end`: half-open character offsets into the document text
/// - `page`: 0-based logical page the chunk starts on, when pages are known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub ordinal: ChunkId,
    pub content: String,
    pub start: usize,
    pub end: usize,
    pub page: Option<usize>,
}

impl Chunk {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Indicates which index produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Dense,
    Lexical,
}

/// The minimal surface returned by both indexes.
///
/// `ordinal` matches `Chunk::ordinal`. `score` is index-specific but
/// higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub ordinal: ChunkId,
    pub score: f32,
    pub source: SourceKind,
}

/// One entry of a fused retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub source: SourceKind,
    pub score: f32,
}

/// Generated text plus the evidence that was placed in the prompt, in prompt
/// order. `evidence[i]` is what `[Source i]` refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub evidence: Vec<RetrievedChunk>,
}

impl Answer {
    /// Distinct `[Source i]` indices in order of first appearance.
    pub fn citations(&self) -> Vec<usize> {
        crate::citation::extract_citations(&self.text)
    }

    /// Cited indices that have no evidence entry.
    pub fn invalid_citations(&self) -> Vec<usize> {
        self.citations().into_iter().filter(|&i| i >= self.evidence.len()).collect()
    }

    pub fn sources(&self) -> impl Iterator<Item = &Chunk> {
        self.evidence.iter().map(|e| &e.chunk)
    }
}
