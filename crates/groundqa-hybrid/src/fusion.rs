use std::collections::HashSet;

use tracing::{debug, warn};

use groundqa_core::error::{Error, Result};
use groundqa_core::types::{Chunk, RetrievedChunk, SearchHit};

use crate::session::DocumentSession;

/// Dense hits, then lexical hits, keeping the first occurrence of each chunk
/// content, cut to `k`. Never padded.
pub fn fuse(chunks: &[Chunk], dense: &[SearchHit], sparse: &[SearchHit], k: usize) -> Vec<RetrievedChunk> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut fused = Vec::with_capacity(k);
    for hit in dense.iter().chain(sparse) {
        if fused.len() == k {
            break;
        }
        let Some(chunk) = chunks.get(hit.ordinal) else {
            warn!(ordinal = hit.ordinal, source = ?hit.source, "hit refers to unknown chunk, skipped");
            continue;
        };
        if seen.insert(chunk.content.as_str()) {
            fused.push(RetrievedChunk { chunk: chunk.clone(), source: hit.source, score: hit.score });
        }
    }
    fused
}

/// Query both indexes for `k` hits each and fuse them.
pub fn retrieve(session: &DocumentSession, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
    if query.trim().is_empty() {
        return Err(Error::EmptyQuery);
    }
    let dense = session.dense().search(query, k)?;
    let sparse = session.lexical().search(query, k)?;
    let fused = fuse(session.chunks(), &dense, &sparse, k);
    debug!(
        k,
        dense = ?dense.iter().map(|h| h.ordinal).collect::<Vec<_>>(),
        sparse = ?sparse.iter().map(|h| h.ordinal).collect::<Vec<_>>(),
        fused = ?fused.iter().map(|r| r.chunk.ordinal).collect::<Vec<_>>(),
        "hybrid retrieval"
    );
    Ok(fused)
}
