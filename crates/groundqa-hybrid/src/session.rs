use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use groundqa_core::chunker::Chunker;
use groundqa_core::error::{Error, Result};
use groundqa_core::extract::ExtractedDocument;
use groundqa_core::traits::{DenseIndex, Embedder, LexicalIndex};
use groundqa_core::types::Chunk;
use groundqa_text::TantivyLexicalIndex;
use groundqa_vector::FlatIndex;

/// One loaded document: its chunks and both indexes built over them.
///
/// A value of this type only exists fully built, so queries can never observe
/// a chunk set with one index missing.
pub struct DocumentSession {
    chunks: Vec<Chunk>,
    dense: Box<dyn DenseIndex>,
    lexical: Box<dyn LexicalIndex>,
}

impl DocumentSession {
    pub fn build(
        doc: &ExtractedDocument,
        chunker: &Chunker,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self> {
        if doc.is_blank() {
            return Err(Error::Ingestion("document contains no text".into()));
        }
        let chunks = chunker.split_document(doc);
        if chunks.is_empty() {
            return Err(Error::Ingestion("document produced no chunks".into()));
        }
        let dense = FlatIndex::build(&chunks, embedder, batch_size)?;
        let lexical = TantivyLexicalIndex::build(&chunks)?;
        info!(chunks = chunks.len(), pages = doc.pages.len(), "document session built");
        Self::from_parts(chunks, dense, lexical)
    }

    /// Assemble a session from already-built indexes. Both must cover exactly
    /// `chunks`, whose ordinals must be `0..chunks.len()`.
    pub fn from_parts(
        chunks: Vec<Chunk>,
        dense: impl DenseIndex + 'static,
        lexical: impl LexicalIndex + 'static,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        if let Some(c) = chunks.iter().enumerate().find(|(i, c)| c.ordinal != *i).map(|(_, c)| c) {
            return Err(Error::Ingestion(format!("chunk ordinal {} out of sequence", c.ordinal)));
        }
        if dense.len() != chunks.len() || lexical.len() != chunks.len() {
            return Err(Error::Ingestion(format!(
                "indexes cover {} dense / {} lexical chunks, session has {}",
                dense.len(),
                lexical.len(),
                chunks.len()
            )));
        }
        Ok(Self { chunks, dense: Box::new(dense), lexical: Box::new(lexical) })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn dense(&self) -> &dyn DenseIndex {
        self.dense.as_ref()
    }

    pub fn lexical(&self) -> &dyn LexicalIndex {
        self.lexical.as_ref()
    }
}

/// Holder for the live session. `replace` swaps in a finished session in one
/// step; readers that already hold an `Arc` keep answering from the old one.
#[derive(Default)]
pub struct SessionSlot {
    current: RwLock<Option<Arc<DocumentSession>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, session: DocumentSession) -> Arc<DocumentSession> {
        let session = Arc::new(session);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if guard.replace(Arc::clone(&session)).is_some() {
            info!("previous document session released");
        }
        session
    }

    pub fn current(&self) -> Result<Arc<DocumentSession>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotReady)
    }

    pub fn clear(&self) {
        self.current.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}
