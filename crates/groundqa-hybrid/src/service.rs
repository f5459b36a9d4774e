use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use groundqa_core::chunker::Chunker;
use groundqa_core::config::Settings;
use groundqa_core::error::Result;
use groundqa_core::extract::ExtractedDocument;
use groundqa_core::traits::{Embedder, Generator};
use groundqa_core::types::{Answer, RetrievedChunk};

use crate::answer::AnswerGenerator;
use crate::fusion::retrieve;
use crate::session::{DocumentSession, SessionSlot};

/// Load documents and answer questions about the one currently loaded.
pub struct QaService<G> {
    slot: SessionSlot,
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    answers: AnswerGenerator<G>,
}

impl<G: Generator> QaService<G> {
    pub fn new(settings: &Settings, embedder: Arc<dyn Embedder>, generator: G) -> Result<Self> {
        settings.validate()?;
        let timeout = settings.llm.timeout_secs.map(Duration::from_secs);
        Ok(Self {
            slot: SessionSlot::new(),
            chunker: Chunker::new(&settings.chunking)?,
            embedder,
            batch_size: settings.embedding.batch_size,
            answers: AnswerGenerator::new(generator, settings.retrieval.k).with_timeout(timeout),
        })
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn load_document(&self, text: &str) -> Result<Arc<DocumentSession>> {
        self.load_extracted(&ExtractedDocument::from_text(text))
    }

    /// Build a session and make it current. On failure the previous session
    /// stays in place.
    pub fn load_extracted(&self, doc: &ExtractedDocument) -> Result<Arc<DocumentSession>> {
        let session = DocumentSession::build(doc, &self.chunker, Arc::clone(&self.embedder), self.batch_size)?;
        Ok(self.install(session))
    }

    pub fn install(&self, session: DocumentSession) -> Arc<DocumentSession> {
        let chunks = session.chunks().len();
        let session = self.slot.replace(session);
        info!(chunks, "document session is now current");
        session
    }

    pub fn session(&self) -> Result<Arc<DocumentSession>> {
        self.slot.current()
    }

    /// The fused evidence `ask` would ground its answer on.
    pub fn sources(&self, query: &str) -> Result<Vec<RetrievedChunk>> {
        let session = self.session()?;
        retrieve(&session, query, self.answers.k())
    }

    pub async fn ask(&self, query: &str) -> Result<Answer> {
        let session = self.session()?;
        self.ask_session(&session, query).await
    }

    pub async fn ask_session(&self, session: &DocumentSession, query: &str) -> Result<Answer> {
        self.answers.generate(session, query).await
    }
}
