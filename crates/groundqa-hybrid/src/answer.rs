use std::time::Duration;

use tracing::{debug, warn};

use groundqa_core::error::{Error, Result, Stage};
use groundqa_core::traits::Generator;
use groundqa_core::types::{Answer, RetrievedChunk};

use crate::fusion::retrieve;
use crate::prompt::render_prompt;
use crate::session::DocumentSession;

/// Turns fused evidence into a cited answer with a single backend call.
pub struct AnswerGenerator<G> {
    generator: G,
    k: usize,
    timeout: Option<Duration>,
}

impl<G: Generator> AnswerGenerator<G> {
    pub fn new(generator: G, k: usize) -> Self {
        Self { generator, k, timeout: None }
    }

    /// Bound each backend call. Expiry is reported as a generation failure.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub async fn generate(&self, session: &DocumentSession, query: &str) -> Result<Answer> {
        let evidence = retrieve(session, query, self.k)?;
        self.generate_with_evidence(query, evidence).await
    }

    /// Answer from evidence that was already retrieved, e.g. to show the same
    /// sources the model saw.
    pub async fn generate_with_evidence(&self, query: &str, evidence: Vec<RetrievedChunk>) -> Result<Answer> {
        let prompt = render_prompt(query, &evidence);
        debug!(evidence = evidence.len(), prompt_chars = prompt.len(), "calling generator");
        let call = self.generator.generate(&prompt);
        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                Error::backend(Stage::Generation, anyhow::anyhow!("no response within {}s", limit.as_secs_f32()))
            })?,
            None => call.await,
        };
        let text = reply.map_err(|e| Error::backend(Stage::Generation, e))?;
        let answer = Answer { text, evidence };
        let invalid = answer.invalid_citations();
        if !invalid.is_empty() {
            warn!(?invalid, evidence = answer.evidence.len(), "answer cites sources that were not provided");
        }
        Ok(answer)
    }
}
