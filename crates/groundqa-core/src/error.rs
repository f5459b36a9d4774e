use std::fmt;

use thiserror::Error;

/// Pipeline stage a provider failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Embedding,
    DenseIndex,
    LexicalIndex,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extraction => "extraction",
            Stage::Embedding => "embedding",
            Stage::DenseIndex => "dense index",
            Stage::LexicalIndex => "lexical index",
            Stage::Generation => "generation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("No document loaded, upload a document first")]
    NotReady,

    #[error("Query is empty")]
    EmptyQuery,

    #[error("Cannot build an index over an empty corpus")]
    EmptyCorpus,

    #[error("{stage} backend failed: {source}")]
    Backend {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn backend(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend { stage, source: source.into() }
    }

    /// Whether re-invoking the same call may succeed. The core never retries
    /// on its own; this is advice for the caller.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::Backend { stage: Stage::Generation, .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
