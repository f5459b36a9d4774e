use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use groundqa_core::config::Settings;
use groundqa_core::error::Result;
use groundqa_core::traits::{DenseIndex, Generator, LexicalIndex};
use groundqa_core::types::{Chunk, SearchHit, SourceKind};
use groundqa_core::{Error, Stage};
use groundqa_embed::HashingEmbedder;
use groundqa_hybrid::{retrieve, AnswerGenerator, DocumentSession, QaService, SessionSlot};

/// Index that replays a fixed ranking.
struct Scripted {
    ranking: Vec<usize>,
    len: usize,
    source: SourceKind,
}

impl Scripted {
    fn hits(&self, k: usize) -> Vec<SearchHit> {
        self.ranking
            .iter()
            .take(k)
            .enumerate()
            .map(|(rank, &ordinal)| SearchHit { ordinal, score: 1.0 / (rank + 1) as f32, source: self.source })
            .collect()
    }
}

impl DenseIndex for Scripted {
    fn len(&self) -> usize { self.len }
    fn search(&self, _query: &str, k: usize) -> Result<Vec<SearchHit>> { Ok(self.hits(k)) }
}

struct ScriptedLexical(Scripted);

impl LexicalIndex for ScriptedLexical {
    fn len(&self) -> usize { self.0.len }
    fn search(&self, _query: &str, k: usize) -> Result<Vec<SearchHit>> { Ok(self.0.hits(k)) }
}

/// Generator that records prompts and returns a canned reply.
struct Recorder {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl Recorder {
    fn replying(reply: &str) -> Self {
        Self { reply: reply.to_string(), prompts: Mutex::new(Vec::new()) }
    }
}

impl Generator for Recorder {
    fn generate(&self, prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send {
        self.prompts.lock().expect("prompt log").push(prompt.to_string());
        let reply = self.reply.clone();
        async move { Ok::<_, anyhow::Error>(reply) }
    }
}

struct Failing;

impl Generator for Failing {
    fn generate(&self, _prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send {
        async { Err::<String, _>(anyhow::anyhow!("rate limited")) }
    }
}

struct Slow;

impl Generator for Slow {
    fn generate(&self, _prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send {
        async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, anyhow::Error>("too late".to_string())
        }
    }
}

fn four_chunks() -> Vec<Chunk> {
    let bodies = [
        "Shipping is free on orders over fifty dollars.",
        "Our refund policy allows returns within thirty days.",
        "Refunds are issued to the original payment method.",
        "Gift cards are not eligible for a refund.",
    ];
    let mut start = 0;
    bodies
        .iter()
        .enumerate()
        .map(|(ordinal, body)| {
            let content = body.repeat(16);
            let end = start + content.chars().count();
            let chunk = Chunk { ordinal, content, start, end, page: None };
            start = end;
            chunk
        })
        .collect()
}

fn scenario_session() -> DocumentSession {
    let chunks = four_chunks();
    // C2, C1, C3 and C1, C4, C2 as 0-based ordinals
    let dense = Scripted { ranking: vec![1, 0, 2], len: 4, source: SourceKind::Dense };
    let lexical = ScriptedLexical(Scripted { ranking: vec![0, 3, 1], len: 4, source: SourceKind::Lexical });
    DocumentSession::from_parts(chunks, dense, lexical).expect("session")
}

fn hash_settings() -> Settings {
    let mut settings = Settings::default();
    settings.chunking.chunk_size = 120;
    settings.chunking.chunk_overlap = 20;
    settings
}

fn service<G: Generator>(generator: G) -> QaService<G> {
    QaService::new(&hash_settings(), Arc::new(HashingEmbedder::new(128)), generator).expect("service")
}

const HANDBOOK: &str = "Shipping\n\nOrders ship within two business days. Express delivery costs extra.\n\n\
Refund policy\n\nCustomers may request a refund within thirty days of delivery. \
Refunds go back to the original payment method.\n\n\
Gift cards\n\nGift cards never expire and cannot be exchanged for cash.";

#[test]
fn dense_results_lead_and_duplicates_drop() {
    let session = scenario_session();
    assert!(session.chunks().iter().map(|c| c.len()).sum::<usize>() >= 3000);
    let fused = retrieve(&session, "refund policy", 3).expect("retrieve");
    let ordinals: Vec<usize> = fused.iter().map(|r| r.chunk.ordinal).collect();
    assert_eq!(ordinals, vec![1, 0, 2]);
    assert!(fused.iter().all(|r| r.source == SourceKind::Dense));
}

#[test]
fn lexical_hits_fill_remaining_slots() {
    let session = scenario_session();
    let fused = retrieve(&session, "refund policy", 4).expect("retrieve");
    let ordinals: Vec<usize> = fused.iter().map(|r| r.chunk.ordinal).collect();
    assert_eq!(ordinals, vec![1, 0, 2, 3]);
    assert_eq!(fused[3].source, SourceKind::Lexical);
}

#[test]
fn fused_results_are_bounded_and_distinct() {
    let session = scenario_session();
    for k in 0..6 {
        let fused = retrieve(&session, "refund", k).expect("retrieve");
        assert!(fused.len() <= k);
        for (i, a) in fused.iter().enumerate() {
            assert!(fused[i + 1..].iter().all(|b| b.chunk.content != a.chunk.content));
        }
    }
}

#[test]
fn blank_query_is_rejected_before_search() {
    let session = scenario_session();
    assert!(matches!(retrieve(&session, "  \n", 3), Err(Error::EmptyQuery)));
}

#[test]
fn mismatched_parts_are_rejected() {
    let dense = Scripted { ranking: vec![0], len: 3, source: SourceKind::Dense };
    let lexical = ScriptedLexical(Scripted { ranking: vec![0], len: 4, source: SourceKind::Lexical });
    assert!(matches!(DocumentSession::from_parts(four_chunks(), dense, lexical), Err(Error::Ingestion(_))));
}

#[test]
fn real_indexes_retrieve_deterministically() {
    let svc = service(Recorder::replying("unused"));
    let session = svc.load_document(HANDBOOK).expect("load");
    assert!(session.chunks().len() > 1);
    let first = retrieve(&session, "refund payment", 3).expect("retrieve");
    assert!(!first.is_empty() && first.len() <= 3);
    assert!(first.iter().any(|r| r.chunk.content.to_lowercase().contains("refund")));
    for _ in 0..3 {
        let again = retrieve(&session, "refund payment", 3).expect("retrieve");
        let a: Vec<usize> = first.iter().map(|r| r.chunk.ordinal).collect();
        let b: Vec<usize> = again.iter().map(|r| r.chunk.ordinal).collect();
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn ask_before_upload_is_not_ready() {
    let svc = service(Recorder::replying("unused"));
    assert!(matches!(svc.ask("anything at all").await, Err(Error::NotReady)));
    assert!(matches!(svc.ask("").await, Err(Error::NotReady)));
    assert!(matches!(svc.sources("refund"), Err(Error::NotReady)));
}

#[tokio::test]
async fn empty_document_creates_no_session() {
    let svc = service(Recorder::replying("unused"));
    assert!(matches!(svc.load_document(""), Err(Error::Ingestion(_))));
    assert!(matches!(svc.ask("refund policy").await, Err(Error::NotReady)));
}

#[tokio::test]
async fn failed_reload_keeps_previous_session() {
    let svc = service(Recorder::replying("unused"));
    let first = svc.load_document(HANDBOOK).expect("load");
    assert!(svc.load_document(" \n\t ").is_err());
    let current = svc.session().expect("still loaded");
    assert!(Arc::ptr_eq(&first, &current));
}

#[tokio::test]
async fn citations_point_into_the_evidence_given_to_the_model() {
    let recorder = Arc::new(Recorder::replying("Refunds are accepted for thirty days [Source 0], paid back to the card [Source 1]."));
    let svc = service(Arc::clone(&recorder));
    svc.install(scenario_session());

    let shown = svc.sources("refund policy").expect("sources");
    let answer = svc.ask("refund policy").await.expect("answer");

    assert_eq!(answer.citations(), vec![0, 1]);
    assert!(answer.invalid_citations().is_empty());
    let shown: Vec<usize> = shown.iter().map(|r| r.chunk.ordinal).collect();
    let used: Vec<usize> = answer.sources().map(|c| c.ordinal).collect();
    assert_eq!(shown, used);

    let prompts = recorder.prompts.lock().expect("prompt log");
    assert_eq!(prompts.len(), 1);
    for (i, chunk) in answer.sources().enumerate() {
        assert!(prompts[0].contains(&format!("[Source {i}]: {}", chunk.content)));
    }
}

#[tokio::test]
async fn out_of_range_citation_is_reported() {
    let svc = service(Recorder::replying("See [Source 7]."));
    svc.install(scenario_session());
    let answer = svc.ask("refund policy").await.expect("answer");
    assert_eq!(answer.invalid_citations(), vec![7]);
}

#[tokio::test]
async fn backend_failure_is_a_generation_error() {
    let svc = service(Failing);
    svc.install(scenario_session());
    let err = svc.ask("refund policy").await.expect_err("must fail");
    assert!(matches!(err, Error::Backend { stage: Stage::Generation, .. }));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn timeout_expiry_is_a_generation_error() {
    let answers = AnswerGenerator::new(Slow, 3).with_timeout(Some(Duration::from_millis(20)));
    let err = answers.generate(&scenario_session(), "refund policy").await.expect_err("must time out");
    assert!(matches!(err, Error::Backend { stage: Stage::Generation, .. }));
}

#[test]
fn readers_keep_the_session_they_started_with() {
    let slot = SessionSlot::new();
    assert!(matches!(slot.current(), Err(Error::NotReady)));
    let old = slot.replace(scenario_session());
    let in_flight = slot.current().expect("loaded");
    let new = slot.replace(scenario_session());
    assert!(Arc::ptr_eq(&old, &in_flight));
    assert!(!Arc::ptr_eq(&in_flight, &new));
    assert_eq!(in_flight.chunks().len(), 4);
    slot.clear();
    assert!(!slot.is_loaded());
}
