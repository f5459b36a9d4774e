use groundqa_core::chunker::Chunker;
use groundqa_core::config::ChunkingConfig;
use groundqa_core::traits::LexicalIndex;
use groundqa_core::types::{Chunk, SourceKind};
use groundqa_core::Error;
use groundqa_text::TantivyLexicalIndex;

fn chunk(ordinal: usize, content: &str) -> Chunk {
    Chunk { ordinal, content: content.to_string(), start: 0, end: content.chars().count(), page: None }
}

fn corpus() -> Vec<Chunk> {
    vec![
        chunk(0, "Shipping usually takes three to five business days."),
        chunk(1, "Our refund policy allows returns within 30 days of purchase."),
        chunk(2, "Refunds are issued to the original payment method. Refund requests need a receipt."),
        chunk(3, "Gift cards cannot be exchanged for cash."),
    ]
}

#[test]
fn keyword_matches_rank_first() {
    let index = TantivyLexicalIndex::build(&corpus()).expect("build");
    let hits = index.search("refund", 3).expect("search");
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.source == SourceKind::Lexical));
    let ordinals: Vec<usize> = hits.iter().map(|h| h.ordinal).collect();
    assert!(ordinals.contains(&1) && ordinals.contains(&2));
    assert!(!ordinals.contains(&0));
    for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score); }
}

#[test]
fn stemming_matches_inflected_forms() {
    let index = TantivyLexicalIndex::build(&corpus()).expect("build");
    let hits = index.search("exchanging", 2).expect("search");
    assert_eq!(hits.first().map(|h| h.ordinal), Some(3));
}

#[test]
fn equal_scores_keep_chunk_order() {
    let chunks = vec![chunk(0, "alpha bravo"), chunk(1, "alpha bravo"), chunk(2, "alpha bravo")];
    let index = TantivyLexicalIndex::build(&chunks).expect("build");
    let hits = index.search("alpha", 3).expect("search");
    let ordinals: Vec<usize> = hits.iter().map(|h| h.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2]);
}

#[test]
fn results_are_bounded_and_deterministic() {
    let text = "The warranty covers parts. The warranty excludes water damage. ".repeat(40);
    let chunks = Chunker::new(&ChunkingConfig { chunk_size: 120, chunk_overlap: 20 }).unwrap().split_text(&text);
    let index = TantivyLexicalIndex::build(&chunks).expect("build");
    let first = index.search("warranty water", 4).expect("search");
    assert!(first.len() <= 4);
    for _ in 0..3 {
        let again: Vec<usize> = index.search("warranty water", 4).expect("search").iter().map(|h| h.ordinal).collect();
        assert_eq!(again, first.iter().map(|h| h.ordinal).collect::<Vec<_>>());
    }
}

#[test]
fn odd_query_syntax_does_not_fail() {
    let index = TantivyLexicalIndex::build(&corpus()).expect("build");
    for q in ["refund: \"policy", "(gift AND", "what's the refund policy?", "the of and"] {
        assert!(index.search(q, 3).is_ok(), "query {q:?}");
    }
    assert!(index.search("refund", 0).expect("search").is_empty());
}

#[test]
fn empty_corpus_is_rejected() {
    assert!(matches!(TantivyLexicalIndex::build(&[]), Err(Error::EmptyCorpus)));
}
