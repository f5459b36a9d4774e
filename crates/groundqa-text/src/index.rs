use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, IndexReader, ReloadPolicy, Searcher, TantivyDocument};
use tracing::debug;

use groundqa_core::error::{Error, Result, Stage};
use groundqa_core::traits::LexicalIndex;
use groundqa_core::types::{Chunk, SearchHit, SourceKind};

use crate::tantivy_utils::{build_schema, register_tokenizer};

const WRITER_HEAP_BYTES: usize = 50_000_000;

fn backend(e: impl Into<anyhow::Error>) -> Error {
	Error::backend(Stage::LexicalIndex, e)
}

/// BM25 ranking over one document's chunks, held in RAM for the session.
pub struct TantivyLexicalIndex {
	index: Index,
	_reader: IndexReader,
	searcher: Searcher,
	ordinal_field: Field,
	text_field: Field,
	len: usize,
}

impl TantivyLexicalIndex {
	pub fn build(chunks: &[Chunk]) -> Result<Self> {
		if chunks.is_empty() { return Err(Error::EmptyCorpus); }
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let ordinal_field = schema.get_field("ordinal").map_err(backend)?;
		let text_field = schema.get_field("text").map_err(backend)?;
		// One writer thread keeps a single segment in insertion order.
		let mut index_writer = index.writer_with_num_threads(1, WRITER_HEAP_BYTES).map_err(backend)?;
		for c in chunks {
			let doc = doc!(
				ordinal_field => c.ordinal as u64,
				text_field => c.content.as_str(),
			);
			index_writer.add_document(doc).map_err(backend)?;
		}
		index_writer.commit().map_err(backend)?;
		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(backend)?;
		let searcher = reader.searcher();
		debug!(chunks = chunks.len(), "built lexical index");
		Ok(Self { index, _reader: reader, searcher, ordinal_field, text_field, len: chunks.len() })
	}
}

impl LexicalIndex for TantivyLexicalIndex {
	fn len(&self) -> usize { self.len }

	fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 || query.trim().is_empty() { return Ok(Vec::new()); }
		let qp = QueryParser::for_index(&self.index, vec![self.text_field]);
		let (q, errors) = qp.parse_query_lenient(query);
		if !errors.is_empty() { debug!(?errors, "lenient query parse dropped parts of the query"); }
		// Score every match so ties can be ordered by chunk position.
		let top_docs = self.searcher.search(&q, &TopDocs::with_limit(self.len)).map_err(backend)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = self.searcher.doc(addr).map_err(backend)?;
			let Some(ordinal) = doc.get_first(self.ordinal_field).and_then(|v| v.as_u64()) else { continue };
			hits.push(SearchHit { ordinal: ordinal as usize, score, source: SourceKind::Lexical });
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.ordinal.cmp(&b.ordinal)));
		hits.truncate(k);
		Ok(hits)
	}
}
