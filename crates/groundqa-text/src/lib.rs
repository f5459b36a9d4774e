//! groundqa-text
//!
//! Tantivy-based lexical index over a document's chunks. Scores with BM25;
//! equal scores keep chunk order.

pub mod tantivy_utils;
pub mod index;

pub use index::TantivyLexicalIndex;
