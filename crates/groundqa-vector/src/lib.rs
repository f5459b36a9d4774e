//! groundqa-vector
//!
//! Dense index over chunk embeddings. The index lives in memory for the
//! duration of one document session.

pub mod flat;

pub use flat::FlatIndex;
