//! groundqa-core
//!
//! Domain types, capability traits, the error taxonomy, configuration, text
//! extraction and the chunker shared by every other crate in the workspace.

pub mod chunker;
pub mod citation;
pub mod config;
pub mod error;
pub mod extract;
pub mod traits;
pub mod types;

pub use error::{Error, Result, Stage};
