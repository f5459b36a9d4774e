//! groundqa-hybrid
//!
//! Document sessions, dense-first fusion retrieval and grounded answer
//! generation over a single loaded document.

pub mod answer;
pub mod fusion;
pub mod prompt;
pub mod service;
pub mod session;

pub use answer::AnswerGenerator;
pub use fusion::{fuse, retrieve};
pub use prompt::render_prompt;
pub use service::QaService;
pub use session::{DocumentSession, SessionSlot};
