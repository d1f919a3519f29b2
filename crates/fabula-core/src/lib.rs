//! Fabula core: scene parsing, prompt templates, fetch wrappers, and the
//! session state machine.
//!
//! This crate knows nothing about any concrete generation service. The
//! vendor clients live in `fabula-interaction` and plug in through the
//! [`backend`] traits.

pub mod backend;
pub mod error;
pub mod fetch;
pub mod prompts;
pub mod scene;
pub mod session;

// Re-export common types
pub use error::{FabulaError, Result};
pub use scene::Scene;
pub use session::{Game, Phase, Session};
