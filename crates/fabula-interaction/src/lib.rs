//! Vendor clients for the hosted generation services.
//!
//! Both clients talk to the Google generative-language REST API directly
//! with `reqwest`, no SDK dependency, and implement the backend traits
//! from `fabula-core`.

pub mod config;
pub mod gemini;
mod http;
pub mod imagen;

pub use config::{GeminiConfig, SecretConfig};
pub use gemini::{DEFAULT_TEXT_MODEL, GeminiTextClient};
pub use imagen::{DEFAULT_IMAGE_MODEL, ImagenClient};
