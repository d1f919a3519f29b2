//! Backend traits for the hosted generation services.
//!
//! The state machine never talks to a vendor API directly; it holds these
//! trait objects, so tests inject fakes and the clients are constructed
//! explicitly at startup instead of living in ambient global state.

use async_trait::async_trait;

use crate::error::Result;

/// A hosted text-generation endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Issues one generation request and returns the raw response text.
    ///
    /// A single blocking request per call: no retries, no timeout at this
    /// layer. Latency is unbounded and surfaced to the player as an
    /// indefinite loading state.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// One generated image as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Base64-encoded JPEG bytes; absent when the service omitted the payload.
    pub bytes_base64: Option<String>,
}

/// A hosted image-generation endpoint.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Issues one request for `count` images.
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<GeneratedImage>>;
}
