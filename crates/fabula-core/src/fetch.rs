//! Fetch wrappers around the generation backends.
//!
//! [`SceneFetcher`] turns a text-generation call into a validated [`Scene`];
//! [`IllustrationFetcher`] turns an image-generation call into a displayable
//! data URI. Neither retries nor enforces a timeout.

use std::sync::Arc;

use crate::backend::{ImageGenerator, TextGenerator};
use crate::error::{FabulaError, Result};
use crate::prompts::{IMAGE_STYLE_SUFFIX, PromptTemplates};
use crate::scene::{Scene, parse_scene};

/// Fetches narrative scenes from the text-generation backend.
pub struct SceneFetcher {
    backend: Arc<dyn TextGenerator>,
    templates: PromptTemplates,
}

impl SceneFetcher {
    pub fn new(backend: Arc<dyn TextGenerator>, templates: PromptTemplates) -> Self {
        Self { backend, templates }
    }

    /// Fetches the opening scene using the fixed initial template.
    pub async fn fetch_initial(&self) -> Result<Scene> {
        let text = self.backend.generate(&self.templates.initial).await?;
        parse_scene(&text)
    }

    /// Fetches the scene that follows `player_choice` taken after
    /// `current_story`.
    pub async fn fetch_next(&self, current_story: &str, player_choice: &str) -> Result<Scene> {
        let prompt = self.templates.render_next(current_story, player_choice)?;
        let text = self.backend.generate(&prompt).await?;
        parse_scene(&text)
    }
}

/// Fetches illustrations and wraps them as displayable JPEG data URIs.
pub struct IllustrationFetcher {
    backend: Arc<dyn ImageGenerator>,
    style_suffix: String,
}

impl IllustrationFetcher {
    pub fn new(backend: Arc<dyn ImageGenerator>) -> Self {
        Self {
            backend,
            style_suffix: IMAGE_STYLE_SUFFIX.to_string(),
        }
    }

    /// Overrides the stylistic suffix appended to every prompt.
    pub fn with_style_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.style_suffix = suffix.into();
        self
    }

    /// Requests exactly one illustration for `prompt` and returns it as a
    /// `data:image/jpeg;base64,` locator.
    pub async fn fetch(&self, prompt: &str) -> Result<String> {
        let full_prompt = format!("{}{}", prompt, self.style_suffix);
        let images = self
            .backend
            .generate(&full_prompt, 1)
            .await
            .map_err(reclassify_safety)?;

        images
            .into_iter()
            .next()
            .and_then(|image| image.bytes_base64)
            .map(|data| format!("data:image/jpeg;base64,{data}"))
            .ok_or(FabulaError::NoImageProduced)
    }
}

/// Splits moderation blocks out of generic image failures so the caller can
/// present a distinct (but still non-fatal) message.
fn reclassify_safety(err: FabulaError) -> FabulaError {
    match err {
        FabulaError::ImageGeneration(message) if message.contains("SAFETY") => {
            FabulaError::ImageSafetyRejected(message)
        }
        other => other,
    }
}
