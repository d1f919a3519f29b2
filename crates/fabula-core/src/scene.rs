//! Scene data model and model-response parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FabulaError, Result};

/// One narrative beat: story text, offered choices, and an illustration prompt.
///
/// An empty choice list is a valid ending; `story` and `image_prompt` are
/// never empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub story: String,
    pub choices: Vec<String>,
    pub image_prompt: String,
}

/// Matches a reply wrapped in a single triple-backtick fence, optionally
/// tagged `json`. Anything else passes through untouched.
static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^```(?:json)?\s*\n?(.*?)\n?\s*```$").expect("fence regex is valid")
});

/// Extracts a [`Scene`] from raw model output.
///
/// Strips at most one surrounding code fence, then parses the remainder as
/// JSON. Syntax failures and shape failures are reported as separate
/// variants so the logs can tell a garbled reply from a well-formed but
/// mis-structured one; raw response text goes to the logs only.
///
/// Pure and synchronous: no retries, no side effects beyond logging.
pub fn parse_scene(raw: &str) -> Result<Scene> {
    let mut text = raw.trim();
    if let Some(inner) = FENCE.captures(text).and_then(|caps| caps.get(1)) {
        text = inner.as_str().trim();
    }

    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        tracing::error!(raw, error = %e, "model reply is not valid JSON");
        FabulaError::MalformedResponse(e.to_string())
    })?;

    if value.is_null() {
        tracing::error!(raw, "model reply parsed to JSON null");
        return Err(FabulaError::EmptyScene);
    }

    let scene: Scene = serde_json::from_value(value).map_err(|e| {
        tracing::error!(raw, error = %e, "model reply does not match the scene shape");
        FabulaError::InvalidSceneShape(e.to_string())
    })?;

    if scene.story.trim().is_empty() {
        return Err(FabulaError::InvalidSceneShape("`story` is empty".into()));
    }
    if scene.image_prompt.trim().is_empty() {
        return Err(FabulaError::InvalidSceneShape("`image_prompt` is empty".into()));
    }

    Ok(scene)
}
