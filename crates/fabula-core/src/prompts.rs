//! Prompt templates for the two generation calls.
//!
//! Templates are configuration data injected into the scene fetcher, not
//! hardcoded inside fetch logic, so they can be swapped without touching
//! the fetch path.

use minijinja::{Environment, context};

use crate::error::{FabulaError, Result};

/// Fixed stylistic suffix appended to every illustration prompt.
///
/// Opaque augmentation: not validated, the image service sees it verbatim.
pub const IMAGE_STYLE_SUFFIX: &str =
    ", cinematic lighting, fantasy illustration, rich atmospheric detail";

const INITIAL_PROMPT: &str = r#"You are the narrator of an interactive fantasy adventure.
Begin a new story. Reply with JSON only, using exactly this shape:
{"story": "...", "choices": ["...", "..."], "image_prompt": "..."}
- "story": the opening scene, two or three short paragraphs.
- "choices": two to four actions the player may take. Use an empty array only when the story has ended.
- "image_prompt": a short English description of the scene for an illustrator.
Do not include any text outside the JSON object."#;

const NEXT_SCENE_TEMPLATE: &str = r#"You are the narrator of an interactive fantasy adventure.
The story so far:
{{ story }}

The player chose: {{ choice }}

Continue the story. Reply with JSON only, using exactly this shape:
{"story": "...", "choices": ["...", "..."], "image_prompt": "..."}
- "story": the next scene, two or three short paragraphs.
- "choices": two to four actions the player may take. Use an empty array only when the story has ended.
- "image_prompt": a short English description of the scene for an illustrator.
Do not include any text outside the JSON object."#;

/// The two generation prompt templates, opaque to the fetch logic.
///
/// The next-scene template is a minijinja template over `story` and
/// `choice`.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub initial: String,
    pub next_scene: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            initial: INITIAL_PROMPT.to_string(),
            next_scene: NEXT_SCENE_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Renders the next-scene template with the current story and the
    /// player's choice.
    pub fn render_next(&self, story: &str, choice: &str) -> Result<String> {
        let env = Environment::new();
        env.render_str(&self.next_scene, context! { story, choice })
            .map_err(|e| {
                FabulaError::Generation(format!("failed to render next-scene template: {e}"))
            })
    }
}
