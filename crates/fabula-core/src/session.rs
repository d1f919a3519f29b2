//! The session state machine: the only stateful core of the game.
//!
//! Single logical thread of control: every transition sequences a text
//! fetch and then its image sub-step strictly after the text result lands,
//! so at most one fetch chain is ever in flight. All suspension happens in
//! the two awaited network calls; there are no timers, no background
//! tasks, and no locks.

use tracing::{info, warn};

use crate::error::Result;
use crate::fetch::{IllustrationFetcher, SceneFetcher};
use crate::scene::Scene;

/// Lifecycle phase of a play-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No story yet.
    #[default]
    Initial,
    /// A fetch chain is in flight.
    Loading,
    /// A scene is fully rendered, with or without an illustration.
    Playing,
    /// A fetch failed and no story is currently displayable.
    Error,
}

/// The complete mutable state of one play-through.
///
/// Created at [`Phase::Initial`], mutated exclusively by [`Game`]
/// transitions, never persisted: a reload loses it by design.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub phase: Phase,
    pub story: String,
    pub choices: Vec<String>,
    pub image_prompt: String,
    /// Opaque displayable locator for the current illustration.
    pub image: Option<String>,
    /// Player-facing error summary, kept for optional display.
    pub error: Option<String>,
    /// Progress text shown while a fetch chain runs.
    pub loading_status: String,
}

/// Identifies one fetch chain. Completions carrying a stale token belong to
/// an abandoned transition and are discarded instead of overwriting newer
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FetchToken(u64);

/// Orchestrates initial load, scene transitions, image refresh, and
/// error/restart handling.
pub struct Game {
    scenes: SceneFetcher,
    images: IllustrationFetcher,
    session: Session,
    generation: u64,
}

impl Game {
    pub fn new(scenes: SceneFetcher, images: IllustrationFetcher) -> Self {
        Self {
            scenes,
            images,
            session: Session::default(),
            generation: 0,
        }
    }

    /// Read-only view of the current session for rendering.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Starts a new story. Valid only from [`Phase::Initial`].
    pub async fn start(&mut self) {
        if self.session.phase != Phase::Initial {
            warn!(phase = ?self.session.phase, "start ignored outside the initial phase");
            return;
        }
        let token = self.begin_loading("Conjuring the opening scene...");
        let result = self.scenes.fetch_initial().await;
        self.complete_scene_fetch(token, result).await;
    }

    /// Advances the story with one of the offered choices.
    ///
    /// Valid only from [`Phase::Playing`]. `option` must be one of the
    /// currently offered choices; anything else is a caller bug and is
    /// forwarded to the model as-is.
    pub async fn choose(&mut self, option: &str) {
        if self.session.phase != Phase::Playing {
            warn!(phase = ?self.session.phase, "choose ignored outside the playing phase");
            return;
        }
        let token = self.begin_loading("Writing the next scene...");
        let story = self.session.story.clone();
        let result = self.scenes.fetch_next(&story, option).await;
        self.complete_scene_fetch(token, result).await;
    }

    /// Unconditionally resets the session to a freshly constructed one.
    ///
    /// Does not abort an in-flight fetch; its eventual completion carries a
    /// stale token and is discarded.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.session = Session::default();
        info!("session restarted");
    }

    fn begin_loading(&mut self, status: &str) -> FetchToken {
        self.generation += 1;
        self.session.phase = Phase::Loading;
        self.session.image = None;
        self.session.error = None;
        self.session.loading_status = status.to_string();
        FetchToken(self.generation)
    }

    fn is_current(&self, token: FetchToken) -> bool {
        token.0 == self.generation
    }

    async fn complete_scene_fetch(&mut self, token: FetchToken, result: Result<Scene>) {
        if !self.is_current(token) {
            warn!("discarding stale scene result from an abandoned transition");
            return;
        }
        match result {
            Ok(scene) => {
                info!(choices = scene.choices.len(), "scene received");
                self.session.story = scene.story;
                self.session.choices = scene.choices;
                self.session.image_prompt = scene.image_prompt;
                self.session.error = None;
                self.fetch_illustration(token).await;
            }
            Err(err) => {
                tracing::error!(error = %err, "scene fetch failed");
                // No story is displayable in the error phase.
                self.session.story.clear();
                self.session.choices.clear();
                self.session.image_prompt.clear();
                self.session.image = None;
                self.session.error = Some(err.user_summary().to_string());
                self.session.loading_status.clear();
                self.session.phase = Phase::Error;
            }
        }
    }

    /// Image sub-step, chained explicitly after a successful scene fetch
    /// rather than reacting to the prompt field changing.
    async fn fetch_illustration(&mut self, token: FetchToken) {
        if !self.is_current(token) {
            warn!("skipping illustration for an abandoned transition");
            return;
        }
        self.session.loading_status = "Illustrating the scene...".to_string();
        let prompt = self.session.image_prompt.clone();
        let result = self.images.fetch(&prompt).await;

        if !self.is_current(token) {
            warn!("discarding stale illustration from an abandoned transition");
            return;
        }
        match result {
            Ok(image) => {
                self.session.image = Some(image);
                self.session.error = None;
            }
            Err(err) => {
                // A missing illustration is non-fatal; the story stays playable.
                tracing::error!(error = %err, "illustration fetch failed");
                self.session.image = None;
                self.session.error = Some(err.user_summary().to_string());
            }
        }
        self.session.loading_status.clear();
        self.session.phase = Phase::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GeneratedImage, ImageGenerator, TextGenerator};
    use crate::error::FabulaError;
    use crate::prompts::PromptTemplates;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedText {
        replies: Mutex<VecDeque<Result<String>>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedText {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FabulaError::Generation("script exhausted".into())))
        }
    }

    struct ScriptedImages {
        replies: Mutex<VecDeque<Result<Vec<GeneratedImage>>>>,
    }

    #[async_trait]
    impl ImageGenerator for ScriptedImages {
        async fn generate(&self, _prompt: &str, _count: u32) -> Result<Vec<GeneratedImage>> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FabulaError::ImageGeneration("script exhausted".into())))
        }
    }

    fn scene_json(story: &str) -> Result<String> {
        Ok(format!(
            r#"{{"story":"{story}","choices":["A","B"],"image_prompt":"P"}}"#
        ))
    }

    fn one_image() -> Result<Vec<GeneratedImage>> {
        Ok(vec![GeneratedImage {
            bytes_base64: Some("QUJD".into()),
        }])
    }

    fn game(
        text_replies: Vec<Result<String>>,
        image_replies: Vec<Result<Vec<GeneratedImage>>>,
    ) -> Game {
        let text = Arc::new(ScriptedText {
            replies: Mutex::new(text_replies.into()),
        });
        let images = Arc::new(ScriptedImages {
            replies: Mutex::new(image_replies.into()),
        });
        Game::new(
            SceneFetcher::new(text, PromptTemplates::default()),
            IllustrationFetcher::new(images),
        )
    }

    #[tokio::test]
    async fn start_with_scene_and_image_reaches_playing() {
        let mut game = game(vec![scene_json("S")], vec![one_image()]);
        game.start().await;

        let session = game.session();
        assert_eq!(session.phase, Phase::Playing);
        assert_eq!(session.story, "S");
        assert_eq!(session.choices, vec!["A", "B"]);
        assert_eq!(session.image_prompt, "P");
        assert_eq!(session.image.as_deref(), Some("data:image/jpeg;base64,QUJD"));
        assert_eq!(session.error, None);
        assert!(session.loading_status.is_empty());
    }

    #[tokio::test]
    async fn image_failure_still_reaches_playing() {
        let mut game = game(
            vec![scene_json("S")],
            vec![Err(FabulaError::ImageGeneration("boom".into()))],
        );
        game.start().await;

        let session = game.session();
        assert_eq!(session.phase, Phase::Playing);
        assert_eq!(session.story, "S");
        assert_eq!(session.image, None);
        assert!(session.error.is_some());
    }

    #[tokio::test]
    async fn failing_choose_enters_error_and_clears_the_scene() {
        let mut game = game(
            vec![
                scene_json("S"),
                Err(FabulaError::Generation("unreachable host".into())),
            ],
            vec![one_image()],
        );
        game.start().await;
        game.choose("A").await;

        let session = game.session();
        assert_eq!(session.phase, Phase::Error);
        assert!(session.story.is_empty());
        assert!(session.choices.is_empty());
        assert!(session.image_prompt.is_empty());
        assert_eq!(session.image, None);
        assert!(session.error.is_some());
    }

    #[tokio::test]
    async fn choose_advances_the_story() {
        let mut game = game(
            vec![scene_json("first"), scene_json("second")],
            vec![one_image(), one_image()],
        );
        game.start().await;
        game.choose("A").await;

        assert_eq!(game.session().phase, Phase::Playing);
        assert_eq!(game.session().story, "second");
    }

    #[tokio::test]
    async fn restart_restores_a_fresh_session() {
        let mut game = game(vec![scene_json("S")], vec![one_image()]);
        game.start().await;
        assert_ne!(*game.session(), Session::default());

        game.restart();
        assert_eq!(*game.session(), Session::default());

        // Also from the error phase.
        let mut game = game2_in_error().await;
        game.restart();
        assert_eq!(*game.session(), Session::default());
    }

    async fn game2_in_error() -> Game {
        let mut game = game(vec![Err(FabulaError::Generation("down".into()))], vec![]);
        game.start().await;
        assert_eq!(game.session().phase, Phase::Error);
        game
    }

    #[tokio::test]
    async fn start_is_ignored_outside_initial() {
        let mut game = game(vec![scene_json("S")], vec![one_image()]);
        game.start().await;
        let before = game.session().clone();

        game.start().await;
        assert_eq!(*game.session(), before);
    }

    #[tokio::test]
    async fn choose_is_ignored_outside_playing() {
        let mut game = game(vec![scene_json("S")], vec![one_image()]);
        game.choose("A").await;
        assert_eq!(*game.session(), Session::default());
    }

    #[tokio::test]
    async fn stale_scene_result_is_discarded() {
        let mut game = game(vec![], vec![]);

        // A fetch chain begins, then the player restarts before it lands.
        let token = game.begin_loading("loading");
        game.restart();

        let late_scene = Scene {
            story: "stale".into(),
            choices: vec!["A".into()],
            image_prompt: "P".into(),
        };
        game.complete_scene_fetch(token, Ok(late_scene)).await;

        // The late result must not overwrite the fresh session.
        assert_eq!(*game.session(), Session::default());
    }

    #[tokio::test]
    async fn stale_illustration_is_discarded() {
        let mut game = game(vec![], vec![one_image()]);

        let token = game.begin_loading("loading");
        game.session.image_prompt = "P".into();
        game.restart();

        game.fetch_illustration(token).await;
        assert_eq!(*game.session(), Session::default());
    }

    #[tokio::test]
    async fn loading_clears_previous_image_and_error() {
        let mut game = game(
            vec![
                scene_json("S"),
                Err(FabulaError::Generation("down".into())),
            ],
            vec![one_image()],
        );
        game.start().await;
        assert!(game.session().image.is_some());

        game.choose("A").await;
        // The failed transition discarded the previous image with the scene.
        assert_eq!(game.session().image, None);
    }
}
