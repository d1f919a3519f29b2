//! Error types for the Fabula application.

use thiserror::Error;

/// A shared error type for the entire Fabula application.
///
/// Variants carry the underlying error text for the logs; the player only
/// ever sees the short string from [`FabulaError::user_summary`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FabulaError {
    /// No API key configured. Fatal at startup, blocks all requests.
    #[error(
        "no API key configured: set `gemini.api_key` in secret.json or the GEMINI_API_KEY environment variable"
    )]
    CredentialMissing,

    /// An API key was present but the client could not be constructed.
    #[error("client initialization failed: {0}")]
    ClientInit(String),

    /// The model reply was not syntactically valid JSON.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    /// The model reply was valid JSON but did not match the scene shape.
    #[error("invalid scene shape: {0}")]
    InvalidSceneShape(String),

    /// The model reply parsed to JSON `null` instead of a scene object.
    #[error("model returned no scene data")]
    EmptyScene,

    /// Text generation failed at the transport or service level.
    #[error("story generation failed: {0}")]
    Generation(String),

    /// Image generation failed at the transport or service level.
    #[error("image generation failed: {0}")]
    ImageGeneration(String),

    /// Image generation was blocked by the service's moderation policy.
    #[error("image generation blocked by safety policy: {0}")]
    ImageSafetyRejected(String),

    /// The image service replied without a usable image payload.
    #[error("no image was produced")]
    NoImageProduced,
}

impl FabulaError {
    /// Creates a ClientInit error
    pub fn client_init(message: impl Into<String>) -> Self {
        Self::ClientInit(message.into())
    }

    /// Creates a Generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Creates an ImageGeneration error
    pub fn image_generation(message: impl Into<String>) -> Self {
        Self::ImageGeneration(message.into())
    }

    /// Check if this error came from the image fetch chain.
    ///
    /// Image errors are non-fatal to the session: the story stays playable
    /// without its illustration.
    pub fn is_image_error(&self) -> bool {
        matches!(
            self,
            Self::ImageGeneration(_) | Self::ImageSafetyRejected(_) | Self::NoImageProduced
        )
    }

    /// The short player-facing summary for this error.
    ///
    /// Full diagnostic detail (raw response text, underlying errors) goes to
    /// the logs only and must never reach the player.
    pub fn user_summary(&self) -> &'static str {
        match self {
            Self::CredentialMissing => {
                "No API key is configured. Set GEMINI_API_KEY or create ~/.config/fabula/secret.json."
            }
            Self::ClientInit(_) => "Failed to initialize the API client. Check your API key.",
            Self::MalformedResponse(_)
            | Self::InvalidSceneShape(_)
            | Self::EmptyScene
            | Self::Generation(_) => "Failed to retrieve the story.",
            Self::ImageSafetyRejected(_) => {
                "The illustration was blocked by the service's safety policy."
            }
            Self::ImageGeneration(_) | Self::NoImageProduced => "Failed to illustrate the scene.",
        }
    }
}

/// A type alias for `Result<T, FabulaError>`.
pub type Result<T> = std::result::Result<T, FabulaError>;
