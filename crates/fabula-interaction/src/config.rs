//! Credential configuration for the hosted generation services.
//!
//! Reads `~/.config/fabula/secret.json`, falling back to environment
//! variables. A missing key blocks startup before any request is made.
//! Error messages never contain the key itself.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use fabula_core::error::{FabulaError, Result};
use serde::Deserialize;

/// Root structure of secret.json.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub image_model_name: Option<String>,
}

impl GeminiConfig {
    /// Loads configuration.
    ///
    /// Priority:
    /// 1. `~/.config/fabula/secret.json`
    /// 2. Environment variables (`GEMINI_API_KEY`, `GEMINI_MODEL_NAME`)
    pub fn load() -> Result<Self> {
        if let Some(path) = default_path()
            && path.exists()
        {
            return Self::load_from(&path);
        }

        let api_key = env::var("GEMINI_API_KEY").map_err(|_| FabulaError::CredentialMissing)?;
        Self::validated(Self {
            api_key,
            model_name: env::var("GEMINI_MODEL_NAME").ok(),
            image_model_name: None,
        })
    }

    /// Loads configuration from a specific secret.json (for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FabulaError::ClientInit(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: SecretConfig = serde_json::from_str(&content).map_err(|e| {
            FabulaError::ClientInit(format!("failed to parse {}: {}", path.display(), e))
        })?;
        let gemini = config.gemini.ok_or(FabulaError::CredentialMissing)?;
        Self::validated(gemini)
    }

    fn validated(config: Self) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(FabulaError::CredentialMissing);
        }
        Ok(config)
    }
}

/// Path to the configuration file: `~/.config/fabula/secret.json`.
fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("fabula").join("secret.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_secret(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_gemini_section() {
        let (_dir, path) = write_secret(
            r#"{"gemini":{"api_key":"k","model_name":"gemini-x","image_model_name":"imagen-y"}}"#,
        );
        let config = GeminiConfig::load_from(&path).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.model_name.as_deref(), Some("gemini-x"));
        assert_eq!(config.image_model_name.as_deref(), Some("imagen-y"));
    }

    #[test]
    fn missing_gemini_section_is_credential_missing() {
        let (_dir, path) = write_secret(r#"{}"#);
        assert_eq!(
            GeminiConfig::load_from(&path).unwrap_err(),
            FabulaError::CredentialMissing
        );
    }

    #[test]
    fn blank_key_is_credential_missing() {
        let (_dir, path) = write_secret(r#"{"gemini":{"api_key":"  "}}"#);
        assert_eq!(
            GeminiConfig::load_from(&path).unwrap_err(),
            FabulaError::CredentialMissing
        );
    }

    #[test]
    fn unparseable_file_does_not_leak_contents() {
        let (_dir, path) = write_secret("not json");
        let err = GeminiConfig::load_from(&path).unwrap_err();
        match err {
            FabulaError::ClientInit(message) => assert!(!message.contains("not json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
