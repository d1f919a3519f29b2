//! Imagen image-generation client - direct REST API implementation.
//!
//! Calls the `predict` endpoint and hands back base64 JPEG payloads; the
//! data-URI wrapping and safety reclassification happen upstream in the
//! illustration fetcher.

use async_trait::async_trait;
use fabula_core::backend::{GeneratedImage, ImageGenerator};
use fabula_core::error::{FabulaError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::service_error_message;

pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Imagen `predict` HTTP API.
#[derive(Clone)]
pub struct ImagenClient {
    client: Client,
    api_key: String,
    model: String,
}

impl ImagenClient {
    /// Creates a new client with the provided API key and the default model.
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<GeneratedImage>> {
        let url = format!(
            "{}/{model}:predict?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let request = PredictRequest {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: Parameters {
                sample_count: count,
                output_options: OutputOptions {
                    mime_type: "image/jpeg".to_string(),
                },
            },
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                FabulaError::ImageGeneration(format!("Imagen API request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Imagen error body".to_string());
            tracing::error!(%status, body = %body_text, "Imagen request rejected");
            return Err(FabulaError::ImageGeneration(service_error_message(
                status, &body_text,
            )));
        }

        let parsed: PredictResponse = response.json().await.map_err(|err| {
            FabulaError::ImageGeneration(format!("failed to parse Imagen response: {err}"))
        })?;

        Ok(parsed
            .predictions
            .unwrap_or_default()
            .into_iter()
            .map(|prediction| GeneratedImage {
                bytes_base64: prediction.bytes_base64_encoded,
            })
            .collect())
    }
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
    output_options: OutputOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}
