//! GeminiEndpoint - Direct REST API implementation for Gemini and Imagen.
//!
//! Text tasks call `generateContent` on the text model, image tasks call
//! `predict` on the image model. Response bodies are classified into
//! [`EndpointResponse`] here so nothing downstream inspects raw JSON.

use async_trait::async_trait;
use atelier_core::config::GeminiSettings;
use atelier_core::error::{AtelierError, Result};
use atelier_core::generation::{EndpointResponse, GenerativeEndpoint};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Header carrying the API key; request URLs never contain it.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Generative endpoint backed by the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiEndpoint {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiEndpoint {
    /// Creates an endpoint with the provided API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = GeminiSettings::default();
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: defaults.base_url,
            text_model: defaults.text_model,
            image_model: defaults.image_model,
        }
    }

    /// Builds an endpoint from configuration. Fails when no API key is set.
    pub fn from_settings(settings: &GeminiSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AtelierError::config("Gemini API key is not configured (gemini.api_key)")
            })?;

        Ok(Self::new(api_key)
            .with_base_url(settings.base_url.clone())
            .with_models(settings.text_model.clone(), settings.image_model.clone()))
    }

    /// Overrides the API root (useful for proxies and local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the models after construction.
    pub fn with_models(
        mut self,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        self.text_model = text_model.into();
        self.image_model = image_model.into();
        self
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/{model}:{method}", self.base_url)
    }

    async fn post<B: Serialize + Sync>(&self, url: String, body: &B) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                let err = err.without_url();
                AtelierError::network(None, format!("Gemini API request failed: {err}"))
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|err| {
            let err = err.without_url();
            AtelierError::network(
                Some(status.as_u16()),
                format!("Failed to read Gemini response: {err}"),
            )
        })?;

        if !status.is_success() {
            return Err(map_http_error(status, body_text));
        }

        Ok(body_text)
    }
}

#[async_trait]
impl GenerativeEndpoint for GeminiEndpoint {
    async fn generate_text(&self, prompt: &str) -> Result<EndpointResponse<String>> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        tracing::debug!(model = %self.text_model, "sending generateContent request");
        let body = self.post(self.url(&self.text_model, "generateContent"), &request).await?;
        Ok(parse_text_response(&body))
    }

    async fn generate_image(&self, prompt: &str) -> Result<EndpointResponse<String>> {
        let request = PredictRequest {
            instances: Instance {
                prompt: prompt.to_string(),
            },
            parameters: Parameters { sample_count: 1 },
        };

        tracing::debug!(model = %self.image_model, "sending predict request");
        let body = self.post(self.url(&self.image_model, "predict"), &request).await?;
        Ok(parse_image_response(&body))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Instance,
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
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
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

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

// ============================================================================
// Boundary parsing
// ============================================================================

/// Classifies a `generateContent` body: first candidate, first part, text.
pub fn parse_text_response(body: &str) -> EndpointResponse<String> {
    let parsed: GenerateContentResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) => return EndpointResponse::Malformed(format!("invalid JSON: {err}")),
    };

    let Some(candidate) = parsed.candidates.and_then(|c| c.into_iter().next()) else {
        return EndpointResponse::Empty;
    };

    match candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
    {
        Some(text) if !text.is_empty() => EndpointResponse::Ok(text),
        _ => EndpointResponse::Malformed("first candidate carries no text part".into()),
    }
}

/// Classifies a `predict` body: first prediction's base64 bytes.
pub fn parse_image_response(body: &str) -> EndpointResponse<String> {
    let parsed: PredictResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) => return EndpointResponse::Malformed(format!("invalid JSON: {err}")),
    };

    let Some(prediction) = parsed.predictions.and_then(|p| p.into_iter().next()) else {
        return EndpointResponse::Empty;
    };

    match prediction.bytes_base64_encoded {
        Some(bytes) if !bytes.is_empty() => EndpointResponse::Ok(bytes),
        _ => EndpointResponse::Malformed("first prediction carries no image bytes".into()),
    }
}

fn map_http_error(status: StatusCode, body: String) -> AtelierError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    AtelierError::network(Some(status.as_u16()), message)
}
