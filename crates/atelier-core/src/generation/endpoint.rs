//! Generative endpoint contract.

use async_trait::async_trait;

use crate::error::Result;

/// Response of a generative endpoint, classified at the parsing boundary.
///
/// Downstream code matches on this instead of probing optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointResponse<T> {
    /// The contract's payload was present.
    Ok(T),
    /// Well-formed response with no candidates/predictions.
    Empty,
    /// The body did not match the contract.
    Malformed(String),
}

/// Remote text and image generation.
///
/// `Err` means the request itself failed (transport, non-2xx status,
/// timeout). Anything the server answered is reported through
/// [`EndpointResponse`].
#[async_trait]
pub trait GenerativeEndpoint: Send + Sync + 'static {
    /// `{prompt}` → first candidate's first text part.
    async fn generate_text(&self, prompt: &str) -> Result<EndpointResponse<String>>;

    /// `{prompt, sampleCount: 1}` → first prediction's base64 image bytes.
    async fn generate_image(&self, prompt: &str) -> Result<EndpointResponse<String>>;
}
