//! HTTP clients for the generative endpoints.

pub mod gemini_endpoint;

pub use gemini_endpoint::GeminiEndpoint;
