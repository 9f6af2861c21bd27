//! Generation domain: task state machine, endpoint contract, prompt rendering.

pub mod endpoint;
pub mod model;
pub mod prompt;

pub use endpoint::{EndpointResponse, GenerativeEndpoint};
pub use model::{GenerationKind, GenerationOutput, GenerationRequest, GenerationTask, TaskStatus};
