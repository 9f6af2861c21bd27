//! Generation task domain model.
//!
//! A [`GenerationTask`] is a transient value describing the one task the
//! orchestrator is tracking. Its transition methods are the only way its
//! status changes, and each one refuses to act outside the state it expects.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{AtelierError, ErrorKind, Result};

/// Progress value of a finished sweep.
pub const PROGRESS_COMPLETE: f32 = 100.0;

/// What a task produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// Interior design concept write-up (text endpoint).
    Concept,
    /// Optimised prompt for an image tool (text endpoint).
    Prompt,
    /// Rendered image (image endpoint).
    Image,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Prompt => "prompt",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific input payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRequest {
    Concept { description: String },
    Prompt { idea: String, target_tool: String },
    Image { prompt: String },
}

impl GenerationRequest {
    pub fn concept(description: impl Into<String>) -> Self {
        Self::Concept {
            description: description.into(),
        }
    }

    pub fn prompt(idea: impl Into<String>, target_tool: impl Into<String>) -> Self {
        Self::Prompt {
            idea: idea.into(),
            target_tool: target_tool.into(),
        }
    }

    pub fn image(prompt: impl Into<String>) -> Self {
        Self::Image {
            prompt: prompt.into(),
        }
    }

    pub fn kind(&self) -> GenerationKind {
        match self {
            Self::Concept { .. } => GenerationKind::Concept,
            Self::Prompt { .. } => GenerationKind::Prompt,
            Self::Image { .. } => GenerationKind::Image,
        }
    }

    /// The free-text part the user typed.
    pub fn user_text(&self) -> &str {
        match self {
            Self::Concept { description } => description,
            Self::Prompt { idea, .. } => idea,
            Self::Image { prompt } => prompt,
        }
    }

    /// True when the user-typed text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.user_text().trim().is_empty()
    }
}

/// Successful result of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationOutput {
    Text { text: String },
    Image { base64: String },
}

impl GenerationOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Wraps a base64 PNG payload, rejecting data that does not decode.
    pub fn image(base64: impl Into<String>) -> Result<Self> {
        let base64 = base64.into();
        if base64.is_empty() {
            return Err(AtelierError::malformed("image payload is empty"));
        }
        BASE64_STANDARD
            .decode(&base64)
            .map_err(|e| AtelierError::malformed(format!("image payload is not base64: {e}")))?;
        Ok(Self::Image { base64 })
    }

    /// `data:` URL suitable for an `<img src>`; `None` for text output.
    pub fn data_url(&self) -> Option<String> {
        match self {
            Self::Image { base64 } => Some(format!("data:image/png;base64,{base64}")),
            Self::Text { .. } => None,
        }
    }

    /// Raw image bytes; `None` for text output.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::Image { base64 } => BASE64_STANDARD.decode(base64).ok(),
            Self::Text { .. } => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// Lifecycle status of a generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Nothing has been started yet.
    #[default]
    Idle,
    /// A request is in flight.
    Running,
    /// The request resolved with a well-formed payload.
    Succeeded,
    /// The request failed or returned an unusable payload.
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Snapshot of the orchestrator's current task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationTask {
    /// Monotonic token identifying the task; 0 before the first start.
    pub epoch: u64,
    pub request: Option<GenerationRequest>,
    pub status: TaskStatus,
    /// 0..=100, never decreases while running.
    pub progress: f32,
    pub result: Option<GenerationOutput>,
    pub error_kind: Option<ErrorKind>,
    /// User-facing text shown in place of a result after a failure.
    pub message: Option<String>,
}

impl GenerationTask {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> Option<GenerationKind> {
        self.request.as_ref().map(GenerationRequest::kind)
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    /// Replaces the current (non-running) task with a fresh running one.
    pub fn begin(&mut self, request: GenerationRequest, epoch: u64) {
        *self = Self {
            epoch,
            request: Some(request),
            status: TaskStatus::Running,
            progress: 0.0,
            result: None,
            error_kind: None,
            message: None,
        };
    }

    /// Adds one cosmetic tick. Returns false once no further ticks apply
    /// (the task left `running`, or progress already reached 100).
    pub fn advance(&mut self, increment: f32) -> bool {
        if !self.is_running() || self.progress >= PROGRESS_COMPLETE {
            return false;
        }
        self.progress = (self.progress + increment).min(PROGRESS_COMPLETE);
        self.progress < PROGRESS_COMPLETE
    }

    pub fn succeed(&mut self, output: GenerationOutput) {
        if !self.is_running() {
            return;
        }
        self.status = TaskStatus::Succeeded;
        self.progress = PROGRESS_COMPLETE;
        self.result = Some(output);
    }

    pub fn fail(&mut self, kind: ErrorKind) {
        if !self.is_running() {
            return;
        }
        self.status = TaskStatus::Failed;
        self.error_kind = Some(kind);
        self.message = Some(kind.fallback_message().to_string());
    }
}
