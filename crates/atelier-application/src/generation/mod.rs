//! Generation task orchestration.
//!
//! One task at a time: a cosmetic progress ticker and the real endpoint
//! request run side by side, and only the request decides the outcome.

mod orchestrator;
mod settings;

pub use orchestrator::GenerationOrchestrator;
pub use settings::OrchestratorSettings;

/// Result of [`GenerationOrchestrator::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The task is running under `epoch`.
    Accepted { epoch: u64 },
    /// Nothing changed.
    Rejected(RejectReason),
}

impl StartOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another task is still running.
    AlreadyRunning,
    /// The request's input text is empty or whitespace.
    BlankInput,
    /// The orchestrator was torn down.
    TornDown,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::AlreadyRunning => "a generation task is already running",
            Self::BlankInput => "input is empty",
            Self::TornDown => "orchestrator has been torn down",
        };
        f.write_str(text)
    }
}
