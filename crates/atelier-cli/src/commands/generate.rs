use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use atelier_application::{GenerationOrchestrator, OrchestratorSettings, StartOutcome};
use atelier_core::generation::prompt::PROMPT_TARGET_TOOLS;
use atelier_core::generation::{GenerationOutput, GenerationRequest, GenerationTask, TaskStatus};
use atelier_core::history::HistoryEntry;
use atelier_core::notification::{Notification, Notifier};
use atelier_interaction::GeminiEndpoint;
use clap::ValueEnum;
use tokio::sync::mpsc;

use super::Context;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Interior design concept from a room description
    Concept,
    /// Optimised prompt for an image tool
    Prompt,
    /// Rendered image
    Image,
}

pub struct GenerateArgs {
    pub kind: KindArg,
    pub text: String,
    pub tool: String,
    pub out: Option<PathBuf>,
}

impl GenerateArgs {
    fn request(&self) -> GenerationRequest {
        match self.kind {
            KindArg::Concept => GenerationRequest::concept(&self.text),
            KindArg::Prompt => GenerationRequest::prompt(&self.text, &self.tool),
            KindArg::Image => GenerationRequest::image(&self.text),
        }
    }
}

pub async fn run(ctx: &Context, args: GenerateArgs) -> Result<()> {
    let endpoint = GeminiEndpoint::from_settings(&ctx.config.gemini)
        .context("Set gemini.api_key in config.toml or the GEMINI_API_KEY environment variable")?;
    let (notifier, mut notifications) = Notifier::channel();
    let orchestrator = GenerationOrchestrator::new(
        Arc::new(endpoint),
        OrchestratorSettings::from_config(&ctx.config),
        notifier,
    );

    if matches!(args.kind, KindArg::Prompt) && !PROMPT_TARGET_TOOLS.contains(&args.tool.as_str()) {
        tracing::warn!(
            "{} is not a known prompt target (known: {})",
            args.tool,
            PROMPT_TARGET_TOOLS.join(", ")
        );
    }

    let request = args.request();
    let mut updates = orchestrator.subscribe();
    let epoch = match orchestrator.start(request.clone()) {
        StartOutcome::Accepted { epoch } => epoch,
        StartOutcome::Rejected(reason) => bail!("Generation not started: {reason}"),
    };
    tracing::debug!(epoch, "waiting for generation task");

    let task = follow_progress(&mut updates, &request).await?;
    report_notifications(&mut notifications);

    match task.status {
        TaskStatus::Succeeded => {
            if let Some(output) = &task.result {
                print_output(output, args.out.as_ref())?;
            }
        }
        TaskStatus::Failed => bail!(
            "{}",
            task.message
                .unwrap_or_else(|| "Generation failed".to_string())
        ),
        TaskStatus::Idle | TaskStatus::Running => bail!("Generation ended unexpectedly"),
    }

    print_history(&orchestrator.recent_history());
    Ok(())
}

/// Renders the progress bar on stderr until the task is terminal.
async fn follow_progress(
    updates: &mut tokio::sync::watch::Receiver<GenerationTask>,
    request: &GenerationRequest,
) -> Result<GenerationTask> {
    let mut stderr = std::io::stderr();
    loop {
        let task = updates.borrow_and_update().clone();
        let _ = write!(
            stderr,
            "\r[{:<20}] {:>3.0}% generating {}",
            "#".repeat((task.progress / 5.0) as usize),
            task.progress,
            request.kind()
        );
        let _ = stderr.flush();

        if task.status.is_terminal() {
            let _ = writeln!(stderr);
            return Ok(task);
        }
        updates
            .changed()
            .await
            .context("Generation task was dropped")?;
    }
}

fn report_notifications(notifications: &mut mpsc::UnboundedReceiver<Notification>) {
    while let Ok(notification) = notifications.try_recv() {
        eprintln!("{}: {}", notification.title, notification.message);
    }
}

fn print_output(output: &GenerationOutput, out: Option<&PathBuf>) -> Result<()> {
    match output {
        GenerationOutput::Text { text } => println!("{text}"),
        GenerationOutput::Image { .. } => match (out, output.image_bytes()) {
            (Some(path), Some(bytes)) => {
                std::fs::write(path, &bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Image saved to {} ({} bytes)", path.display(), bytes.len());
            }
            _ => {
                if let Some(url) = output.data_url() {
                    println!("{url}");
                }
            }
        },
    }
    Ok(())
}

fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        return;
    }
    eprintln!("\nRecent results:");
    for entry in entries {
        let preview = match &entry.content {
            GenerationOutput::Text { text } => text.lines().next().unwrap_or_default().to_string(),
            GenerationOutput::Image { base64 } => format!("<image, {} base64 chars>", base64.len()),
        };
        eprintln!(
            "  {} {:<8} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.kind.as_str(),
            preview
        );
    }
}
