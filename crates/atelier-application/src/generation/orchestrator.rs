//! Single-flight generation task runner.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use atelier_core::error::{AtelierError, ErrorKind, Result};
use atelier_core::generation::{
    EndpointResponse, GenerationKind, GenerationOutput, GenerationRequest, GenerationTask,
    GenerativeEndpoint, prompt,
};
use atelier_core::history::{HistoryEntry, HistoryLog};
use atelier_core::notification::{Notification, Notifier};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{OrchestratorSettings, RejectReason, StartOutcome};

struct OrchestratorState {
    task: GenerationTask,
    next_epoch: u64,
    history: HistoryLog,
    torn_down: bool,
    /// Stops the current task's progress ticker.
    ticker: Option<CancellationToken>,
    publisher: watch::Sender<GenerationTask>,
}

impl OrchestratorState {
    fn publish(&self) {
        self.publisher.send_replace(self.task.clone());
    }

    fn stop_ticker(&mut self) {
        if let Some(token) = self.ticker.take() {
            token.cancel();
        }
    }
}

type SharedState = Arc<Mutex<OrchestratorState>>;

fn lock(shared: &Mutex<OrchestratorState>) -> MutexGuard<'_, OrchestratorState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs at most one generation task at a time.
///
/// Each accepted task gets a fresh epoch. Ticks and request resolutions
/// carry the epoch they were started under and are dropped when it no longer
/// matches, or once [`teardown`](Self::teardown) ran. Teardown never aborts
/// an in-flight request; it only suppresses its effect.
///
/// `start` spawns onto the ambient tokio runtime.
pub struct GenerationOrchestrator {
    endpoint: Arc<dyn GenerativeEndpoint>,
    settings: OrchestratorSettings,
    shared: SharedState,
    notifier: Notifier,
}

impl GenerationOrchestrator {
    pub fn new(
        endpoint: Arc<dyn GenerativeEndpoint>,
        settings: OrchestratorSettings,
        notifier: Notifier,
    ) -> Self {
        let (publisher, _) = watch::channel(GenerationTask::idle());
        Self {
            endpoint,
            settings,
            shared: Arc::new(Mutex::new(OrchestratorState {
                task: GenerationTask::idle(),
                next_epoch: 1,
                history: HistoryLog::new(),
                torn_down: false,
                ticker: None,
                publisher,
            })),
            notifier,
        }
    }

    /// Starts `request` unless a task is running or its input is blank.
    ///
    /// The guard and the transition to `running` happen under one lock
    /// before anything is awaited, so two callers cannot both be accepted.
    pub fn start(&self, request: GenerationRequest) -> StartOutcome {
        let mut state = lock(&self.shared);

        if state.torn_down {
            return StartOutcome::Rejected(RejectReason::TornDown);
        }
        if state.task.is_running() {
            tracing::debug!(active_epoch = state.task.epoch, "generation rejected: busy");
            return StartOutcome::Rejected(RejectReason::AlreadyRunning);
        }
        if request.is_blank() {
            return StartOutcome::Rejected(RejectReason::BlankInput);
        }

        let epoch = state.next_epoch;
        state.next_epoch += 1;
        state.task.begin(request.clone(), epoch);

        let ticker = CancellationToken::new();
        state.ticker = Some(ticker.clone());
        state.publish();
        drop(state);

        tracing::info!(epoch, kind = %request.kind(), "generation task accepted");

        self.spawn_ticker(epoch, ticker);
        self.spawn_request(epoch, request);

        StartOutcome::Accepted { epoch }
    }

    /// Stops every effect of the current and future tasks. Idempotent.
    pub fn teardown(&self) {
        let mut state = lock(&self.shared);
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        state.stop_ticker();
        tracing::debug!(epoch = state.task.epoch, "generation orchestrator torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        lock(&self.shared).torn_down
    }

    /// Current task snapshot.
    pub fn task(&self) -> GenerationTask {
        lock(&self.shared).task.clone()
    }

    /// Receives a snapshot on every progress tick and transition.
    pub fn subscribe(&self) -> watch::Receiver<GenerationTask> {
        lock(&self.shared).publisher.subscribe()
    }

    /// Full history in insertion order.
    pub fn history(&self) -> Vec<HistoryEntry> {
        lock(&self.shared).history.entries().to_vec()
    }

    /// The most recent entries, newest first.
    pub fn recent_history(&self) -> Vec<HistoryEntry> {
        lock(&self.shared)
            .history
            .recent(self.settings.history_display_count)
            .cloned()
            .collect()
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    fn spawn_ticker(&self, epoch: u64, token: CancellationToken) {
        let shared = Arc::clone(&self.shared);
        let period = self.settings.tick_interval;
        let increment = self.settings.tick_increment;

        tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {}
                }

                let mut state = lock(&shared);
                if token.is_cancelled() || state.torn_down || state.task.epoch != epoch {
                    break;
                }
                let more = state.task.advance(increment);
                state.publish();
                if !more {
                    break;
                }
            }
            tracing::trace!(epoch, "progress ticker stopped");
        });
    }

    fn spawn_request(&self, epoch: u64, request: GenerationRequest) {
        let shared = Arc::clone(&self.shared);
        let endpoint = Arc::clone(&self.endpoint);
        let notifier = self.notifier.clone();
        let timeout = self.settings.request_timeout;

        tokio::spawn(async move {
            let outcome = run_request(endpoint.as_ref(), &request, timeout).await;
            complete(&shared, &notifier, epoch, outcome);
        });
    }
}

impl Drop for GenerationOrchestrator {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Sends the rendered prompt and classifies the response.
async fn run_request(
    endpoint: &dyn GenerativeEndpoint,
    request: &GenerationRequest,
    timeout: Option<Duration>,
) -> Result<GenerationOutput> {
    let kind = request.kind();
    let rendered = prompt::render(request);

    let call = match kind {
        GenerationKind::Image => endpoint.generate_image(&rendered),
        GenerationKind::Concept | GenerationKind::Prompt => endpoint.generate_text(&rendered),
    };
    let response = match timeout {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            AtelierError::network(
                None,
                format!("generation request timed out after {}s", limit.as_secs()),
            )
        })??,
        None => call.await?,
    };

    match response {
        EndpointResponse::Ok(payload) => match kind {
            GenerationKind::Image => GenerationOutput::image(payload),
            GenerationKind::Concept | GenerationKind::Prompt => Ok(GenerationOutput::text(payload)),
        },
        EndpointResponse::Empty => Err(AtelierError::malformed(format!(
            "{kind} endpoint returned no results"
        ))),
        EndpointResponse::Malformed(reason) => Err(AtelierError::malformed(reason)),
    }
}

/// Applies a request resolution if its epoch is still the active one.
fn complete(
    shared: &Mutex<OrchestratorState>,
    notifier: &Notifier,
    epoch: u64,
    outcome: Result<GenerationOutput>,
) {
    let mut state = lock(shared);
    if state.torn_down {
        tracing::debug!(epoch, "dropping generation result after teardown");
        return;
    }
    if state.task.epoch != epoch || !state.task.is_running() {
        tracing::warn!(epoch, active_epoch = state.task.epoch, "dropping stale generation result");
        return;
    }

    state.stop_ticker();
    let failure = match outcome {
        Ok(output) => {
            if let Some(kind) = state.task.kind() {
                state.history.append(HistoryEntry::new(kind, output.clone()));
            }
            state.task.succeed(output);
            tracing::info!(epoch, history_len = state.history.len(), "generation task succeeded");
            None
        }
        Err(err) => {
            let kind = err.kind();
            state.task.fail(kind);
            tracing::warn!(epoch, ?kind, "generation task failed: {}", err);
            Some(kind)
        }
    };
    state.publish();
    drop(state);

    if let Some(kind) = failure {
        notifier.notify(Notification::error(kind, generation_error_title(kind)));
    }
}

fn generation_error_title(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NetworkError => "Connection error",
        _ => "Generation failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atelier_core::generation::TaskStatus;
    use atelier_core::notification::NotificationLevel;
    use std::collections::VecDeque;
    use tokio::sync::{mpsc, oneshot};

    type Reply = Result<EndpointResponse<String>>;

    /// Endpoint whose responses are released by the test through oneshot gates.
    #[derive(Default)]
    struct GatedEndpoint {
        gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl GatedEndpoint {
        fn gate(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push_back(rx);
            tx
        }

        fn respond_now(&self, reply: Reply) {
            let _ = self.gate().send(reply);
        }

        async fn next(&self, prompt: &str) -> Reply {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let gate = self.gates.lock().unwrap().pop_front();
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(AtelierError::network(None, "gate dropped"))),
                None => Err(AtelierError::internal("no scripted response")),
            }
        }
    }

    #[async_trait]
    impl GenerativeEndpoint for GatedEndpoint {
        async fn generate_text(&self, prompt: &str) -> Reply {
            self.next(prompt).await
        }

        async fn generate_image(&self, prompt: &str) -> Reply {
            self.next(prompt).await
        }
    }

    fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            request_timeout: None,
            ..OrchestratorSettings::default()
        }
    }

    fn build(
        endpoint: &Arc<GatedEndpoint>,
        settings: OrchestratorSettings,
    ) -> (GenerationOrchestrator, mpsc::UnboundedReceiver<Notification>) {
        let (notifier, rx) = Notifier::channel();
        (
            GenerationOrchestrator::new(endpoint.clone(), settings, notifier),
            rx,
        )
    }

    async fn wait_terminal(orchestrator: &GenerationOrchestrator) -> GenerationTask {
        let mut rx = orchestrator.subscribe();
        let task = rx.wait_for(|task| task.status.is_terminal()).await.unwrap();
        task.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_completes_progress_and_records_history() {
        let endpoint = Arc::new(GatedEndpoint::default());
        endpoint.respond_now(Ok(EndpointResponse::Ok("A calm Scandinavian loft".into())));
        let (orchestrator, mut notifications) = build(&endpoint, settings());

        let outcome = orchestrator.start(GenerationRequest::concept("scandinavian loft"));
        assert_eq!(outcome, StartOutcome::Accepted { epoch: 1 });

        let task = wait_terminal(&orchestrator).await;
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.progress, 100.0);
        assert_eq!(
            task.result,
            Some(GenerationOutput::text("A calm Scandinavian loft"))
        );

        let history = orchestrator.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, GenerationKind::Concept);
        assert!(endpoint.prompts.lock().unwrap()[0].contains("scandinavian loft"));
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_rejected_while_running() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let gate = endpoint.gate();
        let (orchestrator, _rx) = build(&endpoint, settings());

        assert!(orchestrator.start(GenerationRequest::concept("first")).is_accepted());
        tokio::time::sleep(Duration::from_millis(350)).await;
        let before = orchestrator.task();

        let outcome = orchestrator.start(GenerationRequest::image("second"));

        assert_eq!(outcome, StartOutcome::Rejected(RejectReason::AlreadyRunning));
        assert_eq!(orchestrator.task(), before);
        assert_eq!(before.request, Some(GenerationRequest::concept("first")));

        gate.send(Ok(EndpointResponse::Ok("done".into()))).unwrap();
        assert_eq!(wait_terminal(&orchestrator).await.status, TaskStatus::Succeeded);
        assert_eq!(endpoint.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_is_rejected() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let (orchestrator, _rx) = build(&endpoint, settings());

        let outcome = orchestrator.start(GenerationRequest::prompt("   ", "Midjourney"));

        assert_eq!(outcome, StartOutcome::Rejected(RejectReason::BlankInput));
        assert_eq!(orchestrator.task(), GenerationTask::idle());
        assert!(endpoint.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_candidates_fail_as_malformed() {
        let endpoint = Arc::new(GatedEndpoint::default());
        endpoint.respond_now(Ok(EndpointResponse::Empty));
        let (orchestrator, mut notifications) = build(&endpoint, settings());

        orchestrator.start(GenerationRequest::concept("boho bedroom"));
        let task = wait_terminal(&orchestrator).await;

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_kind, Some(ErrorKind::MalformedResponse));
        assert_eq!(
            task.message.as_deref(),
            Some(ErrorKind::MalformedResponse.fallback_message())
        );
        assert!(orchestrator.history().is_empty());

        let notification = notifications.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.kind, Some(ErrorKind::MalformedResponse));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_fails_task() {
        let endpoint = Arc::new(GatedEndpoint::default());
        endpoint.respond_now(Err(AtelierError::network(Some(503), "unavailable")));
        let (orchestrator, mut notifications) = build(&endpoint, settings());

        orchestrator.start(GenerationRequest::prompt("misty harbour", "Midjourney"));
        let task = wait_terminal(&orchestrator).await;

        assert_eq!(task.error_kind, Some(ErrorKind::NetworkError));
        assert!(task.result.is_none());
        assert!(orchestrator.history().is_empty());
        assert_eq!(
            notifications.recv().await.unwrap().kind,
            Some(ErrorKind::NetworkError)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_image_payload_is_malformed() {
        let endpoint = Arc::new(GatedEndpoint::default());
        endpoint.respond_now(Ok(EndpointResponse::Ok("not base64 !!".into())));
        let (orchestrator, _rx) = build(&endpoint, settings());

        orchestrator.start(GenerationRequest::image("a lamp"));
        let task = wait_terminal(&orchestrator).await;

        assert_eq!(task.error_kind, Some(ErrorKind::MalformedResponse));
        assert!(orchestrator.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_may_finish_before_result() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let gate = endpoint.gate();
        let (orchestrator, _rx) = build(&endpoint, settings());

        orchestrator.start(GenerationRequest::image("a lamp"));
        tokio::time::sleep(Duration::from_secs(5)).await;

        let task = orchestrator.task();
        assert_eq!(task.progress, 100.0);
        assert_eq!(task.status, TaskStatus::Running);

        gate.send(Ok(EndpointResponse::Ok("aGVsbG8=".into()))).unwrap();
        let task = wait_terminal(&orchestrator).await;
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(
            task.result.and_then(|output| output.image_bytes()),
            Some(b"hello".to_vec())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let gate = endpoint.gate();
        let (orchestrator, _rx) = build(&endpoint, settings());
        let mut rx = orchestrator.subscribe();

        orchestrator.start(GenerationRequest::concept("attic office"));
        let mut last = 0.0;
        for _ in 0..10 {
            rx.changed().await.unwrap();
            let progress = rx.borrow_and_update().progress;
            assert!(progress >= last);
            last = progress;
        }
        assert!(last > 0.0 && last < 100.0);
        drop(gate);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_suppresses_late_resolution() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let gate = endpoint.gate();
        let (orchestrator, mut notifications) = build(&endpoint, settings());

        orchestrator.start(GenerationRequest::concept("tiny kitchen"));
        tokio::time::sleep(Duration::from_millis(500)).await;

        orchestrator.teardown();
        orchestrator.teardown();
        let frozen = orchestrator.task();

        gate.send(Ok(EndpointResponse::Ok("late".into()))).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(orchestrator.task(), frozen);
        assert_eq!(frozen.status, TaskStatus::Running);
        assert!(orchestrator.history().is_empty());
        assert!(notifications.try_recv().is_err());
        assert_eq!(
            orchestrator.start(GenerationRequest::concept("again")),
            StartOutcome::Rejected(RejectReason::TornDown)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_is_network_error() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let _held = endpoint.gate();
        let (orchestrator, _rx) = build(
            &endpoint,
            OrchestratorSettings {
                request_timeout: Some(Duration::from_secs(10)),
                ..OrchestratorSettings::default()
            },
        );

        orchestrator.start(GenerationRequest::concept("glass house"));
        let task = wait_terminal(&orchestrator).await;

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_kind, Some(ErrorKind::NetworkError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_terminal_state() {
        let endpoint = Arc::new(GatedEndpoint::default());
        endpoint.respond_now(Err(AtelierError::network(None, "offline")));
        endpoint.respond_now(Ok(EndpointResponse::Ok("second try".into())));
        let (orchestrator, _rx) = build(&endpoint, settings());

        orchestrator.start(GenerationRequest::concept("courtyard"));
        assert_eq!(wait_terminal(&orchestrator).await.status, TaskStatus::Failed);

        let outcome = orchestrator.start(GenerationRequest::concept("courtyard"));
        assert_eq!(outcome, StartOutcome::Accepted { epoch: 2 });

        let mut rx = orchestrator.subscribe();
        let task = rx
            .wait_for(|task| task.epoch == 2 && task.status.is_terminal())
            .await
            .unwrap()
            .clone();
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.progress, 100.0);
        assert!(task.error_kind.is_none());
        assert_eq!(orchestrator.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_history_is_newest_first_and_bounded() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let (orchestrator, _rx) = build(
            &endpoint,
            OrchestratorSettings {
                history_display_count: 2,
                ..settings()
            },
        );

        for text in ["one", "two", "three"] {
            endpoint.respond_now(Ok(EndpointResponse::Ok(text.into())));
            let request = GenerationRequest::concept(text);
            let StartOutcome::Accepted { epoch } = orchestrator.start(request) else {
                panic!("start rejected");
            };
            let mut rx = orchestrator.subscribe();
            rx.wait_for(|task| task.epoch == epoch && task.status.is_terminal())
                .await
                .unwrap();
        }

        let recent: Vec<_> = orchestrator
            .recent_history()
            .into_iter()
            .map(|entry| entry.content.as_text().unwrap().to_string())
            .collect();
        assert_eq!(recent, vec!["three", "two"]);
        assert_eq!(orchestrator.history().len(), 3);
    }
}
