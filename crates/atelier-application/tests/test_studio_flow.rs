//! End-to-end flow over the in-memory store: sign in, browse, bookmark,
//! generate, sign out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atelier_application::{
    BookmarkToggle, GenerationOrchestrator, LifecycleState, OrchestratorSettings, StartOutcome,
    SubscriptionManager, SyncHandle, SyncSnapshot, ToggleAction,
};
use atelier_core::catalog::{CatalogEntry, CatalogQuery, bookmarked_entries};
use atelier_core::error::Result;
use atelier_core::generation::{
    EndpointResponse, GenerationKind, GenerationRequest, GenerativeEndpoint, TaskStatus,
};
use atelier_core::identity::{IdentityId, IdentitySignal};
use atelier_core::notification::{NotificationLevel, Notifier};
use atelier_infrastructure::{InMemoryRemoteStore, SeedCatalog};
use tokio::sync::watch;

const APP_ID: &str = "studio";

/// Endpoint answering every request with a fixed text.
struct EchoEndpoint;

#[async_trait]
impl GenerativeEndpoint for EchoEndpoint {
    async fn generate_text(&self, prompt: &str) -> Result<EndpointResponse<String>> {
        Ok(EndpointResponse::Ok(format!("concept for {} chars", prompt.len())))
    }

    async fn generate_image(&self, _prompt: &str) -> Result<EndpointResponse<String>> {
        Ok(EndpointResponse::Ok("aGVsbG8=".to_string()))
    }
}

async fn wait_until(handle: &SyncHandle, predicate: impl FnMut(&SyncSnapshot) -> bool) {
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("state did not converge")
        .expect("publisher dropped");
}

#[tokio::test]
async fn test_directory_session() {
    let seed = SeedCatalog::builtin().unwrap();
    let store = InMemoryRemoteStore::with_catalog(
        APP_ID,
        vec![
            CatalogEntry::new("midjourney", "Midjourney v7").with_category("Image Generation"),
            CatalogEntry::new("roomgpt", "RoomGPT").with_category("Interior Design"),
        ],
    );
    let (notifier, mut notifications) = Notifier::channel();
    let manager = SubscriptionManager::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        APP_ID,
        seed.entries().to_vec(),
        notifier.clone(),
    );
    let handle = manager.handle();
    let toggle = BookmarkToggle::new(Arc::new(store.clone()), handle.clone(), notifier);

    let (signals, rx) = watch::channel(IdentitySignal::unready());
    let follower = tokio::spawn(async move { manager.follow(rx).await });

    // Anonymous: catalog merges, bookmarks refused
    signals.send_replace(IdentitySignal::anonymous());
    wait_until(&handle, |s| s.catalog.iter().any(|e| e.id == "roomgpt")).await;

    let catalog = handle.catalog();
    assert_eq!(catalog.len(), seed.len() + 1);
    let midjourney = catalog.iter().find(|e| e.id == "midjourney").unwrap();
    assert_eq!(midjourney.name, "Midjourney v7");
    assert_eq!(CatalogQuery::new("roomgpt").apply(&catalog).len(), 1);

    assert!(toggle.toggle("midjourney").await.unwrap_err().is_auth_required());
    assert_eq!(
        notifications.recv().await.unwrap().level,
        NotificationLevel::Error
    );

    // Signed in: bookmark round trip through the channel
    signals.send_replace(IdentitySignal::signed_in("alice"));
    wait_until(&handle, |s| {
        s.state == LifecycleState::ReadyWithIdentity(IdentityId::new("alice"))
    })
    .await;

    assert_eq!(toggle.toggle("roomgpt").await.unwrap(), ToggleAction::Added);
    wait_until(&handle, |s| s.bookmarks.contains("roomgpt")).await;
    let saved = bookmarked_entries(&handle.catalog(), &handle.bookmarks())
        .into_iter()
        .map(|e| e.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(saved, vec!["roomgpt"]);

    // Signed out: bookmarks cleared, bookmark listener released
    signals.send_replace(IdentitySignal::anonymous());
    wait_until(&handle, |s| s.state == LifecycleState::ReadyNoIdentity).await;
    assert!(handle.bookmarks().is_empty());
    assert_eq!(store.total_bookmark_listeners(), 0);
    assert_eq!(store.catalog_listener_count(), 1);

    drop(signals);
    follower.await.unwrap();
}

#[tokio::test]
async fn test_generation_session() {
    let (notifier, _notifications) = Notifier::channel();
    let orchestrator = GenerationOrchestrator::new(
        Arc::new(EchoEndpoint),
        OrchestratorSettings {
            tick_interval: Duration::from_millis(5),
            ..OrchestratorSettings::default()
        },
        notifier,
    );

    let requests = [
        GenerationRequest::concept("japandi living room"),
        GenerationRequest::prompt("rainy neon alley", "Stable Diffusion"),
        GenerationRequest::image("a walnut desk by a window"),
    ];
    for request in requests {
        let StartOutcome::Accepted { epoch } = orchestrator.start(request) else {
            panic!("start rejected");
        };
        let mut rx = orchestrator.subscribe();
        let task = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|task| task.epoch == epoch && task.status.is_terminal()),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.progress, 100.0);
    }

    let kinds: Vec<_> = orchestrator
        .recent_history()
        .into_iter()
        .map(|entry| entry.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            GenerationKind::Image,
            GenerationKind::Prompt,
            GenerationKind::Concept
        ]
    );

    orchestrator.teardown();
    assert!(orchestrator.is_torn_down());
}
