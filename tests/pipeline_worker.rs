//! End-to-end tests for the async pipeline against in-memory collaborators.
//!
//! Time is paused, so the undo window elapses only when a test sleeps past it.

use async_trait::async_trait;
use material_tracker::domain::{MaterialRecord, TrackerError, UnitType};
use material_tracker::pipeline::{ConnectionState, Notice, SortColumn, StatsScope, UndoPhase};
use material_tracker::preferences::MemoryPreferences;
use material_tracker::remote::{DocumentStore, FeedSubscription, InMemoryStore};
use material_tracker::worker::{spawn_pipeline, ConfirmationPrompt, PipelineHandle, StaticConfirmation};
use material_tracker::Config;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, Mutex};

const COLLECTION: &str = "materials";
const PAST_WINDOW: Duration = Duration::from_millis(4_001);

fn records() -> Vec<MaterialRecord> {
    vec![
        MaterialRecord::new("a", "red", 50, true, "scrap"),
        MaterialRecord::new("b", "blue", 100, false, "sheet"),
        MaterialRecord::new("c", "red", 800, false, "sheet"),
    ]
}

struct Harness {
    store: Arc<InMemoryStore>,
    prefs: Arc<MemoryPreferences>,
    handle: PipelineHandle,
}

async fn start_with(
    store: InMemoryStore,
    prefs: MemoryPreferences,
    confirm: bool,
) -> Harness {
    let store = Arc::new(store);
    let prefs = Arc::new(prefs);
    store.seed(COLLECTION, records()).await;

    let handle = spawn_pipeline(
        &Config::default(),
        store.clone(),
        prefs.clone(),
        Arc::new(StaticConfirmation(confirm)),
    )
    .await
    .unwrap();
    handle
        .wait_for(|v| v.connection == ConnectionState::Connected)
        .await
        .unwrap();

    Harness { store, prefs, handle }
}

async fn start() -> Harness {
    start_with(InMemoryStore::new(), MemoryPreferences::new(), false).await
}

async fn expect_notice(
    notices: &mut broadcast::Receiver<Notice>,
    mut predicate: impl FnMut(&Notice) -> bool,
) -> Notice {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let notice = notices.recv().await.unwrap();
            if predicate(&notice) {
                return notice;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn filters_and_sort_drive_the_visible_list() {
    let Harness { handle, .. } = start().await;

    let view = handle.toggle_color("red").await.unwrap();
    assert_eq!(view.visible_ids(), ["a", "c"]);

    handle.sort_by(SortColumn::Weight).await.unwrap();
    let view = handle.sort_by(SortColumn::Weight).await.unwrap();
    assert_eq!(view.visible_ids(), ["c", "a"]);

    assert_eq!(view.summary.count, 3);
    let view = handle.set_stats_scope(StatsScope::Filtered).await.unwrap();
    assert_eq!(view.summary.count, 2);
    assert!((view.summary.grams.mean - 425.0).abs() < 1e-9);

    let view = handle.clear_filters().await.unwrap();
    assert_eq!(view.visible_ids(), ["c", "b", "a"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn undo_inside_window_never_reaches_the_store() {
    let Harness { store, handle, .. } = start().await;
    let mut notices = handle.notices();

    let view = handle.delete_item("a").await.unwrap();
    assert_eq!(view.visible_ids(), ["b", "c"]);
    assert_eq!(view.undo_phase, UndoPhase::PendingDelete);
    assert_eq!(view.summary.count, 2);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let view = handle.undo().await.unwrap();
    assert_eq!(view.visible_ids(), ["a", "b", "c"]);
    assert!(view.pending.is_none());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.delete_calls(), 0);
    assert!(store.requested_deletes().await.is_empty());

    assert_eq!(
        notices.recv().await.unwrap(),
        Notice::DeletionPending { generation: 1, count: 1 }
    );
    assert_eq!(notices.recv().await.unwrap(), Notice::DeletionRestored { count: 1 });

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn elapsed_window_commits_exactly_once() {
    let Harness { store, handle, .. } = start().await;

    handle.delete_item("b").await.unwrap();
    tokio::time::sleep(PAST_WINDOW).await;

    let view = handle
        .wait_for(|v| v.undo_phase == UndoPhase::Idle && v.snapshot.len() == 2)
        .await
        .unwrap();
    assert_eq!(view.visible_ids(), ["a", "c"]);

    let view = handle.undo().await.unwrap();
    assert_eq!(view.visible_ids(), ["a", "c"]);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.delete_calls(), 1);
    assert_eq!(store.requested_deletes().await, ["b"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn new_delete_commits_the_previous_batch() {
    let Harness { store, handle, .. } = start().await;

    handle.delete_item("a").await.unwrap();
    let view = handle.delete_item("b").await.unwrap();
    assert_eq!(view.visible_ids(), ["c"]);

    handle
        .wait_for(|v| v.snapshot.get("a").is_none())
        .await
        .unwrap();
    assert_eq!(store.requested_deletes().await, ["a"]);

    let view = handle.undo().await.unwrap();
    assert_eq!(view.visible_ids(), ["b", "c"]);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.requested_deletes().await, ["a"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn selected_items_are_deleted_and_restored_together() {
    let Harness { handle, .. } = start().await;
    let mut notices = handle.notices();

    handle.toggle_selection("a").await.unwrap();
    let view = handle.toggle_selection("c").await.unwrap();
    assert_eq!(view.selection.len(), 2);

    let view = handle.delete_selected().await.unwrap();
    assert_eq!(view.visible_ids(), ["b"]);
    assert!(view.selection.is_empty());

    let view = handle.undo().await.unwrap();
    assert_eq!(view.visible_ids(), ["a", "b", "c"]);
    assert!(view.selection.is_empty());

    expect_notice(&mut notices, |n| *n == Notice::DeletionRestored { count: 2 }).await;

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn confirmed_clear_all_deletes_everything_including_pending() {
    let Harness { store, handle, .. } = start_with(InMemoryStore::new(), MemoryPreferences::new(), true).await;

    handle.delete_item("a").await.unwrap();
    handle.clear_all().await.unwrap();

    let view = handle
        .wait_for(|v| v.snapshot.is_empty() && v.undo_phase == UndoPhase::Idle)
        .await
        .unwrap();
    assert!(view.visible.is_empty());
    assert!(!view.awaiting_clear_confirmation);

    let view = handle.undo().await.unwrap();
    assert!(view.visible.is_empty());

    let mut requested = store.requested_deletes().await;
    requested.sort();
    assert_eq!(requested, ["a", "b", "c"]);
    assert_eq!(store.delete_calls(), 3);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn batch_capable_store_clears_in_one_call() {
    let Harness { store, handle, .. } = start_with(
        InMemoryStore::new().with_batch_support(true),
        MemoryPreferences::new(),
        true,
    )
    .await;

    handle.clear_all().await.unwrap();
    handle.wait_for(|v| v.snapshot.is_empty()).await.unwrap();

    assert_eq!(store.batch_calls(), 1);
    assert_eq!(store.delete_calls(), 0);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn declined_clear_all_changes_nothing() {
    let Harness { store, handle, .. } = start().await;
    let mut notices = handle.notices();

    let view = handle.clear_all().await.unwrap();
    assert!(view.awaiting_clear_confirmation);
    assert_eq!(view.visible.len(), 3);

    expect_notice(&mut notices, |n| *n == Notice::ClearAllCancelled).await;
    let view = handle.wait_for(|v| !v.awaiting_clear_confirmation).await.unwrap();
    assert_eq!(view.visible.len(), 3);
    assert_eq!(store.delete_calls(), 0);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_delete_reports_and_reconciles_on_next_snapshot() {
    let Harness { store, handle, .. } = start().await;
    let mut notices = handle.notices();
    store.fail_deletes_for("a", "permission denied").await;

    handle.delete_item("a").await.unwrap();
    tokio::time::sleep(PAST_WINDOW).await;

    let notice = expect_notice(&mut notices, |n| matches!(n, Notice::DeleteFailed(_))).await;
    assert_eq!(
        notice,
        Notice::DeleteFailed(TrackerError::DeleteFailed {
            id: "a".to_string(),
            reason: "permission denied".to_string(),
        })
    );

    store.republish(COLLECTION).await;
    let view = handle.wait_for(|v| v.visible.len() == 3).await.unwrap();
    assert_eq!(view.visible_ids(), ["a", "b", "c"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn connection_loss_keeps_the_last_snapshot() {
    let Harness { store, handle, .. } = start().await;
    let mut notices = handle.notices();

    store.emit_connection_error(COLLECTION, "offline").await;
    let view = handle
        .wait_for(|v| v.connection == ConnectionState::Disconnected)
        .await
        .unwrap();
    assert_eq!(view.visible.len(), 3);
    assert_eq!(view.last_error.as_deref(), Some("offline"));

    store.republish(COLLECTION).await;
    let view = handle
        .wait_for(|v| v.connection == ConnectionState::Connected)
        .await
        .unwrap();
    assert!(view.last_error.is_none());

    assert_eq!(
        notices.recv().await.unwrap(),
        Notice::ConnectionLost("offline".to_string())
    );
    assert_eq!(notices.recv().await.unwrap(), Notice::Reconnected);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unit_is_loaded_and_persisted() {
    let Harness { prefs, handle, .. } = start_with(
        InMemoryStore::new(),
        MemoryPreferences::with_unit(UnitType::Kilograms),
        false,
    )
    .await;
    assert_eq!(handle.view().unit, UnitType::Kilograms);

    let view = handle.set_unit(UnitType::Pounds).await.unwrap();
    assert_eq!(view.unit, UnitType::Pounds);
    assert!((view.summary.display.mean - 950.0 / 3.0 * 0.00220462).abs() < 1e-9);

    handle.shutdown().await.unwrap();
    assert_eq!(prefs.stored().await, Some(UnitType::Pounds));
}

#[tokio::test(start_paused = true)]
async fn failed_unit_write_keeps_the_choice_in_memory() {
    let Harness { prefs, handle, .. } = start().await;
    let mut notices = handle.notices();
    prefs.fail_writes(true);

    let view = handle.set_unit(UnitType::Kilograms).await.unwrap();
    assert_eq!(view.unit, UnitType::Kilograms);

    let notice = expect_notice(&mut notices, |n| matches!(n, Notice::PreferenceFailed(_))).await;
    assert!(matches!(notice, Notice::PreferenceFailed(TrackerError::Storage(_))));
    assert_eq!(handle.view().unit, UnitType::Kilograms);
    assert_eq!(prefs.writes(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_commits_pending_and_unsubscribes() {
    let Harness { store, handle, .. } = start().await;
    assert_eq!(store.subscriber_count().await, 1);

    handle.delete_item("a").await.unwrap();
    handle.shutdown().await.unwrap();

    assert_eq!(store.requested_deletes().await, ["a"]);
    assert_eq!(store.subscriber_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn navigating_away_commits_and_clears_selection() {
    let Harness { store, handle, .. } = start().await;

    handle.toggle_selection("b").await.unwrap();
    handle.delete_item("c").await.unwrap();
    let view = handle.navigate_away().await.unwrap();
    assert!(view.selection.is_empty());
    assert!(view.pending.is_none());

    handle.wait_for(|v| v.undo_phase == UndoPhase::Idle).await.unwrap();
    assert_eq!(store.requested_deletes().await, ["c"]);

    handle.shutdown().await.unwrap();
}

/// Prompt answered by the test: call `n` waits on the `n`th gate.
struct GatedConfirmation {
    gates: Mutex<VecDeque<oneshot::Receiver<bool>>>,
    asked: AtomicUsize,
}

impl GatedConfirmation {
    fn new(gates: impl IntoIterator<Item = oneshot::Receiver<bool>>) -> Self {
        Self {
            gates: Mutex::new(gates.into_iter().collect()),
            asked: AtomicUsize::new(0),
        }
    }

    async fn wait_until_asked(&self, times: usize) {
        while self.asked.load(Ordering::SeqCst) < times {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ConfirmationPrompt for GatedConfirmation {
    async fn confirm_clear_all(&self, _count: usize) -> bool {
        let gate = self.gates.lock().await.pop_front();
        self.asked.fetch_add(1, Ordering::SeqCst);
        match gate {
            Some(gate) => gate.await.unwrap_or(false),
            None => std::future::pending().await,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn answer_to_a_dismissed_prompt_cannot_clear_later() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(COLLECTION, records()).await;
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let prompt = Arc::new(GatedConfirmation::new([first_rx, second_rx]));

    let handle = spawn_pipeline(
        &Config::default(),
        store.clone(),
        Arc::new(MemoryPreferences::new()),
        prompt.clone(),
    )
    .await
    .unwrap();
    handle
        .wait_for(|v| v.connection == ConnectionState::Connected)
        .await
        .unwrap();

    handle.clear_all().await.unwrap();
    prompt.wait_until_asked(1).await;
    let view = handle.navigate_away().await.unwrap();
    assert!(!view.awaiting_clear_confirmation);

    let view = handle.clear_all().await.unwrap();
    assert!(view.awaiting_clear_confirmation);
    prompt.wait_until_asked(2).await;

    // the dismissed prompt may already be gone
    let _ = first_tx.send(true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let view = handle.view();
    assert!(view.awaiting_clear_confirmation);
    assert_eq!(view.visible.len(), 3);
    assert_eq!(store.delete_calls(), 0);
    assert!(store.requested_deletes().await.is_empty());

    second_tx.send(true).unwrap();
    handle.wait_for(|v| v.snapshot.is_empty()).await.unwrap();
    assert_eq!(store.delete_calls(), 3);

    handle.shutdown().await.unwrap();
}

/// Store whose deletes crash the calling task.
struct PanickingDeletes(Arc<InMemoryStore>);

#[async_trait]
impl DocumentStore for PanickingDeletes {
    async fn subscribe(&self, collection: &str) -> material_tracker::Result<FeedSubscription> {
        self.0.subscribe(collection).await
    }

    async fn delete_by_id(&self, id: &str) -> material_tracker::Result<()> {
        panic!("store crashed deleting {id}")
    }

    async fn fetch_all(&self, collection: &str) -> material_tracker::Result<Vec<MaterialRecord>> {
        self.0.fetch_all(collection).await
    }
}

#[tokio::test(start_paused = true)]
async fn crashed_commit_reports_failure_and_leaves_committing() {
    let inner = Arc::new(InMemoryStore::new());
    inner.seed(COLLECTION, records()).await;
    let handle = spawn_pipeline(
        &Config::default(),
        Arc::new(PanickingDeletes(inner.clone())),
        Arc::new(MemoryPreferences::new()),
        Arc::new(StaticConfirmation(false)),
    )
    .await
    .unwrap();
    handle
        .wait_for(|v| v.connection == ConnectionState::Connected)
        .await
        .unwrap();
    let mut notices = handle.notices();

    handle.delete_item("a").await.unwrap();
    tokio::time::sleep(PAST_WINDOW).await;

    let notice = expect_notice(&mut notices, |n| matches!(n, Notice::DeleteFailed(_))).await;
    assert!(matches!(notice, Notice::DeleteFailed(TrackerError::DeleteFailed { ref id, .. }) if id == "a"));

    let view = handle.wait_for(|v| v.undo_phase == UndoPhase::Idle).await.unwrap();
    assert_eq!(view.visible_ids(), ["b", "c"]);

    inner.republish(COLLECTION).await;
    let view = handle.wait_for(|v| v.visible.len() == 3).await.unwrap();
    assert_eq!(view.visible_ids(), ["a", "b", "c"]);

    handle.shutdown().await.unwrap();
}
