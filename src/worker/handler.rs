//! The pipeline task: single owner of [`PipelineState`].
//!
//! One tokio task owns the state and multiplexes four inputs with
//! `tokio::select!`:
//!
//! ```text
//!   commands (mpsc) ──┐
//!   feed (stream) ────┤                    ┌─► watch<PipelineView>
//!   remote results ───┼─► handle_event ────┤
//!   undo deadline ────┘        │           └─► broadcast<Notice>
//!                              ▼
//!                   actions: spawn deletes, arm timer, ask confirmation
//! ```
//!
//! Because only this task mutates the state, every published view is
//! internally consistent. Remote calls run in spawned tasks and report back as
//! events, so a slow store never stalls command processing.

use super::confirm::ConfirmationPrompt;
use super::messages::Command;
use crate::domain::{Result, TrackerError, UnitType};
use crate::pipeline::{
    handle_event, Action, Event, MetalFilter, Notice, PipelineState, PipelineView, SortColumn,
    StatsScope,
};
use crate::preferences::PreferenceStore;
use crate::remote::{delete_records, DeleteOutcome, DocumentStore, FeedEvent, FeedSubscription};
use crate::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::Instrument;

const COMMAND_CAPACITY: usize = 64;
const NOTICE_CAPACITY: usize = 64;

/// Result of a spawned remote call.
enum TaskOutcome {
    Deleted { generation: u64, outcome: DeleteOutcome },
    Persisted(Result<()>),
}

/// Starts a pipeline for `config.collection_name`.
///
/// Subscribes to the feed and loads the unit preference before returning, so
/// a store that refuses the subscription fails here rather than later.
///
/// # Errors
///
/// Returns an error if the feed subscription cannot be registered.
///
/// # Examples
///
/// ```
/// use material_tracker::preferences::MemoryPreferences;
/// use material_tracker::remote::InMemoryStore;
/// use material_tracker::worker::{spawn_pipeline, StaticConfirmation};
/// use material_tracker::Config;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> material_tracker::Result<()> {
/// let store = Arc::new(InMemoryStore::new());
/// store.insert("materials", "red", 50, true, "scrap").await;
///
/// let handle = spawn_pipeline(
///     &Config::default(),
///     store,
///     Arc::new(MemoryPreferences::new()),
///     Arc::new(StaticConfirmation(false)),
/// )
/// .await?;
///
/// let view = handle.wait_for(|v| v.visible.len() == 1).await?;
/// assert_eq!(view.summary.count, 1);
/// handle.shutdown().await
/// # }
/// ```
pub async fn spawn_pipeline(
    config: &Config,
    store: Arc<dyn DocumentStore>,
    prefs: Arc<dyn PreferenceStore>,
    confirm: Arc<dyn ConfirmationPrompt>,
) -> Result<PipelineHandle> {
    let feed = store.subscribe(&config.collection_name).await?;
    let unit = prefs.get_unit().await;

    let mut state = crate::initialize(config);
    handle_event(&mut state, &Event::UnitLoaded(unit))?;

    let (views_tx, views_rx) = watch::channel(state.view());
    let (notices_tx, _) = broadcast::channel(NOTICE_CAPACITY);
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);

    let worker = PipelineWorker {
        state,
        store,
        prefs,
        confirm,
        feed,
        commands: commands_rx,
        views: views_tx,
        notices: notices_tx.clone(),
        remote_tasks: JoinSet::new(),
        commits: HashMap::new(),
        prompts: JoinSet::new(),
        prompt_requests: HashMap::new(),
        deadline: None,
    };

    let span = tracing::info_span!("pipeline", collection = %config.collection_name);
    let task = tokio::spawn(worker.run().instrument(span));

    tracing::info!(
        collection = %config.collection_name,
        undo_window_ms = config.undo_window_ms,
        unit = unit.key(),
        "pipeline started"
    );

    Ok(PipelineHandle {
        commands: commands_tx,
        views: views_rx,
        notices: notices_tx,
        task,
    })
}

/// Caller side of a running pipeline.
///
/// Command methods resolve once the command has been applied, returning the
/// view at that point. Dropping the handle without calling
/// [`shutdown`](Self::shutdown) shuts the pipeline down the same way, but
/// nobody waits for it.
#[derive(Debug)]
pub struct PipelineHandle {
    commands: mpsc::Sender<Command>,
    views: watch::Receiver<PipelineView>,
    notices: broadcast::Sender<Notice>,
    task: JoinHandle<()>,
}

impl PipelineHandle {
    /// Sends a command and waits until it has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn send(&self, command: Command) -> Result<PipelineView> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(command.with_ack(ack_tx))
            .await
            .map_err(|_| TrackerError::Worker("pipeline stopped".to_string()))?;
        ack_rx
            .await
            .map_err(|_| TrackerError::Worker("pipeline dropped the command".to_string()))
    }

    /// Latest published view.
    #[must_use]
    pub fn view(&self) -> PipelineView {
        self.views.borrow().clone()
    }

    /// Observable of every published view.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<PipelineView> {
        self.views.clone()
    }

    /// Waits until the published view satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline stops first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&PipelineView) -> bool,
    ) -> Result<PipelineView> {
        let mut views = self.views.clone();
        let view = views
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| TrackerError::Worker("pipeline stopped".to_string()))?;
        Ok(view.clone())
    }

    /// Subscribes to notices published from now on.
    #[must_use]
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Adds or removes a color from the filter.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn toggle_color(&self, color: impl Into<String>) -> Result<PipelineView> {
        self.send(Command::toggle_color(color.into())).await
    }

    /// Adds or removes a category from the filter.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn toggle_category(&self, category: impl Into<String>) -> Result<PipelineView> {
        self.send(Command::toggle_category(category.into())).await
    }

    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn set_metal(&self, metal: MetalFilter) -> Result<PipelineView> {
        self.send(Command::set_metal(metal)).await
    }

    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn clear_filters(&self) -> Result<PipelineView> {
        self.send(Command::clear_filters()).await
    }

    /// Header click on `column`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn sort_by(&self, column: SortColumn) -> Result<PipelineView> {
        self.send(Command::sort_by(column)).await
    }

    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn set_stats_scope(&self, scope: StatsScope) -> Result<PipelineView> {
        self.send(Command::set_stats_scope(scope)).await
    }

    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn toggle_selection(&self, id: impl Into<String>) -> Result<PipelineView> {
        self.send(Command::toggle_selection(id.into())).await
    }

    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn select_all_visible(&self) -> Result<PipelineView> {
        self.send(Command::select_all_visible()).await
    }

    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn deselect_all(&self) -> Result<PipelineView> {
        self.send(Command::deselect_all()).await
    }

    /// Removes one visible record, undoable until the window elapses.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn delete_item(&self, id: impl Into<String>) -> Result<PipelineView> {
        self.send(Command::delete_item(id.into())).await
    }

    /// Removes every selected record as one undoable batch.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn delete_selected(&self) -> Result<PipelineView> {
        self.send(Command::delete_selected()).await
    }

    /// Restores the pending batch, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn undo(&self) -> Result<PipelineView> {
        self.send(Command::undo()).await
    }

    /// Leaves the screen: commits the pending batch and clears the selection.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn navigate_away(&self) -> Result<PipelineView> {
        self.send(Command::navigate_away()).await
    }

    /// Asks for confirmation, then deletes the whole collection without undo.
    ///
    /// Resolves as soon as the request is registered; the deletion itself
    /// follows the confirmation asynchronously.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped.
    pub async fn clear_all(&self) -> Result<PipelineView> {
        self.send(Command::clear_all()).await
    }

    /// Changes the display unit and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline has stopped. A failed
    /// write is reported as [`Notice::PreferenceFailed`].
    pub async fn set_unit(&self, unit: UnitType) -> Result<PipelineView> {
        self.send(Command::set_unit(unit)).await
    }

    /// Commits any pending deletion, waits for in-flight remote calls, and
    /// releases the feed subscription.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Worker`] if the pipeline task panicked.
    pub async fn shutdown(self) -> Result<()> {
        // a stopped pipeline already shut down; only the join result matters
        let _ = self.send(Command::shutdown()).await;
        self.task
            .await
            .map_err(|e| TrackerError::Worker(format!("pipeline task failed: {e}")))
    }
}

struct PipelineWorker {
    state: PipelineState,
    store: Arc<dyn DocumentStore>,
    prefs: Arc<dyn PreferenceStore>,
    confirm: Arc<dyn ConfirmationPrompt>,
    feed: FeedSubscription,
    commands: mpsc::Receiver<Command>,
    views: watch::Sender<PipelineView>,
    notices: broadcast::Sender<Notice>,
    remote_tasks: JoinSet<TaskOutcome>,
    /// Commit tasks still running, by task id: generation and identities.
    commits: HashMap<task::Id, (u64, Vec<String>)>,
    prompts: JoinSet<(u64, bool)>,
    /// Clear-all request each running prompt answers.
    prompt_requests: HashMap<task::Id, u64>,
    deadline: Option<(u64, Instant)>,
}

impl PipelineWorker {
    async fn run(mut self) {
        let worker_span = tracing::Span::current();

        loop {
            let armed = self.deadline;

            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("all handles dropped");
                        self.shutdown(&worker_span).await;
                        break;
                    };
                    if self.handle_command(command).await {
                        break;
                    }
                }
                event = self.feed.next(), if self.feed.is_active() => {
                    let event = match event {
                        Some(FeedEvent::Snapshot(records)) => Event::FeedSnapshot(records),
                        Some(FeedEvent::ConnectionError(reason)) => Event::FeedError(reason),
                        None => {
                            tracing::warn!("feed closed by the store");
                            self.feed.unsubscribe();
                            Event::FeedError("feed closed".to_string())
                        }
                    };
                    self.process(&event, &worker_span);
                }
                Some(joined) = self.remote_tasks.join_next_with_id(), if !self.remote_tasks.is_empty() => {
                    self.settle(joined, &worker_span);
                }
                Some(joined) = self.prompts.join_next_with_id(), if !self.prompts.is_empty() => {
                    self.answer(joined, &worker_span);
                }
                () = sleep_until_armed(armed), if armed.is_some() => {
                    self.deadline = None;
                    if let Some((generation, _)) = armed {
                        self.process(&Event::UndoWindowElapsed { generation }, &worker_span);
                    }
                }
            }
        }

        tracing::info!("pipeline stopped");
    }

    /// Applies one caller command. Returns `true` when the loop must stop.
    async fn handle_command(&mut self, command: Command) -> bool {
        let Command { event, origin, ack } = command;
        let stop = event == Event::Shutdown;

        if stop {
            self.shutdown(&origin).await;
        } else {
            self.process(&event, &origin);
        }

        if let Some(ack) = ack {
            let _ = ack.send(self.state.view());
        }
        stop
    }

    fn process(&mut self, event: &Event, parent: &tracing::Span) {
        let span = tracing::debug_span!(parent: parent, "pipeline_event");
        let _entered = span.enter();

        match handle_event(&mut self.state, event) {
            Ok((changed, actions)) => {
                if changed {
                    self.publish();
                }
                for action in actions {
                    self.execute(action);
                }
            }
            Err(err) => tracing::error!(error = %err, "event rejected"),
        }
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::CommitDeletion(batch) => {
                let store = Arc::clone(&self.store);
                let span = tracing::debug_span!("commit_deletion",
                    generation = batch.generation,
                    item_count = batch.ids.len(),
                    reason = ?batch.reason
                );
                let generation = batch.generation;
                let ids = batch.ids.clone();
                let spawned = self.remote_tasks.spawn(
                    async move {
                        let outcome = delete_records(store.as_ref(), &batch.ids).await;
                        TaskOutcome::Deleted {
                            generation: batch.generation,
                            outcome,
                        }
                    }
                    .instrument(span),
                );
                self.commits.insert(spawned.id(), (generation, ids));
            }
            Action::ScheduleUndoDeadline { generation, deadline } => {
                self.deadline = Some((generation, deadline));
            }
            Action::CancelUndoDeadline => {
                self.deadline = None;
            }
            Action::ConfirmClearAll { request, count } => {
                let confirm = Arc::clone(&self.confirm);
                let spawned = self.prompts.spawn(
                    async move { (request, confirm.confirm_clear_all(count).await) }.in_current_span(),
                );
                self.prompt_requests.insert(spawned.id(), request);
            }
            Action::DismissClearAllPrompt => {
                self.prompts.abort_all();
            }
            Action::PersistUnit(unit) => {
                let prefs = Arc::clone(&self.prefs);
                self.remote_tasks.spawn(
                    async move { TaskOutcome::Persisted(prefs.set_unit(unit).await) }.in_current_span(),
                );
            }
            Action::Notify(notice) => {
                // no receivers is fine
                let _ = self.notices.send(notice);
            }
        }
    }

    fn settle(
        &mut self,
        joined: std::result::Result<(task::Id, TaskOutcome), JoinError>,
        parent: &tracing::Span,
    ) {
        let outcome = match joined {
            Ok((id, outcome)) => {
                self.commits.remove(&id);
                outcome
            }
            Err(err) => {
                self.remote_task_failed(&err, parent);
                return;
            }
        };

        match outcome {
            TaskOutcome::Deleted { generation, outcome } => {
                self.process(&Event::DeletionSettled { generation, outcome }, parent);
            }
            TaskOutcome::Persisted(Ok(())) => tracing::debug!("unit preference persisted"),
            TaskOutcome::Persisted(Err(err)) => {
                tracing::warn!(error = %err, "unit preference not persisted");
                let _ = self.notices.send(Notice::PreferenceFailed(err));
            }
        }
    }

    /// A remote task panicked or was cancelled before reporting back.
    ///
    /// A lost commit settles as if every identity failed, so its generation
    /// leaves the committing set and observers hear about it.
    fn remote_task_failed(&mut self, err: &JoinError, parent: &tracing::Span) {
        match self.commits.remove(&err.id()) {
            Some((generation, ids)) => {
                tracing::error!(error = %err, generation, item_count = ids.len(), "commit task failed");
                let outcome = DeleteOutcome::all_failed(&ids, &format!("delete task failed: {err}"));
                self.process(&Event::DeletionSettled { generation, outcome }, parent);
            }
            None => {
                tracing::error!(error = %err, "preference task failed");
                let _ = self.notices.send(Notice::PreferenceFailed(TrackerError::Worker(format!(
                    "preference task failed: {err}"
                ))));
            }
        }
    }

    /// Turns a finished prompt into the decision for the request it answered.
    fn answer(
        &mut self,
        joined: std::result::Result<(task::Id, (u64, bool)), JoinError>,
        parent: &tracing::Span,
    ) {
        let (request, confirmed) = match joined {
            Ok((id, decision)) => {
                self.prompt_requests.remove(&id);
                decision
            }
            Err(err) => {
                let Some(request) = self.prompt_requests.remove(&err.id()) else {
                    return;
                };
                if err.is_cancelled() {
                    tracing::debug!(request, "confirmation prompt dismissed");
                } else {
                    tracing::error!(error = %err, request, "confirmation prompt failed, treating as declined");
                }
                (request, false)
            }
        };
        self.process(&Event::ClearAllDecision { request, confirmed }, parent);
    }

    async fn shutdown(&mut self, origin: &tracing::Span) {
        self.process(&Event::Shutdown, origin);
        self.prompts.abort_all();

        while let Some(joined) = self.remote_tasks.join_next_with_id().await {
            self.settle(joined, origin);
        }

        self.feed.unsubscribe();
        self.publish();
    }

    fn publish(&self) {
        self.views.send_replace(self.state.view());
    }
}

async fn sleep_until_armed(armed: Option<(u64, Instant)>) {
    if let Some((_, deadline)) = armed {
        tokio::time::sleep_until(deadline).await;
    }
}
