//! The task list coordinator: discovery loop, notification listener, ready
//! channel, and the claim protocol.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use tasklist_core::{error::CoreError, RawTask};
use tasklist_db::{listener::Notification, CancelOutcome, NotifyListener, TaskRepository};

use crate::handle::TaskHandle;
use crate::registry::RunningTaskRegistry;

const SCAN_LIMIT: i64 = 10;
const SCAN_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const HANDOFF_DEADLINE: Duration = Duration::from_secs(60);

/// Owns the discovery loop, the notification listener, the ready-id
/// channel, and the fetch/claim protocol. One instance is shared by all
/// workers in a process.
#[derive(Clone)]
pub struct TaskListCoordinator {
    repository: TaskRepository,
    registry: Arc<RunningTaskRegistry>,
    ready_tx: mpsc::Sender<i64>,
    ready_rx: Arc<Mutex<mpsc::Receiver<i64>>>,
    shutdown: CancellationToken,
    background: Arc<Mutex<Vec<tokio::task::JoinHandle<()>>>>,
}

impl TaskListCoordinator {
    /// Creates the schema if absent, then spawns the discovery loop and the
    /// notification listener.
    pub async fn connect(pool: PgPool) -> Result<Self, CoreError> {
        tasklist_db::schema::init(&pool).await?;

        let repository = TaskRepository::new(pool.clone());
        let registry = Arc::new(RunningTaskRegistry::new());
        // tokio::sync::mpsc has no zero-capacity variant; capacity 1 is the
        // closest analogue to the unbuffered rendezvous channel the original
        // Go implementation relies on.
        let (ready_tx, ready_rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();

        let (notify_tx, notify_rx) = mpsc::channel::<Notification>(64);
        let (listener_shutdown_tx, listener_shutdown_rx) = oneshot::channel();
        let listener = NotifyListener::new(pool);
        let listener_task = tokio::spawn(listener.run(notify_tx, listener_shutdown_rx));

        let discovery_task = tokio::spawn(discovery_loop(
            repository.clone(),
            registry.clone(),
            ready_tx.clone(),
            notify_rx,
            shutdown.clone(),
        ));

        let coordinator = Self {
            repository,
            registry,
            ready_tx,
            ready_rx: Arc::new(Mutex::new(ready_rx)),
            shutdown,
            background: Arc::new(Mutex::new(Vec::new())),
        };

        coordinator
            .background
            .lock()
            .await
            .extend([discovery_task]);
        // listener_shutdown_tx is held by nobody yet; stash it by leaking
        // into a detached task that waits on coordinator shutdown.
        let root_shutdown = coordinator.shutdown.clone();
        tokio::spawn(async move {
            root_shutdown.cancelled().await;
            let _ = listener_shutdown_tx.send(());
        });
        coordinator.background.lock().await.push(listener_task);

        Ok(coordinator)
    }

    /// Persists a new task.
    #[tracing::instrument(skip(self))]
    pub async fn write(&self, raw: RawTask) -> Result<i64, CoreError> {
        self.repository.write(raw).await
    }

    /// Blocks until a claimable task exists; returns a handle with
    /// `performed_at` already written, or `Cancelled` if `ctx` fires first.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn read(&self, ctx: &CancellationToken) -> Result<TaskHandle, CoreError> {
        loop {
            let id = {
                let mut rx = self.ready_rx.lock().await;
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => return Err(CoreError::Cancelled),
                    _ = self.shutdown.cancelled() => return Err(CoreError::Cancelled),
                    maybe_id = rx.recv() => match maybe_id {
                        Some(id) => id,
                        None => return Err(CoreError::Cancelled),
                    },
                }
            };

            match self.repository.lock_and_claim(id).await? {
                Some(description) => {
                    let handle = TaskHandle::new(id, description, self.repository.clone());
                    self.registry.set(handle.clone());
                    tracing::info!(task.id = id, "task claimed");
                    return Ok(handle);
                }
                None => continue,
            }
        }
    }

    /// Marks a task cancelled. Accepts the id as a string since the admin
    /// API passes a path segment. A row that exists but is already
    /// cancelled/finished is treated as idempotent success, since a caller
    /// retrying a timed-out delete should not see a different outcome than
    /// one that landed cleanly; a row that never existed is `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id_str: &str) -> Result<(), CoreError> {
        let id: i64 = id_str
            .parse()
            .map_err(|_| CoreError::InvalidId(id_str.to_string()))?;
        match self.repository.cancel(id).await? {
            CancelOutcome::Cancelled | CancelOutcome::AlreadyTerminal => Ok(()),
            CancelOutcome::NotFound => Err(CoreError::NotFound(id_str.to_string())),
        }
    }

    /// Returns a task's description for inspection.
    #[tracing::instrument(skip(self))]
    pub async fn peek(&self, id_str: &str) -> Result<RawTask, CoreError> {
        let id: i64 = id_str
            .parse()
            .map_err(|_| CoreError::InvalidId(id_str.to_string()))?;
        let record = self
            .repository
            .peek(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id_str.to_string()))?;
        Ok(RawTask {
            description: record.description,
            scheduled_at: Some(record.scheduled_at),
        })
    }

    /// Registry access for the worker's completion path.
    pub(crate) fn registry(&self) -> &Arc<RunningTaskRegistry> {
        &self.registry
    }

    /// Cancels the root context, fanning out to the discovery loop and
    /// listener, and waits up to 5s for background tasks to exit.
    pub async fn close(&self) {
        self.shutdown.cancel();
        let mut tasks = self.background.lock().await;
        let drain = async {
            for task in tasks.drain(..) {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(5), drain)
            .await
            .is_err()
        {
            tracing::warn!("coordinator close timed out draining background tasks");
        }
    }
}

async fn discovery_loop(
    repository: TaskRepository,
    registry: Arc<RunningTaskRegistry>,
    ready_tx: mpsc::Sender<i64>,
    mut notify_rx: mpsc::Receiver<Notification>,
    shutdown: CancellationToken,
) {
    // Accumulates ids handed off during the current burst of work so that,
    // while workers are still busy with an earlier batch, repeated scans
    // don't requeue ids that are still sitting unclaimed. Reset once the
    // scan comes back empty — that's the start of a fresh discovery pass.
    let mut passed_ids: Vec<i64> = Vec::new();

    loop {
        if shutdown.is_cancelled() {
            return;
        }

        match repository.scan_eligible(&passed_ids, SCAN_LIMIT).await {
            Ok(ids) if !ids.is_empty() => {
                for id in ids {
                    let handoff = tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => return,
                        send_result = tokio::time::timeout(HANDOFF_DEADLINE, ready_tx.send(id)) => send_result,
                    };
                    match handoff {
                        Ok(Ok(())) => passed_ids.push(id),
                        Ok(Err(_)) => return, // no receivers left, coordinator is gone
                        Err(_) => {
                            tracing::debug!(task.id = id, "handoff deadline elapsed, rescanning");
                        }
                    }
                }

                // Drain any pending abort notifications without blocking, so
                // reconciliation still happens even while the scan keeps
                // finding work (notifications only wake discovery, they
                // never replace the poll).
                while let Ok(notification) = notify_rx.try_recv() {
                    if let Notification::Abort = notification {
                        reconcile(&repository, &registry).await;
                    }
                }
            }
            Ok(_) => {
                passed_ids.clear();
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(SCAN_IDLE_TIMEOUT) => {}
                    notification = notify_rx.recv() => {
                        if let Some(Notification::Abort) = notification {
                            reconcile(&repository, &registry).await;
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "discovery scan failed, retrying");
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                }
            }
        }
    }
}

async fn reconcile(repository: &TaskRepository, registry: &Arc<RunningTaskRegistry>) {
    let running_ids = registry.ids();
    match repository.cancelled_among(&running_ids).await {
        Ok(cancelled_ids) => {
            for id in cancelled_ids {
                tracing::info!(task.id = id, "reconciled cancellation, closing abort signal");
                registry.del(id);
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "reconciliation query failed");
        }
    }
}
