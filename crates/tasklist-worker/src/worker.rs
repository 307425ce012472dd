//! Single consumer of ready tasks.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tasklist_core::{error::CoreError, JobRunner};

use crate::coordinator::TaskListCoordinator;

pub struct Worker {
    id: String,
    coordinator: TaskListCoordinator,
    runner: Arc<dyn JobRunner>,
}

impl Worker {
    pub fn new(id: String, coordinator: TaskListCoordinator, runner: Arc<dyn JobRunner>) -> Self {
        Self {
            id,
            coordinator,
            runner,
        }
    }

    /// Runs the `idle -> claimed -> running -> idle` loop until `ctx` is
    /// cancelled. Finishes its current task before exiting on shutdown.
    #[tracing::instrument(skip(self, ctx), fields(worker.id = %self.id))]
    pub async fn run(&self, ctx: CancellationToken) {
        loop {
            let handle = match self.coordinator.read(&ctx).await {
                Ok(handle) => handle,
                Err(CoreError::Cancelled) => {
                    tracing::info!("worker shutting down");
                    return;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "read failed, retrying");
                    continue;
                }
            };

            let task_id = handle.id();
            tracing::info!(task.id = task_id, "task claimed, dispatching to runner");

            // The runner must observe either signal: the task's own abort
            // (an explicit Delete) or the worker's root shutdown. Derive a
            // child of the abort token and cancel it early if `ctx` fires
            // first, then race the runner against that combined token.
            let abort = handle.aborted();
            let run_token = abort.child_token();
            let guard_ctx = ctx.clone();
            let guard_token = run_token.clone();
            let guard = tokio::spawn(async move {
                tokio::select! {
                    _ = guard_ctx.cancelled() => guard_token.cancel(),
                    _ = guard_token.cancelled() => {}
                }
            });

            let result = tokio::select! {
                biased;
                run_result = self.runner.execute(run_token.clone(), handle.description()) => run_result,
                _ = run_token.cancelled() => {
                    Err(tasklist_core::TaskError::recoverable(anyhow::anyhow!(
                        "task {task_id} aborted"
                    )))
                }
            };
            guard.abort();

            match result {
                Ok(()) => {
                    if let Err(err) = handle.done().await {
                        tracing::error!(task.id = task_id, error = %err, "failed to record completion");
                    } else {
                        tracing::info!(task.id = task_id, "task completed");
                    }
                }
                Err(task_err) => {
                    let message = task_err.to_string();
                    if let Err(err) = handle.error(&message).await {
                        tracing::error!(task.id = task_id, error = %err, "failed to record task error");
                    } else {
                        tracing::warn!(task.id = task_id, error = %message, "task failed");
                    }
                }
            }

            self.coordinator.registry().del(task_id);
        }
    }
}
