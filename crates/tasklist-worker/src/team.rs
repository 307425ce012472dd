//! Supervisor that spawns N workers and aggregates their exits.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tasklist_core::JobRunner;

use crate::coordinator::TaskListCoordinator;
use crate::worker::Worker;

pub struct Workteam {
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Workteam {
    /// Spawns `count` workers, each with an id of `host-pid-index` so that
    /// logs are attributable across a fleet.
    pub fn spawn(
        count: usize,
        coordinator: TaskListCoordinator,
        runner: Arc<dyn JobRunner>,
        ctx: CancellationToken,
    ) -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());
        let pid = std::process::id();

        let handles = (0..count)
            .map(|idx| {
                let id = format!("{host}-{pid}-{idx}");
                let worker = Worker::new(id, coordinator.clone(), runner.clone());
                let ctx = ctx.clone();
                tokio::spawn(async move { worker.run(ctx).await })
            })
            .collect();

        Self { handles }
    }

    /// Resolves once every worker has exited.
    pub async fn wait(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
