//! Per-task in-memory handle.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use tasklist_core::CoreError;
use tasklist_db::TaskRepository;

/// Exposes the id, a snapshot of the description, the one-shot abort
/// signal, and the terminal `done`/`error` operations. Created by a
/// successful claim, destroyed when `done`/`error` completes.
#[derive(Clone)]
pub struct TaskHandle {
    id: i64,
    description: Arc<str>,
    abort: CancellationToken,
    repository: TaskRepository,
}

impl TaskHandle {
    pub(crate) fn new(id: i64, description: String, repository: TaskRepository) -> Self {
        Self {
            id,
            description: Arc::from(description),
            abort: CancellationToken::new(),
            repository,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// A signal consumable by any number of waiters, fires at most once.
    pub fn aborted(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Closes the abort signal. Idempotent — [`CancellationToken::cancel`]
    /// is already safe to call more than once, so no extra "once" guard is
    /// needed at this layer (the registry still only calls it at most once
    /// per id; see [`crate::registry::RunningTaskRegistry::del`]).
    pub(crate) fn abort(&self) {
        self.abort.cancel();
    }

    /// Writes `finished_at = now`, no error. Calling this twice for the
    /// same handle is a programming error the worker must prevent.
    pub async fn done(&self) -> Result<(), CoreError> {
        self.repository.mark_finished(self.id, None).await
    }

    /// Writes `finished_at = now` and the terminal error message.
    pub async fn error(&self, err: &str) -> Result<(), CoreError> {
        self.repository.mark_finished(self.id, Some(err)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn fake_repo() -> TaskRepository {
        // lazy pool: never actually connects until a query runs, which the
        // aborted()/id()/description() tests below never trigger.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/nonexistent")
            .unwrap();
        TaskRepository::new(pool)
    }

    #[test]
    fn exposes_id_and_description() {
        let h = TaskHandle::new(7, "P1".into(), fake_repo());
        assert_eq!(h.id(), 7);
        assert_eq!(h.description(), "P1");
    }

    #[test]
    fn abort_signal_fires_exactly_once_observed_by_all_clones() {
        let h = TaskHandle::new(1, "P".into(), fake_repo());
        let sig_a = h.aborted();
        let sig_b = h.aborted();
        assert!(!sig_a.is_cancelled());
        h.abort();
        assert!(sig_a.is_cancelled());
        assert!(sig_b.is_cancelled());
    }
}
