//! In-memory registry of tasks currently being executed by this process.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::handle::TaskHandle;

/// Mutex-guarded mapping from task id to its live handle. `del` closes the
/// handle's abort signal — safe to call for an id that was never inserted
/// or already removed.
#[derive(Default)]
pub struct RunningTaskRegistry {
    inner: Mutex<HashMap<i64, TaskHandle>>,
}

impl RunningTaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upgrades a placeholder to a real handle on successful claim.
    pub fn set(&self, handle: TaskHandle) {
        let mut guard = self.inner.lock().expect("registry mutex poisoned");
        guard.insert(handle.id(), handle);
    }

    /// Removes `id` (terminal completion or abort reconciliation) and
    /// closes its abort signal if it was present.
    pub fn del(&self, id: i64) {
        let removed = {
            let mut guard = self.inner.lock().expect("registry mutex poisoned");
            guard.remove(&id)
        };
        if let Some(handle) = removed {
            handle.abort();
        }
    }

    /// Snapshot of ids currently registered, for reconciliation queries.
    pub fn ids(&self) -> Vec<i64> {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard.keys().copied().collect()
    }

    pub fn get(&self, id: i64) -> Option<TaskHandle> {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use tasklist_db::TaskRepository;

    fn fake_repo() -> TaskRepository {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/nonexistent")
            .unwrap();
        TaskRepository::new(pool)
    }

    #[test]
    fn set_then_del_closes_abort_signal() {
        let reg = RunningTaskRegistry::new();
        let handle = TaskHandle::new(1, "P1".into(), fake_repo());
        let sig = handle.aborted();
        reg.set(handle);
        assert_eq!(reg.ids(), vec![1]);

        reg.del(1);
        assert!(reg.is_empty());
        assert!(sig.is_cancelled());
    }

    #[test]
    fn del_on_unknown_id_is_a_no_op() {
        let reg = RunningTaskRegistry::new();
        reg.del(999);
        assert!(reg.is_empty());
    }
}
