//! The external collaborator contract a [`crate::task::RawTask`]'s opaque
//! description is handed to. This crate depends only on the trait: whatever
//! engine interprets `description` lives outside the core.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::task_error::TaskError;

/// Executes a task's opaque description, honoring cooperative cancellation
/// via `cancel`. Implementations should periodically check `cancel` (or
/// race it against their own work) rather than expect preemption.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn execute(&self, cancel: CancellationToken, description: &str) -> Result<(), TaskError>;
}

/// A runner used where no real implementation is wired up yet; every call
/// fails unrecoverably so misconfiguration is loud rather than silent.
pub struct NoopRunner;

#[async_trait]
impl JobRunner for NoopRunner {
    async fn execute(&self, _cancel: CancellationToken, _description: &str) -> Result<(), TaskError> {
        Err(TaskError::unrecoverable(anyhow::anyhow!(
            "no job runner configured"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_runner_always_fails_unrecoverably() {
        let runner = NoopRunner;
        let err = runner
            .execute(CancellationToken::new(), "anything")
            .await
            .unwrap_err();
        assert!(!err.is_recoverable());
    }
}
