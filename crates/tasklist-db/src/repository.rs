//! `TaskRepository`: the conditional-UPDATE claim protocol, advisory locks,
//! and the CRUD surface the coordinator builds `Write`/`Read`/`Delete`/`Peek`
//! on top of.

use chrono::Utc;
use sqlx::PgPool;
use tasklist_core::{error::CoreError, task::TaskRecord, RawTask};

use crate::TASKS_CHANNEL;

/// Result of attempting `cancel`. `AlreadyTerminal` and `Cancelled` both mean
/// the row is (now) cancelled or finished, so a caller retrying a timed-out
/// delete sees success either way; only `NotFound` means the id never
/// existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyTerminal,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a new task row and notifies listeners on `TASKS_CHANNEL` with
    /// payload `"new"`.
    #[tracing::instrument(skip(self, raw))]
    pub async fn write(&self, raw: RawTask) -> Result<i64, CoreError> {
        let now = Utc::now();
        let scheduled_at = raw.scheduled_at.unwrap_or(now);

        let mut tx = self.pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            "insert into tasks(description, created_at, scheduled_at) values ($1, $2, $3) returning id",
        )
        .bind(&raw.description)
        .bind(now)
        .bind(scheduled_at)
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query("select pg_notify($1, 'new')")
            .bind(TASKS_CHANNEL)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(task.id = id, "task written");
        Ok(id)
    }

    /// Scans for eligible task ids, oldest-`scheduled_at`-first, excluding
    /// `exclude` (the discovery loop's already-handed-off ids for this pass).
    /// Returns at most `limit` ids.
    #[tracing::instrument(skip(self, exclude))]
    pub async fn scan_eligible(&self, exclude: &[i64], limit: i64) -> Result<Vec<i64>, CoreError> {
        let now = Utc::now();
        let rows: Vec<i64> = sqlx::query_scalar(
            r#"
            select id from tasks
            where performed_at is null
              and cancelled_at is null
              and finished_at is null
              and scheduled_at <= $1
              and not (id = any($2))
            order by scheduled_at
            limit $3
            "#,
        )
        .bind(now)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Attempts the session-scoped advisory lock for `id` (non-blocking).
    /// Returns `true` if acquired.
    pub async fn try_advisory_lock(
        &self,
        conn: &mut sqlx::pool::PoolConnection<sqlx::Postgres>,
        id: i64,
    ) -> Result<bool, CoreError> {
        let lockable: bool = sqlx::query_scalar("select pg_try_advisory_lock($1)")
            .bind(id)
            .fetch_one(&mut **conn)
            .await?;
        Ok(lockable)
    }

    pub async fn advisory_unlock(
        &self,
        conn: &mut sqlx::pool::PoolConnection<sqlx::Postgres>,
        id: i64,
    ) -> Result<(), CoreError> {
        sqlx::query("select pg_advisory_unlock($1)")
            .bind(id)
            .execute(&mut **conn)
            .await?;
        Ok(())
    }

    /// Conditional claim UPDATE. Returns `Some(description)` if this process
    /// won the claim, `None` otherwise. Must be called while holding the
    /// advisory lock for `id`.
    pub async fn claim(
        &self,
        conn: &mut sqlx::pool::PoolConnection<sqlx::Postgres>,
        id: i64,
    ) -> Result<Option<String>, CoreError> {
        let now = Utc::now();
        let description: Option<String> = sqlx::query_scalar(
            r#"
            update tasks set performed_at = $1
            where id = $2
              and scheduled_at <= $1
              and performed_at is null
              and cancelled_at is null
            returning description
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut **conn)
        .await?;
        Ok(description)
    }

    /// Acquires a dedicated connection, locks `id`, attempts the claim, and
    /// always releases the lock before returning. Registry bookkeeping is
    /// the coordinator's job, not this repository's.
    pub async fn lock_and_claim(&self, id: i64) -> Result<Option<String>, CoreError> {
        let mut conn = self.pool.acquire().await?;
        if !self.try_advisory_lock(&mut conn, id).await? {
            return Ok(None);
        }
        let result = self.claim(&mut conn, id).await;
        let unlock_result = self.advisory_unlock(&mut conn, id).await;
        let claimed = result?;
        unlock_result?;
        Ok(claimed)
    }

    /// Marks `id` cancelled iff it is not already cancelled or finished, and
    /// publishes `"abort"`.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: i64) -> Result<CancelOutcome, CoreError> {
        let mut conn = self.pool.acquire().await?;
        if !self.try_advisory_lock(&mut conn, id).await? {
            return Err(CoreError::Store(sqlx::Error::PoolTimedOut));
        }
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            update tasks set cancelled_at = $1
            where id = $2 and cancelled_at is null and finished_at is null
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await;
        let rows_affected = match result {
            Ok(r) => r.rows_affected(),
            Err(e) => {
                let _ = self.advisory_unlock(&mut conn, id).await;
                return Err(e.into());
            }
        };

        let outcome = if rows_affected > 0 {
            CancelOutcome::Cancelled
        } else {
            // Distinguish "no such row" from "row exists but already
            // cancelled/finished": only the former is a genuine NotFound,
            // the latter is treated as idempotent success by the caller.
            let exists: bool = sqlx::query_scalar("select exists(select 1 from tasks where id = $1)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
            if exists {
                CancelOutcome::AlreadyTerminal
            } else {
                CancelOutcome::NotFound
            }
        };
        self.advisory_unlock(&mut conn, id).await?;

        if outcome == CancelOutcome::Cancelled {
            sqlx::query("select pg_notify($1, 'abort')")
                .bind(TASKS_CHANNEL)
                .execute(&self.pool)
                .await?;
            tracing::info!(task.id = id, "task cancelled");
        }
        Ok(outcome)
    }

    /// Returns the full row for inspection, no state change.
    #[tracing::instrument(skip(self))]
    pub async fn peek(&self, id: i64) -> Result<Option<TaskRecord>, CoreError> {
        let row = sqlx::query_as::<_, TaskRecord>("select * from tasks where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Ids currently in `running` (`performed_at` set, `finished_at` null)
    /// whose `cancelled_at` has since been set — used by reconciliation.
    pub async fn cancelled_among(&self, ids: &[i64]) -> Result<Vec<i64>, CoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<i64> = sqlx::query_scalar(
            "select id from tasks where id = any($1) and cancelled_at is not null and finished_at is null",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Writes `finished_at` unconditionally.
    pub async fn mark_finished(&self, id: i64, error: Option<&str>) -> Result<(), CoreError> {
        let now = Utc::now();
        sqlx::query("update tasks set finished_at = $1, error = $2 where id = $3")
            .bind(now)
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Exercised against a real Postgres in tasklist-worker's integration
    // tests (coordinator_test.rs) — this crate has no database-free unit
    // tests to add beyond the SQL above, which has no branching logic worth
    // unit testing without a connection.
}
