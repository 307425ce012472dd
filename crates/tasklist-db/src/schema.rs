//! Creates the `tasks` table if it is absent.

use sqlx::PgPool;
use tasklist_core::CoreError;

pub async fn init(pool: &PgPool) -> Result<(), CoreError> {
    sqlx::query(
        r#"
        create table if not exists tasks (
            id bigserial primary key,
            created_at timestamptz not null,
            scheduled_at timestamptz not null,
            performed_at timestamptz,
            finished_at timestamptz,
            cancelled_at timestamptz,
            description text not null,
            error text
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
