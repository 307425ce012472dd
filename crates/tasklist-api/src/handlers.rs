//! Route handlers for the administrative API.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use tasklist_core::{error::CoreError, RawTask};
use tasklist_worker::TaskListCoordinator;

use crate::error::HttpCoreError;

pub struct AppState {
    pub coordinator: TaskListCoordinator,
}

#[derive(Serialize)]
pub struct WriteResponse {
    pub id: i64,
}

/// `POST /api/v1/tasks` — multipart `file` (description) and optional form
/// field `scheduled_at` (RFC 3339).
#[tracing::instrument(skip(state, multipart))]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<WriteResponse>, HttpCoreError> {
    let mut description: Option<String> = None;
    let mut scheduled_at: Option<DateTime<Utc>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoreError::InvalidId(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| CoreError::InvalidId(format!("reading file field: {e}")))?;
                description = Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            Some("scheduled_at") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| CoreError::InvalidId(format!("reading scheduled_at field: {e}")))?;
                if !text.is_empty() {
                    scheduled_at = Some(
                        DateTime::parse_from_rfc3339(&text)
                            .map_err(|e| CoreError::InvalidId(format!("invalid scheduled_at: {e}")))?
                            .with_timezone(&Utc),
                    );
                }
            }
            _ => {}
        }
    }

    let description =
        description.ok_or_else(|| CoreError::InvalidId("missing file field".to_string()))?;

    let mut raw = RawTask::new(description);
    raw.scheduled_at = scheduled_at;

    let id = state.coordinator.write(raw).await?;
    Ok(Json(WriteResponse { id }))
}

/// `GET /api/v1/tasks/:id` — returns the description as a plain-text
/// attachment.
#[tracing::instrument(skip(state))]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpCoreError> {
    let raw = state.coordinator.peek(&id).await?;
    Ok((
        [("content-type", "text/plain; charset=utf-8")],
        raw.description,
    ))
}

/// `DELETE /api/v1/tasks/:id` — requests cancellation.
#[tracing::instrument(skip(state))]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, HttpCoreError> {
    state.coordinator.delete(&id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
