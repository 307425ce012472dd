//! Router assembly with a request-tracing layer.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use tasklist_worker::TaskListCoordinator;

use crate::handlers::{self, AppState};

pub fn build_router(coordinator: TaskListCoordinator) -> Router {
    let state = Arc::new(AppState { coordinator });

    Router::new()
        .route("/api/v1/tasks", post(handlers::create_task))
        .route("/api/v1/tasks/{id}", get(handlers::get_task))
        .route("/api/v1/tasks/{id}", delete(handlers::delete_task))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
