//! Thin store adapter over Postgres: schema init, the claim SQL, advisory
//! locks, and the LISTEN/NOTIFY channel.

pub mod listener;
pub mod repository;
pub mod schema;

pub use listener::NotifyListener;
pub use repository::{CancelOutcome, TaskRepository};

/// Pub/sub channel name used for both `new` and `abort` notifications.
pub const TASKS_CHANNEL: &str = "tasks_channel";
