//! Core domain types for the tasklist coordinator: the task record, error
//! kinds, startup configuration, and the external job-runner contract.

pub mod config;
pub mod error;
pub mod job_runner;
pub mod task;
pub mod task_error;

pub use config::Config;
pub use error::CoreError;
pub use job_runner::{JobRunner, NoopRunner};
pub use task::{RawTask, TaskRecord, TaskStatus};
pub use task_error::{TaskError, TaskResultExt};
