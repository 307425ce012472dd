//! The coordinator, task handle, running-task registry, worker, and work
//! team.

pub mod coordinator;
pub mod handle;
pub mod registry;
pub mod team;
pub mod worker;

pub use coordinator::TaskListCoordinator;
pub use handle::TaskHandle;
pub use registry::RunningTaskRegistry;
pub use team::Workteam;
pub use worker::Worker;
