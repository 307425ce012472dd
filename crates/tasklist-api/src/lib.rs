//! Admin HTTP shim: translates `POST`/`GET`/`DELETE /api/v1/tasks` into
//! calls on the coordinator.

pub mod error;
pub mod handlers;
pub mod router;

pub use error::HttpCoreError;
pub use router::build_router;
