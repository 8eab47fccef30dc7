//! Shared worker runtime for the pipeline services.
//!
//! Each service binary wires a [`JobHandler`] into a [`Worker`], which owns
//! the consume→decode→dispatch→ack flow: prefetch-bounded fan-out, panic
//! isolation per delivery, ack-before-publish ordering and graceful drain on
//! shutdown.

pub mod bootstrap;
pub mod error;
pub mod worker;

pub use bootstrap::{init_tracing, shutdown_signal};
pub use error::{Disposition, JobError, WorkerError, WorkerResult};
pub use worker::{JobHandler, Worker};
