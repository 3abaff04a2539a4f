//! # Sistema de Jobs
//! src/jobs/mod.rs
//!
//! Sistema asíncrono de hashing: los envíos se aceptan de inmediato y se
//! procesan en un pool fijo de workers con una latencia mínima de servicio.
//!
//! ```text
//! submit ──► JobStore(pending) ──► JobQueue ──► Worker ──► JobStore(digest)
//!                                                   └────► StatsAggregator
//! ```

pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod job;
pub mod queue;
pub mod store;
mod worker;

pub use dispatcher::{Dispatcher, DispatcherConfig, LifecycleState, SERVICE_FLOOR};
pub use error::DispatchError;
pub use job::{Job, JobId};
pub use queue::{Dequeued, JobQueue, QueueClosed, QueueStats};
pub use store::{JobResult, JobStore};
