//! Job registry, id generation and the background conversion worker.

mod id;
mod memory;
mod pipeline;
mod store;
mod trait_;

pub use id::{IdProvider, TimestampIdGenerator};
pub use memory::InMemoryScheduler;
pub use pipeline::{Pipeline, PipelineError};
pub use store::InMemoryJobStore;
pub use trait_::{Scheduler, SchedulerError};
