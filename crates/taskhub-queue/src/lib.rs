//! Job model and queue orchestration for TaskHub.
//!
//! This crate provides:
//! - The [`Job`] unit-of-work model with retry bookkeeping
//! - The [`QueueManager`] that serializes jobs into a pluggable backend
//! - An in-memory [`MemoryQueueBackend`] reference implementation

pub mod backend;
pub mod job;
pub mod manager;

pub use backend::memory::MemoryQueueBackend;
pub use job::Job;
pub use manager::QueueManager;
