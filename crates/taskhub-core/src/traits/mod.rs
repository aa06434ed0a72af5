//! Trait definitions for pluggable collaborators.

pub mod queue;

pub use queue::QueueBackend;
