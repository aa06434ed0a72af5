//! # taskhub-core
//!
//! Core crate for TaskHub. Contains the unified error system, configuration
//! schemas, and the queue backend trait that storage implementations plug
//! into.
//!
//! This crate has **no** internal dependencies on other TaskHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
