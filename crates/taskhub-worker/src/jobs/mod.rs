//! Built-in job handler implementations.

pub mod echo;

pub use echo::EchoJobHandler;
