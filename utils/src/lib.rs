//! Shared utilities for the Covenant engine.

pub mod logging;

pub use logging::{init_tracing, init_tracing_with, LogFormat};
