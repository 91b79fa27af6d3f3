//! Shared utilities for the Kura wallet core.

pub mod logging;

pub use logging::{init_logging, init_tracing, LogFormat};
