//! Nullable infrastructure for deterministic testing.
//!
//! The wallet core talks to the outside world through two traits:
//! [`kura_provider::DataProvider`] and [`kura_store::Storage`]. This crate
//! provides test-friendly implementations that:
//! - Return scripted, deterministic values
//! - Record how often they were called
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod provider;
pub mod storage;

pub use provider::{NullProvider, ScriptedTx};
pub use storage::FailingStorage;
