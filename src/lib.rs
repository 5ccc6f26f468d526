//! ProTrader: simulated analysis engines and a trading journal.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod logging;
pub mod types;
pub mod rng;
pub mod sim;
pub mod engines;
pub mod journal;
