//! SURGE: single-pass spot momentum trader
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry points.

pub mod config;
pub mod error;
pub mod types;
pub mod exchange;
pub mod engine;
pub mod logging;
