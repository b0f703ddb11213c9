//! Core engine: the scan → allocate → buy → sell pass.
//!
//! `scanner` and `allocator` are pure decision logic. `executor` and
//! `seller` are the thin I/O shell over the `Exchange` trait, and `cycle`
//! ties them together.

pub mod scanner;
pub mod allocator;
pub mod executor;
pub mod seller;
pub mod cycle;
