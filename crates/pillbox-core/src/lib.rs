//! Core types and trait definitions for the Pillbox supplement tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::DoseStore`]; the [`tracker::Tracker`]
//! drives the day view and calendar view on top of any such backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod history;
pub mod schedule;
pub mod store;
pub mod supplement;
pub mod tracker;

pub use error::{Error, Result};

#[cfg(test)]
mod memory;
