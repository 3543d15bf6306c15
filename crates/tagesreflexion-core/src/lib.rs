//! Core types and trait definitions for the Tagesreflexion journal.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod day;
pub mod entry;
pub mod error;
pub mod role;
pub mod store;
pub mod talk;
pub mod view;

pub use error::{Classify, Error, Fault, Result};
pub use role::Role;
