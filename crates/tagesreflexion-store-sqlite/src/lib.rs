//! SQLite backend for the Tagesreflexion journal.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Opening a store repairs older layouts
//! in place (see [`schema`]).

mod day;
mod encode;
mod entry;
mod store;
mod talk;

pub mod error;
pub mod schema;

pub use error::{Error, Result};
pub use store::{SqliteStore, StoreOptions};

#[cfg(test)]
mod tests;
