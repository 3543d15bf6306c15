//! JSON REST API for the Tagesreflexion journal.
//!
//! Exposes an axum [`Router`] backed by any
//! [`tagesreflexion_core::store::JournalStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tagesreflexion_api::api_router(store.clone()))
//! ```

pub mod day;
pub mod entries;
pub mod error;
pub mod extract;
pub mod state;
pub mod talk;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use tagesreflexion_core::store::JournalStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: JournalStore + 'static,
{
  Router::new()
    .route("/state", get(state::get::<S>))
    // Entries
    .route("/entries/{role}", put(entries::put::<S>))
    // Talk backlog
    .route("/talk", get(talk::list::<S>).post(talk::create::<S>))
    .route("/talk/{id}", patch(talk::complete::<S>))
    // Days
    .route("/days/{date}", get(day::by_date::<S>))
    .route("/day/next", post(day::advance::<S>))
    .with_state(store)
}
