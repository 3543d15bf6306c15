//! Handlers for reading the current journal state.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/state` | Open day, both entries, open backlog, close eligibility |

use std::sync::Arc;

use axum::{Json, extract::State};
use tagesreflexion_core::{store::JournalStore, view::JournalState};

use crate::error::ApiError;

/// `GET /state`
pub async fn get<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<JournalState>, ApiError>
where
  S: JournalStore,
{
  let state = store.read_state().await.map_err(ApiError::store)?;
  Ok(Json(state))
}
