//! Handlers for `/entries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/entries/{role}` | Body: [`EntryFields`]; every field required |

use std::sync::Arc;

use axum::{Json, extract::State};
use tagesreflexion_core::{
  Role,
  entry::{Entry, EntryFields},
  store::JournalStore,
};

use crate::{
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

/// `PUT /entries/{role}`: replaces the role's entry for the open day.
///
/// Missing fields deserialise as empty and are rejected by validation.
pub async fn put<S>(
  State(store): State<Arc<S>>,
  ApiPath(role): ApiPath<String>,
  ApiJson(fields): ApiJson<EntryFields>,
) -> Result<Json<Entry>, ApiError>
where
  S: JournalStore,
{
  let role: Role = role.parse()?;
  let entry = store
    .submit_entry(role, fields)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entry))
}
