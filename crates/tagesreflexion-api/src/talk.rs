//! Handlers for `/talk` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/talk` | Open items of the current day, oldest origin first |
//! | `POST`  | `/talk` | Body: [`NewTalkBody`]; returns 201 + stored item |
//! | `PATCH` | `/talk/{id}` | Body: [`CompleteBody`]; marks the item done |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tagesreflexion_core::{
  Role,
  store::JournalStore,
  talk::{TalkItem, TalkItemId},
};

use crate::{
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /talk`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<TalkItem>>, ApiError>
where
  S: JournalStore,
{
  let items = store.open_talk().await.map_err(ApiError::store)?;
  Ok(Json(items))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /talk`.
///
/// Roles arrive as strings so an unknown role is a 400 rather than a body
/// rejection.
#[derive(Debug, Deserialize)]
pub struct NewTalkBody {
  pub text:       String,
  pub created_by: String,
}

/// `POST /talk`: returns 201 + the stored [`TalkItem`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<NewTalkBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JournalStore,
{
  let role: Role = body.created_by.parse()?;
  let item = store
    .submit_talk_item(role, body.text)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(item)))
}

// ─── Complete ────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /talk/{id}`.
#[derive(Debug, Deserialize)]
pub struct CompleteBody {
  pub done_by: String,
}

/// `PATCH /talk/{id}`
pub async fn complete<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<TalkItemId>,
  ApiJson(body): ApiJson<CompleteBody>,
) -> Result<Json<TalkItem>, ApiError>
where
  S: JournalStore,
{
  let role: Role = body.done_by.parse()?;
  let item = store
    .complete_talk_item(id, role)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(item))
}
