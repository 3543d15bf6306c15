//! Handlers for day history and the day advance.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/days/{date}` | `YYYY-MM-DD`; newest day with that date |
//! | `POST` | `/day/next` | Close the open day, open its successor; 409 while incomplete |

use std::sync::Arc;

use axum::{Json, extract::State};
use tagesreflexion_core::{
  day::parse_date,
  store::JournalStore,
  view::{Advance, DayRecord},
};

use crate::{error::ApiError, extract::ApiPath};

/// `GET /days/{date}`
pub async fn by_date<S>(
  State(store): State<Arc<S>>,
  ApiPath(date): ApiPath<String>,
) -> Result<Json<DayRecord>, ApiError>
where
  S: JournalStore,
{
  let date = parse_date(&date)?;
  let record = store
    .day_by_date(date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no day dated {date}")))?;
  Ok(Json(record))
}

/// `POST /day/next`
pub async fn advance<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Advance>, ApiError>
where
  S: JournalStore,
{
  let advance = store.advance_day().await.map_err(ApiError::store)?;
  Ok(Json(advance))
}
