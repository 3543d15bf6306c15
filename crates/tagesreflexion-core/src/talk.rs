//! Talk items: the shared backlog of things to talk about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, Role, day::DayId, entry::normalize_text};

pub type TalkItemId = i64;

/// A discussion point scoped to a day.
///
/// Unresolved items are copied into each successor day. The copy gets a new
/// `id` and `created_at`, but keeps `origin_created_at`, which is what the
/// backlog is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkItem {
  pub id:                TalkItemId,
  pub day_id:            DayId,
  pub text:              String,
  pub created_by:        Role,
  /// When this row was written under its day.
  pub created_at:        DateTime<Utc>,
  /// When the item was first raised; never changes.
  pub origin_created_at: DateTime<Utc>,
  pub is_done:           bool,
  pub done_at:           Option<DateTime<Utc>>,
  pub done_by:           Option<Role>,
}

/// Normalise talk item text, rejecting text that is empty afterwards.
pub fn normalize_talk_text(text: &str) -> Result<String> {
  let text = normalize_text(text);
  if text.is_empty() {
    return Err(Error::EmptyTalkText);
  }
  Ok(text)
}
