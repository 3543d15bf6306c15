//! Days: the journal periods entries and talk items belong to.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type DayId = i64;

/// Lifecycle status of a day. At most one day is open at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
  Open,
  Closed,
}

impl DayStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Open => "open",
      Self::Closed => "closed",
    }
  }
}

/// A journal day. The open day is *the* current day; it is not keyed by the
/// calendar, so several closed days may share a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
  pub id:         DayId,
  pub date:       NaiveDate,
  pub status:     DayStatus,
  pub created_at: DateTime<Utc>,
  /// Set when the day is closed by an advance.
  pub closed_at:  Option<DateTime<Utc>>,
}

impl Day {
  pub fn is_open(&self) -> bool { self.status == DayStatus::Open }
}

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> crate::Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|_| crate::Error::InvalidDate(s.to_owned()))
}
