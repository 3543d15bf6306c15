//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are written as RFC 3339 UTC strings with microsecond precision.
//! Rows written by older releases used SQLite's `datetime('now')` format
//! (`YYYY-MM-DD HH:MM:SS`, UTC); both are accepted on read.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound as _, Utc};
use tagesreflexion_core::{
  Role,
  day::{Day, DayId, DayStatus},
  entry::{Entry, EntryFields},
  talk::{TalkItem, TalkItemId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current instant, truncated to the precision that survives a round
/// trip through the database.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|naive| naive.and_utc())
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse()
    .map_err(|_| Error::Corrupt(format!("unknown role: {s:?}")))
}

// ─── DayStatus ───────────────────────────────────────────────────────────────

pub fn encode_status(s: DayStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<DayStatus> {
  match s {
    "open" => Ok(DayStatus::Open),
    "closed" => Ok(DayStatus::Closed),
    other => Err(Error::Corrupt(format!("unknown day status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const DAY_COLUMNS: &str = "id, day_date, status, created_at, closed_at";

/// Raw values read directly from a `days` row.
pub struct RawDay {
  pub id:         DayId,
  pub day_date:   String,
  pub status:     String,
  pub created_at: String,
  pub closed_at:  Option<String>,
}

impl RawDay {
  /// Expects the columns in [`DAY_COLUMNS`] order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      day_date:   row.get(1)?,
      status:     row.get(2)?,
      created_at: row.get(3)?,
      closed_at:  row.get(4)?,
    })
  }

  pub fn into_day(self) -> Result<Day> {
    Ok(Day {
      id:         self.id,
      date:       decode_date(&self.day_date)?,
      status:     decode_status(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
      closed_at:  decode_opt_dt(self.closed_at)?,
    })
  }
}

pub const ENTRY_COLUMNS: &str = "day_id, role, general_1, general_2, \
  partner_specific, children1_gratitude, children2_gratitude, created_at, \
  updated_at";

/// Raw values read directly from an `entries` row. Text columns added to
/// older stores may hold NULL.
pub struct RawEntry {
  pub day_id:              DayId,
  pub role:                String,
  pub general_1:           Option<String>,
  pub general_2:           Option<String>,
  pub partner_specific:    Option<String>,
  pub children1_gratitude: Option<String>,
  pub children2_gratitude: Option<String>,
  pub created_at:          Option<String>,
  pub updated_at:          Option<String>,
}

impl RawEntry {
  /// Expects the columns in [`ENTRY_COLUMNS`] order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      day_id:              row.get(0)?,
      role:                row.get(1)?,
      general_1:           row.get(2)?,
      general_2:           row.get(3)?,
      partner_specific:    row.get(4)?,
      children1_gratitude: row.get(5)?,
      children2_gratitude: row.get(6)?,
      created_at:          row.get(7)?,
      updated_at:          row.get(8)?,
    })
  }

  pub fn into_entry(self) -> Result<Entry> {
    Ok(Entry {
      day_id:     self.day_id,
      role:       decode_role(&self.role)?,
      fields:     EntryFields {
        general_1:           self.general_1.unwrap_or_default(),
        general_2:           self.general_2.unwrap_or_default(),
        partner_specific:    self.partner_specific.unwrap_or_default(),
        children1_gratitude: self.children1_gratitude.unwrap_or_default(),
        children2_gratitude: self.children2_gratitude.unwrap_or_default(),
      },
      created_at: decode_opt_dt(self.created_at)?,
      updated_at: decode_opt_dt(self.updated_at)?,
    })
  }
}

pub const TALK_COLUMNS: &str = "id, day_id, text, created_by, created_at, \
  origin_created_at, is_done, done_at, done_by";

/// Raw values read directly from a `talk_items` row.
pub struct RawTalkItem {
  pub id:                TalkItemId,
  pub day_id:            DayId,
  pub text:              String,
  pub created_by:        String,
  pub created_at:        String,
  pub origin_created_at: String,
  pub is_done:           bool,
  pub done_at:           Option<String>,
  pub done_by:           Option<String>,
}

impl RawTalkItem {
  /// Expects the columns in [`TALK_COLUMNS`] order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      day_id:            row.get(1)?,
      text:              row.get(2)?,
      created_by:        row.get(3)?,
      created_at:        row.get(4)?,
      origin_created_at: row.get(5)?,
      is_done:           row.get(6)?,
      done_at:           row.get(7)?,
      done_by:           row.get(8)?,
    })
  }

  pub fn into_item(self) -> Result<TalkItem> {
    Ok(TalkItem {
      id:                self.id,
      day_id:            self.day_id,
      text:              self.text,
      created_by:        decode_role(&self.created_by)?,
      created_at:        decode_dt(&self.created_at)?,
      origin_created_at: decode_dt(&self.origin_created_at)?,
      is_done:           self.is_done,
      done_at:           decode_opt_dt(self.done_at)?,
      done_by:           self.done_by.as_deref().map(decode_role).transpose()?,
    })
  }
}
