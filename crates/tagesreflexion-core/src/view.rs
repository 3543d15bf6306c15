//! Composite read models returned by the engine. Never stored, always
//! derived from the rows of one transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Role, day::Day, entry::Entry, talk::TalkItem};

// ─── Entries ─────────────────────────────────────────────────────────────────

/// Both roles' entries for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entries {
  pub mann: Entry,
  pub frau: Entry,
}

impl Entries {
  pub fn get(&self, role: Role) -> &Entry {
    match role {
      Role::Mann => &self.mann,
      Role::Frau => &self.frau,
    }
  }

  /// A day may close once every role has filled every required field.
  /// Recomputed on each call; never persisted.
  pub fn eligible_to_close(&self) -> bool {
    Role::ALL
      .into_iter()
      .all(|role| self.get(role).fields.is_complete())
  }
}

// ─── Current state ───────────────────────────────────────────────────────────

/// Snapshot of the open day as seen by both participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalState {
  pub day:               Day,
  /// The deployment's local calendar date, which can run ahead of the open
  /// day's date when nobody has advanced yet.
  pub today:             NaiveDate,
  pub entries:           Entries,
  /// Uncompleted talk items of the open day, oldest origin first.
  pub open_talk:         Vec<TalkItem>,
  pub eligible_to_close: bool,
}

// ─── History ─────────────────────────────────────────────────────────────────

/// A day looked up by calendar date, with its exact backlog (completed items
/// included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
  pub day:     Day,
  pub entries: Entries,
  pub talk:    Vec<TalkItem>,
}

// ─── Advance ─────────────────────────────────────────────────────────────────

/// Outcome of a successful day advance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advance {
  pub closed:  Day,
  pub opened:  Day,
  /// Number of open talk items copied into `opened`.
  pub carried: usize,
}
