//! Error type for `tagesreflexion-store-sqlite`.

use tagesreflexion_core::{
  Classify, Fault, Role,
  day::DayId,
  talk::TalkItemId,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] tagesreflexion_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value is outside the set the current layout allows.
  #[error("corrupt row: {0}")]
  Corrupt(String),

  /// Advance refused because at least one required field is still empty.
  #[error("required fields incomplete for day {0}")]
  RequiredFieldsIncomplete(DayId),

  #[error("talk item not found: {0}")]
  TalkItemNotFound(TalkItemId),

  /// A day is missing one of its pre-created entry rows.
  #[error("day {day_id} has no entry for {role}")]
  MissingEntry { day_id: DayId, role: Role },

  /// The day to close was no longer open inside the advancing transaction.
  #[error("day {0} is not open")]
  DayNotOpen(DayId),
}

impl Classify for Error {
  fn fault(&self) -> Fault {
    match self {
      Error::Core(e) => e.fault(),
      Error::RequiredFieldsIncomplete(_) => Fault::Precondition,
      Error::TalkItemNotFound(_) => Fault::NotFound,
      Error::Database(_)
      | Error::Sqlite(_)
      | Error::DateParse(_)
      | Error::Corrupt(_)
      | Error::MissingEntry { .. }
      | Error::DayNotOpen(_) => Fault::Storage,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
