//! Day lifecycle: finding, opening and closing days, and the close
//! eligibility predicate.
//!
//! Every function takes a plain connection; callers run them inside the
//! transaction that gives them their atomicity.

use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use tagesreflexion_core::day::{Day, DayId, DayStatus};

use crate::{
  Error, Result,
  encode::{DAY_COLUMNS, RawDay, encode_date, encode_dt, encode_status, now},
  entry,
};

/// The deployment's local calendar date.
pub(crate) fn today() -> NaiveDate { Local::now().date_naive() }

/// The open day, if there is one.
pub(crate) fn find_open(conn: &Connection) -> Result<Option<Day>> {
  conn
    .query_row(
      &format!("SELECT {DAY_COLUMNS} FROM days WHERE status = 'open'"),
      [],
      RawDay::from_row,
    )
    .optional()?
    .map(RawDay::into_day)
    .transpose()
}

/// The open day, opening one dated today if none exists. Must run inside a
/// write transaction.
pub(crate) fn current(conn: &Connection) -> Result<Day> {
  match find_open(conn)? {
    Some(day) => Ok(day),
    None => open_new(conn, today(), now()),
  }
}

/// Insert a new open day together with an empty entry for each role.
pub(crate) fn open_new(
  conn: &Connection,
  date: NaiveDate,
  at: DateTime<Utc>,
) -> Result<Day> {
  conn.execute(
    "INSERT INTO days (day_date, status, created_at) VALUES (?1, ?2, ?3)",
    rusqlite::params![
      encode_date(date),
      encode_status(DayStatus::Open),
      encode_dt(at)
    ],
  )?;
  let day = Day {
    id:         conn.last_insert_rowid(),
    date,
    status:     DayStatus::Open,
    created_at: at,
    closed_at:  None,
  };
  entry::create_empty(conn, day.id, at)?;
  Ok(day)
}

/// Close `day`. Fails if it is no longer open.
pub(crate) fn close(conn: &Connection, day: &Day, at: DateTime<Utc>) -> Result<Day> {
  let changed = conn.execute(
    "UPDATE days SET status = ?2, closed_at = ?3 WHERE id = ?1 AND status = 'open'",
    rusqlite::params![day.id, encode_status(DayStatus::Closed), encode_dt(at)],
  )?;
  if changed == 0 {
    return Err(Error::DayNotOpen(day.id));
  }
  Ok(Day { status: DayStatus::Closed, closed_at: Some(at), ..day.clone() })
}

/// Whether every role has filled every required field for `day_id`.
pub(crate) fn eligible_to_close(conn: &Connection, day_id: DayId) -> Result<bool> {
  Ok(entry::for_day(conn, day_id)?.eligible_to_close())
}

/// The newest day with the given calendar date.
pub(crate) fn newest_by_date(
  conn: &Connection,
  date: NaiveDate,
) -> Result<Option<Day>> {
  conn
    .query_row(
      &format!(
        "SELECT {DAY_COLUMNS} FROM days WHERE day_date = ?1
         ORDER BY id DESC LIMIT 1"
      ),
      [encode_date(date)],
      RawDay::from_row,
    )
    .optional()?
    .map(RawDay::into_day)
    .transpose()
}
