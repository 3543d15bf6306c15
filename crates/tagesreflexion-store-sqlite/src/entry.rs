//! Entry store: one row per (day, role), pre-created empty, updated in place.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use tagesreflexion_core::{
  Role,
  day::DayId,
  entry::{Entry, EntryFields},
  view::Entries,
};

use crate::{
  Error, Result,
  encode::{ENTRY_COLUMNS, RawEntry, encode_dt, encode_role, now},
};

/// Create the empty entry rows for a freshly opened day.
pub(crate) fn create_empty(
  conn: &Connection,
  day_id: DayId,
  at: DateTime<Utc>,
) -> Result<()> {
  let at = encode_dt(at);
  for role in Role::ALL {
    conn.execute(
      "INSERT INTO entries (day_id, role, created_at) VALUES (?1, ?2, ?3)",
      rusqlite::params![day_id, encode_role(role), at],
    )?;
  }
  Ok(())
}

/// Normalise and write `fields` for (`day_id`, `role`). The update timestamp
/// moves on every successful write, even if nothing changed.
pub(crate) fn upsert(
  conn: &Connection,
  day_id: DayId,
  role: Role,
  fields: &EntryFields,
) -> Result<Entry> {
  let fields = fields.normalized()?;
  let at = encode_dt(now());

  conn.execute(
    "INSERT INTO entries (
       day_id, role,
       general_1, general_2, partner_specific,
       children1_gratitude, children2_gratitude,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
     ON CONFLICT (day_id, role) DO UPDATE SET
       general_1           = excluded.general_1,
       general_2           = excluded.general_2,
       partner_specific    = excluded.partner_specific,
       children1_gratitude = excluded.children1_gratitude,
       children2_gratitude = excluded.children2_gratitude,
       updated_at          = excluded.updated_at",
    rusqlite::params![
      day_id,
      encode_role(role),
      fields.general_1,
      fields.general_2,
      fields.partner_specific,
      fields.children1_gratitude,
      fields.children2_gratitude,
      at,
    ],
  )?;

  get(conn, day_id, role)?.ok_or(Error::MissingEntry { day_id, role })
}

pub(crate) fn get(
  conn: &Connection,
  day_id: DayId,
  role: Role,
) -> Result<Option<Entry>> {
  conn
    .query_row(
      &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE day_id = ?1 AND role = ?2"),
      rusqlite::params![day_id, encode_role(role)],
      RawEntry::from_row,
    )
    .optional()?
    .map(RawEntry::into_entry)
    .transpose()
}

/// Both entries of a day. A missing row is a broken invariant, not an empty
/// entry.
pub(crate) fn for_day(conn: &Connection, day_id: DayId) -> Result<Entries> {
  let fetch = |role| get(conn, day_id, role)?.ok_or(Error::MissingEntry { day_id, role });
  Ok(Entries { mann: fetch(Role::Mann)?, frau: fetch(Role::Frau)? })
}

