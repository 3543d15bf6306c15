//! Talk backlog: adding, listing, completing and carrying items forward.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use tagesreflexion_core::{
  Role,
  day::DayId,
  talk::{TalkItem, TalkItemId, normalize_talk_text},
};

use crate::{
  Error, Result,
  encode::{RawTalkItem, TALK_COLUMNS, encode_dt, encode_role, now},
};

/// Backlog order. `julianday` copes with legacy `datetime('now')` values;
/// the raw string then breaks sub-millisecond ties among current rows.
const ORDER: &str =
  "ORDER BY julianday(origin_created_at), origin_created_at, id";

pub(crate) fn add(
  conn: &Connection,
  day_id: DayId,
  role: Role,
  text: &str,
) -> Result<TalkItem> {
  let text = normalize_talk_text(text)?;
  let at = now();
  let at_str = encode_dt(at);

  conn.execute(
    "INSERT INTO talk_items (
       day_id, text, created_by, created_at, origin_created_at, is_done
     ) VALUES (?1, ?2, ?3, ?4, ?4, 0)",
    rusqlite::params![day_id, text, encode_role(role), at_str],
  )?;

  Ok(TalkItem {
    id: conn.last_insert_rowid(),
    day_id,
    text,
    created_by: role,
    created_at: at,
    origin_created_at: at,
    is_done: false,
    done_at: None,
    done_by: None,
  })
}

pub(crate) fn get(conn: &Connection, id: TalkItemId) -> Result<Option<TalkItem>> {
  conn
    .query_row(
      &format!("SELECT {TALK_COLUMNS} FROM talk_items WHERE id = ?1"),
      [id],
      RawTalkItem::from_row,
    )
    .optional()?
    .map(RawTalkItem::into_item)
    .transpose()
}

fn query(conn: &Connection, filter: &str, day_id: DayId) -> Result<Vec<TalkItem>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {TALK_COLUMNS} FROM talk_items WHERE day_id = ?1 {filter} {ORDER}"
  ))?;
  let raws = stmt
    .query_map([day_id], RawTalkItem::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawTalkItem::into_item).collect()
}

/// Uncompleted items of a day, oldest origin first.
pub(crate) fn list_open(conn: &Connection, day_id: DayId) -> Result<Vec<TalkItem>> {
  query(conn, "AND is_done = 0", day_id)
}

/// Every item of a day, completed or not, in backlog order.
pub(crate) fn list_for_day(
  conn: &Connection,
  day_id: DayId,
) -> Result<Vec<TalkItem>> {
  query(conn, "", day_id)
}

/// Mark an item done. Re-completing overwrites the completion metadata.
pub(crate) fn complete(
  conn: &Connection,
  id: TalkItemId,
  role: Role,
) -> Result<TalkItem> {
  let changed = conn.execute(
    "UPDATE talk_items SET is_done = 1, done_at = ?2, done_by = ?3 WHERE id = ?1",
    rusqlite::params![id, encode_dt(now()), encode_role(role)],
  )?;
  if changed == 0 {
    return Err(Error::TalkItemNotFound(id));
  }
  get(conn, id)?.ok_or(Error::TalkItemNotFound(id))
}

/// Copy every open item of `from` into `to`, keeping text, author and origin
/// timestamp. The source rows stay where they are. Returns the number of
/// items copied.
pub(crate) fn carry_forward(
  conn: &Connection,
  from: DayId,
  to: DayId,
  at: DateTime<Utc>,
) -> Result<usize> {
  Ok(conn.execute(
    &format!(
      "INSERT INTO talk_items (
         day_id, text, created_by, created_at, origin_created_at, is_done
       )
       SELECT ?2, text, created_by, ?3, origin_created_at, 0
       FROM talk_items WHERE day_id = ?1 AND is_done = 0 {ORDER}"
    ),
    rusqlite::params![from, to, encode_dt(at)],
  )?)
}
