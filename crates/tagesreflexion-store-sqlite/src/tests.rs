//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use chrono::NaiveDate;
use tagesreflexion_core::{
  Classify as _, Fault, Role,
  day::DayStatus,
  entry::EntryFields,
  store::JournalStore,
};

use crate::{Error, SqliteStore, StoreOptions, schema};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn fields(tag: &str) -> EntryFields {
  EntryFields {
    general_1:           format!("{tag} general one"),
    general_2:           format!("{tag} general two"),
    partner_specific:    format!("{tag} partner"),
    children1_gratitude: format!("{tag} child one"),
    children2_gratitude: format!("{tag} child two"),
  }
}

async fn fill_both(s: &SqliteStore) {
  for role in Role::ALL {
    s.submit_entry(role, fields(role.as_str())).await.unwrap();
  }
}

async fn scalar(s: &SqliteStore, sql: &'static str) -> i64 {
  s.conn
    .call(move |c| Ok(c.query_row(sql, [], |r| r.get(0))?))
    .await
    .unwrap()
}

async fn exec(s: &SqliteStore, sql: String) {
  s.conn
    .call(move |c| Ok(c.execute_batch(&sql)?))
    .await
    .unwrap()
}

// ─── Days ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_creates_one_open_day_with_two_empty_entries() {
  let s = store().await;

  let state = s.read_state().await.unwrap();
  assert!(state.day.is_open());
  assert!(state.day.closed_at.is_none());
  assert_eq!(state.entries.mann.role, Role::Mann);
  assert_eq!(state.entries.frau.role, Role::Frau);
  assert_eq!(state.entries.mann.fields, EntryFields::default());
  assert!(state.entries.mann.updated_at.is_none());
  assert!(state.entries.frau.created_at.is_some());
  assert!(!state.eligible_to_close);

  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days").await, 1);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM entries").await, 2);
}

#[tokio::test]
async fn read_state_does_not_write() {
  let s = store().await;
  let first = s.read_state().await.unwrap();
  let second = s.read_state().await.unwrap();
  assert_eq!(first.day, second.day);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days").await, 1);
}

#[tokio::test]
async fn missing_open_day_is_recreated_on_read() {
  let s = store().await;
  exec(&s, "UPDATE days SET status = 'closed'".into()).await;

  let state = s.read_state().await.unwrap();
  assert!(state.day.is_open());
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days").await, 2);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM entries").await, 4);
}

// ─── Entries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submitted_entry_round_trips_through_read_state() {
  let s = store().await;
  let saved = s.submit_entry(Role::Mann, fields("m")).await.unwrap();
  assert!(saved.updated_at.is_some());

  let state = s.read_state().await.unwrap();
  assert_eq!(state.entries.mann.fields, fields("m"));
  assert_eq!(state.entries.mann.updated_at, saved.updated_at);
  assert_eq!(state.entries.frau.fields, EntryFields::default());
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM entries").await, 2);
}

#[tokio::test]
async fn entry_values_are_normalized_on_write() {
  let s = store().await;
  let mut f = fields("x");
  f.general_1 = "  line one\r\nline two \r\n".into();
  let saved = s.submit_entry(Role::Frau, f).await.unwrap();
  assert_eq!(saved.fields.general_1, "line one\nline two");

  let state = s.read_state().await.unwrap();
  assert_eq!(state.entries.frau.fields.general_1, "line one\nline two");
}

#[tokio::test]
async fn blank_required_field_is_rejected_and_nothing_is_written() {
  let s = store().await;
  let mut f = fields("x");
  f.children2_gratitude = " \r\n ".into();

  let err = s.submit_entry(Role::Mann, f).await.unwrap_err();
  assert_eq!(err.fault(), Fault::Validation);

  let state = s.read_state().await.unwrap();
  assert!(state.entries.mann.updated_at.is_none());
  assert_eq!(state.entries.mann.fields, EntryFields::default());
}

#[tokio::test]
async fn resubmitting_identical_fields_moves_updated_at() {
  let s = store().await;
  let first = s.submit_entry(Role::Frau, fields("f")).await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = s.submit_entry(Role::Frau, fields("f")).await.unwrap();
  assert!(second.updated_at > first.updated_at);
  assert_eq!(second.created_at, first.created_at);
}

#[tokio::test]
async fn eligibility_requires_both_roles() {
  let s = store().await;
  s.submit_entry(Role::Mann, fields("m")).await.unwrap();
  assert!(!s.read_state().await.unwrap().eligible_to_close);

  s.submit_entry(Role::Frau, fields("f")).await.unwrap();
  assert!(s.read_state().await.unwrap().eligible_to_close);
}

#[tokio::test]
async fn stored_blank_field_makes_day_ineligible() {
  let s = store().await;
  fill_both(&s).await;
  exec(&s, "UPDATE entries SET partner_specific = '  ' WHERE role = 'frau'".into()).await;
  assert!(!s.read_state().await.unwrap().eligible_to_close);
}

// ─── Talk backlog ────────────────────────────────────────────────────────────

#[tokio::test]
async fn talk_items_list_in_origin_order() {
  let s = store().await;
  let a = s.submit_talk_item(Role::Mann, "first".into()).await.unwrap();
  let b = s.submit_talk_item(Role::Frau, " second \r\n".into()).await.unwrap();
  assert_eq!(b.text, "second");
  assert_eq!(a.origin_created_at, a.created_at);

  let open = s.open_talk().await.unwrap();
  let ids: Vec<_> = open.iter().map(|t| t.id).collect();
  assert_eq!(ids, vec![a.id, b.id]);
  assert_eq!(open[1].created_by, Role::Frau);
}

#[tokio::test]
async fn origin_ties_break_by_id() {
  let s = store().await;
  let a = s.submit_talk_item(Role::Mann, "a".into()).await.unwrap();
  let b = s.submit_talk_item(Role::Mann, "b".into()).await.unwrap();
  exec(&s, "UPDATE talk_items SET origin_created_at = '2026-01-01T00:00:00.000000Z'".into()).await;

  let ids: Vec<_> = s.open_talk().await.unwrap().iter().map(|t| t.id).collect();
  assert_eq!(ids, vec![a.id, b.id]);
}

#[tokio::test]
async fn blank_talk_text_is_rejected() {
  let s = store().await;
  let err = s.submit_talk_item(Role::Frau, "  \r\n".into()).await.unwrap_err();
  assert!(matches!(err, Error::Core(tagesreflexion_core::Error::EmptyTalkText)));
  assert_eq!(err.fault(), Fault::Validation);
  assert!(s.open_talk().await.unwrap().is_empty());
}

#[tokio::test]
async fn completed_item_leaves_open_list() {
  let s = store().await;
  let a = s.submit_talk_item(Role::Mann, "a".into()).await.unwrap();
  let b = s.submit_talk_item(Role::Mann, "b".into()).await.unwrap();

  let done = s.complete_talk_item(a.id, Role::Frau).await.unwrap();
  assert!(done.is_done);
  assert_eq!(done.done_by, Some(Role::Frau));
  assert!(done.done_at.is_some());

  let open = s.open_talk().await.unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].id, b.id);
}

#[tokio::test]
async fn completing_unknown_item_is_not_found() {
  let s = store().await;
  let err = s.complete_talk_item(999, Role::Mann).await.unwrap_err();
  assert!(matches!(err, Error::TalkItemNotFound(999)));
  assert_eq!(err.fault(), Fault::NotFound);
}

#[tokio::test]
async fn recompleting_overwrites_completion_metadata() {
  let s = store().await;
  let item = s.submit_talk_item(Role::Mann, "x".into()).await.unwrap();

  let first = s.complete_talk_item(item.id, Role::Mann).await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = s.complete_talk_item(item.id, Role::Frau).await.unwrap();

  assert!(second.is_done);
  assert_eq!(second.done_by, Some(Role::Frau));
  assert!(second.done_at > first.done_at);
}

// ─── Advance day ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn advance_refused_while_entries_incomplete() {
  let s = store().await;
  s.submit_entry(Role::Mann, fields("m")).await.unwrap();
  let before = s.read_state().await.unwrap();

  let err = s.advance_day().await.unwrap_err();
  assert!(matches!(err, Error::RequiredFieldsIncomplete(id) if id == before.day.id));
  assert_eq!(err.fault(), Fault::Precondition);

  let after = s.read_state().await.unwrap();
  assert_eq!(after.day, before.day);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days").await, 1);
}

#[tokio::test]
async fn advance_closes_day_and_opens_successor() {
  let s = store().await;
  fill_both(&s).await;
  let before = s.read_state().await.unwrap();

  let advance = s.advance_day().await.unwrap();
  assert_eq!(advance.closed.id, before.day.id);
  assert_eq!(advance.closed.status, DayStatus::Closed);
  assert!(advance.closed.closed_at.is_some());
  assert!(advance.opened.is_open());
  assert_eq!(advance.carried, 0);

  let state = s.read_state().await.unwrap();
  assert_eq!(state.day, advance.opened);
  assert_eq!(state.entries.mann.fields, EntryFields::default());
  assert!(!state.eligible_to_close);

  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days WHERE status = 'open'").await, 1);
  // Exactly two entries per day, for every day.
  assert_eq!(
    scalar(
      &s,
      "SELECT COUNT(*) FROM (
         SELECT day_id FROM entries GROUP BY day_id HAVING COUNT(*) <> 2
       )"
    )
    .await,
    0
  );
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM entries").await, 4);
}

#[tokio::test]
async fn carry_forward_preserves_origin_across_two_advances() {
  let s = store().await;
  let original = s.submit_talk_item(Role::Frau, "holiday".into()).await.unwrap();

  fill_both(&s).await;
  let first = s.advance_day().await.unwrap();
  assert_eq!(first.carried, 1);
  fill_both(&s).await;
  let second = s.advance_day().await.unwrap();
  assert_eq!(second.carried, 1);

  let open = s.open_talk().await.unwrap();
  assert_eq!(open.len(), 1);
  let copy = &open[0];
  assert_ne!(copy.id, original.id);
  assert_eq!(copy.day_id, second.opened.id);
  assert_eq!(copy.text, "holiday");
  assert_eq!(copy.created_by, Role::Frau);
  assert_eq!(copy.origin_created_at, original.origin_created_at);
  assert_ne!(copy.origin_created_at, copy.created_at);
  assert_eq!(Some(copy.created_at), second.closed.closed_at);

  // One row per day the item lived through.
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM talk_items").await, 3);
}

#[tokio::test]
async fn completed_items_are_never_carried() {
  let s = store().await;
  let keep = s.submit_talk_item(Role::Mann, "keep".into()).await.unwrap();
  let drop = s.submit_talk_item(Role::Mann, "drop".into()).await.unwrap();
  s.complete_talk_item(drop.id, Role::Frau).await.unwrap();

  for _ in 0..3 {
    fill_both(&s).await;
    s.advance_day().await.unwrap();
  }

  let open = s.open_talk().await.unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].text, "keep");
  assert_eq!(open[0].origin_created_at, keep.origin_created_at);
  assert_eq!(
    scalar(&s, "SELECT COUNT(*) FROM talk_items WHERE text = 'drop'").await,
    1
  );
}

#[tokio::test]
async fn carried_copies_keep_backlog_order() {
  let s = store().await;
  let a = s.submit_talk_item(Role::Mann, "a".into()).await.unwrap();
  let b = s.submit_talk_item(Role::Frau, "b".into()).await.unwrap();
  fill_both(&s).await;
  s.advance_day().await.unwrap();
  let c = s.submit_talk_item(Role::Mann, "c".into()).await.unwrap();

  let open = s.open_talk().await.unwrap();
  let texts: Vec<_> = open.iter().map(|t| t.text.as_str()).collect();
  assert_eq!(texts, vec!["a", "b", "c"]);
  assert_eq!(open[0].origin_created_at, a.origin_created_at);
  assert_eq!(open[1].origin_created_at, b.origin_created_at);
  assert_eq!(open[2].id, c.id);
}

#[tokio::test]
async fn failed_carry_forward_rolls_back_everything() {
  let s = store().await;
  s.submit_talk_item(Role::Mann, "pending".into()).await.unwrap();
  fill_both(&s).await;
  let before = s.read_state().await.unwrap();

  // Carried copies are the only inserts whose row and origin timestamps
  // differ.
  exec(
    &s,
    "CREATE TRIGGER refuse_carry BEFORE INSERT ON talk_items
     WHEN NEW.created_at <> NEW.origin_created_at
     BEGIN SELECT RAISE(ABORT, 'carry refused'); END;"
      .into(),
  )
  .await;

  let err = s.advance_day().await.unwrap_err();
  assert_eq!(err.fault(), Fault::Storage);

  let after = s.read_state().await.unwrap();
  assert_eq!(after.day, before.day);
  assert!(after.day.is_open());
  assert!(after.eligible_to_close);
  assert_eq!(after.open_talk.len(), 1);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days").await, 1);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM entries").await, 2);
}

#[tokio::test]
async fn concurrent_advances_on_one_store_advance_once() {
  let s = store().await;
  s.submit_talk_item(Role::Frau, "once".into()).await.unwrap();
  fill_both(&s).await;

  let (a, b) = tokio::join!(s.advance_day(), s.advance_day());
  assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days").await, 2);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM talk_items").await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_advances_on_separate_connections_advance_once() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("journal.sqlite");
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();

  a.submit_talk_item(Role::Mann, "carry once".into()).await.unwrap();
  fill_both(&a).await;

  let (ra, rb) = tokio::join!(
    tokio::spawn({
      let a = a.clone();
      async move { a.advance_day().await }
    }),
    tokio::spawn({
      let b = b.clone();
      async move { b.advance_day().await }
    }),
  );
  let results = [ra.unwrap(), rb.unwrap()];

  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  let refused = results.iter().find_map(|r| r.as_ref().err()).unwrap();
  assert!(matches!(refused, Error::RequiredFieldsIncomplete(_)));

  assert_eq!(scalar(&b, "SELECT COUNT(*) FROM days").await, 2);
  assert_eq!(scalar(&b, "SELECT COUNT(*) FROM days WHERE status = 'open'").await, 1);
  assert_eq!(scalar(&b, "SELECT COUNT(*) FROM talk_items").await, 2);
  assert_eq!(scalar(&b, "SELECT COUNT(*) FROM entries").await, 4);
}

#[tokio::test]
async fn lock_timeout_surfaces_as_storage_fault() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("journal.sqlite");
  let options = StoreOptions { busy_timeout: std::time::Duration::from_millis(50) };
  let s = SqliteStore::open_with(&path, options).await.unwrap();

  let holder = rusqlite::Connection::open(&path).unwrap();
  holder.execute_batch("BEGIN IMMEDIATE").unwrap();

  let err = s.submit_talk_item(Role::Mann, "waiting".into()).await.unwrap_err();
  assert_eq!(err.fault(), Fault::Storage);

  holder.execute_batch("ROLLBACK").unwrap();
  s.submit_talk_item(Role::Mann, "later".into()).await.unwrap();
  assert_eq!(s.open_talk().await.unwrap().len(), 1);
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn day_by_date_returns_closed_day_with_its_backlog() {
  let s = store().await;
  let item = s.submit_talk_item(Role::Mann, "old".into()).await.unwrap();
  fill_both(&s).await;
  let advance = s.advance_day().await.unwrap();
  exec(
    &s,
    format!("UPDATE days SET day_date = '2020-02-02' WHERE id = {}", advance.closed.id),
  )
  .await;

  let date = NaiveDate::from_ymd_opt(2020, 2, 2).unwrap();
  let record = s.day_by_date(date).await.unwrap().unwrap();
  assert_eq!(record.day.id, advance.closed.id);
  assert_eq!(record.day.status, DayStatus::Closed);
  assert_eq!(record.entries.mann.fields, fields("mann"));
  assert_eq!(record.talk.len(), 1);
  assert_eq!(record.talk[0].id, item.id);
}

#[tokio::test]
async fn day_by_date_without_match_is_none() {
  let s = store().await;
  let date = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
  assert!(s.day_by_date(date).await.unwrap().is_none());
}

// ─── Legacy layouts ──────────────────────────────────────────────────────────

/// The four-field layout: `children_gratitude` instead of two child fields,
/// a `done` flag instead of `is_done`, no origin timestamps.
const FOUR_FIELD_LAYOUT: &str = "
CREATE TABLE days (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  day_date TEXT NOT NULL,
  status TEXT NOT NULL CHECK(status IN ('open','closed')),
  created_at TEXT NOT NULL,
  closed_at TEXT
);
CREATE TABLE entries (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  day_id INTEGER NOT NULL,
  role TEXT NOT NULL CHECK(role IN ('mann','frau')),
  general_1 TEXT NOT NULL DEFAULT '',
  general_2 TEXT NOT NULL DEFAULT '',
  partner_specific TEXT NOT NULL DEFAULT '',
  children_gratitude TEXT NOT NULL DEFAULT '',
  updated_at TEXT,
  UNIQUE(day_id, role)
);
CREATE TABLE talk_items (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  day_id INTEGER NOT NULL,
  text TEXT NOT NULL,
  created_by TEXT NOT NULL,
  created_at TEXT NOT NULL,
  done INTEGER NOT NULL DEFAULT 0
);

INSERT INTO days VALUES
  (1, '2025-05-01', 'closed', '2025-05-01 06:00:00', '2025-05-01 22:00:00'),
  (2, '2025-05-02', 'open',   '2025-05-02 06:00:00', NULL);

INSERT INTO entries (day_id, role, general_1, general_2, partner_specific, children_gratitude, updated_at) VALUES
  (1, 'mann', 'm1', 'm2', 'm3', 'm-kids', '2025-05-01 20:00:00'),
  (1, 'frau', 'f1', 'f2', 'f3', 'f-kids', '2025-05-01 21:00:00'),
  (2, 'mann', 'n1', 'n2', 'n3', 'n-kids', '2025-05-02 20:00:00');

INSERT INTO talk_items (day_id, text, created_by, created_at, done) VALUES
  (2, 'plan the holiday', 'frau', '2025-05-02 07:00:00', 0),
  (2, 'clear the cellar', 'mann', '2025-05-02 08:00:00', 1);
";

#[tokio::test]
async fn legacy_store_reopens_without_data_loss() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("legacy.sqlite");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(FOUR_FIELD_LAYOUT).unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();

  // Legacy rows survive; only frau's missing entry for day 2 is added.
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days").await, 2);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM talk_items").await, 2);
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM entries").await, 4);

  let state = s.read_state().await.unwrap();
  assert_eq!(state.day.id, 2);
  assert_eq!(state.day.date, NaiveDate::from_ymd_opt(2025, 5, 2).unwrap());
  assert_eq!(state.entries.mann.fields.general_1, "n1");
  assert_eq!(state.entries.mann.fields.children1_gratitude, "n-kids");
  assert_eq!(state.entries.mann.fields.children2_gratitude, "");
  assert!(state.entries.mann.updated_at.is_some());
  assert_eq!(state.entries.frau.fields, EntryFields::default());
  assert!(!state.eligible_to_close);

  assert_eq!(state.open_talk.len(), 1);
  let item = &state.open_talk[0];
  assert_eq!(item.text, "plan the holiday");
  assert_eq!(item.origin_created_at, item.created_at);
  assert_eq!(
    item.origin_created_at.to_rfc3339(),
    "2025-05-02T07:00:00+00:00"
  );

  let old = s
    .day_by_date(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(old.entries.frau.fields.children1_gratitude, "f-kids");
  assert!(old.talk.is_empty());

  drop(s);

  // Reopening applies nothing further.
  let mut conn = rusqlite::Connection::open(&path).unwrap();
  assert!(schema::ensure_layout(&mut conn).unwrap().is_empty());
  let legacy_kids: String = conn
    .query_row(
      "SELECT children_gratitude FROM entries WHERE day_id = 1 AND role = 'mann'",
      [],
      |r| r.get(0),
    )
    .unwrap();
  assert_eq!(legacy_kids, "m-kids");
}

#[tokio::test]
async fn legacy_store_can_advance_after_repair() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("legacy.sqlite");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(FOUR_FIELD_LAYOUT).unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  fill_both(&s).await;
  let advance = s.advance_day().await.unwrap();
  assert_eq!(advance.closed.id, 2);
  assert_eq!(advance.carried, 1);

  let open = s.open_talk().await.unwrap();
  assert_eq!(open[0].text, "plan the holiday");
  assert_eq!(
    open[0].origin_created_at.to_rfc3339(),
    "2025-05-02T07:00:00+00:00"
  );
}

/// The date-keyed layout: days addressed by `date`, no status, and one
/// global backlog spread over every day.
const DATE_KEYED_LAYOUT: &str = "
CREATE TABLE days (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  date TEXT NOT NULL UNIQUE
);
CREATE TABLE entries (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  day_id INTEGER NOT NULL,
  role TEXT NOT NULL,
  general_1 TEXT,
  general_2 TEXT,
  partner_specific TEXT,
  children1_gratitude TEXT,
  children2_gratitude TEXT,
  created_at TEXT,
  updated_at TEXT,
  UNIQUE(day_id, role)
);
CREATE TABLE talk_items (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  day_id INTEGER NOT NULL,
  text TEXT NOT NULL,
  created_by TEXT NOT NULL,
  created_at TEXT NOT NULL,
  origin_created_at TEXT,
  is_done INTEGER NOT NULL DEFAULT 0,
  done INTEGER NOT NULL DEFAULT 0
);

INSERT INTO days (date) VALUES ('2025-07-01'), ('2025-07-02');

INSERT INTO entries (day_id, role, general_1, general_2, partner_specific, children1_gratitude, children2_gratitude, updated_at) VALUES
  (1, 'mann', 'a', 'b', 'c', 'd', 'e', '2025-07-01 20:00:00');

INSERT INTO talk_items (day_id, text, created_by, created_at, origin_created_at, is_done, done) VALUES
  (1, 'call the school', 'mann', '2025-07-01 08:00:00', '2025-07-01 08:00:00', 0, 0),
  (2, 'book the car',    'frau', '2025-07-02 09:00:00', '2025-07-02 09:00:00', 0, 0),
  (1, 'water plants',    'frau', '2025-07-01 09:00:00', NULL,                  1, 1);
";

#[tokio::test]
async fn date_keyed_store_keeps_its_unresolved_backlog() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("dated.sqlite");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(DATE_KEYED_LAYOUT).unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();

  let state = s.read_state().await.unwrap();
  assert_eq!(state.day.id, 2);
  assert_eq!(state.day.date, NaiveDate::from_ymd_opt(2025, 7, 2).unwrap());
  assert_eq!(scalar(&s, "SELECT COUNT(*) FROM days").await, 2);

  let texts: Vec<_> = state.open_talk.iter().map(|t| t.text.as_str()).collect();
  assert_eq!(texts, vec!["call the school", "book the car"]);
  assert_eq!(
    state.open_talk[0].origin_created_at.to_rfc3339(),
    "2025-07-01T08:00:00+00:00"
  );

  // Day 1 still holds its exact backlog.
  let first = s
    .day_by_date(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(first.day.status, DayStatus::Closed);
  assert_eq!(first.talk.len(), 2);
  assert_eq!(first.entries.mann.fields.general_1, "a");

  fill_both(&s).await;
  let advance = s.advance_day().await.unwrap();
  assert_eq!(advance.carried, 2);

  drop(s);
  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.open_talk().await.unwrap().len(), 2);
  assert_eq!(scalar(&reopened, "SELECT COUNT(*) FROM days").await, 3);
}
