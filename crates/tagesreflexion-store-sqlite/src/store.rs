//! [`SqliteStore`], the SQLite implementation of [`JournalStore`].

use std::{path::Path, time::Duration};

use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior};
use tagesreflexion_core::{
  Role,
  day::Day,
  entry::{Entry, EntryFields},
  store::JournalStore,
  talk::{TalkItem, TalkItemId},
  view::{Advance, DayRecord, JournalState},
};

use crate::{
  Error, Result, day, entry,
  encode::now,
  schema::{self, Repair},
  talk,
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Connection tuning applied at open time.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
  /// How long a write waits for another connection's lock before failing.
  pub busy_timeout: Duration,
}

impl Default for StoreOptions {
  fn default() -> Self { Self { busy_timeout: Duration::from_secs(5) } }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A journal backed by a single SQLite file.
///
/// Cloning is cheap. The inner connection is reference-counted, and clones
/// share its dedicated thread, so their calls are serialised. Separate
/// stores opened on the same file are serialised by SQLite's write lock.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, repair its layout, and make sure a
  /// day is open.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  pub async fn open_with(
    path: impl AsRef<Path>,
    options: StoreOptions,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init(options).await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(StoreOptions::default()).await?;
    Ok(store)
  }

  async fn init(&self, options: StoreOptions) -> Result<()> {
    let repairs = self
      .conn
      .call(move |conn| {
        conn.busy_timeout(options.busy_timeout)?;
        Ok(schema::ensure_layout(conn)?)
      })
      .await?;

    for repair in &repairs {
      match repair {
        Repair::ClosedSurplusOpenDays(_) => {
          tracing::warn!(%repair, "schema repair applied")
        }
        _ => tracing::info!(%repair, "schema repair applied"),
      }
    }

    let day = self.write(day::current).await?;
    tracing::debug!(day_id = day.id, date = %day.date, "current day ready");
    Ok(())
  }

  /// Run `f` in a transaction that takes the write lock up front
  /// (`BEGIN IMMEDIATE`). Commits on `Ok`, rolls back on `Err`.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }

  /// Run `f` in a deferred transaction, giving it a consistent snapshot.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx);
        tx.finish()?;
        Ok(out)
      })
      .await?
  }

  /// Run `f` against the open day. Reads take the cheap path; only when no
  /// day is open does this fall back to a write that opens one.
  async fn on_current_day<T, F>(&self, f: F) -> Result<T>
  where
    F: Fn(&Connection, &Day) -> Result<T> + Clone + Send + 'static,
    T: Send + 'static,
  {
    let g = f.clone();
    let found = self
      .read(move |conn| day::find_open(conn)?.map(|day| g(conn, &day)).transpose())
      .await?;
    if let Some(out) = found {
      return Ok(out);
    }
    self
      .write(move |conn| {
        let day = day::current(conn)?;
        f(conn, &day)
      })
      .await
  }
}

fn snapshot(conn: &Connection, day: &Day, today: NaiveDate) -> Result<JournalState> {
  let entries = entry::for_day(conn, day.id)?;
  let open_talk = talk::list_open(conn, day.id)?;
  Ok(JournalState {
    day: day.clone(),
    today,
    eligible_to_close: entries.eligible_to_close(),
    entries,
    open_talk,
  })
}

// ─── JournalStore impl ───────────────────────────────────────────────────────

impl JournalStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn read_state(&self) -> Result<JournalState> {
    let today = day::today();
    self
      .on_current_day(move |conn, day| snapshot(conn, day, today))
      .await
  }

  async fn open_talk(&self) -> Result<Vec<TalkItem>> {
    self
      .on_current_day(|conn, day| talk::list_open(conn, day.id))
      .await
  }

  async fn day_by_date(&self, date: NaiveDate) -> Result<Option<DayRecord>> {
    self
      .read(move |conn| {
        let Some(day) = day::newest_by_date(conn, date)? else {
          return Ok(None);
        };
        let entries = entry::for_day(conn, day.id)?;
        let talk = talk::list_for_day(conn, day.id)?;
        Ok(Some(DayRecord { day, entries, talk }))
      })
      .await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn submit_entry(&self, role: Role, fields: EntryFields) -> Result<Entry> {
    let entry = self
      .write(move |conn| {
        let day = day::current(conn)?;
        entry::upsert(conn, day.id, role, &fields)
      })
      .await?;
    tracing::debug!(day_id = entry.day_id, %role, "entry saved");
    Ok(entry)
  }

  async fn submit_talk_item(&self, role: Role, text: String) -> Result<TalkItem> {
    let item = self
      .write(move |conn| {
        let day = day::current(conn)?;
        talk::add(conn, day.id, role, &text)
      })
      .await?;
    tracing::debug!(id = item.id, day_id = item.day_id, %role, "talk item added");
    Ok(item)
  }

  async fn complete_talk_item(&self, id: TalkItemId, role: Role) -> Result<TalkItem> {
    let item = self.write(move |conn| talk::complete(conn, id, role)).await?;
    tracing::debug!(id, %role, "talk item completed");
    Ok(item)
  }

  async fn advance_day(&self) -> Result<Advance> {
    let result = self
      .write(|conn| {
        let old = day::current(conn)?;
        if !day::eligible_to_close(conn, old.id)? {
          return Err(Error::RequiredFieldsIncomplete(old.id));
        }
        let at = now();
        let closed = day::close(conn, &old, at)?;
        let opened = day::open_new(conn, day::today(), at)?;
        let carried = talk::carry_forward(conn, closed.id, opened.id, at)?;
        Ok(Advance { closed, opened, carried })
      })
      .await;

    match &result {
      Ok(advance) => tracing::info!(
        closed = advance.closed.id,
        opened = advance.opened.id,
        date = %advance.opened.date,
        carried = advance.carried,
        "day advanced"
      ),
      Err(Error::RequiredFieldsIncomplete(day_id)) => {
        tracing::debug!(day_id, "advance refused: required fields incomplete")
      }
      Err(e) => tracing::warn!(error = %e, "advance failed; rolled back"),
    }
    result
  }
}
