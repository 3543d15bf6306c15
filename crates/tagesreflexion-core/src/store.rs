//! The `JournalStore` trait: the engine's public operations.
//!
//! The trait is implemented by storage backends (e.g.
//! `tagesreflexion-store-sqlite`). Higher layers (`tagesreflexion-api`) depend
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  Classify, Role,
  entry::{Entry, EntryFields},
  talk::{TalkItem, TalkItemId},
  view::{Advance, DayRecord, JournalState},
};

/// Abstraction over a journal backend.
///
/// Every operation acts on the single open day unless it says otherwise.
/// Implementations must make [`JournalStore::advance_day`] atomic with
/// respect to every other operation, including concurrent advances.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait JournalStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Snapshot of the open day: both entries, the open backlog, and whether
  /// the day may close.
  fn read_state(
    &self,
  ) -> impl Future<Output = Result<JournalState, Self::Error>> + Send + '_;

  /// The open day's uncompleted talk items, oldest origin first.
  fn open_talk(
    &self,
  ) -> impl Future<Output = Result<Vec<TalkItem>, Self::Error>> + Send + '_;

  /// The newest day with the given calendar date, or `None`.
  fn day_by_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<DayRecord>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Replace `role`'s entry for the open day. Every required field must be
  /// non-empty after normalisation.
  fn submit_entry(
    &self,
    role: Role,
    fields: EntryFields,
  ) -> impl Future<Output = Result<Entry, Self::Error>> + Send + '_;

  /// Add a talk item to the open day's backlog.
  fn submit_talk_item(
    &self,
    role: Role,
    text: String,
  ) -> impl Future<Output = Result<TalkItem, Self::Error>> + Send + '_;

  /// Mark a talk item done. Completing an already completed item is accepted
  /// and overwrites the completion time and role.
  fn complete_talk_item(
    &self,
    id: TalkItemId,
    role: Role,
  ) -> impl Future<Output = Result<TalkItem, Self::Error>> + Send + '_;

  /// Close the open day and open its successor, carrying unresolved talk
  /// items forward. Fails with a precondition fault unless both entries are
  /// complete; nothing changes on failure.
  fn advance_day(
    &self,
  ) -> impl Future<Output = Result<Advance, Self::Error>> + Send + '_;
}
