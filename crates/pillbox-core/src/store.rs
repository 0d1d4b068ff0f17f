//! The `DoseStore` trait: the persisted tables the tracker reads and writes.
//!
//! The trait is implemented by storage backends (e.g. `pillbox-store-sqlite`).
//! [`crate::tracker::Tracker`] is handed a store explicitly; nothing in the
//! core reaches for a global client.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  history::{HistoryRecord, NewHistoryEntry, TakenFlag},
  schedule::{NewScheduleItem, ScheduleItem, ScheduledDose, WeekBucket},
  supplement::{NewSupplement, Supplement},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error type of a [`DoseStore`] backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` if a write was rejected because a row with the same
  /// `(taken_date, supplement_id, day_slot, timing)` already exists.
  fn is_unique_violation(&self) -> bool;
}

// ─── Insert policy ───────────────────────────────────────────────────────────

/// What [`DoseStore::insert_history`] does when a draft collides with an
/// existing row for the same `(date, supplement, slot, timing)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
  /// Abort the whole batch with a unique-violation error. Nothing is written.
  #[default]
  Reject,
  /// Reset the existing row to the draft's values and mark it untaken. The
  /// row keeps its id.
  Overwrite,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the supplement, schedule and history tables.
///
/// Every call is a fresh round trip to the backend; implementations must not
/// cache. All methods return `Send` futures so the trait can be used from
/// axum handlers on a multi-threaded runtime.
pub trait DoseStore: Send + Sync {
  type Error: StoreError;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// List all supplements, ordered by name.
  fn list_supplements(
    &self,
  ) -> impl Future<Output = Result<Vec<Supplement>, Self::Error>> + Send + '_;

  fn add_supplement(
    &self,
    input: NewSupplement,
  ) -> impl Future<Output = Result<Supplement, Self::Error>> + Send + '_;

  // ── Template schedule ─────────────────────────────────────────────────

  fn add_schedule_item(
    &self,
    input: NewScheduleItem,
  ) -> impl Future<Output = Result<ScheduleItem, Self::Error>> + Send + '_;

  /// All template rows for `week`, joined with their supplements, ordered by
  /// day slot then timing.
  fn schedule_for_week(
    &self,
    week: WeekBucket,
  ) -> impl Future<Output = Result<Vec<ScheduledDose>, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// All history rows for `date`, joined with their supplements, ordered by
  /// day slot then timing.
  fn history_for_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<HistoryRecord>, Self::Error>> + Send + '_;

  /// Insert `drafts` as a single atomic batch and return the written rows,
  /// joined and ordered as in [`history_for_date`](Self::history_for_date).
  ///
  /// Under [`ConflictPolicy::Reject`] a collision fails the whole batch with
  /// an error for which [`StoreError::is_unique_violation`] is `true`.
  fn insert_history(
    &self,
    drafts: Vec<NewHistoryEntry>,
    policy: ConflictPolicy,
  ) -> impl Future<Output = Result<Vec<HistoryRecord>, Self::Error>> + Send + '_;

  /// Set `taken` and `taken_at` on one row in a single update. Returns
  /// `None` if no row has `entry_id`.
  fn set_taken(
    &self,
    entry_id: Uuid,
    taken: bool,
    taken_at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Option<HistoryRecord>, Self::Error>> + Send + '_;

  /// Delete every history row for `date`; returns the number removed.
  fn delete_history_for_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// `(date, taken)` for every history row, unbounded.
  fn taken_flags(
    &self,
  ) -> impl Future<Output = Result<Vec<TakenFlag>, Self::Error>> + Send + '_;
}
