//! [`Tracker`]: the day view and calendar view over a [`DoseStore`].
//!
//! A date's history is materialized lazily: the first read of a date copies
//! the template schedule for that date's week bucket into history rows. There
//! is no lock around the read-then-insert sequence. Two concurrent first reads
//! race on the insert; the loser's batch is rejected by the store's uniqueness
//! constraint and it re-reads the winner's rows instead.
//!
//! Store failures do not propagate out of the day and calendar reads. They are
//! logged and the caller sees an empty result, which the UI renders as "nothing
//! to show". Only [`Tracker::toggle`] and the supplementary reads return a
//! [`Result`], because the caller must revert its optimistic update on failure.

use std::{
  collections::{BTreeMap, HashSet},
  sync::Arc,
};

use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  history::{DayCompletion, HistoryEntry, HistoryRecord, NewHistoryEntry},
  schedule::{Schedule, ScheduledDose, WeekBucket},
  store::{ConflictPolicy, DoseStore, StoreError},
  supplement::Supplement,
};

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}

/// The template schedule that applies to one date.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DaySchedule {
  pub date:  NaiveDate,
  pub week:  WeekBucket,
  /// Only doses whose supplement resolved, ordered by slot then timing.
  pub doses: Vec<ScheduledDose>,
}

/// Cloning is cheap; the store is reference-counted.
pub struct Tracker<S> {
  store:    Arc<S>,
  schedule: Schedule,
}

impl<S> Clone for Tracker<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), schedule: self.schedule }
  }
}

impl<S: DoseStore> Tracker<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, schedule: Schedule::default() }
  }

  /// Use a program calendar other than the default start date.
  pub fn with_schedule(mut self, schedule: Schedule) -> Self {
    self.schedule = schedule;
    self
  }

  pub fn schedule(&self) -> Schedule { self.schedule }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Day view ──────────────────────────────────────────────────────────

  /// Return the history for `date`, creating it from the template schedule
  /// if the date has never been viewed.
  pub async fn get_or_create_history(&self, date: &str) -> Vec<HistoryEntry> {
    let Some(date) = parse_logged(date) else {
      return Vec::new();
    };

    match self.store.history_for_date(date).await {
      Ok(existing) if !existing.is_empty() => {
        debug!(%date, rows = existing.len(), "history found");
        return resolved(existing);
      }
      Ok(_) => {}
      Err(e) => {
        error!(%date, error = %e, "failed to fetch history");
        return Vec::new();
      }
    }

    info!(%date, "no history for date, creating from schedule");
    match self.create_from_schedule(date, ConflictPolicy::Reject).await {
      Ok(rows) => resolved(rows),
      Err(e) if e.is_unique_violation() => {
        warn!(%date, "history created concurrently, refetching");
        match self.store.history_for_date(date).await {
          Ok(rows) => resolved(rows),
          Err(e) => {
            error!(%date, error = %e, "failed to refetch history after insert conflict");
            Vec::new()
          }
        }
      }
      Err(e) => {
        error!(%date, error = %e, "failed to create history");
        Vec::new()
      }
    }
  }

  /// Discard all progress for `date` and recreate its rows from the template
  /// schedule.
  ///
  /// A failed delete is logged and the recreate goes ahead regardless. The
  /// recreate overwrites on conflict, so rows the delete left behind are reset
  /// rather than duplicated.
  pub async fn reset_day(&self, date: &str) -> Vec<HistoryEntry> {
    let Some(date) = parse_logged(date) else {
      return Vec::new();
    };

    info!(%date, "resetting history");
    match self.store.delete_history_for_date(date).await {
      Ok(n) => debug!(%date, deleted = n, "cleared history"),
      Err(e) => error!(%date, error = %e, "failed to delete history for reset"),
    }

    match self.create_from_schedule(date, ConflictPolicy::Overwrite).await {
      Ok(rows) => resolved(rows),
      Err(e) => {
        error!(%date, error = %e, "failed to recreate history during reset");
        Vec::new()
      }
    }
  }

  /// Mark one entry taken or untaken. `taken_at` is set to now when `taken`
  /// is true and cleared otherwise.
  ///
  /// If the row's supplement no longer resolves the update still stands, but
  /// the entry cannot be rendered and [`Error::UnresolvedSupplement`] is
  /// returned.
  pub async fn toggle(&self, entry_id: Uuid, taken: bool) -> Result<HistoryEntry> {
    let taken_at = taken.then(Utc::now);

    let record = self
      .store
      .set_taken(entry_id, taken, taken_at)
      .await
      .map_err(|e| {
        error!(%entry_id, error = %e, "failed to update history entry");
        Error::Store(Box::new(e))
      })?
      .ok_or(Error::EntryNotFound(entry_id))?;

    let supplement_id = record.supplement_id;
    HistoryEntry::from_record(record).ok_or_else(|| {
      warn!(%entry_id, %supplement_id, "updated entry references an unknown supplement");
      Error::UnresolvedSupplement { entry_id, supplement_id }
    })
  }

  // ── Calendar view ─────────────────────────────────────────────────────

  /// Completion percentage for every date that has history. Dates with no
  /// rows are absent rather than reported as 0%.
  pub async fn overview(&self) -> BTreeMap<NaiveDate, DayCompletion> {
    let flags = match self.store.taken_flags().await {
      Ok(flags) => flags,
      Err(e) => {
        error!(error = %e, "failed to fetch calendar overview");
        return BTreeMap::new();
      }
    };

    let mut counts: BTreeMap<NaiveDate, (u32, u32)> = BTreeMap::new();
    for flag in flags {
      let (completed, total) = counts.entry(flag.taken_date).or_default();
      *total += 1;
      if flag.taken {
        *completed += 1;
      }
    }

    counts
      .into_iter()
      .map(|(date, (completed, total))| (date, DayCompletion::from_counts(completed, total)))
      .collect()
  }

  // ── Reference data ────────────────────────────────────────────────────

  /// The template doses that apply to `date`, without materializing
  /// anything.
  pub async fn scheduled_for_date(&self, date: &str) -> Result<DaySchedule> {
    let date = parse_date(date)?;
    let week = self.schedule.week_bucket(date);
    let mut doses = self
      .store
      .schedule_for_week(week)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    doses.retain(|d| d.supplement.is_some());
    doses.sort_by(|a, b| {
      (a.item.day_slot, &a.item.timing).cmp(&(b.item.day_slot, &b.item.timing))
    });
    Ok(DaySchedule { date, week, doses })
  }

  pub async fn supplements(&self) -> Result<Vec<Supplement>> {
    self
      .store
      .list_supplements()
      .await
      .map_err(|e| Error::Store(Box::new(e)))
  }

  // ── Internals ─────────────────────────────────────────────────────────

  /// Insert one untaken row per template item of `date`'s week bucket.
  /// An empty template yields no rows and no error.
  async fn create_from_schedule(
    &self,
    date: NaiveDate,
    policy: ConflictPolicy,
  ) -> std::result::Result<Vec<HistoryRecord>, S::Error> {
    let week = self.schedule.week_bucket(date);
    let doses = self.store.schedule_for_week(week).await?;

    // A duplicated template row would collide with itself inside the batch
    // and be mistaken for a concurrent materialization.
    let mut seen = HashSet::with_capacity(doses.len());
    let drafts: Vec<NewHistoryEntry> = doses
      .iter()
      .filter_map(|dose| NewHistoryEntry::from_dose(date, dose))
      .filter(|d| {
        let fresh = seen.insert((d.supplement_id, d.day_slot, d.timing.clone()));
        if !fresh {
          warn!(
            %date,
            supplement_id = %d.supplement_id,
            slot = d.day_slot.as_str(),
            timing = %d.timing,
            "duplicate template row ignored"
          );
        }
        fresh
      })
      .collect();

    if drafts.is_empty() {
      warn!(%date, week = week.number(), "no schedule found to create history");
      return Ok(Vec::new());
    }

    self.store.insert_history(drafts, policy).await
  }
}

fn parse_logged(date: &str) -> Option<NaiveDate> {
  match parse_date(date) {
    Ok(d) => Some(d),
    Err(e) => {
      warn!(error = %e, "rejecting history lookup");
      None
    }
  }
}

/// Drop rows whose supplement did not resolve and put the rest in day order.
fn resolved(records: Vec<HistoryRecord>) -> Vec<HistoryEntry> {
  let mut entries: Vec<HistoryEntry> = records
    .into_iter()
    .filter_map(HistoryEntry::from_record)
    .collect();
  entries.sort_by(|a, b| (a.day_slot, &a.timing).cmp(&(b.day_slot, &b.timing)));
  entries
}
