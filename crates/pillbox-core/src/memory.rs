//! In-memory [`DoseStore`] used by the tracker tests.
//!
//! Enforces the same `(date, supplement, slot, timing)` uniqueness as the
//! SQLite schema. Reads yield to the runtime after taking their snapshot so
//! that `join!`-ed callers interleave between read and insert.

use std::sync::{
  Mutex,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  history::{HistoryRecord, NewHistoryEntry, TakenFlag},
  schedule::{DaySlot, NewScheduleItem, ScheduleItem, ScheduledDose, WeekBucket},
  store::{ConflictPolicy, DoseStore, StoreError},
  supplement::{NewSupplement, Supplement, SupplementRef},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("unique constraint violated on history")]
  Conflict,
  #[error("injected failure: {0}")]
  Injected(&'static str),
}

impl StoreError for MemoryError {
  fn is_unique_violation(&self) -> bool { matches!(self, Self::Conflict) }
}

#[derive(Debug, Clone)]
struct Row {
  entry_id:         Uuid,
  taken_date:       NaiveDate,
  supplement_id:    Uuid,
  day_slot:         DaySlot,
  timing:           String,
  dosage_scheduled: f64,
  unit_scheduled:   Option<String>,
  taken:            bool,
  taken_at:         Option<DateTime<Utc>>,
  created_at:       DateTime<Utc>,
}

impl Row {
  fn same_key(&self, d: &NewHistoryEntry) -> bool {
    self.taken_date == d.taken_date
      && self.supplement_id == d.supplement_id
      && self.day_slot == d.day_slot
      && self.timing == d.timing
  }
}

#[derive(Default)]
struct Tables {
  supplements: Vec<Supplement>,
  schedule:    Vec<ScheduleItem>,
  history:     Vec<Row>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables:               Mutex<Tables>,
  pub fail_reads:       AtomicBool,
  pub fail_inserts:     AtomicBool,
  pub fail_updates:     AtomicBool,
  pub fail_deletes:     AtomicBool,
  /// Reject every insert as a conflict without writing, as if another caller
  /// had won the race.
  pub conflict_inserts: AtomicBool,
  /// When set, history reads succeed this many more times and then fail.
  pub read_budget:      Mutex<Option<usize>>,
  pub inserts:          AtomicUsize,
}

impl MemoryStore {
  fn lookup(tables: &Tables, id: Uuid) -> Option<SupplementRef> {
    tables
      .supplements
      .iter()
      .find(|s| s.supplement_id == id)
      .map(SupplementRef::from)
  }

  fn record(tables: &Tables, row: &Row) -> HistoryRecord {
    HistoryRecord {
      entry_id:         row.entry_id,
      taken_date:       row.taken_date,
      supplement_id:    row.supplement_id,
      day_slot:         row.day_slot,
      timing:           row.timing.clone(),
      dosage_scheduled: row.dosage_scheduled,
      unit_scheduled:   row.unit_scheduled.clone(),
      taken:            row.taken,
      taken_at:         row.taken_at,
      created_at:       row.created_at,
      supplement:       Self::lookup(tables, row.supplement_id),
    }
  }

  /// Number of stored history rows for `date`, regardless of supplement.
  pub fn history_len(&self, date: NaiveDate) -> usize {
    let tables = self.tables.lock().unwrap();
    tables.history.iter().filter(|r| r.taken_date == date).count()
  }

  /// Mark every stored row for `date` as taken, bypassing the tracker.
  pub fn mark_all_taken(&self, date: NaiveDate) {
    let mut tables = self.tables.lock().unwrap();
    for row in tables.history.iter_mut().filter(|r| r.taken_date == date) {
      row.taken = true;
      row.taken_at = Some(Utc::now());
    }
  }
}

impl DoseStore for MemoryStore {
  type Error = MemoryError;

  async fn list_supplements(&self) -> Result<Vec<Supplement>, MemoryError> {
    let mut all = self.tables.lock().unwrap().supplements.clone();
    all.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(all)
  }

  async fn add_supplement(&self, input: NewSupplement) -> Result<Supplement, MemoryError> {
    let supplement = Supplement {
      supplement_id: Uuid::new_v4(),
      name:          input.name,
      default_unit:  input.default_unit,
      created_at:    Utc::now(),
    };
    self.tables.lock().unwrap().supplements.push(supplement.clone());
    Ok(supplement)
  }

  async fn add_schedule_item(
    &self,
    input: NewScheduleItem,
  ) -> Result<ScheduleItem, MemoryError> {
    let item = ScheduleItem {
      item_id:       Uuid::new_v4(),
      week:          input.week,
      day_slot:      input.day_slot,
      timing:        input.timing,
      supplement_id: input.supplement_id,
      dosage:        input.dosage,
      notes:         input.notes,
      created_at:    Utc::now(),
    };
    self.tables.lock().unwrap().schedule.push(item.clone());
    Ok(item)
  }

  async fn schedule_for_week(
    &self,
    week: WeekBucket,
  ) -> Result<Vec<ScheduledDose>, MemoryError> {
    let doses = {
      let tables = self.tables.lock().unwrap();
      let mut doses: Vec<ScheduledDose> = tables
        .schedule
        .iter()
        .filter(|i| i.week == week)
        .map(|i| ScheduledDose {
          item:       i.clone(),
          supplement: Self::lookup(&tables, i.supplement_id),
        })
        .collect();
      doses.sort_by(|a, b| {
        (a.item.day_slot, &a.item.timing).cmp(&(b.item.day_slot, &b.item.timing))
      });
      doses
    };
    tokio::task::yield_now().await;
    Ok(doses)
  }

  async fn history_for_date(
    &self,
    date: NaiveDate,
  ) -> Result<Vec<HistoryRecord>, MemoryError> {
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(MemoryError::Injected("read"));
    }
    let exhausted = {
      let mut budget = self.read_budget.lock().unwrap();
      match budget.as_mut() {
        Some(0) => true,
        Some(left) => {
          *left -= 1;
          false
        }
        None => false,
      }
    };
    if exhausted {
      return Err(MemoryError::Injected("read"));
    }
    let rows = {
      let tables = self.tables.lock().unwrap();
      tables
        .history
        .iter()
        .filter(|r| r.taken_date == date)
        .map(|r| Self::record(&tables, r))
        .collect::<Vec<_>>()
    };
    tokio::task::yield_now().await;
    Ok(rows)
  }

  async fn insert_history(
    &self,
    drafts: Vec<NewHistoryEntry>,
    policy: ConflictPolicy,
  ) -> Result<Vec<HistoryRecord>, MemoryError> {
    if self.fail_inserts.load(Ordering::SeqCst) {
      return Err(MemoryError::Injected("insert"));
    }
    self.inserts.fetch_add(1, Ordering::SeqCst);
    if self.conflict_inserts.load(Ordering::SeqCst) {
      return Err(MemoryError::Conflict);
    }

    let mut tables = self.tables.lock().unwrap();
    let now = Utc::now();

    if policy == ConflictPolicy::Reject
      && drafts
        .iter()
        .any(|d| tables.history.iter().any(|r| r.same_key(d)))
    {
      return Err(MemoryError::Conflict);
    }

    let mut ids = Vec::with_capacity(drafts.len());
    for d in drafts {
      if let Some(existing) = tables.history.iter_mut().find(|r| r.same_key(&d)) {
        existing.dosage_scheduled = d.dosage_scheduled;
        existing.unit_scheduled = d.unit_scheduled;
        existing.taken = false;
        existing.taken_at = None;
        ids.push(existing.entry_id);
        continue;
      }
      let row = Row {
        entry_id:         Uuid::new_v4(),
        taken_date:       d.taken_date,
        supplement_id:    d.supplement_id,
        day_slot:         d.day_slot,
        timing:           d.timing,
        dosage_scheduled: d.dosage_scheduled,
        unit_scheduled:   d.unit_scheduled,
        taken:            false,
        taken_at:         None,
        created_at:       now,
      };
      ids.push(row.entry_id);
      tables.history.push(row);
    }

    Ok(
      ids
        .iter()
        .filter_map(|id| tables.history.iter().find(|r| r.entry_id == *id))
        .map(|r| Self::record(&tables, r))
        .collect(),
    )
  }

  async fn set_taken(
    &self,
    entry_id: Uuid,
    taken: bool,
    taken_at: Option<DateTime<Utc>>,
  ) -> Result<Option<HistoryRecord>, MemoryError> {
    if self.fail_updates.load(Ordering::SeqCst) {
      return Err(MemoryError::Injected("update"));
    }
    let mut tables = self.tables.lock().unwrap();
    let Some(row) = tables.history.iter_mut().find(|r| r.entry_id == entry_id) else {
      return Ok(None);
    };
    row.taken = taken;
    row.taken_at = taken_at;
    let row = row.clone();
    Ok(Some(Self::record(&tables, &row)))
  }

  async fn delete_history_for_date(&self, date: NaiveDate) -> Result<u64, MemoryError> {
    if self.fail_deletes.load(Ordering::SeqCst) {
      return Err(MemoryError::Injected("delete"));
    }
    let mut tables = self.tables.lock().unwrap();
    let before = tables.history.len();
    tables.history.retain(|r| r.taken_date != date);
    Ok((before - tables.history.len()) as u64)
  }

  async fn taken_flags(&self) -> Result<Vec<TakenFlag>, MemoryError> {
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(MemoryError::Injected("read"));
    }
    let tables = self.tables.lock().unwrap();
    Ok(
      tables
        .history
        .iter()
        .map(|r| TakenFlag { taken_date: r.taken_date, taken: r.taken })
        .collect(),
    )
  }
}
