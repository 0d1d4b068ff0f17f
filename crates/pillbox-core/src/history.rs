//! Per-day history: what was scheduled on a date and whether it was taken.
//!
//! History rows are copied from the template schedule the first time a date is
//! viewed. Dosage and unit are frozen at that moment; later template edits do
//! not touch existing rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  schedule::{DaySlot, ScheduledDose},
  supplement::SupplementRef,
};

// ─── Stored rows ─────────────────────────────────────────────────────────────

/// A history row as the store returns it, joined with its supplement.
/// `supplement` is `None` when the reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
  pub entry_id:         Uuid,
  pub taken_date:       NaiveDate,
  pub supplement_id:    Uuid,
  pub day_slot:         DaySlot,
  pub timing:           String,
  pub dosage_scheduled: f64,
  pub unit_scheduled:   Option<String>,
  pub taken:            bool,
  pub taken_at:         Option<DateTime<Utc>>,
  pub created_at:       DateTime<Utc>,
  pub supplement:       Option<SupplementRef>,
}

/// A history row whose supplement reference resolved. This is what the day
/// view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub entry_id:         Uuid,
  pub taken_date:       NaiveDate,
  pub day_slot:         DaySlot,
  pub timing:           String,
  pub dosage_scheduled: f64,
  pub unit_scheduled:   Option<String>,
  pub taken:            bool,
  pub taken_at:         Option<DateTime<Utc>>,
  pub created_at:       DateTime<Utc>,
  pub supplement:       SupplementRef,
}

impl HistoryEntry {
  /// Returns `None` if the record's supplement did not resolve.
  pub fn from_record(record: HistoryRecord) -> Option<Self> {
    let supplement = record.supplement?;
    Some(Self {
      entry_id: record.entry_id,
      taken_date: record.taken_date,
      day_slot: record.day_slot,
      timing: record.timing,
      dosage_scheduled: record.dosage_scheduled,
      unit_scheduled: record.unit_scheduled,
      taken: record.taken,
      taken_at: record.taken_at,
      created_at: record.created_at,
      supplement,
    })
  }
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::DoseStore::insert_history`]. Ids and
/// `created_at` are assigned by the store; new rows always start untaken.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
  pub taken_date:       NaiveDate,
  pub supplement_id:    Uuid,
  pub day_slot:         DaySlot,
  pub timing:           String,
  pub dosage_scheduled: f64,
  pub unit_scheduled:   Option<String>,
}

impl NewHistoryEntry {
  /// Draft the history row for `dose` on `date`. Returns `None` if the dose's
  /// supplement did not resolve.
  pub fn from_dose(date: NaiveDate, dose: &ScheduledDose) -> Option<Self> {
    let supplement = dose.supplement.as_ref()?;
    Some(Self {
      taken_date:       date,
      supplement_id:    dose.item.supplement_id,
      day_slot:         dose.item.day_slot,
      timing:           dose.item.timing.clone(),
      dosage_scheduled: dose.item.dosage,
      unit_scheduled:   supplement.default_unit.clone(),
    })
  }
}

// ─── Calendar ────────────────────────────────────────────────────────────────

/// One `(date, taken)` pair from a full history scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakenFlag {
  pub taken_date: NaiveDate,
  pub taken:      bool,
}

/// Completion status of a single day in the calendar overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCompletion {
  /// 0–100, rounded to the nearest integer with halves rounding up.
  pub completion_percentage: u8,
}

impl DayCompletion {
  /// A day with nothing scheduled is 0% complete.
  pub fn from_counts(completed: u32, total: u32) -> Self {
    if total == 0 {
      return Self { completion_percentage: 0 };
    }
    let pct = (u64::from(completed) * 100 + u64::from(total) / 2) / u64::from(total);
    Self { completion_percentage: pct.min(100) as u8 }
  }
}
