//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, UUIDs as
//! hyphenated lowercase strings, day slots as their lowercase names.

use chrono::{DateTime, NaiveDate, Utc};
use pillbox_core::{
  history::HistoryRecord,
  schedule::{DaySlot, ScheduleItem, ScheduledDose, WeekBucket},
  supplement::{Supplement, SupplementRef},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DaySlot ─────────────────────────────────────────────────────────────────

pub fn encode_slot(slot: DaySlot) -> &'static str { slot.as_str() }

pub fn decode_slot(s: &str) -> Result<DaySlot> {
  DaySlot::ALL
    .into_iter()
    .find(|slot| slot.as_str() == s)
    .ok_or_else(|| Error::UnknownSlot(s.to_owned()))
}

// ─── WeekBucket ──────────────────────────────────────────────────────────────

pub fn encode_week(w: WeekBucket) -> i64 { i64::from(w.number()) }

pub fn decode_week(n: i64) -> Result<WeekBucket> {
  u8::try_from(n)
    .ok()
    .and_then(WeekBucket::from_number)
    .ok_or(Error::UnknownWeek(n))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `supplements` row.
pub struct RawSupplement {
  pub supplement_id: String,
  pub name:          String,
  pub default_unit:  Option<String>,
  pub created_at:    String,
}

impl RawSupplement {
  pub fn into_supplement(self) -> Result<Supplement> {
    Ok(Supplement {
      supplement_id: decode_uuid(&self.supplement_id)?,
      name:          self.name,
      default_unit:  self.default_unit,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// The `supplements` columns of a LEFT JOIN; all `None` when the join missed.
pub struct RawSupplementRef {
  pub supplement_id: Option<String>,
  pub name:          Option<String>,
  pub default_unit:  Option<String>,
}

impl RawSupplementRef {
  fn into_ref(self) -> Result<Option<SupplementRef>> {
    let (Some(id), Some(name)) = (self.supplement_id, self.name) else {
      return Ok(None);
    };
    Ok(Some(SupplementRef {
      supplement_id: decode_uuid(&id)?,
      name,
      default_unit: self.default_unit,
    }))
  }
}

/// Raw values read from a `schedule` row joined with `supplements`.
pub struct RawScheduledDose {
  pub item_id:       String,
  pub week_number:   i64,
  pub day_slot:      String,
  pub timing:        String,
  pub supplement_id: String,
  pub dosage:        f64,
  pub notes:         Option<String>,
  pub created_at:    String,
  pub supplement:    RawSupplementRef,
}

impl RawScheduledDose {
  pub fn into_dose(self) -> Result<ScheduledDose> {
    let item = ScheduleItem {
      item_id:       decode_uuid(&self.item_id)?,
      week:          decode_week(self.week_number)?,
      day_slot:      decode_slot(&self.day_slot)?,
      timing:        self.timing,
      supplement_id: decode_uuid(&self.supplement_id)?,
      dosage:        self.dosage,
      notes:         self.notes,
      created_at:    decode_dt(&self.created_at)?,
    };
    Ok(ScheduledDose { item, supplement: self.supplement.into_ref()? })
  }
}

/// Raw values read from a `history` row joined with `supplements`.
pub struct RawHistory {
  pub entry_id:         String,
  pub taken_date:       String,
  pub supplement_id:    String,
  pub day_slot:         String,
  pub timing:           String,
  pub dosage_scheduled: f64,
  pub unit_scheduled:   Option<String>,
  pub taken:            bool,
  pub taken_at:         Option<String>,
  pub created_at:       String,
  pub supplement:       RawSupplementRef,
}

impl RawHistory {
  pub fn into_record(self) -> Result<HistoryRecord> {
    Ok(HistoryRecord {
      entry_id:         decode_uuid(&self.entry_id)?,
      taken_date:       decode_date(&self.taken_date)?,
      supplement_id:    decode_uuid(&self.supplement_id)?,
      day_slot:         decode_slot(&self.day_slot)?,
      timing:           self.timing,
      dosage_scheduled: self.dosage_scheduled,
      unit_scheduled:   self.unit_scheduled,
      taken:            self.taken,
      taken_at:         self.taken_at.as_deref().map(decode_dt).transpose()?,
      created_at:       decode_dt(&self.created_at)?,
      supplement:       self.supplement.into_ref()?,
    })
  }
}
