//! The recurring dosage program and its template schedule.
//!
//! The program cycles through three week patterns counted from a fixed start
//! date. The third pattern repeats indefinitely once reached.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::supplement::SupplementRef;

// ─── Slots ───────────────────────────────────────────────────────────────────

/// The part of the day a dose belongs to.
///
/// Variants are declared in the order they occur during a day; the derived
/// `Ord` is what day views sort by.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DaySlot {
  Morning,
  Midday,
  Evening,
}

impl DaySlot {
  pub const ALL: [DaySlot; 3] = [Self::Morning, Self::Midday, Self::Evening];

  /// The text stored in the `day_slot` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Morning => "morning",
      Self::Midday => "midday",
      Self::Evening => "evening",
    }
  }
}

// ─── Week buckets ────────────────────────────────────────────────────────────

/// Which of the three weekly dosage patterns applies to a date.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum WeekBucket {
  One,
  Two,
  Three,
}

impl WeekBucket {
  /// The `week_number` stored alongside template rows.
  pub fn number(self) -> u8 {
    match self {
      Self::One => 1,
      Self::Two => 2,
      Self::Three => 3,
    }
  }

  pub fn from_number(n: u8) -> Option<Self> {
    match n {
      1 => Some(Self::One),
      2 => Some(Self::Two),
      3 => Some(Self::Three),
      _ => None,
    }
  }
}

impl From<WeekBucket> for u8 {
  fn from(w: WeekBucket) -> Self { w.number() }
}

impl TryFrom<u8> for WeekBucket {
  type Error = String;

  fn try_from(n: u8) -> Result<Self, Self::Error> {
    Self::from_number(n).ok_or_else(|| format!("week number out of range: {n}"))
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// The first day of the program.
pub const PROGRAM_START: NaiveDate = match NaiveDate::from_ymd_opt(2025, 4, 28) {
  Some(d) => d,
  None => panic!("invalid program start date"),
};

/// The program calendar: maps dates onto week buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
  start: NaiveDate,
}

impl Default for Schedule {
  fn default() -> Self { Self { start: PROGRAM_START } }
}

impl Schedule {
  /// A program that starts on `start` instead of [`PROGRAM_START`].
  pub fn starting_on(start: NaiveDate) -> Self { Self { start } }

  pub fn start(&self) -> NaiveDate { self.start }

  /// Whole weeks between the program start and `date`, truncated toward zero.
  /// Negative for dates before the start.
  pub fn weeks_elapsed(&self, date: NaiveDate) -> i64 {
    (date - self.start).num_days() / 7
  }

  pub fn week_bucket(&self, date: NaiveDate) -> WeekBucket {
    match self.weeks_elapsed(date) {
      i64::MIN..=0 => WeekBucket::One,
      1 => WeekBucket::Two,
      _ => WeekBucket::Three,
    }
  }
}

/// Resolve `date` against the fixed program start date.
pub fn resolve_week_bucket(date: NaiveDate) -> WeekBucket {
  Schedule::default().week_bucket(date)
}

// ─── Template rows ───────────────────────────────────────────────────────────

/// One planned dose: what should be taken on any date in `week`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
  pub item_id:       Uuid,
  pub week:          WeekBucket,
  pub day_slot:      DaySlot,
  /// Admin-defined position within the slot, e.g. `"before_meal"`.
  pub timing:        String,
  pub supplement_id: Uuid,
  pub dosage:        f64,
  pub notes:         Option<String>,
  pub created_at:    DateTime<Utc>,
}

/// A template row joined with its supplement. `supplement` is `None` when the
/// reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDose {
  pub item:       ScheduleItem,
  pub supplement: Option<SupplementRef>,
}

/// Input to [`crate::store::DoseStore::add_schedule_item`].
#[derive(Debug, Clone)]
pub struct NewScheduleItem {
  pub week:          WeekBucket,
  pub day_slot:      DaySlot,
  pub timing:        String,
  pub supplement_id: Uuid,
  pub dosage:        f64,
  pub notes:         Option<String>,
}
