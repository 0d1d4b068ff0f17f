//! Handlers for the day view.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/days/:date` | Creates the day from the template on first view |
//! | `POST` | `/days/:date/reset` | Discards progress and recreates the day |
//! | `GET`  | `/days/:date/schedule` | Template doses for the date; writes nothing |
//!
//! `:date` is `YYYY-MM-DD`; anything else is a 400.

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::NaiveDate;
use pillbox_core::{
  history::{DayCompletion, HistoryEntry},
  schedule::WeekBucket,
  store::DoseStore,
  tracker::{DaySchedule, Tracker, parse_date},
};
use serde::Serialize;

use crate::error::ApiError;

/// Body returned by the day endpoints.
#[derive(Debug, Serialize)]
pub struct DayView {
  pub date:                  NaiveDate,
  pub week:                  WeekBucket,
  pub completed:             usize,
  pub total:                 usize,
  /// 0 for a day with nothing scheduled.
  pub completion_percentage: u8,
  pub entries:               Vec<HistoryEntry>,
}

impl DayView {
  fn new(date: NaiveDate, week: WeekBucket, entries: Vec<HistoryEntry>) -> Self {
    let total = entries.len();
    let completed = entries.iter().filter(|e| e.taken).count();
    let completion_percentage =
      DayCompletion::from_counts(completed as u32, total as u32).completion_percentage;
    Self { date, week, completed, total, completion_percentage, entries }
  }
}

fn date_param(raw: &str) -> Result<NaiveDate, ApiError> { Ok(parse_date(raw)?) }

/// `GET /days/:date`
pub async fn get_day<S>(
  State(tracker): State<Tracker<S>>,
  Path(raw): Path<String>,
) -> Result<Json<DayView>, ApiError>
where
  S: DoseStore + 'static,
{
  let date = date_param(&raw)?;
  let entries = tracker.get_or_create_history(&raw).await;
  Ok(Json(DayView::new(date, tracker.schedule().week_bucket(date), entries)))
}

/// `POST /days/:date/reset`
pub async fn reset_day<S>(
  State(tracker): State<Tracker<S>>,
  Path(raw): Path<String>,
) -> Result<Json<DayView>, ApiError>
where
  S: DoseStore + 'static,
{
  let date = date_param(&raw)?;
  let entries = tracker.reset_day(&raw).await;
  Ok(Json(DayView::new(date, tracker.schedule().week_bucket(date), entries)))
}

/// `GET /days/:date/schedule`
pub async fn schedule<S>(
  State(tracker): State<Tracker<S>>,
  Path(raw): Path<String>,
) -> Result<Json<DaySchedule>, ApiError>
where
  S: DoseStore + 'static,
{
  Ok(Json(tracker.scheduled_for_date(&raw).await?))
}
