//! Handler for `GET /overview`, the calendar view.

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use pillbox_core::{history::DayCompletion, store::DoseStore, tracker::Tracker};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct OverviewParams {
  /// Inclusive lower bound, e.g. the first day of the displayed month.
  pub from: Option<NaiveDate>,
  /// Inclusive upper bound.
  pub to:   Option<NaiveDate>,
}

/// `GET /overview[?from=YYYY-MM-DD][&to=YYYY-MM-DD]`
///
/// Maps each date that has history to its completion percentage. Dates that
/// were never viewed are absent.
pub async fn handler<S>(
  State(tracker): State<Tracker<S>>,
  Query(params): Query<OverviewParams>,
) -> Result<Json<BTreeMap<NaiveDate, DayCompletion>>, ApiError>
where
  S: DoseStore + 'static,
{
  if let (Some(from), Some(to)) = (params.from, params.to)
    && from > to
  {
    return Err(ApiError::BadRequest(format!("from {from} is after to {to}")));
  }

  let mut overview = tracker.overview().await;
  overview.retain(|date, _| {
    params.from.is_none_or(|from| *date >= from) && params.to.is_none_or(|to| *date <= to)
  });
  Ok(Json(overview))
}
