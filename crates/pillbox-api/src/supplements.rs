//! Handler for `GET /supplements`.

use axum::{Json, extract::State};
use pillbox_core::{store::DoseStore, supplement::Supplement, tracker::Tracker};

use crate::error::ApiError;

/// `GET /supplements` — the catalog, ordered by name.
pub async fn list<S>(
  State(tracker): State<Tracker<S>>,
) -> Result<Json<Vec<Supplement>>, ApiError>
where
  S: DoseStore + 'static,
{
  Ok(Json(tracker.supplements().await?))
}
