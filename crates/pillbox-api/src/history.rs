//! Handler for `PUT /history/:id/taken`.

use axum::{
  Json,
  extract::{Path, State},
};
use pillbox_core::{history::HistoryEntry, store::DoseStore, tracker::Tracker};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TakenBody {
  pub taken: bool,
}

/// `PUT /history/:id/taken` — body: `{"taken": true}`.
///
/// Returns the updated entry; 404 if no entry has `id`. The client reverts
/// its optimistic checkbox state on any non-2xx response.
pub async fn set_taken<S>(
  State(tracker): State<Tracker<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TakenBody>,
) -> Result<Json<HistoryEntry>, ApiError>
where
  S: DoseStore + 'static,
{
  Ok(Json(tracker.toggle(id, body.taken).await?))
}
