//! JSON REST API for Pillbox.
//!
//! Exposes an axum [`Router`] backed by a [`Tracker`] over any
//! [`pillbox_core::store::DoseStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", pillbox_api::api_router(tracker.clone()))
//! ```

pub mod days;
pub mod error;
pub mod history;
pub mod overview;
pub mod supplements;

use axum::{
  Router,
  routing::{get, post, put},
};
use pillbox_core::{store::DoseStore, tracker::Tracker};

pub use error::ApiError;

/// Build a fully-materialised API router for `tracker`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(tracker: Tracker<S>) -> Router<()>
where
  S: DoseStore + 'static,
{
  Router::new()
    // Calendar
    .route("/overview", get(overview::handler::<S>))
    // Day view
    .route("/days/{date}", get(days::get_day::<S>))
    .route("/days/{date}/reset", post(days::reset_day::<S>))
    .route("/days/{date}/schedule", get(days::schedule::<S>))
    .route("/history/{id}/taken", put(history::set_taken::<S>))
    // Catalog
    .route("/supplements", get(supplements::list::<S>))
    .with_state(tracker)
}
