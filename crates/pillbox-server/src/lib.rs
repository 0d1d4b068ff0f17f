//! Server wiring for Pillbox.
//!
//! Owns the runtime configuration, the optional first-run seed, and the outer
//! axum [`Router`] that mounts [`pillbox_api`] under `/api`.

pub mod seed;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use axum::Router;
use chrono::NaiveDate;
use pillbox_core::{schedule::Schedule, store::DoseStore, tracker::Tracker};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `pillbox.toml` layered
/// under `PILLBOX_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub store_path:    PathBuf,
  /// Anchor date for week buckets. Defaults to
  /// [`pillbox_core::schedule::PROGRAM_START`].
  pub program_start: Option<NaiveDate>,
  /// TOML file applied to an empty catalog on startup.
  pub seed_path:     Option<PathBuf>,
}

impl ServerConfig {
  /// Read `path` (if it exists) and the environment. Missing keys fall back
  /// to `127.0.0.1:8080` and `pillbox.db`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080_i64)?
      .set_default("store_path", "pillbox.db")?
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("PILLBOX"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn schedule(&self) -> Schedule {
    self.program_start.map(Schedule::starting_on).unwrap_or_default()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level [`Router`]: the JSON API under `/api`, wrapped in a
/// request-tracing layer.
pub fn router<S>(tracker: Tracker<S>) -> Router
where
  S: DoseStore + 'static,
{
  Router::new()
    .nest("/api", pillbox_api::api_router(tracker))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
