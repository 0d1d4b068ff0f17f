//! First-run catalog seeding.
//!
//! A seed file lists supplements and the template schedule that references
//! them by name:
//!
//! ```toml
//! [[supplements]]
//! name         = "Magnesium"
//! default_unit = "mg"
//!
//! [[schedule]]
//! week       = 1
//! day_slot   = "evening"
//! timing     = "with_meal"
//! supplement = "Magnesium"
//! dosage     = 200
//! ```
//!
//! The seed is only applied to an empty catalog, so restarting the server with
//! the same `seed_path` is harmless.

use std::{
  collections::{HashMap, HashSet},
  path::Path,
};

use anyhow::{Context as _, bail};
use pillbox_core::{
  schedule::{DaySlot, NewScheduleItem, WeekBucket},
  store::DoseStore,
  supplement::NewSupplement,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
  #[serde(default)]
  pub supplements: Vec<SeedSupplement>,
  #[serde(default)]
  pub schedule:    Vec<SeedScheduleItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSupplement {
  pub name:         String,
  pub default_unit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedScheduleItem {
  pub week:       WeekBucket,
  pub day_slot:   DaySlot,
  pub timing:     String,
  /// Name of a supplement listed in the same file.
  pub supplement: String,
  pub dosage:     f64,
  pub notes:      Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
  /// The catalog already had supplements; nothing was written.
  Skipped,
  Applied { supplements: usize, schedule: usize },
}

impl SeedFile {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_source(config::File::from(path.to_path_buf()))
      .with_context(|| format!("failed to read seed file {path:?}"))
  }

  pub fn from_toml(toml: &str) -> anyhow::Result<Self> {
    Self::from_source(config::File::from_str(toml, config::FileFormat::Toml))
  }

  fn from_source<T>(source: T) -> anyhow::Result<Self>
  where
    T: config::Source + Send + Sync + 'static,
  {
    let seed = config::Config::builder()
      .add_source(source)
      .build()?
      .try_deserialize()?;
    Ok(seed)
  }

  /// Every schedule row must name a supplement declared in this file, and no
  /// two rows may share `(week, day_slot, timing, supplement)`.
  fn validate(&self) -> anyhow::Result<()> {
    let names: HashSet<&str> =
      self.supplements.iter().map(|s| s.name.as_str()).collect();
    let mut keys = HashSet::with_capacity(self.schedule.len());
    for row in &self.schedule {
      if !names.contains(row.supplement.as_str()) {
        bail!("schedule row references unknown supplement {:?}", row.supplement);
      }
      let key = (row.week, row.day_slot, row.timing.as_str(), row.supplement.as_str());
      if !keys.insert(key) {
        bail!(
          "duplicate schedule row: week {} {} {} {:?}",
          row.week.number(),
          row.day_slot.as_str(),
          row.timing,
          row.supplement
        );
      }
    }
    Ok(())
  }
}

/// Write `seed` into `store` unless the catalog already has supplements.
pub async fn apply<S: DoseStore>(
  store: &S,
  seed: SeedFile,
) -> anyhow::Result<SeedOutcome> {
  let existing = store
    .list_supplements()
    .await
    .context("failed to list supplements")?;
  if !existing.is_empty() {
    info!(count = existing.len(), "catalog already populated; skipping seed");
    return Ok(SeedOutcome::Skipped);
  }

  seed.validate()?;

  let mut ids = HashMap::with_capacity(seed.supplements.len());
  for s in seed.supplements {
    let created = store
      .add_supplement(NewSupplement { name: s.name, default_unit: s.default_unit })
      .await
      .context("failed to add supplement")?;
    ids.insert(created.name, created.supplement_id);
  }

  let schedule = seed.schedule.len();
  for row in seed.schedule {
    let supplement_id = *ids
      .get(&row.supplement)
      .with_context(|| format!("unknown supplement {:?}", row.supplement))?;
    store
      .add_schedule_item(NewScheduleItem {
        week: row.week,
        day_slot: row.day_slot,
        timing: row.timing,
        supplement_id,
        dosage: row.dosage,
        notes: row.notes,
      })
      .await
      .context("failed to add schedule item")?;
  }

  let outcome = SeedOutcome::Applied { supplements: ids.len(), schedule };
  info!(?outcome, "seeded catalog");
  Ok(outcome)
}
