//! Supplement catalog entries.
//!
//! The catalog is reference data: rows are written once by an admin (or the
//! server's seed file) and never changed by the tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A supplement in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplement {
  pub supplement_id: Uuid,
  pub name:          String,
  /// Unit copied onto history rows when a day is materialized (e.g. "mg").
  pub default_unit:  Option<String>,
  pub created_at:    DateTime<Utc>,
}

/// The projection of a supplement joined onto schedule and history rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementRef {
  pub supplement_id: Uuid,
  pub name:          String,
  pub default_unit:  Option<String>,
}

impl From<&Supplement> for SupplementRef {
  fn from(s: &Supplement) -> Self {
    Self {
      supplement_id: s.supplement_id,
      name:          s.name.clone(),
      default_unit:  s.default_unit.clone(),
    }
  }
}

/// Input to [`crate::store::DoseStore::add_supplement`].
#[derive(Debug, Clone)]
pub struct NewSupplement {
  pub name:         String,
  pub default_unit: Option<String>,
}
