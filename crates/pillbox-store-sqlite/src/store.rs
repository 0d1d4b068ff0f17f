//! [`SqliteStore`] — the SQLite implementation of [`DoseStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use pillbox_core::{
  history::{HistoryRecord, NewHistoryEntry, TakenFlag},
  schedule::{NewScheduleItem, ScheduleItem, ScheduledDose, WeekBucket},
  store::{ConflictPolicy, DoseStore},
  supplement::{NewSupplement, Supplement},
};

use crate::{
  Result,
  encode::{
    RawHistory, RawScheduledDose, RawSupplement, RawSupplementRef, decode_date,
    encode_date, encode_dt, encode_slot, encode_uuid, encode_week,
  },
  schema::SCHEMA,
};

// ─── Queries ─────────────────────────────────────────────────────────────────

const SLOT_ORDER: &str =
  "CASE day_slot WHEN 'morning' THEN 0 WHEN 'midday' THEN 1 ELSE 2 END";

const SCHEDULE_SELECT: &str = "
  SELECT i.item_id, i.week_number, i.day_slot, i.timing, i.supplement_id,
         i.dosage, i.notes, i.created_at,
         s.supplement_id, s.name, s.default_unit
  FROM schedule i
  LEFT JOIN supplements s ON s.supplement_id = i.supplement_id";

const HISTORY_SELECT: &str = "
  SELECT h.entry_id, h.taken_date, h.supplement_id, h.day_slot, h.timing,
         h.dosage_scheduled, h.unit_scheduled, h.taken, h.taken_at, h.created_at,
         s.supplement_id, s.name, s.default_unit
  FROM history h
  LEFT JOIN supplements s ON s.supplement_id = h.supplement_id";

const HISTORY_INSERT: &str = "
  INSERT INTO history (
    entry_id, taken_date, supplement_id, day_slot, timing,
    dosage_scheduled, unit_scheduled, taken, taken_at, created_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, NULL, ?8)";

/// Overwrite policy: a colliding row keeps its id but is reset to the draft.
const HISTORY_UPSERT_TAIL: &str = "
  ON CONFLICT (taken_date, supplement_id, day_slot, timing) DO UPDATE SET
    dosage_scheduled = excluded.dosage_scheduled,
    unit_scheduled   = excluded.unit_scheduled,
    taken            = 0,
    taken_at         = NULL";

fn supplement_ref_at(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<RawSupplementRef> {
  Ok(RawSupplementRef {
    supplement_id: row.get(first)?,
    name:          row.get(first + 1)?,
    default_unit:  row.get(first + 2)?,
  })
}

fn scheduled_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawScheduledDose> {
  Ok(RawScheduledDose {
    item_id:       row.get(0)?,
    week_number:   row.get(1)?,
    day_slot:      row.get(2)?,
    timing:        row.get(3)?,
    supplement_id: row.get(4)?,
    dosage:        row.get(5)?,
    notes:         row.get(6)?,
    created_at:    row.get(7)?,
    supplement:    supplement_ref_at(row, 8)?,
  })
}

fn history_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawHistory> {
  Ok(RawHistory {
    entry_id:         row.get(0)?,
    taken_date:       row.get(1)?,
    supplement_id:    row.get(2)?,
    day_slot:         row.get(3)?,
    timing:           row.get(4)?,
    dosage_scheduled: row.get(5)?,
    unit_scheduled:   row.get(6)?,
    taken:            row.get(7)?,
    taken_at:         row.get(8)?,
    created_at:       row.get(9)?,
    supplement:       supplement_ref_at(row, 10)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Pillbox store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DoseStore impl ──────────────────────────────────────────────────────────

impl DoseStore for SqliteStore {
  type Error = crate::Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_supplements(&self) -> Result<Vec<Supplement>> {
    let raws: Vec<RawSupplement> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT supplement_id, name, default_unit, created_at
           FROM supplements ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSupplement {
              supplement_id: row.get(0)?,
              name:          row.get(1)?,
              default_unit:  row.get(2)?,
              created_at:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSupplement::into_supplement).collect()
  }

  async fn add_supplement(&self, input: NewSupplement) -> Result<Supplement> {
    let supplement = Supplement {
      supplement_id: Uuid::new_v4(),
      name:          input.name,
      default_unit:  input.default_unit,
      created_at:    Utc::now(),
    };

    let id_str = encode_uuid(supplement.supplement_id);
    let name   = supplement.name.clone();
    let unit   = supplement.default_unit.clone();
    let at_str = encode_dt(supplement.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO supplements (supplement_id, name, default_unit, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, unit, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(supplement)
  }

  // ── Template schedule ─────────────────────────────────────────────────────

  async fn add_schedule_item(&self, input: NewScheduleItem) -> Result<ScheduleItem> {
    let item = ScheduleItem {
      item_id:       Uuid::new_v4(),
      week:          input.week,
      day_slot:      input.day_slot,
      timing:        input.timing,
      supplement_id: input.supplement_id,
      dosage:        input.dosage,
      notes:         input.notes,
      created_at:    Utc::now(),
    };

    let id_str   = encode_uuid(item.item_id);
    let week     = encode_week(item.week);
    let slot     = encode_slot(item.day_slot);
    let timing   = item.timing.clone();
    let supp_str = encode_uuid(item.supplement_id);
    let dosage   = item.dosage;
    let notes    = item.notes.clone();
    let at_str   = encode_dt(item.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO schedule (
             item_id, week_number, day_slot, timing, supplement_id,
             dosage, notes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![id_str, week, slot, timing, supp_str, dosage, notes, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn schedule_for_week(&self, week: WeekBucket) -> Result<Vec<ScheduledDose>> {
    let week = encode_week(week);

    let raws: Vec<RawScheduledDose> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{SCHEDULE_SELECT} WHERE i.week_number = ?1 ORDER BY {SLOT_ORDER}, i.timing"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![week], scheduled_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawScheduledDose::into_dose).collect()
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn history_for_date(&self, date: NaiveDate) -> Result<Vec<HistoryRecord>> {
    let date_str = encode_date(date);

    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{HISTORY_SELECT} WHERE h.taken_date = ?1 ORDER BY {SLOT_ORDER}, h.timing"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], history_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_record).collect()
  }

  async fn insert_history(
    &self,
    drafts: Vec<NewHistoryEntry>,
    policy: ConflictPolicy,
  ) -> Result<Vec<HistoryRecord>> {
    let at_str = encode_dt(Utc::now());
    let rows: Vec<_> = drafts
      .into_iter()
      .map(|d| {
        (
          encode_uuid(Uuid::new_v4()),
          encode_date(d.taken_date),
          encode_uuid(d.supplement_id),
          encode_slot(d.day_slot),
          d.timing,
          d.dosage_scheduled,
          d.unit_scheduled,
        )
      })
      .collect();

    let insert_sql = match policy {
      ConflictPolicy::Reject => format!("{HISTORY_INSERT} RETURNING entry_id"),
      ConflictPolicy::Overwrite => {
        format!("{HISTORY_INSERT} {HISTORY_UPSERT_TAIL} RETURNING entry_id")
      }
    };

    // One transaction: a conflict on any row rolls back the whole batch.
    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let mut ids: Vec<String> = Vec::with_capacity(rows.len());
        {
          let mut stmt = tx.prepare(&insert_sql)?;
          for (id, date, supp, slot, timing, dosage, unit) in &rows {
            let written: String = stmt.query_row(
              rusqlite::params![id, date, supp, slot, timing, dosage, unit, at_str],
              |r| r.get(0),
            )?;
            ids.push(written);
          }
        }

        let mut out = Vec::with_capacity(ids.len());
        {
          let mut stmt = tx.prepare(&format!("{HISTORY_SELECT} WHERE h.entry_id = ?1"))?;
          for id in &ids {
            out.push(stmt.query_row(rusqlite::params![id], history_from_row)?);
          }
        }

        tx.commit()?;
        Ok(out)
      })
      .await?;

    let mut records = raws
      .into_iter()
      .map(RawHistory::into_record)
      .collect::<Result<Vec<_>>>()?;
    records.sort_by(|a, b| (a.day_slot, &a.timing).cmp(&(b.day_slot, &b.timing)));
    Ok(records)
  }

  async fn set_taken(
    &self,
    entry_id: Uuid,
    taken: bool,
    taken_at: Option<DateTime<Utc>>,
  ) -> Result<Option<HistoryRecord>> {
    let id_str = encode_uuid(entry_id);
    let at_str = taken_at.map(encode_dt);

    let raw: Option<RawHistory> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE history SET taken = ?2, taken_at = ?3 WHERE entry_id = ?1",
          rusqlite::params![id_str, taken, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            &format!("{HISTORY_SELECT} WHERE h.entry_id = ?1"),
            rusqlite::params![id_str],
            history_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawHistory::into_record).transpose()
  }

  async fn delete_history_for_date(&self, date: NaiveDate) -> Result<u64> {
    let date_str = encode_date(date);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM history WHERE taken_date = ?1",
          rusqlite::params![date_str],
        )?)
      })
      .await?;

    Ok(deleted as u64)
  }

  async fn taken_flags(&self) -> Result<Vec<TakenFlag>> {
    let raws: Vec<(String, bool)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT taken_date, taken FROM history")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(date, taken)| Ok(TakenFlag { taken_date: decode_date(&date)?, taken }))
      .collect()
  }
}
