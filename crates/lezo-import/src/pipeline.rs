//! The import pipeline: validate the batch, extract rows, deduplicate, and
//! write one bulk operation per region.

use std::collections::HashSet;

use lezo_core::{
  Region,
  citizen::{CitizenPatch, DedupKey, NewCitizen},
  store::CitizenRepository,
};
use uuid::Uuid;

use crate::{
  Result,
  batch::Batch,
  extract,
  report::{ImportMode, ImportReport, RegionSummary, RowErrorReason},
  row::SourceRow,
};

/// Import `batch` into `store`.
///
/// Returns `Err` only for a structurally invalid batch, in which case nothing
/// has been written. Every other problem is recorded in the report and the
/// run carries on. Each region is written by its own bulk call, so a failure
/// in one region leaves regions already written untouched.
pub async fn import_batch<S>(store: &S, batch: Batch, mode: ImportMode) -> Result<ImportReport>
where
  S: CitizenRepository,
{
  let rows = batch.row_count();
  let regions = batch.into_regions()?;
  tracing::info!(%mode, rows, "starting import");

  let mut report = ImportReport::new(mode);
  match mode {
    ImportMode::Create => {
      let mut seen = SeenKeys::default();
      for (region, rows) in regions {
        create_region(store, region, &rows, &mut seen, &mut report).await;
      }
    }
    ImportMode::Update => {
      for (region, rows) in regions {
        update_region(store, region, &rows, &mut report).await;
      }
    }
  }

  tracing::info!(
    %mode,
    created = report.created(),
    updated = report.updated(),
    skipped = report.skipped(),
    errors = report.errors.len(),
    "import finished"
  );
  Ok(report)
}

// ─── Create mode ─────────────────────────────────────────────────────────────

async fn create_region<S>(
  store: &S,
  region: Region,
  rows: &[SourceRow],
  seen: &mut SeenKeys,
  report: &mut ImportReport,
) where
  S: CitizenRepository,
{
  let mut skipped = 0;
  let mut pending: Vec<(usize, NewCitizen)> = Vec::new();
  // Keys queued in this region; they join `seen` only once stored.
  let mut queued = SeenKeys::default();

  for (row_index, row) in rows.iter().enumerate() {
    let citizen = match extract::new_citizen(row, region) {
      Ok(citizen) => citizen,
      Err(reason) => {
        report.row_error(row_index, region, reason);
        continue;
      }
    };

    let key = citizen.dedup_key();
    if seen.contains(&key) || queued.contains(&key) {
      skipped += 1;
      continue;
    }
    match store.find_duplicate(&key).await {
      Ok(Some(_)) => {
        skipped += 1;
        continue;
      }
      Ok(None) => {}
      Err(e) => {
        report.row_error(row_index, region, RowErrorReason::storage(&e));
        continue;
      }
    }

    queued.insert(&key, region);
    pending.push((row_index, citizen));
  }

  let (indexes, citizens): (Vec<usize>, Vec<NewCitizen>) = pending.into_iter().unzip();
  let mut created = 0;
  if !citizens.is_empty() {
    match store.bulk_insert(citizens).await {
      Ok(outcome) => {
        created = outcome.created.len();
        for citizen in &outcome.created {
          seen.insert(&citizen.dedup_key(), citizen.region);
        }
        for (position, detail) in outcome.rejected {
          let row_index = indexes.get(position).copied().unwrap_or(position);
          report.row_error(row_index, region, RowErrorReason::ConstraintViolation { detail });
        }
      }
      Err(e) => {
        tracing::error!(%region, error = %e, "bulk insert failed");
        for row_index in indexes {
          report.row_error(row_index, region, RowErrorReason::storage(&e));
        }
      }
    }
  }

  tracing::info!(%region, created, skipped, "imported region");
  report.regions.insert(region, RegionSummary { created, updated: 0, skipped });
}

/// Dedup keys of rows accepted earlier in the same batch.
///
/// A birthday-less row also collides with any earlier row of the same name
/// in its region, matching what the store-side check would find on a second
/// run.
#[derive(Default)]
struct SeenKeys {
  keys:  HashSet<DedupKey>,
  names: HashSet<(Region, String, String)>,
}

impl SeenKeys {
  fn contains(&self, key: &DedupKey) -> bool {
    match key {
      DedupKey::NameBirthday { .. } => self.keys.contains(key),
      DedupKey::NameRegion { last_name, first_name, region } => {
        self.names.contains(&(*region, last_name.clone(), first_name.clone()))
      }
    }
  }

  fn insert(&mut self, key: &DedupKey, region: Region) {
    let (last_name, first_name) = key.names();
    self.names.insert((region, last_name.to_owned(), first_name.to_owned()));
    self.keys.insert(key.clone());
  }
}

// ─── Update mode ─────────────────────────────────────────────────────────────

async fn update_region<S>(store: &S, region: Region, rows: &[SourceRow], report: &mut ImportReport)
where
  S: CitizenRepository,
{
  let mut skipped = 0;
  let mut pending: Vec<(usize, Uuid, CitizenPatch)> = Vec::new();

  for (row_index, row) in rows.iter().enumerate() {
    let (identifier, patch) = match extract::update(row) {
      Ok(parts) => parts,
      Err(reason) => {
        report.row_error(row_index, region, reason);
        continue;
      }
    };
    if patch.is_empty() {
      skipped += 1;
      continue;
    }

    match store.find_by_identifier(&identifier).await {
      Ok(Some(citizen)) => pending.push((row_index, citizen.citizen_id, patch)),
      Ok(None) => skipped += 1,
      Err(e) => report.row_error(row_index, region, RowErrorReason::storage(&e)),
    }
  }

  let mut updated = 0;
  if !pending.is_empty() {
    let indexes: Vec<usize> = pending.iter().map(|(i, ..)| *i).collect();
    let patches = pending.into_iter().map(|(_, id, patch)| (id, patch)).collect();
    match store.bulk_update(patches).await {
      Ok(count) => updated = count,
      Err(e) => {
        tracing::error!(%region, error = %e, "bulk update failed");
        for row_index in indexes {
          report.row_error(row_index, region, RowErrorReason::storage(&e));
        }
      }
    }
  }

  tracing::info!(%region, updated, skipped, "updated region");
  report.regions.insert(region, RegionSummary { created: 0, updated, skipped });
}
