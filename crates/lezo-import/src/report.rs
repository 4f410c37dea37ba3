//! The outcome of an import run.

use std::collections::BTreeMap;

use lezo_core::Region;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Create and update mode are mutually exclusive for one run.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImportMode {
  /// Insert rows that do not match an existing citizen by name and birthday.
  #[default]
  Create,
  /// Patch status, address and email of citizens matched by TIN or
  /// PhilHealth number.
  Update,
}

/// Why a single row was not imported. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowErrorReason {
  #[error("missing required field {field}")]
  MissingField { field: &'static str },

  #[error("invalid {field}: {value:?}")]
  InvalidField { field: &'static str, value: String },

  #[error("row has neither TIN nor PHILHEALTH NO")]
  MissingIdentifier,

  /// The storage layer refused the row, e.g. a concurrent import inserted
  /// the same person after the duplicate check.
  #[error("rejected by storage constraint: {detail}")]
  ConstraintViolation { detail: String },

  #[error("storage error: {detail}")]
  Storage { detail: String },
}

impl RowErrorReason {
  pub(crate) fn storage(err: &impl std::error::Error) -> Self {
    Self::Storage { detail: err.to_string() }
  }
}

/// A row-level failure. `row_index` is the 0-based position of the data row
/// within its region group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
  pub row_index: usize,
  pub region:    Region,
  pub reason:    RowErrorReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
  pub created: usize,
  pub updated: usize,
  /// Duplicates in create mode; unmatched or no-op rows in update mode.
  pub skipped: usize,
}

/// Per-region counts plus a flat list of row errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
  pub mode:    ImportMode,
  pub regions: BTreeMap<Region, RegionSummary>,
  pub errors:  Vec<RowError>,
}

impl ImportReport {
  pub fn new(mode: ImportMode) -> Self {
    Self { mode, regions: BTreeMap::new(), errors: Vec::new() }
  }

  pub fn region(&self, region: Region) -> RegionSummary {
    self.regions.get(&region).copied().unwrap_or_default()
  }

  pub fn created(&self) -> usize { self.regions.values().map(|r| r.created).sum() }

  pub fn updated(&self) -> usize { self.regions.values().map(|r| r.updated).sum() }

  pub fn skipped(&self) -> usize { self.regions.values().map(|r| r.skipped).sum() }

  pub(crate) fn row_error(&mut self, row_index: usize, region: Region, reason: RowErrorReason) {
    tracing::warn!(row_index, %region, %reason, "row not imported");
    self.errors.push(RowError { row_index, region, reason });
  }
}
