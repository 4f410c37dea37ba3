//! Typed cells and rows as handed over by the spreadsheet reader.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column headers understood by the pipeline. Matching is done on the
/// trimmed, upper-cased header text.
pub mod field {
  pub const LAST_NAME: &str = "LAST NAME";
  pub const FIRST_NAME: &str = "FIRST NAME";
  pub const MIDDLE_NAME: &str = "MIDDLE NAME";
  pub const SUFFIX: &str = "SUFFIX";
  pub const ADDRESS: &str = "ADDRESS";
  pub const PRECINCT: &str = "PRECINCT";
  pub const LEGEND: &str = "LEGEND";
  pub const SEX: &str = "SEX";
  pub const BIRTHDAY: &str = "BIRTHDAY";
  /// Older voter lists label the birthday column in the plural.
  pub const BIRTHDAYS: &str = "BIRTHDAYS";
  pub const PLACE_OF_BIRTH: &str = "PLACE OF BIRTH";
  pub const CIVIL_STATUS: &str = "CIVIL STATUS";
  pub const TIN: &str = "TIN";
  pub const PHILHEALTH_NO: &str = "PHILHEALTH NO";
  pub const STATUS: &str = "STATUS";
  pub const EMAIL: &str = "EMAIL";
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// One spreadsheet cell.
///
/// From JSON, `null` is [`Cell::Empty`] and dates arrive as [`Cell::Text`];
/// the date variants exist for readers that already know the cell type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
  Empty,
  Bool(bool),
  Number(f64),
  Text(String),
  Date(NaiveDate),
  DateTime(NaiveDateTime),
}

impl Cell {
  /// Blank text counts as empty.
  pub fn is_empty(&self) -> bool {
    match self {
      Cell::Empty => true,
      Cell::Text(s) => s.trim().is_empty(),
      Cell::Bool(_) | Cell::Number(_) | Cell::Date(_) | Cell::DateTime(_) => false,
    }
  }
}

impl From<&str> for Cell {
  fn from(s: &str) -> Self { Cell::Text(s.to_owned()) }
}

impl From<String> for Cell {
  fn from(s: String) -> Self { Cell::Text(s) }
}

impl From<f64> for Cell {
  fn from(n: f64) -> Self { Cell::Number(n) }
}

impl From<NaiveDate> for Cell {
  fn from(d: NaiveDate) -> Self { Cell::Date(d) }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

/// A data row keyed by column header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Cell>", into = "BTreeMap<String, Cell>")]
pub struct SourceRow {
  cells: BTreeMap<String, Cell>,
}

fn header_key(header: &str) -> String { header.trim().to_uppercase() }

impl SourceRow {
  pub fn new() -> Self { Self::default() }

  /// Builder-style insert, mostly for tests and in-process readers.
  pub fn with(mut self, header: &str, cell: impl Into<Cell>) -> Self {
    self.insert(header, cell);
    self
  }

  pub fn insert(&mut self, header: &str, cell: impl Into<Cell>) {
    self.cells.insert(header_key(header), cell.into());
  }

  /// The non-empty cell under `header`, if any.
  pub fn get(&self, header: &str) -> Option<&Cell> {
    self.cells.get(&header_key(header)).filter(|c| !c.is_empty())
  }

  /// The first non-empty cell under any of `headers`.
  pub fn get_any(&self, headers: &[&str]) -> Option<&Cell> {
    headers.iter().find_map(|h| self.get(h))
  }
}

impl From<BTreeMap<String, Cell>> for SourceRow {
  fn from(raw: BTreeMap<String, Cell>) -> Self {
    let cells = raw.into_iter().map(|(k, v)| (header_key(&k), v)).collect();
    Self { cells }
  }
}

impl From<SourceRow> for BTreeMap<String, Cell> {
  fn from(row: SourceRow) -> Self { row.cells }
}
