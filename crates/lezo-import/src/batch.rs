//! A batch of rows grouped by region sheet, and its structural validation.

use std::collections::{BTreeMap, BTreeSet};

use lezo_core::Region;

use crate::{Error, Result, row::SourceRow};

/// Rows under one sheet label, before the label is checked.
#[derive(Debug, Clone, Default)]
pub struct RegionGroup {
  pub label: String,
  pub rows:  Vec<SourceRow>,
}

/// Everything read from one source file.
#[derive(Debug, Clone, Default)]
pub struct Batch {
  groups: Vec<RegionGroup>,
}

impl Batch {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, label: impl Into<String>, rows: Vec<SourceRow>) {
    self.groups.push(RegionGroup { label: label.into(), rows });
  }

  pub fn with(mut self, label: impl Into<String>, rows: Vec<SourceRow>) -> Self {
    self.push(label, rows);
    self
  }

  /// Read the JSON hand-off format: an object mapping each sheet name to an
  /// array of row objects.
  pub fn from_json(input: &str) -> Result<Self> {
    let sheets: BTreeMap<String, Vec<SourceRow>> =
      serde_json::from_str(input).map_err(|e| Error::Unreadable(e.to_string()))?;
    Ok(Self {
      groups: sheets.into_iter().map(|(label, rows)| RegionGroup { label, rows }).collect(),
    })
  }

  pub fn groups(&self) -> &[RegionGroup] { &self.groups }

  pub fn row_count(&self) -> usize { self.groups.iter().map(|g| g.rows.len()).sum() }

  /// Check that the sheet labels are exactly the twelve regions, each once,
  /// and return the rows keyed by region in region order.
  pub fn into_regions(self) -> Result<Vec<(Region, Vec<SourceRow>)>> {
    let mut unknown = Vec::new();
    let mut by_region = BTreeMap::new();
    let mut repeated = None;

    for group in self.groups {
      match Region::from_label(&group.label) {
        None => unknown.push(group.label),
        Some(region) => {
          if by_region.insert(region, group.rows).is_some() {
            repeated.get_or_insert(region);
          }
        }
      }
    }

    if !unknown.is_empty() {
      return Err(Error::UnknownRegions(unknown));
    }
    if let Some(region) = repeated {
      return Err(Error::DuplicateRegion(region));
    }
    let present: BTreeSet<Region> = by_region.keys().copied().collect();
    let missing: Vec<Region> = Region::all().filter(|r| !present.contains(r)).collect();
    if !missing.is_empty() {
      return Err(Error::MissingRegions(missing));
    }

    Ok(by_region.into_iter().collect())
  }
}
