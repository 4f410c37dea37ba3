//! Batch-level errors for `lezo-import`.
//!
//! Every variant here is fatal to the whole batch and is raised before any
//! row is looked at or written. Problems with a single row are reported in
//! [`crate::ImportReport::errors`] instead.

use lezo_core::Region;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unreadable batch source: {0}")]
  Unreadable(String),

  #[error("unexpected region sheets: {0:?}")]
  UnknownRegions(Vec<String>),

  #[error("region {0} appears more than once")]
  DuplicateRegion(Region),

  #[error("batch is missing regions: {}", join(.0))]
  MissingRegions(Vec<Region>),
}

fn join(regions: &[Region]) -> String {
  regions.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
