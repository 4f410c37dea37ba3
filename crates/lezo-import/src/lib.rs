//! Bulk import of the municipal voter list into the citizen registry.
//!
//! The spreadsheet reader is an outside collaborator: it hands over a
//! [`Batch`] of typed [`Cell`]s grouped by region sheet. This crate checks
//! the batch structure, normalises every row, drops duplicates, and writes
//! the survivors with one bulk call per region.
//!
//! ```no_run
//! # async fn run(store: &lezo_core::memory::InMemoryRegistry, json: &str) -> lezo_import::Result<()> {
//! use lezo_import::{Batch, ImportMode, import_batch};
//!
//! let batch = Batch::from_json(json)?;
//! let report = import_batch(store, batch, ImportMode::Create).await?;
//! println!("{} created, {} skipped", report.created(), report.skipped());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod extract;
pub mod normalize;
mod pipeline;
pub mod report;
pub mod row;

pub use batch::Batch;
pub use error::{Error, Result};
pub use pipeline::import_batch;
pub use report::{ImportMode, ImportReport, RegionSummary, RowError, RowErrorReason};
pub use row::{Cell, SourceRow};
