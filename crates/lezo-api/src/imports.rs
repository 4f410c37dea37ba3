//! Handler for `POST /imports`.
//!
//! The body is the JSON hand-off produced by the spreadsheet reader: an
//! object mapping each region sheet name to its rows. A structurally invalid
//! batch is refused with 422 and nothing is written; row-level problems are
//! listed in the returned [`ImportReport`].

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use lezo_core::{access::Action, store::CitizenRepository};
use lezo_import::{Batch, ImportMode, ImportReport, import_batch};
use serde::Deserialize;

use crate::{error::ApiError, role::Caller};

#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
  #[serde(default)]
  pub mode: ImportMode,
}

/// `POST /imports[?mode=create|update]`
pub async fn handler<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  Query(params): Query<ImportParams>,
  body: String,
) -> Result<Json<ImportReport>, ApiError>
where
  S: CitizenRepository,
{
  caller.require(Action::ImportBatch)?;
  let batch = Batch::from_json(&body)?;
  let report = import_batch(store.as_ref(), batch, params.mode).await?;
  Ok(Json(report))
}
