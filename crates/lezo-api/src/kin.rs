//! Handler for `GET /citizens/{id}/kin`: inferred uncles, aunts, nephews
//! and nieces, recomputed on every request.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use lezo_core::{
  access::Action,
  kinship::{self, Kin, SiblingPolicy},
  store::RelationshipRepository,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{citizens::require_citizen, error::ApiError, role::Caller};

#[derive(Debug, Default, Deserialize)]
pub struct KinParams {
  /// Follow only `brother` edges when looking for siblings.
  #[serde(default)]
  pub brothers_only: bool,
}

/// `GET /citizens/{id}/kin[?brothers_only=true]`
pub async fn handler<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<KinParams>,
) -> Result<Json<Vec<Kin>>, ApiError>
where
  S: RelationshipRepository,
{
  caller.require(Action::ViewCitizen(id))?;
  require_citizen(store.as_ref(), id).await?;

  let policy = if params.brothers_only {
    SiblingPolicy::BrotherOnly
  } else {
    SiblingPolicy::AnySibling
  };
  let kin = kinship::infer_with(store.as_ref(), id, policy)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(kin))
}
