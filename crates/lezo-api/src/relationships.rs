//! Handlers for kin edges.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/relationships` | Body: `{"source_id","target_id","kind"}`; 400 self, 404 unknown, 409 duplicate |
//! | `GET`  | `/citizens/{id}/relationships` | Edges at either end, in recording order |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lezo_core::{
  access::Action,
  relationship::{NewRelationship, Relationship},
  store::RelationshipRepository,
};
use uuid::Uuid;

use crate::{citizens::require_citizen, error::ApiError, role::Caller};

/// `POST /relationships`
pub async fn create<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  Json(body): Json<NewRelationship>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RelationshipRepository,
{
  caller.require(Action::AssertRelationships)?;
  let relationship = store.add_relationship(body).await.map_err(ApiError::from_store)?;
  tracing::info!(
    source_id = %relationship.source_id,
    target_id = %relationship.target_id,
    kind = %relationship.kind,
    "relationship asserted"
  );
  Ok((StatusCode::CREATED, Json(relationship)))
}

/// `GET /citizens/{id}/relationships`
pub async fn of_citizen<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Relationship>>, ApiError>
where
  S: RelationshipRepository,
{
  caller.require(Action::ViewCitizen(id))?;
  require_citizen(store.as_ref(), id).await?;
  let edges = store.edges_of(id).await.map_err(ApiError::from_store)?;
  Ok(Json(edges))
}
