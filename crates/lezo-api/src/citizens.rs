//! Handlers for `/citizens` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/citizens` | Optional `?region=`, `?status=`, `?limit=`, `?offset=` |
//! | `POST` | `/citizens` | Body: [`NewCitizen`]; 409 if the dedup key is taken |
//! | `GET`  | `/citizens/{id}` | Sets `ETag` |
//! | `POST` | `/citizens/{id}/status` | Body: `{"status":"deceased"}`; honours `If-Match` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use lezo_core::{
  Region,
  access::Action,
  citizen::{Citizen, CitizenStatus, NewCitizen},
  store::{CitizenQuery, CitizenRepository},
};
use lezo_import::normalize::trimmed;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  etag::{compute_etag, if_match_accepts},
  role::Caller,
};

/// Fetch a citizen or fail with 404.
pub(crate) async fn require_citizen<S>(store: &S, id: Uuid) -> Result<Citizen, ApiError>
where
  S: CitizenRepository,
{
  store
    .get_citizen(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("citizen {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub region: Option<Region>,
  pub status: Option<CitizenStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /citizens[?region=<region>][&status=<status>][&limit=..][&offset=..]`
pub async fn list<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Citizen>>, ApiError>
where
  S: CitizenRepository,
{
  caller.require(Action::ListCitizens)?;
  let query = CitizenQuery {
    region: params.region,
    status: params.status,
    limit:  params.limit,
    offset: params.offset,
  };
  let citizens = store.list_citizens(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(citizens))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /citizens`: manual entry of a single record.
pub async fn create<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  Json(body): Json<NewCitizen>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CitizenRepository,
{
  caller.require(Action::ManageCitizens)?;
  let citizen = store.add_citizen(normalized(body)?).await.map_err(ApiError::from_store)?;
  let etag = compute_etag(&citizen)?;
  tracing::info!(citizen_id = %citizen.citizen_id, region = %citizen.region, "citizen added");
  Ok((StatusCode::CREATED, [(header::ETAG, etag)], Json(citizen)))
}

/// Clean a hand-entered record with the importer's text rule, so that
/// `" Doe"` typed at the counter collides with an imported `"Doe"`.
fn normalized(mut body: NewCitizen) -> Result<NewCitizen, ApiError> {
  fn required(value: &str, field: &str) -> Result<String, ApiError> {
    trimmed(value).ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
  }

  body.last_name = required(&body.last_name, "last_name")?;
  body.first_name = required(&body.first_name, "first_name")?;
  body.precinct = required(&body.precinct, "precinct")?;
  for optional in [
    &mut body.middle_name,
    &mut body.suffix,
    &mut body.address,
    &mut body.legend,
    &mut body.place_of_birth,
    &mut body.tin,
    &mut body.philhealth_no,
    &mut body.email,
  ] {
    *optional = optional.as_deref().and_then(trimmed);
  }
  Ok(body)
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /citizens/{id}`
pub async fn get_one<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CitizenRepository,
{
  caller.require(Action::ViewCitizen(id))?;
  let citizen = require_citizen(store.as_ref(), id).await?;
  let etag = compute_etag(&citizen)?;
  Ok(([(header::ETAG, etag)], Json(citizen)))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: CitizenStatus,
}

/// `POST /citizens/{id}/status`
///
/// With `If-Match`, the change is refused with 412 unless the tag matches the
/// stored record, so two clerks cannot silently overwrite each other.
pub async fn set_status<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<StatusBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CitizenRepository,
{
  caller.require(Action::ManageCitizens)?;

  let if_match = headers.get(header::IF_MATCH).and_then(|v| v.to_str().ok());
  if let Some(expected) = if_match {
    let current = require_citizen(store.as_ref(), id).await?;
    if !if_match_accepts(expected, &compute_etag(&current)?) {
      return Err(ApiError::PreconditionFailed);
    }
  }

  let citizen = store.set_status(id, body.status).await.map_err(ApiError::from_store)?;
  tracing::info!(citizen_id = %id, status = %citizen.status, "status changed");
  let etag = compute_etag(&citizen)?;
  Ok(([(header::ETAG, etag)], Json(citizen)))
}
