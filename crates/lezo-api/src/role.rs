//! Caller role extraction.
//!
//! The gateway in front of the API authenticates the user and forwards their
//! role in the `x-lezo-role` header: `admin`, `staff`, `viewer` or
//! `citizen:<uuid>`. A request without the header is treated as a viewer.

use axum::{extract::FromRequestParts, http::request::Parts};
use lezo_core::access::{Action, Role};

use crate::error::ApiError;

pub const ROLE_HEADER: &str = "x-lezo-role";

/// The role of the current caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Role);

impl Caller {
  /// Fail with 403 unless the caller's role permits `action`.
  pub fn require(&self, action: Action) -> Result<(), ApiError> {
    if self.0.permits(&action) {
      Ok(())
    } else {
      tracing::debug!(role = %self.0, ?action, "access denied");
      Err(ApiError::Forbidden(format!("{} may not {action:?}", self.0)))
    }
  }
}

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(ROLE_HEADER) else {
      return Ok(Caller(Role::Viewer));
    };
    let value = value
      .to_str()
      .map_err(|_| ApiError::BadRequest(format!("{ROLE_HEADER} is not valid text")))?;
    let role = value.parse().map_err(|e: lezo_core::Error| ApiError::BadRequest(e.to_string()))?;
    Ok(Caller(role))
  }
}
