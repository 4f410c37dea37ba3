//! JSON REST API for the Lezo civil registry.
//!
//! Exposes an axum [`Router`] backed by any
//! [`lezo_core::store::RelationshipRepository`]. Authentication and TLS are
//! the gateway's responsibility; the gateway forwards the caller's role in
//! the `x-lezo-role` header (see [`role`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lezo_api::api_router(store.clone()))
//! ```

pub mod citizens;
pub mod error;
pub mod etag;
pub mod imports;
pub mod kin;
pub mod relationships;
pub mod role;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use lezo_core::store::RelationshipRepository;

pub use error::ApiError;
pub use role::Caller;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RelationshipRepository + 'static,
{
  Router::new()
    // Citizens
    .route("/citizens", get(citizens::list::<S>).post(citizens::create::<S>))
    .route("/citizens/{id}", get(citizens::get_one::<S>))
    .route("/citizens/{id}/status", post(citizens::set_status::<S>))
    .route("/citizens/{id}/relationships", get(relationships::of_citizen::<S>))
    .route("/citizens/{id}/kin", get(kin::handler::<S>))
    // Relationships
    .route("/relationships", post(relationships::create::<S>))
    // Bulk import
    .route("/imports", post(imports::handler::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
