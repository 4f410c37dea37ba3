//! Error types for `lezo-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{citizen::DedupKey, relationship::RelationshipKind};

#[derive(Debug, Error)]
pub enum Error {
  #[error("citizen not found: {0}")]
  CitizenNotFound(Uuid),

  #[error("a citizen with the same {0} already exists")]
  DuplicateCitizen(DedupKey),

  #[error("a citizen cannot be related to themselves: {0}")]
  SelfRelationship(Uuid),

  #[error("relationship already recorded: {source_id} is {kind} of {target_id}")]
  DuplicateRelationship {
    source_id: Uuid,
    target_id: Uuid,
    kind:      RelationshipKind,
  },

  #[error("unknown region: {0:?}")]
  UnknownRegion(String),

  #[error("unknown {field}: {value:?}")]
  UnknownValue { field: &'static str, value: String },

  #[error("storage unavailable: {0}")]
  Unavailable(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
