//! Kin edges: directly asserted familial links between two citizens.
//!
//! An edge `(source, target, kind)` reads "source is `kind` of target". Edges
//! are immutable once recorded; there is no update and no delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::citizen::Sex;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RelationshipKind {
  Father,
  Mother,
  Son,
  Daughter,
  Brother,
  Sister,
  Husband,
  Wife,
}

impl RelationshipKind {
  /// `source` is a parent of `target`.
  pub fn is_parent(self) -> bool { matches!(self, Self::Father | Self::Mother) }

  /// `source` is a child of `target`.
  pub fn is_child(self) -> bool { matches!(self, Self::Son | Self::Daughter) }

  /// `source` and `target` are siblings.
  pub fn is_sibling(self) -> bool { matches!(self, Self::Brother | Self::Sister) }

  /// The sex of the source implied by the edge itself.
  pub fn source_sex(self) -> Sex {
    match self {
      Self::Father | Self::Son | Self::Brother | Self::Husband => Sex::Male,
      Self::Mother | Self::Daughter | Self::Sister | Self::Wife => Sex::Female,
    }
  }
}

/// A recorded kin edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
  pub relationship_id: Uuid,
  pub source_id:       Uuid,
  pub target_id:       Uuid,
  pub kind:            RelationshipKind,
  pub recorded_at:     DateTime<Utc>,
}

impl Relationship {
  /// The citizen at the other end of the edge from `citizen_id`.
  pub fn other(&self, citizen_id: Uuid) -> Uuid {
    if self.source_id == citizen_id { self.target_id } else { self.source_id }
  }
}

/// Input to [`crate::store::RelationshipRepository::add_relationship`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelationship {
  pub source_id: Uuid,
  pub target_id: Uuid,
  pub kind:      RelationshipKind,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_parse_case_insensitively() {
    assert_eq!("Brother".parse::<RelationshipKind>().unwrap(), RelationshipKind::Brother);
    assert_eq!(RelationshipKind::Daughter.to_string(), "daughter");
    assert!("cousin".parse::<RelationshipKind>().is_err());
  }

  #[test]
  fn other_end_of_edge() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let edge = Relationship {
      relationship_id: Uuid::new_v4(),
      source_id:       a,
      target_id:       b,
      kind:            RelationshipKind::Father,
      recorded_at:     Utc::now(),
    };
    assert_eq!(edge.other(a), b);
    assert_eq!(edge.other(b), a);
  }
}
