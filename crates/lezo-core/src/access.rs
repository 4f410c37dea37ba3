//! Roles and the actions they permit.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// The role attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "citizen_id", rename_all = "lowercase")]
pub enum Role {
  Admin,
  Staff,
  Viewer,
  /// A citizen signed in to see their own record.
  Citizen(Uuid),
}

/// Something a caller wants to do with the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  ListCitizens,
  /// Read one citizen's record, relationships or inferred kin.
  ViewCitizen(Uuid),
  /// Manual entry and status changes.
  ManageCitizens,
  AssertRelationships,
  ImportBatch,
}

impl Role {
  pub fn permits(&self, action: &Action) -> bool {
    match (self, action) {
      (Role::Admin, _) => true,
      (Role::Staff, Action::ImportBatch) => false,
      (
        Role::Staff,
        Action::ListCitizens
        | Action::ViewCitizen(_)
        | Action::ManageCitizens
        | Action::AssertRelationships,
      ) => true,
      (Role::Viewer, Action::ListCitizens | Action::ViewCitizen(_)) => true,
      (
        Role::Viewer,
        Action::ManageCitizens | Action::AssertRelationships | Action::ImportBatch,
      ) => false,
      (Role::Citizen(own), Action::ViewCitizen(id)) => own == id,
      (
        Role::Citizen(_),
        Action::ListCitizens
        | Action::ManageCitizens
        | Action::AssertRelationships
        | Action::ImportBatch,
      ) => false,
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Role::Admin => f.write_str("admin"),
      Role::Staff => f.write_str("staff"),
      Role::Viewer => f.write_str("viewer"),
      Role::Citizen(id) => write!(f, "citizen:{id}"),
    }
  }
}

/// Parses `admin`, `staff`, `viewer` or `citizen:<uuid>`.
impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    let unknown = || Error::UnknownValue { field: "role", value: s.to_owned() };
    match s.to_ascii_lowercase().as_str() {
      "admin" => Ok(Role::Admin),
      "staff" => Ok(Role::Staff),
      "viewer" => Ok(Role::Viewer),
      other => {
        let id = other.strip_prefix("citizen:").ok_or_else(unknown)?;
        Uuid::parse_str(id).map(Role::Citizen).map_err(|_| unknown())
      }
    }
  }
}
