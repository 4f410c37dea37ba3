//! Citizen records, the rows of the civil registry.
//!
//! Citizens are never deleted. A change of circumstances (death, moving away)
//! is expressed through [`CitizenStatus`].

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::region::Region;

// ─── Enumerated attributes ───────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Sex {
  #[strum(to_string = "M")]
  #[serde(rename = "M")]
  Male,
  #[strum(to_string = "F")]
  #[serde(rename = "F")]
  Female,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CivilStatus {
  Single,
  Married,
  Widowed,
  Divorced,
}

/// Lifecycle status. The only way a citizen "leaves" the registry.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CitizenStatus {
  #[default]
  Active,
  Inactive,
  #[serde(alias = "dead")]
  #[strum(to_string = "deceased", serialize = "dead")]
  Deceased,
  Bedridden,
  Moved,
}

// ─── Citizen ─────────────────────────────────────────────────────────────────

/// A persisted citizen record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citizen {
  pub citizen_id:     Uuid,
  pub created_at:     DateTime<Utc>,
  pub last_name:      String,
  pub first_name:     String,
  pub middle_name:    Option<String>,
  pub suffix:         Option<String>,
  pub address:        Option<String>,
  pub precinct:       String,
  pub legend:         Option<String>,
  pub sex:            Option<Sex>,
  pub birthday:       Option<NaiveDate>,
  pub place_of_birth: Option<String>,
  pub civil_status:   Option<CivilStatus>,
  pub tin:            Option<String>,
  pub philhealth_no:  Option<String>,
  pub email:          Option<String>,
  pub status:         CitizenStatus,
  pub region:         Region,
}

impl Citizen {
  pub fn dedup_key(&self) -> DedupKey {
    DedupKey::new(&self.last_name, &self.first_name, self.birthday, self.region)
  }
}

/// Input to [`crate::store::CitizenRepository::add_citizen`] and
/// [`crate::store::CitizenRepository::bulk_insert`]. The id and creation
/// timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCitizen {
  pub last_name:      String,
  pub first_name:     String,
  #[serde(default)]
  pub middle_name:    Option<String>,
  #[serde(default)]
  pub suffix:         Option<String>,
  #[serde(default)]
  pub address:        Option<String>,
  pub precinct:       String,
  #[serde(default)]
  pub legend:         Option<String>,
  #[serde(default)]
  pub sex:            Option<Sex>,
  #[serde(default)]
  pub birthday:       Option<NaiveDate>,
  #[serde(default)]
  pub place_of_birth: Option<String>,
  #[serde(default)]
  pub civil_status:   Option<CivilStatus>,
  #[serde(default)]
  pub tin:            Option<String>,
  #[serde(default)]
  pub philhealth_no:  Option<String>,
  #[serde(default)]
  pub email:          Option<String>,
  #[serde(default)]
  pub status:         CitizenStatus,
  pub region:         Region,
}

impl NewCitizen {
  /// A record with only the required fields set.
  pub fn new(
    last_name: impl Into<String>,
    first_name: impl Into<String>,
    precinct: impl Into<String>,
    region: Region,
  ) -> Self {
    Self {
      last_name: last_name.into(),
      first_name: first_name.into(),
      middle_name: None,
      suffix: None,
      address: None,
      precinct: precinct.into(),
      legend: None,
      sex: None,
      birthday: None,
      place_of_birth: None,
      civil_status: None,
      tin: None,
      philhealth_no: None,
      email: None,
      status: CitizenStatus::default(),
      region,
    }
  }

  pub fn dedup_key(&self) -> DedupKey {
    DedupKey::new(&self.last_name, &self.first_name, self.birthday, self.region)
  }

  /// Materialise the record with a store-assigned id and timestamp.
  pub fn into_citizen(self, citizen_id: Uuid, created_at: DateTime<Utc>) -> Citizen {
    Citizen {
      citizen_id,
      created_at,
      last_name: self.last_name,
      first_name: self.first_name,
      middle_name: self.middle_name,
      suffix: self.suffix,
      address: self.address,
      precinct: self.precinct,
      legend: self.legend,
      sex: self.sex,
      birthday: self.birthday,
      place_of_birth: self.place_of_birth,
      civil_status: self.civil_status,
      tin: self.tin,
      philhealth_no: self.philhealth_no,
      email: self.email,
      status: self.status,
      region: self.region,
    }
  }
}

// ─── Deduplication ───────────────────────────────────────────────────────────

/// The field tuple that decides whether two records describe the same person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DedupKey {
  /// Birthday known: unique across the whole municipality.
  NameBirthday {
    last_name:  String,
    first_name: String,
    birthday:   NaiveDate,
  },
  /// Birthday unknown: unique within the region.
  NameRegion {
    last_name:  String,
    first_name: String,
    region:     Region,
  },
}

impl DedupKey {
  pub fn new(
    last_name: &str,
    first_name: &str,
    birthday: Option<NaiveDate>,
    region: Region,
  ) -> Self {
    let last_name = last_name.to_owned();
    let first_name = first_name.to_owned();
    match birthday {
      Some(birthday) => Self::NameBirthday { last_name, first_name, birthday },
      None => Self::NameRegion { last_name, first_name, region },
    }
  }

  pub fn names(&self) -> (&str, &str) {
    match self {
      Self::NameBirthday { last_name, first_name, .. }
      | Self::NameRegion { last_name, first_name, .. } => (last_name, first_name),
    }
  }
}

impl fmt::Display for DedupKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NameBirthday { last_name, first_name, birthday } => {
        write!(f, "name and birthday ({last_name}, {first_name}, {birthday})")
      }
      Self::NameRegion { last_name, first_name, region } => {
        write!(f, "name in {region} ({last_name}, {first_name})")
      }
    }
  }
}

// ─── Update mode ─────────────────────────────────────────────────────────────

/// Government identifiers used to match existing citizens in update mode.
/// TIN is consulted before the PhilHealth number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifier {
  pub tin:           Option<String>,
  pub philhealth_no: Option<String>,
}

impl Identifier {
  pub fn is_empty(&self) -> bool { self.tin.is_none() && self.philhealth_no.is_none() }
}

/// The restricted set of fields update mode may change. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenPatch {
  pub status:  Option<CitizenStatus>,
  pub address: Option<String>,
  pub email:   Option<String>,
}

impl CitizenPatch {
  pub fn is_empty(&self) -> bool {
    self.status.is_none() && self.address.is_none() && self.email.is_none()
  }

  pub fn apply(&self, citizen: &mut Citizen) {
    if let Some(status) = self.status {
      citizen.status = status;
    }
    if let Some(address) = &self.address {
      citizen.address = Some(address.clone());
    }
    if let Some(email) = &self.email {
      citizen.email = Some(email.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dedup_key_prefers_birthday() {
    let mut c = NewCitizen::new("Doe", "John", "P1", Region::Poblacion);
    assert!(matches!(c.dedup_key(), DedupKey::NameRegion { region: Region::Poblacion, .. }));

    c.birthday = NaiveDate::from_ymd_opt(1980, 5, 17);
    assert!(matches!(c.dedup_key(), DedupKey::NameBirthday { .. }));
  }

  #[test]
  fn status_accepts_dead_alias() {
    assert_eq!("dead".parse::<CitizenStatus>().unwrap(), CitizenStatus::Deceased);
    assert_eq!("DECEASED".parse::<CitizenStatus>().unwrap(), CitizenStatus::Deceased);
    assert_eq!(CitizenStatus::Deceased.to_string(), "deceased");
  }

  #[test]
  fn sex_is_single_letter() {
    assert_eq!("m".parse::<Sex>().unwrap(), Sex::Male);
    assert_eq!(Sex::Female.as_ref(), "F");
    assert!("Male".parse::<Sex>().is_err());
  }

  #[test]
  fn patch_only_touches_present_fields() {
    let mut citizen = NewCitizen::new("Doe", "Jane", "P1", Region::Cogon)
      .into_citizen(Uuid::new_v4(), Utc::now());
    citizen.address = Some("Purok 1".into());

    let patch = CitizenPatch { status: Some(CitizenStatus::Moved), ..Default::default() };
    patch.apply(&mut citizen);

    assert_eq!(citizen.status, CitizenStatus::Moved);
    assert_eq!(citizen.address.as_deref(), Some("Purok 1"));
  }
}
