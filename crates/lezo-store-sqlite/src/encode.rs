//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with fixed microsecond precision so that they sort
//! lexically. Dates are `YYYY-MM-DD`. Enumerations are stored under their
//! display names, which are also what `FromStr` accepts back.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use lezo_core::{
  Region,
  citizen::Citizen,
  relationship::{Relationship, RelationshipKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_region(s: &str) -> Result<Region> {
  Region::from_label(s).ok_or_else(|| lezo_core::Error::UnknownRegion(s.to_owned()).into())
}

fn decode_enum<T: FromStr>(field: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| lezo_core::Error::UnknownValue { field, value: s.to_owned() }.into())
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawCitizen`].
pub const CITIZEN_COLUMNS: &str = "citizen_id, created_at, last_name, first_name, middle_name, \
   suffix, address, precinct, legend, sex, birthday, place_of_birth, civil_status, tin, \
   philhealth_no, email, status, region";

/// Raw strings read directly from, or about to be written to, a `citizens`
/// row.
pub struct RawCitizen {
  pub citizen_id:     String,
  pub created_at:     String,
  pub last_name:      String,
  pub first_name:     String,
  pub middle_name:    Option<String>,
  pub suffix:         Option<String>,
  pub address:        Option<String>,
  pub precinct:       String,
  pub legend:         Option<String>,
  pub sex:            Option<String>,
  pub birthday:       Option<String>,
  pub place_of_birth: Option<String>,
  pub civil_status:   Option<String>,
  pub tin:            Option<String>,
  pub philhealth_no:  Option<String>,
  pub email:          Option<String>,
  pub status:         String,
  pub region:         String,
}

impl RawCitizen {
  /// Read a row selected with [`CITIZEN_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      citizen_id:     row.get(0)?,
      created_at:     row.get(1)?,
      last_name:      row.get(2)?,
      first_name:     row.get(3)?,
      middle_name:    row.get(4)?,
      suffix:         row.get(5)?,
      address:        row.get(6)?,
      precinct:       row.get(7)?,
      legend:         row.get(8)?,
      sex:            row.get(9)?,
      birthday:       row.get(10)?,
      place_of_birth: row.get(11)?,
      civil_status:   row.get(12)?,
      tin:            row.get(13)?,
      philhealth_no:  row.get(14)?,
      email:          row.get(15)?,
      status:         row.get(16)?,
      region:         row.get(17)?,
    })
  }

  /// Insert this row with the given prepared `INSERT`.
  pub fn insert(&self, stmt: &mut rusqlite::Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(rusqlite::params![
      self.citizen_id,
      self.created_at,
      self.last_name,
      self.first_name,
      self.middle_name,
      self.suffix,
      self.address,
      self.precinct,
      self.legend,
      self.sex,
      self.birthday,
      self.place_of_birth,
      self.civil_status,
      self.tin,
      self.philhealth_no,
      self.email,
      self.status,
      self.region,
    ])
  }

  pub fn into_citizen(self) -> Result<Citizen> {
    Ok(Citizen {
      citizen_id:     decode_uuid(&self.citizen_id)?,
      created_at:     decode_dt(&self.created_at)?,
      last_name:      self.last_name,
      first_name:     self.first_name,
      middle_name:    self.middle_name,
      suffix:         self.suffix,
      address:        self.address,
      precinct:       self.precinct,
      legend:         self.legend,
      sex:            self.sex.as_deref().map(|s| decode_enum("sex", s)).transpose()?,
      birthday:       self.birthday.as_deref().map(decode_date).transpose()?,
      place_of_birth: self.place_of_birth,
      civil_status:   self
        .civil_status
        .as_deref()
        .map(|s| decode_enum("civil status", s))
        .transpose()?,
      tin:            self.tin,
      philhealth_no:  self.philhealth_no,
      email:          self.email,
      status:         decode_enum("status", &self.status)?,
      region:         decode_region(&self.region)?,
    })
  }
}

impl From<&Citizen> for RawCitizen {
  fn from(c: &Citizen) -> Self {
    Self {
      citizen_id:     encode_uuid(c.citizen_id),
      created_at:     encode_dt(c.created_at),
      last_name:      c.last_name.clone(),
      first_name:     c.first_name.clone(),
      middle_name:    c.middle_name.clone(),
      suffix:         c.suffix.clone(),
      address:        c.address.clone(),
      precinct:       c.precinct.clone(),
      legend:         c.legend.clone(),
      sex:            c.sex.map(|s| s.to_string()),
      birthday:       c.birthday.map(encode_date),
      place_of_birth: c.place_of_birth.clone(),
      civil_status:   c.civil_status.map(|s| s.to_string()),
      tin:            c.tin.clone(),
      philhealth_no:  c.philhealth_no.clone(),
      email:          c.email.clone(),
      status:         c.status.to_string(),
      region:         c.region.to_string(),
    }
  }
}

/// Column list matching the field order of [`RawRelationship`].
pub const RELATIONSHIP_COLUMNS: &str =
  "relationship_id, source_id, target_id, kind, recorded_at";

/// Raw strings read directly from a `relationships` row.
pub struct RawRelationship {
  pub relationship_id: String,
  pub source_id:       String,
  pub target_id:       String,
  pub kind:            String,
  pub recorded_at:     String,
}

impl RawRelationship {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      relationship_id: row.get(0)?,
      source_id:       row.get(1)?,
      target_id:       row.get(2)?,
      kind:            row.get(3)?,
      recorded_at:     row.get(4)?,
    })
  }

  pub fn into_relationship(self) -> Result<Relationship> {
    Ok(Relationship {
      relationship_id: decode_uuid(&self.relationship_id)?,
      source_id:       decode_uuid(&self.source_id)?,
      target_id:       decode_uuid(&self.target_id)?,
      kind:            decode_enum::<RelationshipKind>("relationship kind", &self.kind)?,
      recorded_at:     decode_dt(&self.recorded_at)?,
    })
  }
}
