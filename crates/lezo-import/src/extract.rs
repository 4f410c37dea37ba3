//! Row → domain record extraction for both import modes.

use lezo_core::{
  Region,
  citizen::{CitizenPatch, Identifier, NewCitizen},
};

use crate::{
  normalize,
  report::RowErrorReason,
  row::{SourceRow, field},
};

/// Build a [`NewCitizen`] from a create-mode row.
pub fn new_citizen(row: &SourceRow, region: Region) -> Result<NewCitizen, RowErrorReason> {
  let last_name = normalize::required_text(row.get(field::LAST_NAME), field::LAST_NAME)?;
  let first_name = normalize::required_text(row.get(field::FIRST_NAME), field::FIRST_NAME)?;
  let precinct = normalize::required_text(row.get(field::PRECINCT), field::PRECINCT)?;

  let mut citizen = NewCitizen::new(last_name, first_name, precinct, region);
  citizen.middle_name = normalize::text(row.get(field::MIDDLE_NAME));
  citizen.suffix = normalize::text(row.get(field::SUFFIX));
  citizen.address = normalize::text(row.get(field::ADDRESS));
  citizen.legend = normalize::text(row.get(field::LEGEND));
  citizen.sex = normalize::sex(row.get(field::SEX));
  citizen.birthday = normalize::date(row.get_any(&[field::BIRTHDAY, field::BIRTHDAYS]));
  citizen.place_of_birth = normalize::text(row.get(field::PLACE_OF_BIRTH));
  citizen.civil_status = normalize::lowercase_enum(row.get(field::CIVIL_STATUS));
  citizen.tin = normalize::text(row.get(field::TIN));
  citizen.philhealth_no = normalize::text(row.get(field::PHILHEALTH_NO));
  citizen.email = normalize::email_or_none(row.get(field::EMAIL));
  citizen.status = normalize::status(row.get(field::STATUS), field::STATUS)?;
  Ok(citizen)
}

/// Read the identifier and the restricted patch from an update-mode row.
/// Only columns that are present and non-blank end up in the patch.
pub fn update(row: &SourceRow) -> Result<(Identifier, CitizenPatch), RowErrorReason> {
  let identifier = Identifier {
    tin:           normalize::text(row.get(field::TIN)),
    philhealth_no: normalize::text(row.get(field::PHILHEALTH_NO)),
  };
  if identifier.is_empty() {
    return Err(RowErrorReason::MissingIdentifier);
  }

  let status = match row.get(field::STATUS) {
    Some(cell) => Some(normalize::status(Some(cell), field::STATUS)?),
    None => None,
  };
  let patch = CitizenPatch {
    status,
    address: normalize::text(row.get(field::ADDRESS)),
    email: normalize::email(row.get(field::EMAIL), field::EMAIL)?,
  };
  Ok((identifier, patch))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use lezo_core::citizen::{CitizenStatus, CivilStatus, Sex};

  use super::*;
  use crate::row::Cell;

  fn full_row() -> SourceRow {
    SourceRow::new()
      .with(field::LAST_NAME, " Dela Cruz ")
      .with(field::FIRST_NAME, "Juan")
      .with(field::MIDDLE_NAME, "Santos")
      .with(field::PRECINCT, Cell::Number(101.0))
      .with(field::SEX, "M")
      .with(field::BIRTHDAYS, "1970-07-04")
      .with(field::CIVIL_STATUS, "Widowed")
      .with(field::TIN, "123-456-789")
      .with(field::STATUS, "Moved")
  }

  #[test]
  fn create_row_is_normalised() {
    let c = new_citizen(&full_row(), Region::Tayhawan).unwrap();
    assert_eq!(c.last_name, "Dela Cruz");
    assert_eq!(c.precinct, "101");
    assert_eq!(c.sex, Some(Sex::Male));
    assert_eq!(c.birthday, NaiveDate::from_ymd_opt(1970, 7, 4));
    assert_eq!(c.civil_status, Some(CivilStatus::Widowed));
    assert_eq!(c.status, CitizenStatus::Moved);
    assert_eq!(c.region, Region::Tayhawan);
    assert_eq!(c.suffix, None);
  }

  #[test]
  fn missing_required_field_is_a_row_error() {
    let row = SourceRow::new().with(field::LAST_NAME, "Doe").with(field::FIRST_NAME, "Jo");
    let err = new_citizen(&row, Region::Mina).unwrap_err();
    assert_eq!(err, RowErrorReason::MissingField { field: field::PRECINCT });
  }

  #[test]
  fn bad_birthday_becomes_none() {
    let row = full_row().with(field::BIRTHDAYS, "not a date");
    assert_eq!(new_citizen(&row, Region::Mina).unwrap().birthday, None);
  }

  #[test]
  fn placeholder_email_does_not_reject_a_voter() {
    let row = full_row().with(field::EMAIL, "n/a");
    assert_eq!(new_citizen(&row, Region::Mina).unwrap().email, None);
  }

  #[test]
  fn update_rejects_malformed_email() {
    let row = SourceRow::new().with(field::TIN, "1").with(field::EMAIL, "n/a");
    assert!(matches!(
      update(&row).unwrap_err(),
      RowErrorReason::InvalidField { field: field::EMAIL, .. }
    ));
  }

  #[test]
  fn update_row_needs_an_identifier() {
    let row = SourceRow::new().with(field::STATUS, "dead");
    assert_eq!(update(&row).unwrap_err(), RowErrorReason::MissingIdentifier);
  }

  #[test]
  fn update_patch_only_has_present_columns() {
    let row = SourceRow::new()
      .with(field::PHILHEALTH_NO, "PH-1")
      .with(field::EMAIL, "juan@example.ph");
    let (identifier, patch) = update(&row).unwrap();
    assert_eq!(identifier.tin, None);
    assert_eq!(identifier.philhealth_no.as_deref(), Some("PH-1"));
    assert_eq!(patch.status, None);
    assert_eq!(patch.address, None);
    assert_eq!(patch.email.as_deref(), Some("juan@example.ph"));
  }
}
