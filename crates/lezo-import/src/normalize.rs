//! One normalisation function per field type, applied uniformly to every
//! column of that type.

use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use lezo_core::citizen::{CitizenStatus, Sex};

use crate::{report::RowErrorReason, row::Cell};

/// Day zero of spreadsheet serial dates (the 1900 system, after the
/// leap-year quirk).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// 9999-12-31 as a serial date.
const SERIAL_MAX: f64 = 2_958_465.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];
/// `%.f` also accepts a missing fraction.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

// ─── Text ────────────────────────────────────────────────────────────────────

/// Trimmed text, or `None` when nothing is left. Manual entry goes through
/// the same rule so both paths produce the same dedup keys.
pub fn trimmed(s: &str) -> Option<String> {
  let s = s.trim();
  (!s.is_empty()).then(|| s.to_owned())
}

/// Trimmed text. Whole numbers are rendered without a fractional part so a
/// precinct typed as `1234` does not become `"1234.0"`.
pub fn text(cell: Option<&Cell>) -> Option<String> {
  let s = match cell? {
    Cell::Empty => return None,
    Cell::Text(s) => return trimmed(s),
    Cell::Number(n) => number_text(*n),
    Cell::Bool(b) => b.to_string(),
    Cell::Date(d) => d.to_string(),
    Cell::DateTime(dt) => dt.to_string(),
  };
  (!s.is_empty()).then_some(s)
}

fn number_text(n: f64) -> String {
  if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
    format!("{}", n as i64)
  } else {
    n.to_string()
  }
}

/// Like [`text`] but absence is a row error.
pub fn required_text(cell: Option<&Cell>, field: &'static str) -> Result<String, RowErrorReason> {
  text(cell).ok_or(RowErrorReason::MissingField { field })
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// A calendar date, or `None` when the cell cannot be read as one. Never an
/// error: a bad birthday only weakens deduplication.
pub fn date(cell: Option<&Cell>) -> Option<NaiveDate> {
  match cell? {
    Cell::Date(d) => Some(*d),
    Cell::DateTime(dt) => Some(dt.date()),
    Cell::Number(n) => serial_date(*n),
    Cell::Text(s) => parse_date_text(s.trim()),
    Cell::Empty | Cell::Bool(_) => None,
  }
}

fn serial_date(n: f64) -> Option<NaiveDate> {
  if !(1.0..=SERIAL_MAX).contains(&n) {
    return None;
  }
  let (y, m, d) = SERIAL_EPOCH;
  NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(n.trunc() as u64))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
  // An offset-qualified timestamp keeps the calendar date as written.
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.date_naive());
  }
  DATE_FORMATS
    .iter()
    .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    .or_else(|| {
      DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .map(|dt| dt.date())
    })
}

// ─── Enumerations ────────────────────────────────────────────────────────────

/// `M` or `F`; anything else is treated as unknown.
pub fn sex(cell: Option<&Cell>) -> Option<Sex> { text(cell)?.parse().ok() }

/// Lower-cased enum value; unknown values are treated as absent.
pub fn lowercase_enum<T: FromStr>(cell: Option<&Cell>) -> Option<T> {
  text(cell)?.to_lowercase().parse().ok()
}

/// Lifecycle status, defaulting to active when the column is blank. An
/// unrecognised value is a row error since guessing could mark the living as
/// dead.
pub fn status(cell: Option<&Cell>, field: &'static str) -> Result<CitizenStatus, RowErrorReason> {
  match text(cell) {
    None => Ok(CitizenStatus::default()),
    Some(value) => {
      value.to_lowercase().parse().map_err(|_| RowErrorReason::InvalidField { field, value })
    }
  }
}

/// Optional e-mail address; must at least contain an `@`.
pub fn email(cell: Option<&Cell>, field: &'static str) -> Result<Option<String>, RowErrorReason> {
  match text(cell) {
    Some(value) if !value.contains('@') => Err(RowErrorReason::InvalidField { field, value }),
    other => Ok(other),
  }
}

/// Like [`email`], but a value without an `@` (`n/a`, `none`) is dropped
/// rather than failing the row.
pub fn email_or_none(cell: Option<&Cell>) -> Option<String> {
  text(cell).filter(|value| value.contains('@'))
}
