//! The closed set of barangays served by the registry.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator as _};

/// A barangay, the smallest administrative subdivision of the municipality.
///
/// The display form is the exact sheet name used by the voter-list
/// spreadsheet; parsing is case-insensitive.
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
  EnumIter,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Region {
  Agcawilan,
  Bagto,
  Bugasongan,
  Carugdog,
  Cogon,
  Ibao,
  Mina,
  Poblacion,
  #[serde(rename = "Silakat Nonok")]
  #[strum(to_string = "Silakat Nonok")]
  SilakatNonok,
  #[serde(rename = "Sta. Cruz")]
  #[strum(to_string = "Sta. Cruz")]
  StaCruz,
  #[serde(rename = "Sta. Cruz Biga-a")]
  #[strum(to_string = "Sta. Cruz Biga-a")]
  StaCruzBigaA,
  Tayhawan,
}

impl Region {
  /// Parse a sheet or group label, ignoring surrounding whitespace.
  pub fn from_label(label: &str) -> Option<Self> { label.trim().parse().ok() }

  /// Every region, in declaration order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn twelve_regions() {
    assert_eq!(Region::all().count(), 12);
  }

  #[test]
  fn labels_roundtrip_through_display() {
    for region in Region::all() {
      assert_eq!(Region::from_label(&region.to_string()), Some(region));
    }
  }

  #[test]
  fn label_parsing_is_lenient_about_case_and_padding() {
    assert_eq!(Region::from_label("  sta. cruz "), Some(Region::StaCruz));
    assert_eq!(
      Region::from_label("STA. CRUZ BIGA-A"),
      Some(Region::StaCruzBigaA)
    );
    assert_eq!(Region::from_label("Sta Cruz"), None);
  }

  #[test]
  fn as_ref_is_the_sheet_name() {
    assert_eq!(Region::SilakatNonok.as_ref(), "Silakat Nonok");
    assert_eq!(Region::Ibao.as_ref(), "Ibao");
  }
}
