//! The examined subjects and the column names they are stored under.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Number of scored subjects in every record.
pub const SUBJECT_COUNT: usize = 9;

/// A scored exam subject. The serde name is the dataset column name.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Subject {
  #[serde(rename = "Toan")]
  Math,
  #[serde(rename = "Van")]
  Literature,
  #[serde(rename = "Ly")]
  Physics,
  #[serde(rename = "Sinh")]
  Biology,
  #[serde(rename = "Ngoai ngu")]
  ForeignLanguage,
  #[serde(rename = "Hoa")]
  Chemistry,
  #[serde(rename = "Lich su")]
  History,
  #[serde(rename = "Dia ly")]
  Geography,
  #[serde(rename = "GDCD")]
  Civics,
}

impl Subject {
  /// All subjects in canonical column order.
  pub const ALL: [Subject; SUBJECT_COUNT] = [
    Subject::Math,
    Subject::Literature,
    Subject::Physics,
    Subject::Biology,
    Subject::ForeignLanguage,
    Subject::Chemistry,
    Subject::History,
    Subject::Geography,
    Subject::Civics,
  ];

  /// Position of this subject in [`Subject::ALL`].
  pub fn index(self) -> usize { self as usize }

  /// The dataset column name (ASCII, no diacritics).
  pub fn column(self) -> &'static str {
    match self {
      Self::Math => "Toan",
      Self::Literature => "Van",
      Self::Physics => "Ly",
      Self::Biology => "Sinh",
      Self::ForeignLanguage => "Ngoai ngu",
      Self::Chemistry => "Hoa",
      Self::History => "Lich su",
      Self::Geography => "Dia ly",
      Self::Civics => "GDCD",
    }
  }

  /// The human-facing label used by form inputs and chart legends.
  pub fn label(self) -> &'static str {
    match self {
      Self::Math => "Toán",
      Self::Literature => "Văn",
      Self::Physics => "Lý",
      Self::Biology => "Sinh",
      Self::ForeignLanguage => "Ngoại ngữ",
      Self::Chemistry => "Hóa",
      Self::History => "Lịch sử",
      Self::Geography => "Địa lý",
      Self::Civics => "GDCD",
    }
  }

  /// Resolve a column name or a display label.
  pub fn from_name(name: &str) -> Option<Self> {
    let name = name.trim();
    Self::ALL.into_iter().find(|s| {
      s.column().eq_ignore_ascii_case(name) || s.label() == name
    })
  }
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.column())
  }
}

impl FromStr for Subject {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::from_name(s).ok_or_else(|| Error::UnknownSubject(s.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn index_matches_canonical_order() {
    for (i, s) in Subject::ALL.iter().enumerate() {
      assert_eq!(s.index(), i);
    }
  }

  #[test]
  fn resolves_columns_and_labels() {
    assert_eq!("Ngoai ngu".parse::<Subject>().unwrap(), Subject::ForeignLanguage);
    assert_eq!("Ngoại ngữ".parse::<Subject>().unwrap(), Subject::ForeignLanguage);
    assert_eq!("toan".parse::<Subject>().unwrap(), Subject::Math);
    assert!("Tin hoc".parse::<Subject>().is_err());
  }

  #[test]
  fn serde_uses_column_names() {
    let json = serde_json::to_string(&Subject::Geography).unwrap();
    assert_eq!(json, "\"Dia ly\"");
  }
}
