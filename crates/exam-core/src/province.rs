//! The province reference table joined onto exam records by `MaTinh`.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Column holding the province code, both in the dataset and the reference
/// table.
pub const PROVINCE_CODE_COLUMN: &str = "MaTinh";

/// One reference row: the code plus every other column as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Province {
  pub code:       u32,
  pub attributes: BTreeMap<String, String>,
}

/// Read-only lookup from province code to province attributes.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
  columns:   Vec<String>,
  provinces: BTreeMap<u32, Province>,
}

impl ReferenceTable {
  /// Build a table; a code occurring twice is rejected since a left join
  /// would otherwise duplicate exam rows.
  pub fn new(
    columns: Vec<String>,
    provinces: impl IntoIterator<Item = Province>,
  ) -> Result<Self> {
    let mut by_code = BTreeMap::new();
    for p in provinces {
      let code = p.code;
      if by_code.insert(code, p).is_some() {
        return Err(Error::DuplicateProvince(code));
      }
    }
    Ok(Self { columns, provinces: by_code })
  }

  /// Attribute column names (the code column excluded).
  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn get(&self, code: u32) -> Option<&Province> { self.provinces.get(&code) }

  pub fn len(&self) -> usize { self.provinces.len() }

  pub fn is_empty(&self) -> bool { self.provinces.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn province(code: u32, name: &str) -> Province {
    Province {
      code,
      attributes: BTreeMap::from([("TenTinh".to_owned(), name.to_owned())]),
    }
  }

  #[test]
  fn lookup_by_code() {
    let t = ReferenceTable::new(
      vec!["TenTinh".into()],
      [province(2, "TP. Hồ Chí Minh"), province(1, "Hà Nội")],
    )
    .unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.get(2).unwrap().attributes["TenTinh"], "TP. Hồ Chí Minh");
    assert!(t.get(64).is_none());
  }

  #[test]
  fn duplicate_code_is_rejected() {
    let err = ReferenceTable::new(vec![], [province(1, "a"), province(1, "b")])
      .unwrap_err();
    assert!(matches!(err, Error::DuplicateProvince(1)));
  }
}
