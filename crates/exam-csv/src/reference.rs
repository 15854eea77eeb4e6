//! Province reference table: a `MaTinh` column plus arbitrary attributes.

use std::collections::BTreeMap;

use exam_core::province::{PROVINCE_CODE_COLUMN, Province, ReferenceTable};

use crate::{Error, Frame, Result, is_missing};

/// Build a [`ReferenceTable`] from `frame`. Rows without a code are skipped;
/// every other column becomes a text attribute.
pub fn reference_from_frame(frame: &Frame) -> Result<ReferenceTable> {
  let code_col = frame.require_column(PROVINCE_CODE_COLUMN)?;
  let attr_cols: Vec<(usize, &String)> = frame
    .headers()
    .iter()
    .enumerate()
    .filter(|&(i, _)| i != code_col)
    .collect();

  let mut provinces = Vec::with_capacity(frame.len());
  for row in 0..frame.len() {
    let cell = frame.cell(row, code_col);
    if is_missing(cell) {
      continue;
    }
    let code = exam_core::change::as_integer(&serde_json::Value::String(cell.to_owned()))
      .and_then(|c| u32::try_from(c).ok())
      .ok_or_else(|| Error::InvalidCell {
        row:    row + 1,
        column: PROVINCE_CODE_COLUMN.to_owned(),
        value:  cell.to_owned(),
      })?;
    let attributes: BTreeMap<String, String> = attr_cols
      .iter()
      .map(|&(i, name)| (name.clone(), frame.cell(row, i).to_owned()))
      .collect();
    provinces.push(Province { code, attributes });
  }

  let columns = attr_cols.into_iter().map(|(_, n)| n.clone()).collect();
  Ok(ReferenceTable::new(columns, provinces)?)
}
