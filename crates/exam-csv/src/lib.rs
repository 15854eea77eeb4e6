//! Delimited-text codec for the exam store.
//!
//! Converts between comma-separated files and [`exam_core`] types: the exam
//! dataset, the province reference table and the audit log snapshot. Pure
//! synchronous; no network or filesystem access.
//!
//! Everything goes through [`Frame`], an untyped header-plus-rows table. Typed
//! readers look columns up by header name, so column order and extra columns
//! in upstream files do not matter.

pub mod error;
mod history;
mod records;
mod reference;

pub use error::{Error, Result};
pub use history::{decode_payload, history_from_csv, history_to_csv};
pub use records::{cleaned_to_csv, records_to_csv, rows_from_frame};
pub use reference::reference_from_frame;

// ─── Frame ───────────────────────────────────────────────────────────────────

/// An untyped table: one header row, then rows of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
  headers: Vec<String>,
  rows:    Vec<Vec<String>>,
}

impl Frame {
  pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
    Self { headers, rows }
  }

  /// Parse comma-separated text with a header row. Short rows are allowed;
  /// their missing cells read as empty.
  pub fn parse(input: &[u8]) -> Result<Self> {
    let mut reader = csv::ReaderBuilder::new()
      .has_headers(true)
      .flexible(true)
      .from_reader(input);

    let headers = reader
      .headers()?
      .iter()
      .map(|h| h.trim().trim_start_matches('\u{feff}').to_owned())
      .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
      rows.push(record?.iter().map(str::to_owned).collect());
    }
    Ok(Self { headers, rows })
  }

  /// Serialise back to comma-separated text, header first.
  pub fn to_csv(&self) -> Result<String> {
    write_csv(&self.headers, self.rows.iter())
  }

  pub fn headers(&self) -> &[String] { &self.headers }

  pub fn rows(&self) -> &[Vec<String>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Index of the column named `name`.
  pub fn column(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == name)
  }

  pub fn require_column(&self, name: &str) -> Result<usize> {
    self
      .column(name)
      .ok_or_else(|| Error::MissingColumn(name.to_owned()))
  }

  /// Cell text, or `""` when the row is shorter than the header or does not
  /// exist.
  pub fn cell(&self, row: usize, col: usize) -> &str {
    self
      .rows
      .get(row)
      .and_then(|r| r.get(col))
      .map_or("", String::as_str)
  }
}

/// Write a header and rows into an in-memory CSV string.
pub(crate) fn write_csv<H, R, C>(
  headers: impl IntoIterator<Item = H>,
  rows: impl Iterator<Item = R>,
) -> Result<String>
where
  H: AsRef<[u8]>,
  R: IntoIterator<Item = C>,
  C: AsRef<[u8]>,
{
  let mut writer = csv::Writer::from_writer(Vec::new());
  writer.write_record(headers)?;
  for row in rows {
    writer.write_record(row)?;
  }
  let bytes = writer
    .into_inner()
    .map_err(|e| csv::Error::from(e.into_error()))?;
  Ok(String::from_utf8(bytes)?)
}

/// True for the blank and not-a-number spellings dataframe exports use for
/// missing cells.
pub(crate) fn is_missing(cell: &str) -> bool {
  matches!(cell.trim(), "" | "NaN" | "nan" | "NA" | "<NA>" | "None" | "null")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_tolerates_short_rows_and_bom() {
    let f = Frame::parse("\u{feff}SBD,Year,Toan\n1,2018,8\n2,2019\n".as_bytes()).unwrap();
    assert_eq!(f.headers(), ["SBD", "Year", "Toan"]);
    assert_eq!(f.len(), 2);
    assert_eq!(f.cell(1, 2), "");
    assert_eq!(f.column("Year"), Some(1));
    assert!(matches!(f.require_column("MaTinh"), Err(Error::MissingColumn(_))));
  }

  #[test]
  fn to_csv_quotes_where_needed() {
    let f = Frame::new(
      vec!["a".into(), "b".into()],
      vec![vec!["x,y".into(), "z".into()]],
    );
    assert_eq!(f.to_csv().unwrap(), "a,b\n\"x,y\",z\n");
    assert_eq!(Frame::parse(f.to_csv().unwrap().as_bytes()).unwrap(), f);
  }

  #[test]
  fn missing_spellings() {
    for s in ["", "  ", "NaN", "nan", "<NA>"] {
      assert!(is_missing(s), "{s:?}");
    }
    assert!(!is_missing("0"));
    assert!(!is_missing("-1"));
  }

  #[test]
  fn cell_outside_the_table_reads_empty() {
    let f = Frame::parse(b"SBD,Year\n1,2018\n").unwrap();
    assert_eq!(f.cell(0, 1), "2018");
    assert_eq!(f.cell(0, 5), "");
    assert_eq!(f.cell(3, 0), "");
  }
}
