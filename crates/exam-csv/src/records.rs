//! Exam dataset rows: `SBD, Year, <subjects...>, MaTinh`.

use exam_core::{
  province::PROVINCE_CODE_COLUMN,
  record::{CleanedRecord, ExamRecord, ExamRow, Scores},
  subject::Subject,
};

use crate::{Error, Frame, Result, is_missing, write_csv};

const CANDIDATE_COLUMN: &str = "SBD";
const YEAR_COLUMN: &str = "Year";

/// Read exam rows from `frame`. `SBD` and `Year` columns are required; absent
/// subject or province columns read as all-missing.
pub fn rows_from_frame(frame: &Frame) -> Result<Vec<ExamRow>> {
  let id_col = frame.require_column(CANDIDATE_COLUMN)?;
  let year_col = frame.require_column(YEAR_COLUMN)?;
  let province_col = frame.column(PROVINCE_CODE_COLUMN);
  let subject_cols: Vec<(Subject, usize)> = Subject::ALL
    .into_iter()
    .filter_map(|s| frame.column(s.column()).map(|c| (s, c)))
    .collect();

  let mut rows = Vec::with_capacity(frame.len());
  for i in 0..frame.len() {
    let mut scores = Scores::default();
    for &(subject, col) in &subject_cols {
      scores.set(subject, parse_score(frame, i, col, subject.column())?);
    }
    rows.push(ExamRow {
      candidate_id: parse_integer(frame, i, id_col, CANDIDATE_COLUMN)?,
      year: parse_integer(frame, i, year_col, YEAR_COLUMN)?
        .map(|y| i32::try_from(y).map_err(|_| invalid(frame, i, year_col, YEAR_COLUMN)))
        .transpose()?,
      scores,
      province_code: province_col
        .map(|c| {
          parse_integer(frame, i, c, PROVINCE_CODE_COLUMN)?
            .map(|p| u32::try_from(p).map_err(|_| invalid(frame, i, c, PROVINCE_CODE_COLUMN)))
            .transpose()
        })
        .transpose()?
        .flatten(),
    });
  }
  Ok(rows)
}

/// Serialise store records with the fixed dataset header.
pub fn records_to_csv(records: &[ExamRecord]) -> Result<String> {
  write_csv(
    dataset_header(),
    records.iter().map(|r| {
      let mut cells = vec![r.candidate_id.to_string(), r.year.to_string()];
      cells.extend(r.scores.iter().map(|(_, v)| v.map(format_score).unwrap_or_default()));
      cells.push(r.province_code.map(|p| p.to_string()).unwrap_or_default());
      cells
    }),
  )
}

/// Serialise cleaned records; `reference_columns` are appended after the
/// dataset columns in the given order.
pub fn cleaned_to_csv(
  records: &[CleanedRecord],
  reference_columns: &[String],
) -> Result<String> {
  let mut header = dataset_header();
  header.extend(reference_columns.iter().map(String::as_str));
  write_csv(
    header,
    records.iter().map(|r| {
      let mut cells = vec![r.candidate_id.to_string(), r.year.to_string()];
      cells.extend(r.scores.iter().copied().map(format_score));
      cells.push(r.province_code.to_string());
      for col in reference_columns {
        cells.push(
          r.province
            .as_ref()
            .and_then(|attrs| attrs.get(col).cloned())
            .unwrap_or_default(),
        );
      }
      cells
    }),
  )
}

fn dataset_header() -> Vec<&'static str> {
  let mut header = vec![CANDIDATE_COLUMN, YEAR_COLUMN];
  header.extend(Subject::ALL.iter().map(|s| s.column()));
  header.push(PROVINCE_CODE_COLUMN);
  header
}

/// Shortest text that reads back to the same `f64`.
fn format_score(v: f64) -> String { format!("{v}") }

// ─── Cell parsing ────────────────────────────────────────────────────────────

fn parse_score(frame: &Frame, row: usize, col: usize, name: &str) -> Result<Option<f64>> {
  let cell = frame.cell(row, col);
  if is_missing(cell) {
    return Ok(None);
  }
  match cell.trim().parse::<f64>() {
    Ok(v) if v.is_finite() => Ok(Some(v)),
    _ => Err(invalid(frame, row, col, name)),
  }
}

/// Integers, tolerating the `123.0` form dataframe exports produce for integer
/// columns with gaps.
fn parse_integer(frame: &Frame, row: usize, col: usize, name: &str) -> Result<Option<i64>> {
  let cell = frame.cell(row, col);
  if is_missing(cell) {
    return Ok(None);
  }
  exam_core::change::as_integer(&serde_json::Value::String(cell.to_owned()))
    .map(Some)
    .ok_or_else(|| invalid(frame, row, col, name))
}

fn invalid(frame: &Frame, row: usize, col: usize, name: &str) -> Error {
  Error::InvalidCell {
    row:    row + 1,
    column: name.to_owned(),
    value:  frame.cell(row, col).to_owned(),
  }
}

#[cfg(test)]
mod tests {
  use exam_core::record::MISSING_SCORE;

  use super::*;

  #[test]
  fn reads_by_header_name_in_any_order() {
    let input = "Toan,Year,SBD,Extra,MaTinh\n8.5,2018.0,1000001.0,x,2\n,2019,1000002,y,\n";
    let rows = rows_from_frame(&Frame::parse(input.as_bytes()).unwrap()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].candidate_id, Some(1000001));
    assert_eq!(rows[0].year, Some(2018));
    assert_eq!(rows[0].scores.get(Subject::Math), Some(8.5));
    assert_eq!(rows[0].scores.get(Subject::Literature), None);
    assert_eq!(rows[0].province_code, Some(2));
    assert_eq!(rows[1].scores.get(Subject::Math), None);
    assert_eq!(rows[1].province_code, None);
  }

  #[test]
  fn missing_identity_cells_read_as_none() {
    let input = "SBD,Year\n,2018\n5,\n";
    let rows = rows_from_frame(&Frame::parse(input.as_bytes()).unwrap()).unwrap();
    assert_eq!(rows[0].candidate_id, None);
    assert_eq!(rows[1].year, None);
  }

  #[test]
  fn bad_cell_reports_row_and_column() {
    let input = "SBD,Year,Van\n1,2018,seven\n";
    let err = rows_from_frame(&Frame::parse(input.as_bytes()).unwrap()).unwrap_err();
    assert!(
      matches!(err, Error::InvalidCell { row: 1, ref column, .. } if column == "Van"),
      "{err}"
    );
  }

  #[test]
  fn missing_year_column_is_an_error() {
    let err = rows_from_frame(&Frame::parse(b"SBD,Toan\n1,2\n").unwrap()).unwrap_err();
    assert!(matches!(err, Error::MissingColumn(ref c) if c == "Year"));
  }

  #[test]
  fn records_write_fixed_header() {
    let mut r = ExamRecord::new(1000001, 2018);
    r.scores.set(Subject::Math, Some(8.25));
    r.scores.set(Subject::Civics, Some(9.0));
    let text = records_to_csv(&[r.clone()]).unwrap();
    let mut lines = text.lines();
    assert_eq!(
      lines.next().unwrap(),
      "SBD,Year,Toan,Van,Ly,Sinh,Ngoai ngu,Hoa,Lich su,Dia ly,GDCD,MaTinh"
    );
    assert_eq!(lines.next().unwrap(), "1000001,2018,8.25,,,,,,,,9,");

    let back = rows_from_frame(&Frame::parse(text.as_bytes()).unwrap()).unwrap();
    assert_eq!(back[0].clone().into_record(), Some(r));
  }

  #[test]
  fn cleaned_rows_carry_sentinel_and_reference_columns() {
    let mut scores = [MISSING_SCORE; 9];
    scores[0] = 7.0;
    let r = CleanedRecord {
      candidate_id: 1,
      year: 2019,
      province_code: 2,
      scores,
      province: Some([("TenTinh".to_owned(), "Hà Nội".to_owned())].into()),
    };
    let text = cleaned_to_csv(&[r], &["TenTinh".to_owned()]).unwrap();
    assert_eq!(text.lines().nth(1).unwrap(), "1,2019,7,-1,-1,-1,-1,-1,-1,-1,-1,2,Hà Nội");
  }
}
