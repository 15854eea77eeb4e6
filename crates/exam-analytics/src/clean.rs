//! Turning raw dataset rows into [`CleanedRecord`]s.

use exam_core::{
  province::ReferenceTable,
  record::{ACCEPTED_YEARS, CleanedRecord, ExamRow, MISSING_SCORE},
  subject::{SUBJECT_COUNT, Subject},
};
use exam_csv::{Frame, reference_from_frame, rows_from_frame};

use crate::Result;

/// Clean `raw` against `reference`.
///
/// Each row is joined to its province (rows whose code has no reference
/// entry are kept without attributes), missing scores become
/// [`MISSING_SCORE`], rows outside [`ACCEPTED_YEARS`] are dropped, and so are
/// rows lacking a candidate number, year or province code. Input order is
/// preserved.
pub fn clean(raw: &[ExamRow], reference: &ReferenceTable) -> Vec<CleanedRecord> {
  let cleaned: Vec<CleanedRecord> = raw
    .iter()
    .filter_map(|row| {
      let candidate_id = row.candidate_id?;
      let year = row.year.filter(|y| ACCEPTED_YEARS.contains(y))?;
      let province_code = row.province_code?;

      let mut scores = [MISSING_SCORE; SUBJECT_COUNT];
      for subject in Subject::ALL {
        if let Some(v) = row.scores.get(subject) {
          scores[subject.index()] = v;
        }
      }

      Some(CleanedRecord {
        candidate_id,
        year,
        province_code,
        scores,
        province: reference.get(province_code).map(|p| p.attributes.clone()),
      })
    })
    .collect();

  tracing::info!("cleaned {} of {} rows", cleaned.len(), raw.len());
  cleaned
}

/// Decode the reference table and [`clean`] `raw` against it. Returns the
/// decoded table alongside so callers can reuse its columns. A reference that
/// cannot be decoded is [`Error::Cleaning`](crate::Error::Cleaning).
pub fn clean_against(
  raw: &[ExamRow],
  reference: &Frame,
) -> Result<(Vec<CleanedRecord>, ReferenceTable)> {
  let reference = reference_from_frame(reference)?;
  Ok((clean(raw, &reference), reference))
}

/// Decode both tables and [`clean`] them. Any decode failure aborts the
/// whole operation.
pub fn clean_frames(raw: &Frame, reference: &Frame) -> Result<Vec<CleanedRecord>> {
  let rows = rows_from_frame(raw)?;
  Ok(clean_against(&rows, reference)?.0)
}
