//! Chart-ready views over a table snapshot. All read-only.
//!
//! Store records and cleaned records exclude different values: a store
//! record's score is missing only when it is null, a cleaned record's also
//! when it holds the sentinel. [`Scored`] carries that distinction so every
//! view applies the rule belonging to its input.

use exam_core::{
  record::{ACCEPTED_YEARS, CleanedRecord, ExamRecord, Year},
  subject::{SUBJECT_COUNT, Subject},
};
use serde::Serialize;

use crate::{
  group::Group,
  stats::{Bins, has_variance, mean, pearson, round2},
};

/// Scores at or above this pass.
pub const PASS_MARK: f64 = 5.0;

const HISTOGRAM_BINS: Bins = Bins::new(20);
const AREA_BINS: Bins = Bins::new(10);

// ─── Score access ────────────────────────────────────────────────────────────

/// A row with a year and per-subject scores.
pub trait Scored {
  fn year(&self) -> Year;

  /// The usable score, or `None` when it counts as missing.
  fn value(&self, subject: Subject) -> Option<f64>;
}

impl Scored for ExamRecord {
  fn year(&self) -> Year { self.year }

  fn value(&self, subject: Subject) -> Option<f64> {
    self.scores.get(subject).filter(|v| v.is_finite())
  }
}

impl Scored for CleanedRecord {
  fn year(&self) -> Year { self.year }

  fn value(&self, subject: Subject) -> Option<f64> {
    self.valid_score(subject).filter(|v| v.is_finite())
  }
}

fn values<'a, R: Scored>(
  rows: &'a [R],
  year: Option<Year>,
  subject: Subject,
) -> impl Iterator<Item = f64> + 'a {
  rows
    .iter()
    .filter(move |r| year.is_none_or(|y| r.year() == y))
    .filter_map(move |r| r.value(subject))
}

// ─── Mean by year (bar, line) ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectMeans {
  pub subject: Subject,
  pub label:   &'static str,
  /// Aligned with [`MeanChart::years`]; `None` when the year has no scores.
  pub means:   Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanChart {
  pub years:    Vec<Year>,
  pub subjects: Vec<SubjectMeans>,
}

/// Per-subject mean for each accepted year, rounded to two decimals.
pub fn mean_by_year<R: Scored>(rows: &[R]) -> MeanChart {
  let subjects = Subject::ALL
    .into_iter()
    .map(|subject| SubjectMeans {
      subject,
      label: subject.label(),
      means: ACCEPTED_YEARS
        .iter()
        .map(|&y| mean(values(rows, Some(y), subject)).map(round2))
        .collect(),
    })
    .collect();
  MeanChart { years: ACCEPTED_YEARS.to_vec(), subjects }
}

/// Bar chart: year-over-year means from the cleaned table.
pub fn bar(cleaned: &[CleanedRecord]) -> MeanChart { mean_by_year(cleaned) }

/// Line chart: year-over-year means from the live store.
pub fn line(records: &[ExamRecord]) -> MeanChart { mean_by_year(records) }

// ─── Histogram ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
  pub subject: Subject,
  pub year:    Year,
  pub edges:   Vec<f64>,
  pub labels:  Vec<String>,
  pub counts:  Vec<u64>,
}

/// Distribution of one subject's scores in one year over 20 bins.
pub fn histogram(cleaned: &[CleanedRecord], subject: Subject, year: Year) -> Histogram {
  Histogram {
    subject,
    year,
    edges: HISTOGRAM_BINS.edges(),
    labels: HISTOGRAM_BINS.labels(),
    counts: HISTOGRAM_BINS.count(values(cleaned, Some(year), subject)),
  }
}

// ─── Pass / fail (pie) ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearOutcome {
  pub year: Year,
  pub pass: u64,
  pub fail: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassFail {
  pub subject: Subject,
  pub years:   Vec<YearOutcome>,
}

/// Per-year pass and fail counts for `subject`. Missing scores count as
/// neither.
pub fn pass_fail(cleaned: &[CleanedRecord], subject: Subject) -> PassFail {
  let years = ACCEPTED_YEARS
    .iter()
    .map(|&year| {
      let (pass, fail) = values(cleaned, Some(year), subject).fold((0, 0), |(p, f), v| {
        if v >= PASS_MARK { (p + 1, f) } else { (p, f + 1) }
      });
      YearOutcome { year, pass, fail }
    })
    .collect();
  PassFail { subject, years }
}

// ─── Group averages (area) ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDistribution {
  pub group:    Group,
  pub subjects: [Subject; 3],
  pub counts:   Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaChart {
  pub year:   Option<Year>,
  pub labels: Vec<String>,
  pub groups: Vec<GroupDistribution>,
}

/// For each group, the per-row mean of its subjects bucketed into 10 bins.
/// A row's mean is taken over the group subjects it has scores for; rows with
/// none are skipped. `year` of `None` covers both years.
pub fn area(cleaned: &[CleanedRecord], year: Option<Year>) -> AreaChart {
  let rows: Vec<&CleanedRecord> = cleaned
    .iter()
    .filter(|r| year.is_none_or(|y| r.year == y))
    .collect();

  let groups = Group::ALL
    .into_iter()
    .map(|group| {
      let subjects = group.subjects();
      let averages = rows
        .iter()
        .filter_map(|r| mean(subjects.iter().filter_map(|&s| r.value(s))));
      GroupDistribution { group, subjects, counts: AREA_BINS.count(averages) }
    })
    .collect();

  AreaChart { year, labels: AREA_BINS.labels(), groups }
}

// ─── Correlation (heatmap) ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
  pub year:     Year,
  pub subjects: Vec<Subject>,
  /// `(row, column, coefficient)` in row-major order.
  pub cells:    Vec<(usize, usize, f64)>,
  pub matrix:   Vec<Vec<f64>>,
}

/// Pearson correlation between every pair of subjects in `year`.
///
/// Each pair uses the rows where both scores are present. Undefined
/// coefficients are reported as `0.0`. The matrix is symmetric by
/// construction.
pub fn heatmap(cleaned: &[CleanedRecord], year: Year) -> Heatmap {
  let rows: Vec<&CleanedRecord> = cleaned.iter().filter(|r| r.year == year).collect();
  let mut matrix = vec![vec![0.0; SUBJECT_COUNT]; SUBJECT_COUNT];

  for (i, &a) in Subject::ALL.iter().enumerate() {
    let own: Vec<f64> = rows.iter().filter_map(|r| r.value(a)).collect();
    matrix[i][i] = if has_variance(&own) { 1.0 } else { 0.0 };

    for (j, &b) in Subject::ALL.iter().enumerate().skip(i + 1) {
      let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r.value(a)?, r.value(b)?)))
        .collect();
      let r = pearson(&pairs);
      matrix[i][j] = r;
      matrix[j][i] = r;
    }
  }

  let cells = matrix
    .iter()
    .enumerate()
    .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &v)| (i, j, v)))
    .collect();

  Heatmap { year, subjects: Subject::ALL.to_vec(), cells, matrix }
}

// ─── Scatter ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter {
  pub x:      Subject,
  pub y:      Subject,
  pub year:   Option<Year>,
  pub points: Vec<(f64, f64)>,
}

/// `(x, y)` for every row holding both scores, in row order.
pub fn scatter(cleaned: &[CleanedRecord], x: Subject, y: Subject, year: Option<Year>) -> Scatter {
  let points = cleaned
    .iter()
    .filter(|r| year.is_none_or(|yr| r.year == yr))
    .filter_map(|r| Some((r.value(x)?, r.value(y)?)))
    .collect();
  Scatter { x, y, year, points }
}
