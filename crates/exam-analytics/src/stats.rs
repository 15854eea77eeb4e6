//! Numeric helpers shared by the chart views.

/// Lower and upper bound of every score scale.
pub const SCORE_RANGE: (f64, f64) = (0.0, 10.0);

/// Arithmetic mean, `None` for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
  let (sum, n) = values
    .into_iter()
    .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
  (n > 0).then(|| sum / n as f64)
}

/// Round half away from zero to two decimal places.
pub fn round2(v: f64) -> f64 { (v * 100.0).round() / 100.0 }

/// Pearson correlation of paired samples.
///
/// Fewer than two pairs, or a constant side, has no defined coefficient and
/// yields `0.0`.
pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
  if pairs.len() < 2 {
    return 0.0;
  }
  let n = pairs.len() as f64;
  let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
  let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

  let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
  for &(x, y) in pairs {
    let (dx, dy) = (x - mx, y - my);
    sxx += dx * dx;
    syy += dy * dy;
    sxy += dx * dy;
  }
  if sxx == 0.0 || syy == 0.0 {
    return 0.0;
  }
  let r = sxy / (sxx * syy).sqrt();
  if r.is_finite() { r.clamp(-1.0, 1.0) } else { 0.0 }
}

/// Whether `values` has at least two distinct entries.
pub fn has_variance(values: &[f64]) -> bool {
  values.windows(2).any(|w| w[0] != w[1])
}

/// `count` equal-width bins over [`SCORE_RANGE`]. Bins are half-open except
/// the last, which also takes the upper bound.
#[derive(Debug, Clone, Copy)]
pub struct Bins {
  count: usize,
}

impl Bins {
  pub const fn new(count: usize) -> Self { Self { count } }

  pub fn width(&self) -> f64 { (SCORE_RANGE.1 - SCORE_RANGE.0) / self.count as f64 }

  /// The `count + 1` bin boundaries.
  pub fn edges(&self) -> Vec<f64> {
    (0..=self.count)
      .map(|i| SCORE_RANGE.0 + i as f64 * self.width())
      .collect()
  }

  /// `"lo-hi"` per bin, with trailing zeros trimmed (`"0-0.5"`, `"9-10"`).
  pub fn labels(&self) -> Vec<String> {
    self
      .edges()
      .windows(2)
      .map(|w| format!("{}-{}", w[0], w[1]))
      .collect()
  }

  /// Bin index of `v`; `None` outside the range or for NaN.
  pub fn index(&self, v: f64) -> Option<usize> {
    let (lo, hi) = SCORE_RANGE;
    if !(lo..=hi).contains(&v) {
      return None;
    }
    let i = ((v - lo) / (hi - lo) * self.count as f64).floor() as usize;
    Some(i.min(self.count - 1))
  }

  /// Per-bin counts of `values`; out-of-range values are dropped.
  pub fn count(&self, values: impl IntoIterator<Item = f64>) -> Vec<u64> {
    let mut counts = vec![0; self.count];
    for v in values {
      if let Some(i) = self.index(v) {
        counts[i] += 1;
      }
    }
    counts
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mean_and_rounding() {
    assert_eq!(mean([8.0, 6.0]), Some(7.0));
    assert_eq!(mean(std::iter::empty()), None);
    assert_eq!(round2(20.0 / 3.0), 6.67);
  }

  #[test]
  fn pearson_edges() {
    assert_eq!(pearson(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]), 1.0);
    assert_eq!(pearson(&[(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]), -1.0);
    assert_eq!(pearson(&[(1.0, 5.0), (2.0, 5.0)]), 0.0);
    assert_eq!(pearson(&[(1.0, 5.0)]), 0.0);
  }

  #[test]
  fn last_bin_is_closed() {
    let bins = Bins::new(20);
    assert_eq!(bins.edges().len(), 21);
    assert_eq!(bins.index(0.0), Some(0));
    assert_eq!(bins.index(0.5), Some(1));
    assert_eq!(bins.index(9.75), Some(19));
    assert_eq!(bins.index(10.0), Some(19));
    assert_eq!(bins.index(10.5), None);
    assert_eq!(bins.index(-1.0), None);
    assert_eq!(bins.index(f64::NAN), None);
  }

  #[test]
  fn labels_match_bin_edges() {
    let bins = Bins::new(10);
    let labels = bins.labels();
    assert_eq!(labels[0], "0-1");
    assert_eq!(labels[9], "9-10");
    assert_eq!(Bins::new(20).labels()[1], "0.5-1");
    assert_eq!(bins.count([0.0, 0.99, 4.5, 10.0, 11.0]), [2, 0, 0, 0, 1, 0, 0, 0, 0, 1]);
  }
}
