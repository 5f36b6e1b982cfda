//! Song profiles
//!
//! Corpus-relative views of single fingerprints: complexity tiers, per-metric
//! deviation from the corpus, and how the metrics correlate.

use serde::{Deserialize, Serialize};

use crate::fingerprint::{FingerprintColumn, SongFingerprint, NUM_COLUMNS};

/// Complexity band of a song relative to the corpus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComplexityTier {
    /// Bottom third of the corpus
    Low,
    /// Middle third
    Medium,
    /// Top third
    High,
}

/// Tercile boundaries of `mean_complexity`, as `(lower, upper)`.
pub fn complexity_terciles(fingerprints: &[SongFingerprint]) -> Option<(f64, f64)> {
    let mut values: Vec<f64> = fingerprints.iter().map(|f| f.mean_complexity).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some((quantile(&values, 1.0 / 3.0), quantile(&values, 2.0 / 3.0)))
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Label every fingerprint `Low`, `Medium` or `High` by the corpus terciles of
/// `mean_complexity`. Values on a boundary fall in the lower tier.
pub fn complexity_tiers(fingerprints: &[SongFingerprint]) -> Vec<(String, ComplexityTier)> {
    let Some((lower, upper)) = complexity_terciles(fingerprints) else {
        return Vec::new();
    };
    fingerprints
        .iter()
        .map(|f| {
            let tier = if f.mean_complexity <= lower {
                ComplexityTier::Low
            } else if f.mean_complexity <= upper {
                ComplexityTier::Medium
            } else {
                ComplexityTier::High
            };
            (f.song_id.clone(), tier)
        })
        .collect()
}

/// Whether a column varies beyond rounding noise.
fn has_spread(std: f64, mean: f64) -> bool {
    std > 1e-9 * (1.0 + mean.abs())
}

/// Column means and sample standard deviations.
fn column_moments(fingerprints: &[SongFingerprint]) -> ([f64; NUM_COLUMNS], [f64; NUM_COLUMNS]) {
    let n = fingerprints.len() as f64;
    let mut means = [0.0; NUM_COLUMNS];
    let mut stds = [0.0; NUM_COLUMNS];
    if fingerprints.is_empty() {
        return (means, stds);
    }
    for f in fingerprints {
        for (m, v) in means.iter_mut().zip(f.to_vector()) {
            *m += v / n;
        }
    }
    if fingerprints.len() > 1 {
        for f in fingerprints {
            for ((s, v), m) in stds.iter_mut().zip(f.to_vector()).zip(means) {
                *s += (v - m).powi(2) / (n - 1.0);
            }
        }
        stds.iter_mut().for_each(|s| *s = s.sqrt());
    }
    (means, stds)
}

/// Z-score of every column of `song_id` against the corpus, using the sample
/// standard deviation. Columns without spread report 0. `None` if the song is not in
/// the table.
pub fn metric_deviation(
    fingerprints: &[SongFingerprint],
    song_id: &str,
) -> Option<[(FingerprintColumn, f64); NUM_COLUMNS]> {
    let song = fingerprints.iter().find(|f| f.song_id == song_id)?;
    let (means, stds) = column_moments(fingerprints);
    let values = song.to_vector();
    Some(std::array::from_fn(|j| {
        let z = if has_spread(stds[j], means[j]) {
            (values[j] - means[j]) / stds[j]
        } else {
            0.0
        };
        (FingerprintColumn::ALL[j], z)
    }))
}

/// Pearson correlation between every pair of fingerprint columns, indexed by
/// `FingerprintColumn::index`. The diagonal is 1; pairs involving a constant column
/// are 0.
pub fn correlation_matrix(fingerprints: &[SongFingerprint]) -> [[f64; NUM_COLUMNS]; NUM_COLUMNS] {
    let (means, stds) = column_moments(fingerprints);
    let n = fingerprints.len() as f64;
    let mut out = [[0.0; NUM_COLUMNS]; NUM_COLUMNS];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            if i == j {
                *cell = 1.0;
                continue;
            }
            if !has_spread(stds[i], means[i]) || !has_spread(stds[j], means[j]) {
                continue;
            }
            let covariance = fingerprints
                .iter()
                .map(|f| {
                    let v = f.to_vector();
                    (v[i] - means[i]) * (v[j] - means[j])
                })
                .sum::<f64>()
                / (n - 1.0);
            *cell = (covariance / (stds[i] * stds[j])).clamp(-1.0, 1.0);
        }
    }
    out
}
