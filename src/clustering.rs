//! Clustering
//!
//! Corpus-wide reduction of fingerprints: standardize the columns, project onto the
//! leading principal components, then partition with k-means.
//!
//! Given the same fingerprint rows (in the same order) and the same seed, a run
//! reproduces its cluster ids and coordinates exactly. Cluster ids are renumbered by
//! first appearance in row order; they carry no meaning across runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::fingerprint::{FingerprintColumn, SongFingerprint};

/// Projections always carry at least this many coordinates.
pub const MIN_COMPONENTS: usize = 2;

const JACOBI_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-22;
const VARIANCE_TOLERANCE: f64 = 1e-14;

/// Cluster membership and plotting coordinates of one song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// The song.
    pub song_id: String,
    /// Cluster id, `0..k`.
    pub cluster_id: usize,
    /// Coordinates in the reduced space; at least two entries.
    pub projected_coordinates: Vec<f64>,
}

/// Fingerprint matrix with constant columns removed and the rest z-scored.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardized {
    /// Columns kept, in order.
    pub columns: Vec<FingerprintColumn>,
    /// Columns dropped for zero variance.
    pub dropped: Vec<FingerprintColumn>,
    /// Corpus mean of each kept column.
    pub means: Vec<f64>,
    /// Corpus (population) standard deviation of each kept column.
    pub scales: Vec<f64>,
    /// One row per fingerprint, one entry per kept column.
    pub rows: Vec<Vec<f64>>,
}

/// Center every column to mean 0 and scale it to population variance 1.
///
/// Columns with no variance are dropped and logged as `DegenerateFingerprint`.
pub fn standardize(fingerprints: &[SongFingerprint]) -> Standardized {
    let matrix: Vec<_> = fingerprints.iter().map(SongFingerprint::to_vector).collect();
    let n = matrix.len() as f64;

    let mut out = Standardized {
        columns: Vec::new(),
        dropped: Vec::new(),
        means: Vec::new(),
        scales: Vec::new(),
        rows: vec![Vec::new(); matrix.len()],
    };
    if matrix.is_empty() {
        return out;
    }

    for column in FingerprintColumn::ALL {
        let j = column.index();
        let mean = matrix.iter().map(|r| r[j]).sum::<f64>() / n;
        let variance = matrix.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
        if variance <= VARIANCE_TOLERANCE * (1.0 + mean * mean) {
            let err = AnalysisError::DegenerateFingerprint { column };
            warn!("{err}; dropping it from clustering");
            out.dropped.push(column);
            continue;
        }
        let scale = variance.sqrt();
        for (row, values) in out.rows.iter_mut().zip(&matrix) {
            row.push((values[j] - mean) / scale);
        }
        out.columns.push(column);
        out.means.push(mean);
        out.scales.push(scale);
    }
    out
}

/// Result of a principal-component fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Unit component vectors, by decreasing explained variance.
    pub components: Vec<Vec<f64>>,
    /// Explained-variance ratio of every component, including unused ones.
    pub explained_variance_ratio: Vec<f64>,
    /// Number of components kept.
    pub kept: usize,
    /// Projected rows, zero-padded to `MIN_COMPONENTS`.
    pub coordinates: Vec<Vec<f64>>,
}

/// Project centered rows onto the fewest principal components whose cumulative
/// explained variance reaches `threshold`, but at least `MIN_COMPONENTS` and at most
/// the column count.
#[allow(clippy::needless_range_loop)]
pub fn principal_components(rows: &[Vec<f64>], threshold: f64) -> Projection {
    let dims = rows.first().map_or(0, Vec::len);
    let n = rows.len().max(1) as f64;

    let mut covariance = vec![vec![0.0; dims]; dims];
    for row in rows {
        for i in 0..dims {
            for j in i..dims {
                covariance[i][j] += row[i] * row[j] / n;
            }
        }
    }
    for i in 0..dims {
        for j in 0..i {
            covariance[i][j] = covariance[j][i];
        }
    }

    let (values, vectors) = symmetric_eigen(covariance);
    let mut order: Vec<usize> = (0..dims).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
    let explained_variance_ratio: Vec<f64> = order
        .iter()
        .map(|&i| if total > 0.0 { values[i].max(0.0) / total } else { 0.0 })
        .collect();

    let mut kept = dims;
    let mut cumulative = 0.0;
    for (i, ratio) in explained_variance_ratio.iter().enumerate() {
        cumulative += ratio;
        if cumulative >= threshold - 1e-12 {
            kept = i + 1;
            break;
        }
    }
    let kept = kept.max(MIN_COMPONENTS).min(dims);

    let components: Vec<Vec<f64>> = order
        .iter()
        .map(|&i| {
            let mut v: Vec<f64> = (0..dims).map(|r| vectors[r][i]).collect();
            // fix the sign: largest-magnitude entry positive
            let pivot = v
                .iter()
                .enumerate()
                .fold((0, 0.0f64), |best, (j, x)| if x.abs() > best.1 { (j, x.abs()) } else { best })
                .0;
            if v[pivot] < 0.0 {
                v.iter_mut().for_each(|x| *x = -*x);
            }
            v
        })
        .collect();

    let coordinates = rows
        .iter()
        .map(|row| {
            let mut coords: Vec<f64> = components[..kept]
                .iter()
                .map(|c| c.iter().zip(row).map(|(a, b)| a * b).sum())
                .collect();
            coords.resize(coords.len().max(MIN_COMPONENTS), 0.0);
            coords
        })
        .collect();

    Projection {
        components,
        explained_variance_ratio,
        kept,
        coordinates,
    }
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix whose columns are the eigenvectors.
#[allow(clippy::needless_range_loop)]
fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..JACOBI_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in p + 1..n {
                off += a[p][q] * a[p][q];
            }
        }
        if off < JACOBI_TOLERANCE {
            break;
        }
        for p in 0..n {
            for q in p + 1..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for k in 0..n {
                    let (akp, akq) = (a[k][p], a[k][q]);
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = (0..n).map(|i| a[i][i]).collect();
    (values, v)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the nearest centroid and its squared distance; ties go to the lower index.
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

/// A k-means partition.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster of every point, renumbered by first appearance.
    pub labels: Vec<usize>,
    /// Cluster centers, indexed by label.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to assigned centers.
    pub inertia: f64,
}

/// Lloyd's k-means with k-means++ seeding. Runs `config.kmeans_restarts`
/// initializations from one `StdRng` seeded with `seed` and keeps the lowest inertia.
///
/// `points` must be non-empty and `1 <= k <= points.len()`.
pub fn kmeans(points: &[Vec<f64>], k: usize, config: &AnalysisConfig, seed: u64) -> KMeansFit {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut best: Option<KMeansFit> = None;
    for _ in 0..config.kmeans_restarts {
        let fit = lloyd(points, k, config, &mut rng);
        let better = match &best {
            Some(b) => fit.inertia < b.inertia,
            None => true,
        };
        if better {
            best = Some(fit);
        }
    }
    let fit = match best {
        Some(fit) => fit,
        None => lloyd(points, k, config, &mut rng),
    };
    renumber(fit)
}

fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = vec![points[rng.random_range(0..n)].clone()];
    let mut d2: Vec<f64> = points.iter().map(|p| squared_distance(p, &centroids[0])).collect();
    while centroids.len() < k {
        let total: f64 = d2.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            let mut chosen = n - 1;
            for (i, d) in d2.iter().enumerate() {
                if target < *d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            rng.random_range(0..n)
        };
        let centroid = points[pick].clone();
        for (dist, p) in d2.iter_mut().zip(points) {
            *dist = dist.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

#[allow(clippy::needless_range_loop)]
fn lloyd(points: &[Vec<f64>], k: usize, config: &AnalysisConfig, rng: &mut StdRng) -> KMeansFit {
    let dims = points[0].len();
    let mut centroids = seed_centroids(points, k, rng);
    let mut labels = vec![0usize; points.len()];

    for _ in 0..config.kmeans_max_iterations {
        for (label, p) in labels.iter_mut().zip(points) {
            *label = nearest(p, &centroids).0;
        }

        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (&label, p) in labels.iter().zip(points) {
            counts[label] += 1;
            for (s, x) in sums[label].iter_mut().zip(p) {
                *s += x;
            }
        }

        let mut shift = 0.0f64;
        for c in 0..k {
            let updated: Vec<f64> = if counts[c] > 0 {
                sums[c].iter().map(|s| s / counts[c] as f64).collect()
            } else {
                // empty cluster: restart it on the worst-served point
                let far = (0..points.len()).fold((0, -1.0), |best, i| {
                    let d = squared_distance(&points[i], &centroids[labels[i]]);
                    if d > best.1 {
                        (i, d)
                    } else {
                        best
                    }
                });
                points[far.0].clone()
            };
            shift = shift.max(squared_distance(&centroids[c], &updated));
            centroids[c] = updated;
        }
        if shift <= config.kmeans_tolerance {
            break;
        }
    }

    let mut inertia = 0.0;
    for (label, p) in labels.iter_mut().zip(points) {
        let (c, d) = nearest(p, &centroids);
        *label = c;
        inertia += d;
    }
    KMeansFit {
        labels,
        centroids,
        inertia,
    }
}

/// Renumber clusters by first appearance; unused centroids go last.
fn renumber(fit: KMeansFit) -> KMeansFit {
    let k = fit.centroids.len();
    let mut mapping: Vec<Option<usize>> = vec![None; k];
    let mut next = 0;
    for &label in &fit.labels {
        if mapping[label].is_none() {
            mapping[label] = Some(next);
            next += 1;
        }
    }
    for slot in mapping.iter_mut().filter(|m| m.is_none()) {
        *slot = Some(next);
        next += 1;
    }
    let mapping: Vec<usize> = mapping.into_iter().map(|m| m.unwrap_or(0)).collect();

    let mut centroids = vec![Vec::new(); k];
    for (old, centroid) in fit.centroids.into_iter().enumerate() {
        centroids[mapping[old]] = centroid;
    }
    KMeansFit {
        labels: fit.labels.iter().map(|&l| mapping[l]).collect(),
        centroids,
        inertia: fit.inertia,
    }
}

/// Mean silhouette coefficient in `[-1, 1]`. Points alone in their cluster count 0;
/// fewer than two clusters scores 0.
#[allow(clippy::needless_range_loop)]
pub fn silhouette_score(points: &[Vec<f64>], labels: &[usize]) -> f64 {
    let n = points.len();
    let k = labels.iter().max().map_or(0, |m| m + 1);
    if n < 2 || k < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for j in (0..n).filter(|&j| j != i) {
            sums[labels[j]] += squared_distance(&points[i], &points[j]).sqrt();
            counts[labels[j]] += 1;
        }
        let own = labels[i];
        if counts[own] == 0 {
            continue;
        }
        let a = sums[own] / counts[own] as f64;
        let b = (0..k)
            .filter(|&c| c != own && counts[c] > 0)
            .map(|c| sums[c] / counts[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let m = a.max(b);
        if b.is_finite() && m > 0.0 {
            total += (b - a) / m;
        }
    }
    total / n as f64
}

/// Everything a clustering run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringOutcome {
    /// One assignment per fingerprint, in input order.
    pub assignments: Vec<ClusterAssignment>,
    /// Columns that entered the PCA.
    pub retained_columns: Vec<FingerprintColumn>,
    /// Columns dropped for zero variance.
    pub dropped_columns: Vec<FingerprintColumn>,
    /// Explained-variance ratio of every principal component.
    pub explained_variance_ratio: Vec<f64>,
    /// Principal components kept.
    pub components: usize,
    /// Cluster count used.
    pub k: usize,
    /// Silhouette of the final partition, when `k >= 2`.
    pub silhouette: Option<f64>,
    /// Silhouette of every scanned candidate `k`, empty when `k` was explicit.
    pub k_scores: Vec<(usize, f64)>,
}

impl ClusteringOutcome {
    /// Assignment of `song_id`, if it was clustered.
    pub fn assignment(&self, song_id: &str) -> Option<&ClusterAssignment> {
        self.assignments.iter().find(|a| a.song_id == song_id)
    }
}

/// Standardize, project, partition.
#[derive(Debug, Clone)]
pub struct ClusteringPipeline {
    config: AnalysisConfig,
}

impl ClusteringPipeline {
    /// Pipeline with the given configuration.
    pub fn new(config: AnalysisConfig) -> Self {
        ClusteringPipeline { config }
    }

    /// Cluster the whole fingerprint table at once.
    pub fn run(&self, fingerprints: &[SongFingerprint]) -> Result<ClusteringOutcome> {
        self.config.validate()?;

        let standardized = standardize(fingerprints);
        let projection =
            principal_components(&standardized.rows, self.config.pca_variance_threshold);
        debug!(
            ratios = ?projection.explained_variance_ratio,
            kept = projection.kept,
            "principal components"
        );
        let points = projection.coordinates;

        let (k, fit, k_scores) = if points.is_empty() {
            (0, None, Vec::new())
        } else {
            self.partition(&points)
        };
        let silhouette = fit
            .as_ref()
            .filter(|_| k >= 2)
            .map(|f| silhouette_score(&points, &f.labels));

        let labels = fit.map(|f| f.labels).unwrap_or_default();
        let assignments = fingerprints
            .iter()
            .zip(labels)
            .zip(points)
            .map(|((fp, cluster_id), projected_coordinates)| ClusterAssignment {
                song_id: fp.song_id.clone(),
                cluster_id,
                projected_coordinates,
            })
            .collect::<Vec<_>>();

        info!(
            songs = assignments.len(),
            k,
            components = projection.kept,
            dropped = standardized.dropped.len(),
            "clustering complete"
        );

        Ok(ClusteringOutcome {
            assignments,
            retained_columns: standardized.columns,
            dropped_columns: standardized.dropped,
            explained_variance_ratio: projection.explained_variance_ratio,
            components: projection.kept,
            k,
            silhouette,
            k_scores,
        })
    }

    fn partition(&self, points: &[Vec<f64>]) -> (usize, Option<KMeansFit>, Vec<(usize, f64)>) {
        let n = points.len();
        let seed = self.config.random_seed;

        if let Some(requested) = self.config.explicit_k {
            let k = requested.min(n);
            if k < requested {
                warn!(requested, songs = n, "explicit k exceeds song count; clamping");
            }
            return (k, Some(kmeans(points, k, &self.config, seed)), Vec::new());
        }

        if n < 3 {
            return (1, Some(kmeans(points, 1, &self.config, seed)), Vec::new());
        }

        let (lo, hi) = self.config.k_range;
        let hi = hi.min(n - 1);
        let lo = lo.max(2).min(hi);
        if (lo, hi) != self.config.k_range {
            debug!(lo, hi, "k range clamped to corpus size");
        }

        let mut scores = Vec::with_capacity(hi - lo + 1);
        let mut best: Option<(usize, f64, KMeansFit)> = None;
        for k in lo..=hi {
            let fit = kmeans(points, k, &self.config, seed);
            let score = silhouette_score(points, &fit.labels);
            debug!(k, score, "silhouette");
            scores.push((k, score));
            // strict comparison keeps the smaller k on ties
            let better = match &best {
                Some((_, s, _)) => score > *s,
                None => true,
            };
            if better {
                best = Some((k, score, fit));
            }
        }
        match best {
            Some((k, _, fit)) => (k, Some(fit), scores),
            None => (1, Some(kmeans(points, 1, &self.config, seed)), scores),
        }
    }
}
