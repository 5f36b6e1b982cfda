//! Configuration
//!
//! Tuning constants for scoring, geometry and clustering. The values are fixed for a
//! run and documented here; nothing is learned from the data.
//!
//! `AnalysisConfig` deserializes with `serde`, every field falling back to its
//! default, so a partial document such as `{"explicit_k": 4}` is a complete
//! configuration.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Geometry of the tonal spiral.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralConfig {
    /// Rotation per fifth-step, in radians.
    pub fifth_angle: f64,
    /// Rise per fifth-step.
    pub height: f64,
    /// Distance from the spiral axis.
    pub radius: f64,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        SpiralConfig {
            fifth_angle: 2.0 * PI * 4.0 / 12.0,
            height: (2.0f64 / 15.0).sqrt(),
            radius: 1.0,
        }
    }
}

/// All recognized analysis options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Complexity added per chord extension.
    pub extension_weight: f64,
    /// Complexity added when a chord falls outside the song's key.
    pub borrowed_chord_weight: f64,
    /// Complexity per unit of relative deviation from the song's median duration.
    pub duration_irregularity_weight: f64,
    /// Cumulative explained-variance ratio the PCA must reach.
    pub pca_variance_threshold: f64,
    /// Inclusive range of cluster counts scanned when `explicit_k` is unset.
    pub k_range: (usize, usize),
    /// Fixed cluster count; disables the silhouette scan.
    pub explicit_k: Option<usize>,
    /// Seed for k-means initialization.
    pub random_seed: u64,
    /// Spiral geometry.
    pub spiral: SpiralConfig,
    /// Independent k-means initializations; the lowest inertia wins.
    pub kmeans_restarts: usize,
    /// Lloyd iteration cap per initialization.
    pub kmeans_max_iterations: usize,
    /// Squared centroid shift below which k-means stops.
    pub kmeans_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            extension_weight: 1.0,
            borrowed_chord_weight: 2.0,
            duration_irregularity_weight: 0.5,
            pca_variance_threshold: 0.90,
            k_range: (2, 10),
            explicit_k: None,
            random_seed: 42,
            spiral: SpiralConfig::default(),
            kmeans_restarts: 10,
            kmeans_max_iterations: 300,
            kmeans_tolerance: 1e-6,
        }
    }
}

fn invalid(field: &'static str, msg: impl Into<String>) -> AnalysisError {
    AnalysisError::InvalidConfig {
        field,
        msg: msg.into(),
    }
}

fn check_weight(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and >= 0, got {value}")))
    }
}

impl AnalysisConfig {
    /// Start customizing with a builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::new()
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        check_weight("extension_weight", self.extension_weight)?;
        check_weight("borrowed_chord_weight", self.borrowed_chord_weight)?;
        check_weight("duration_irregularity_weight", self.duration_irregularity_weight)?;

        let t = self.pca_variance_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(invalid("pca_variance_threshold", format!("must be in (0, 1], got {t}")));
        }
        let (lo, hi) = self.k_range;
        if lo == 0 || lo > hi {
            return Err(invalid("k_range", format!("must satisfy 1 <= lo <= hi, got ({lo}, {hi})")));
        }
        if self.explicit_k == Some(0) {
            return Err(invalid("explicit_k", "must be >= 1"));
        }
        if self.kmeans_restarts == 0 {
            return Err(invalid("kmeans_restarts", "must be >= 1"));
        }
        if self.kmeans_max_iterations == 0 {
            return Err(invalid("kmeans_max_iterations", "must be >= 1"));
        }
        check_weight("kmeans_tolerance", self.kmeans_tolerance)?;

        let s = &self.spiral;
        if !s.fifth_angle.is_finite() {
            return Err(invalid("spiral.fifth_angle", "must be finite"));
        }
        if !(s.height.is_finite() && s.height > 0.0) {
            return Err(invalid("spiral.height", "must be finite and > 0"));
        }
        if !(s.radius.is_finite() && s.radius > 0.0) {
            return Err(invalid("spiral.radius", "must be finite and > 0"));
        }
        Ok(())
    }
}

/// Builder for `AnalysisConfig`
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    /// Start from the defaults.
    pub fn new() -> Self {
        AnalysisConfigBuilder {
            config: AnalysisConfig::default(),
        }
    }

    /// Set the per-extension complexity weight.
    pub fn extension_weight(mut self, value: f64) -> Self {
        self.config.extension_weight = value;
        self
    }

    /// Set the borrowed-chord complexity weight.
    pub fn borrowed_chord_weight(mut self, value: f64) -> Self {
        self.config.borrowed_chord_weight = value;
        self
    }

    /// Set the duration-irregularity complexity weight.
    pub fn duration_irregularity_weight(mut self, value: f64) -> Self {
        self.config.duration_irregularity_weight = value;
        self
    }

    /// Set the PCA cumulative variance threshold.
    pub fn pca_variance_threshold(mut self, value: f64) -> Self {
        self.config.pca_variance_threshold = value;
        self
    }

    /// Set the scanned cluster-count range.
    pub fn k_range(mut self, lo: usize, hi: usize) -> Self {
        self.config.k_range = (lo, hi);
        self
    }

    /// Fix the cluster count.
    pub fn explicit_k(mut self, k: usize) -> Self {
        self.config.explicit_k = Some(k);
        self
    }

    /// Set the k-means seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Replace the spiral geometry.
    pub fn spiral(mut self, spiral: SpiralConfig) -> Self {
        self.config.spiral = spiral;
        self
    }

    /// Set the number of k-means initializations.
    pub fn kmeans_restarts(mut self, n: usize) -> Self {
        self.config.kmeans_restarts = n;
        self
    }

    /// Finalize, validating every field.
    pub fn build(self) -> Result<AnalysisConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for AnalysisConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
