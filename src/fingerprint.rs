//! Song fingerprints
//!
//! Reduces a song's scored events to one fixed-length vector.

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::corpus::SnapshotId;
use crate::error::{AnalysisError, Result};
use crate::scoring::ScoredEvent;

/// Number of fingerprint components.
pub const NUM_COLUMNS: usize = 6;

/// Fingerprint components, in vector order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FingerprintColumn {
    /// Mean tension
    MeanTension,
    /// Population variance of tension
    TensionVariance,
    /// Mean complexity
    MeanComplexity,
    /// Mean novelty
    MeanNovelty,
    /// Distinct qualities used
    ChordVocabularySize,
    /// Event count
    ProgressionLength,
}

impl FingerprintColumn {
    /// Every column in vector order.
    pub const ALL: [FingerprintColumn; NUM_COLUMNS] = [
        FingerprintColumn::MeanTension,
        FingerprintColumn::TensionVariance,
        FingerprintColumn::MeanComplexity,
        FingerprintColumn::MeanNovelty,
        FingerprintColumn::ChordVocabularySize,
        FingerprintColumn::ProgressionLength,
    ];

    /// Column name as used in tabular exports.
    pub const fn name(self) -> &'static str {
        match self {
            FingerprintColumn::MeanTension => "mean_tension",
            FingerprintColumn::TensionVariance => "tension_variance",
            FingerprintColumn::MeanComplexity => "mean_complexity",
            FingerprintColumn::MeanNovelty => "mean_novelty",
            FingerprintColumn::ChordVocabularySize => "chord_vocabulary_size",
            FingerprintColumn::ProgressionLength => "progression_length",
        }
    }

    /// Position in the fingerprint vector.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Display for FingerprintColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary vector of one song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongFingerprint {
    /// The song.
    pub song_id: String,
    /// Mean tension over events.
    pub mean_tension: f64,
    /// Population variance of tension.
    pub tension_variance: f64,
    /// Mean complexity over events.
    pub mean_complexity: f64,
    /// Mean novelty over events.
    pub mean_novelty: f64,
    /// Number of distinct qualities.
    pub chord_vocabulary_size: usize,
    /// Number of events.
    pub progression_length: usize,
}

impl SongFingerprint {
    /// The components in `FingerprintColumn::ALL` order.
    pub fn to_vector(&self) -> [f64; NUM_COLUMNS] {
        [
            self.mean_tension,
            self.tension_variance,
            self.mean_complexity,
            self.mean_novelty,
            self.chord_vocabulary_size as f64,
            self.progression_length as f64,
        ]
    }

    /// A single component.
    pub fn get(&self, column: FingerprintColumn) -> f64 {
        self.to_vector()[column.index()]
    }
}

/// A song left out of the fingerprint table, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSong {
    /// The skipped song.
    pub song_id: String,
    /// The song-scoped error that excluded it.
    pub reason: AnalysisError,
}

/// Aggregate one song's scored events.
///
/// Every event must have been scored against `snapshot`; anything else is a
/// `StaleStatistics` error. An empty song is `EmptySong`.
pub fn aggregate_song(
    song_id: &str,
    events: &[ScoredEvent],
    snapshot: SnapshotId,
) -> Result<SongFingerprint> {
    if events.is_empty() {
        return Err(AnalysisError::EmptySong {
            song_id: song_id.to_string(),
        });
    }
    if let Some(stale) = events.iter().find(|e| e.snapshot != snapshot) {
        return Err(AnalysisError::StaleStatistics {
            snapshot: Some(stale.snapshot),
            msg: format!(
                "song `{song_id}` event {} was scored against {}, current is {snapshot}",
                stale.sequence_index, stale.snapshot
            ),
        });
    }

    let n = events.len() as f64;
    let mean = |f: fn(&ScoredEvent) -> f64| events.iter().map(f).sum::<f64>() / n;
    let mean_tension = mean(|e| e.tension);
    let tension_variance = events
        .iter()
        .map(|e| (e.tension - mean_tension).powi(2))
        .sum::<f64>()
        / n;
    let vocabulary: BTreeSet<_> = events.iter().map(|e| e.quality).collect();

    let fingerprint = SongFingerprint {
        song_id: song_id.to_string(),
        mean_tension,
        tension_variance,
        mean_complexity: mean(|e| e.complexity),
        mean_novelty: mean(|e| e.novelty),
        chord_vocabulary_size: vocabulary.len(),
        progression_length: events.len(),
    };

    if let Some(column) = FingerprintColumn::ALL
        .into_iter()
        .find(|c| !fingerprint.get(*c).is_finite())
    {
        return Err(AnalysisError::NonFiniteFingerprint {
            song_id: song_id.to_string(),
            column,
        });
    }
    Ok(fingerprint)
}
