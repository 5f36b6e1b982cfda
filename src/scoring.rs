//! Complexity & novelty
//!
//! Per-event structural complexity and statistical novelty. Both are pure functions
//! of the event, its predecessor and, for novelty, a frozen `CorpusStatistics`.

use serde::{Deserialize, Serialize};

use crate::chord::{ChordQuality, Key};
use crate::config::AnalysisConfig;
use crate::corpus::{CorpusStatistics, SnapshotId};
use crate::model::ChordEvent;

/// Fixed weights of the complexity sum.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Per extension present.
    pub extension: f64,
    /// When the chord leaves the key.
    pub borrowed: f64,
    /// Per unit of relative duration deviation.
    pub duration_irregularity: f64,
}

impl From<&AnalysisConfig> for ScoringWeights {
    fn from(config: &AnalysisConfig) -> Self {
        ScoringWeights {
            extension: config.extension_weight,
            borrowed: config.borrowed_chord_weight,
            duration_irregularity: config.duration_irregularity_weight,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights::from(&AnalysisConfig::default())
    }
}

/// Median of the usable durations of a song, `None` if there are none.
pub fn median_duration<'a, I>(events: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a ChordEvent>,
{
    let mut durations: Vec<f64> = events
        .into_iter()
        .filter_map(ChordEvent::usable_duration)
        .collect();
    if durations.is_empty() {
        return None;
    }
    durations.sort_by(f64::total_cmp);
    let mid = durations.len() / 2;
    Some(if durations.len() % 2 == 0 {
        (durations[mid - 1] + durations[mid]) / 2.0
    } else {
        durations[mid]
    })
}

/// Structural complexity scorer.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ComplexityScorer {
    weights: ScoringWeights,
}

impl ComplexityScorer {
    /// Scorer with the given weights.
    pub fn new(weights: ScoringWeights) -> Self {
        ComplexityScorer { weights }
    }

    /// The weights in use.
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// `extension * |extensions| + borrowed * [outside key] + duration * |d - m| / m`
    /// where `m` is the song's median duration.
    ///
    /// The duration term is zero when the event's duration is unusable or the median
    /// is missing or zero.
    pub fn score(&self, event: &ChordEvent, key: &Key, median: Option<f64>) -> f64 {
        let extensions = event.extensions.len() as f64;
        let borrowed = if event.chord().is_diatonic_in(key) { 0.0 } else { 1.0 };
        let irregularity = match (event.usable_duration(), median) {
            (Some(d), Some(m)) if m > 0.0 => (d - m).abs() / m,
            _ => 0.0,
        };
        self.weights.extension * extensions
            + self.weights.borrowed * borrowed
            + self.weights.duration_irregularity * irregularity
    }
}

/// Transition novelty against one statistics snapshot.
#[derive(Debug, Copy, Clone)]
pub struct NoveltyScorer<'a> {
    statistics: &'a CorpusStatistics,
}

impl<'a> NoveltyScorer<'a> {
    /// Scorer reading `statistics`.
    pub fn new(statistics: &'a CorpusStatistics) -> Self {
        NoveltyScorer { statistics }
    }

    /// The snapshot scores refer to.
    pub fn snapshot(&self) -> SnapshotId {
        self.statistics.snapshot()
    }

    /// Novelty in `[0, 1]` of playing `quality` after `prev`. The first event of a
    /// song gets the corpus fallback.
    pub fn score(&self, prev: Option<ChordQuality>, quality: ChordQuality) -> f64 {
        match prev {
            Some(p) => self.statistics.transition_novelty(p, quality),
            None => self.statistics.fallback_novelty(),
        }
    }
}

/// Scores of one chord event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvent {
    /// Owning song.
    pub song_id: String,
    /// Position within the song.
    pub sequence_index: u32,
    /// Quality of the scored chord.
    pub quality: ChordQuality,
    /// Distance to the tonal center, `>= 0`.
    pub tension: f64,
    /// Structural complexity, `>= 0`.
    pub complexity: f64,
    /// Transition rarity, in `[0, 1]`.
    pub novelty: f64,
    /// Statistics snapshot the novelty was computed against.
    pub snapshot: SnapshotId,
}
