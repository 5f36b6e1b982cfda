//! Analysis engine
//!
//! Runs the stages in order: corpus statistics (once, as a barrier), per-song
//! scoring and aggregation fanned out over songs, then corpus-wide clustering.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::clustering::{ClusteringOutcome, ClusteringPipeline};
use crate::config::AnalysisConfig;
use crate::corpus::CorpusStatistics;
use crate::error::{AnalysisError, Result};
use crate::fingerprint::{aggregate_song, SkippedSong, SongFingerprint};
use crate::geometry::TonalSpiral;
use crate::model::{ChordEvent, Song};
use crate::scoring::{median_duration, ComplexityScorer, NoveltyScorer, ScoredEvent, ScoringWeights};
use crate::tension::TensionCalculator;

/// Fingerprints of the songs that could be summarized, and the songs that could not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerprintTable {
    /// One fingerprint per usable song, in song order.
    pub fingerprints: Vec<SongFingerprint>,
    /// Songs left out, in song order.
    pub skipped: Vec<SkippedSong>,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct CorpusAnalysis {
    /// Song fingerprints.
    pub fingerprints: Vec<SongFingerprint>,
    /// Songs excluded from the fingerprint table.
    pub skipped: Vec<SkippedSong>,
    /// Clustering of the fingerprints.
    pub clustering: ClusteringOutcome,
    /// The statistics snapshot novelty was scored against.
    pub statistics: Arc<CorpusStatistics>,
}

/// Owns the configuration and the current statistics snapshot.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    config: AnalysisConfig,
    tension: TensionCalculator,
    complexity: ComplexityScorer,
    statistics: Option<Arc<CorpusStatistics>>,
}

impl AnalysisEngine {
    /// Engine with a validated configuration and no statistics yet.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(AnalysisEngine {
            tension: TensionCalculator::new(TonalSpiral::new(config.spiral)),
            complexity: ComplexityScorer::new(ScoringWeights::from(&config)),
            statistics: None,
            config,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The current statistics snapshot, if one was built.
    pub fn statistics(&self) -> Option<&Arc<CorpusStatistics>> {
        self.statistics.as_ref()
    }

    /// Count the whole event table and make it the current snapshot. Scores from any
    /// previous snapshot stop aggregating.
    pub fn build_statistics(&mut self, events: &[ChordEvent]) -> Arc<CorpusStatistics> {
        let statistics = Arc::new(CorpusStatistics::from_events(events));
        info!(
            snapshot = %statistics.snapshot(),
            chords = statistics.total_chords(),
            transitions = statistics.total_transitions(),
            "corpus statistics built"
        );
        self.statistics = Some(Arc::clone(&statistics));
        statistics
    }

    /// Install a snapshot built elsewhere.
    pub fn use_statistics(&mut self, statistics: Arc<CorpusStatistics>) {
        self.statistics = Some(statistics);
    }

    fn current_statistics(&self) -> Result<&Arc<CorpusStatistics>> {
        self.statistics
            .as_ref()
            .ok_or_else(|| AnalysisError::StaleStatistics {
                snapshot: None,
                msg: "novelty requested before corpus statistics were built".to_string(),
            })
    }

    /// Score the events of `song` found in `events` (other songs' events are
    /// ignored), in `sequence_index` order.
    ///
    /// Fails with `StaleStatistics` before `build_statistics`, and with
    /// `MissingKey` when the song has no usable key.
    pub fn score_song(&self, song: &Song, events: &[ChordEvent]) -> Result<Vec<ScoredEvent>> {
        let mut own: Vec<&ChordEvent> =
            events.iter().filter(|e| e.song_id == song.song_id).collect();
        own.sort_by_key(|e| e.sequence_index);
        self.score_ordered(song, &own)
    }

    fn score_ordered(&self, song: &Song, events: &[&ChordEvent]) -> Result<Vec<ScoredEvent>> {
        let statistics = self.current_statistics()?;
        let novelty = NoveltyScorer::new(statistics);
        let frame = self.tension.frame(song.key()?);
        let median = median_duration(events.iter().copied());

        let mut prev = None;
        let mut scored = Vec::with_capacity(events.len());
        for event in events {
            if let Err(err) = event.check_root() {
                warn!("{err}; wrapping by octave");
            }
            if event.usable_duration().is_none() {
                debug!(
                    song = %song.song_id,
                    index = event.sequence_index,
                    duration = event.duration_beats,
                    "unusable duration ignored for irregularity"
                );
            }
            scored.push(ScoredEvent {
                song_id: song.song_id.clone(),
                sequence_index: event.sequence_index,
                quality: event.quality,
                tension: frame.tension(&event.chord()),
                complexity: self.complexity.score(event, frame.key(), median),
                novelty: novelty.score(prev, event.quality),
                snapshot: novelty.snapshot(),
            });
            prev = Some(event.quality);
        }
        Ok(scored)
    }

    /// Score and aggregate one song.
    pub fn fingerprint_song(&self, song: &Song, events: &[ChordEvent]) -> Result<SongFingerprint> {
        let scored = self.score_song(song, events)?;
        self.aggregate(&song.song_id, &scored)
    }

    /// Aggregate events scored earlier; they must come from the current snapshot.
    pub fn aggregate(&self, song_id: &str, scored: &[ScoredEvent]) -> Result<SongFingerprint> {
        let statistics = self.current_statistics()?;
        aggregate_song(song_id, scored, statistics.snapshot())
    }

    /// Fingerprint every song, in parallel.
    ///
    /// Song-scoped failures become `skipped` entries; anything else aborts.
    pub fn fingerprint_corpus(&self, songs: &[Song], events: &[ChordEvent]) -> Result<FingerprintTable> {
        self.current_statistics()?;

        let mut by_song: HashMap<&str, Vec<&ChordEvent>> = HashMap::new();
        for event in events {
            by_song.entry(event.song_id.as_str()).or_default().push(event);
        }
        for list in by_song.values_mut() {
            list.sort_by_key(|e| e.sequence_index);
        }
        let known: HashSet<&str> = songs.iter().map(|s| s.song_id.as_str()).collect();
        let unknown = by_song.keys().filter(|id| !known.contains(*id)).count();
        if unknown > 0 {
            warn!(songs = unknown, "chord events reference unknown songs; ignored");
        }

        let results: Vec<Result<SongFingerprint>> = songs
            .par_iter()
            .map(|song| {
                let events = by_song.get(song.song_id.as_str()).map_or(&[][..], Vec::as_slice);
                let scored = self.score_ordered(song, events)?;
                self.aggregate(&song.song_id, &scored)
            })
            .collect();

        let mut table = FingerprintTable::default();
        for (song, result) in songs.iter().zip(results) {
            match result {
                Ok(fingerprint) => table.fingerprints.push(fingerprint),
                Err(reason) if reason.is_song_scoped() => {
                    warn!("skipping song: {reason}");
                    table.skipped.push(SkippedSong {
                        song_id: song.song_id.clone(),
                        reason,
                    });
                }
                Err(fatal) => return Err(fatal),
            }
        }
        info!(
            songs = table.fingerprints.len(),
            skipped = table.skipped.len(),
            "fingerprints computed"
        );
        Ok(table)
    }

    /// Run every stage over a corpus: statistics, fingerprints, clustering.
    pub fn analyze(&mut self, songs: &[Song], events: &[ChordEvent]) -> Result<CorpusAnalysis> {
        let statistics = self.build_statistics(events);
        let table = self.fingerprint_corpus(songs, events)?;
        let clustering = ClusteringPipeline::new(self.config.clone()).run(&table.fingerprints)?;
        Ok(CorpusAnalysis {
            fingerprints: table.fingerprints,
            skipped: table.skipped,
            clustering,
            statistics,
        })
    }
}
