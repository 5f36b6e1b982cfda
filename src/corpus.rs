//! Corpus statistics
//!
//! Quality and quality-transition counts over a whole corpus, gathered in one pass
//! and then frozen. Novelty is always relative to one of these snapshots; each
//! snapshot carries a fresh `SnapshotId` so scores from different snapshots can be
//! told apart.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::chord::ChordQuality;
use crate::model::ChordEvent;

static NEXT_SNAPSHOT: AtomicU64 = AtomicU64::new(1);

/// Identity of one frozen `CorpusStatistics`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(u64);

impl SnapshotId {
    fn next() -> Self {
        SnapshotId(NEXT_SNAPSHOT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "snapshot-{}", self.0)
    }
}

/// Accumulates counts song by song.
#[derive(Debug, Default)]
pub struct CorpusStatisticsBuilder {
    transition_frequency: BTreeMap<(ChordQuality, ChordQuality), u64>,
    vocabulary_frequency: BTreeMap<ChordQuality, u64>,
    total_transitions: u64,
    total_chords: u64,
    songs: u64,
}

impl CorpusStatisticsBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one song's qualities in playing order. Transitions are only counted
    /// inside the sequence.
    pub fn add_sequence<I>(&mut self, qualities: I)
    where
        I: IntoIterator<Item = ChordQuality>,
    {
        let mut prev = None;
        for quality in qualities {
            *self.vocabulary_frequency.entry(quality).or_insert(0) += 1;
            self.total_chords += 1;
            if let Some(p) = prev {
                *self.transition_frequency.entry((p, quality)).or_insert(0) += 1;
                self.total_transitions += 1;
            }
            prev = Some(quality);
        }
        self.songs += 1;
    }

    /// Count one song's events, ordering them by `sequence_index` first.
    pub fn add_song(&mut self, events: &[ChordEvent]) {
        let mut ordered: Vec<&ChordEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.sequence_index);
        self.add_sequence(ordered.into_iter().map(|e| e.quality));
    }

    /// Freeze the counts into a new snapshot.
    pub fn finish(self) -> CorpusStatistics {
        CorpusStatistics {
            snapshot: SnapshotId::next(),
            transition_frequency: self.transition_frequency,
            vocabulary_frequency: self.vocabulary_frequency,
            total_transitions: self.total_transitions,
            total_chords: self.total_chords,
            songs: self.songs,
        }
    }
}

/// Frozen corpus-wide counts.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStatistics {
    snapshot: SnapshotId,
    transition_frequency: BTreeMap<(ChordQuality, ChordQuality), u64>,
    vocabulary_frequency: BTreeMap<ChordQuality, u64>,
    total_transitions: u64,
    total_chords: u64,
    songs: u64,
}

impl CorpusStatistics {
    /// Build a snapshot from an unordered event table, splitting it by song.
    pub fn from_events(events: &[ChordEvent]) -> Self {
        let mut by_song: HashMap<&str, Vec<&ChordEvent>> = HashMap::new();
        for event in events {
            by_song.entry(event.song_id.as_str()).or_default().push(event);
        }
        let mut builder = CorpusStatisticsBuilder::new();
        for mut song in by_song.into_values() {
            song.sort_by_key(|e| e.sequence_index);
            builder.add_sequence(song.into_iter().map(|e| e.quality));
        }
        builder.finish()
    }

    /// This snapshot's identity.
    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    /// Occurrences of `a` immediately followed by `b` within a song.
    pub fn transition_count(&self, a: ChordQuality, b: ChordQuality) -> u64 {
        self.transition_frequency.get(&(a, b)).copied().unwrap_or(0)
    }

    /// Occurrences of `quality`.
    pub fn quality_count(&self, quality: ChordQuality) -> u64 {
        self.vocabulary_frequency.get(&quality).copied().unwrap_or(0)
    }

    /// All transition counts, ordered by quality pair.
    pub fn transitions(&self) -> impl Iterator<Item = ((ChordQuality, ChordQuality), u64)> + '_ {
        self.transition_frequency.iter().map(|(k, v)| (*k, *v))
    }

    /// All quality counts, ordered by quality.
    pub fn vocabulary(&self) -> impl Iterator<Item = (ChordQuality, u64)> + '_ {
        self.vocabulary_frequency.iter().map(|(k, v)| (*k, *v))
    }

    /// Number of distinct transition pairs observed.
    pub fn distinct_transitions(&self) -> usize {
        self.transition_frequency.len()
    }

    /// Total transitions counted.
    pub fn total_transitions(&self) -> u64 {
        self.total_transitions
    }

    /// Total chords counted.
    pub fn total_chords(&self) -> u64 {
        self.total_chords
    }

    /// Number of songs counted, including empty ones.
    pub fn songs(&self) -> u64 {
        self.songs
    }

    /// `1 - count(a, b) / total_transitions`, in `[0, 1]`. Unseen pairs, and every
    /// pair of a corpus without transitions, score 1.
    pub fn transition_novelty(&self, a: ChordQuality, b: ChordQuality) -> f64 {
        if self.total_transitions == 0 {
            return 1.0;
        }
        let share = self.transition_count(a, b) as f64 / self.total_transitions as f64;
        (1.0 - share).clamp(0.0, 1.0)
    }

    /// Neutral novelty for events without a predecessor: the novelty of a pair
    /// occurring with the mean frequency of the observed pairs, `1 - 1/D`.
    pub fn fallback_novelty(&self) -> f64 {
        match self.transition_frequency.len() {
            0 => 1.0,
            distinct => 1.0 - 1.0 / distinct as f64,
        }
    }
}
