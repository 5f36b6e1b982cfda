//! # harmonic_fingerprint
//!
//! Music-theory metrics for symbolic chord progressions: place every chord on a tonal
//! spiral, measure its tension against the song's key, score its complexity and the
//! rarity of its transition within the corpus, summarize each song as a fingerprint
//! and group songs by clustering the fingerprints.
//!
//! ## Example
//! ```rust
//! use harmonic_fingerprint::{AnalysisConfig, AnalysisEngine, Chord, ChordEvent, Mode, Song};
//!
//! fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1) Songs and their chords, as produced by your loader
//!     let songs = vec![
//!         Song::new("let-it-be", 0, Mode::Major),
//!         Song::from_key_name("creep", "G Major"),
//!     ];
//!     let mut events = Vec::new();
//!     for (i, symbol) in ["C", "G", "Am", "F"].iter().enumerate() {
//!         events.push(ChordEvent::new("let-it-be", i as u32, symbol.parse::<Chord>()?, 4.0));
//!     }
//!     for (i, symbol) in ["G", "B", "C", "Cm"].iter().enumerate() {
//!         events.push(ChordEvent::new("creep", i as u32, symbol.parse::<Chord>()?, 4.0));
//!     }
//!
//!     // 2) Build an engine and analyse the corpus
//!     let config = AnalysisConfig::builder().explicit_k(2).random_seed(7).build()?;
//!     let mut engine = AnalysisEngine::new(config)?;
//!     let analysis = engine.analyze(&songs, &events)?;
//!
//!     for fp in &analysis.fingerprints {
//!         println!("{} mean tension {:.3}", fp.song_id, fp.mean_tension);
//!     }
//!     for a in &analysis.clustering.assignments {
//!         println!("{} -> cluster {}", a.song_id, a.cluster_id);
//!     }
//!     Ok(())
//! }
//! # run().unwrap();
//! ```
//!
//! ## Stages
//! - `corpus`: quality and transition counts over the whole corpus, built once before
//!   any novelty is scored
//! - `geometry` / `tension`: spiral positions and distance to the tonal center
//! - `scoring`: per-event complexity and novelty
//! - `fingerprint`: per-song summary vectors
//! - `clustering`: standardization, PCA and k-means over all fingerprints
//!
//! The crate logs through `tracing` and never installs a subscriber.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

/// Chord, note and key types.
pub use chord::{
    Chord, ChordQuality, Extension, Extensions, Key, Mode, NoteName, Tonality, ToneRole,
    CHORD_QUALITIES,
};

/// Input records.
pub use model::{ChordEvent, Song, SongMetadata};

/// Tonal spiral.
pub use geometry::{TonalPoint, TonalSpiral, TonalSpiralBuilder};

/// Tension against a key.
pub use tension::{KeyFrame, TensionCalculator};

/// Corpus-wide counts.
pub use corpus::{CorpusStatistics, CorpusStatisticsBuilder, SnapshotId};

/// Per-event scores.
pub use scoring::{ComplexityScorer, NoveltyScorer, ScoredEvent, ScoringWeights};

/// Song summaries.
pub use fingerprint::{aggregate_song, FingerprintColumn, SkippedSong, SongFingerprint};

/// Clustering.
pub use clustering::{ClusterAssignment, ClusteringOutcome, ClusteringPipeline};

/// Corpus-relative profiles.
pub use profile::ComplexityTier;

/// Configuration.
pub use config::{AnalysisConfig, AnalysisConfigBuilder, SpiralConfig};

/// Orchestration.
pub use engine::{AnalysisEngine, CorpusAnalysis, FingerprintTable};

/// Errors.
pub use error::{AnalysisError, Result};

/// Chords, notes and keys.
pub mod chord;

/// Clustering pipeline.
pub mod clustering;

/// Configuration.
pub mod config;

/// Corpus statistics.
pub mod corpus;

/// Analysis engine.
pub mod engine;

/// Error types.
pub mod error;

/// Song fingerprints.
pub mod fingerprint;

/// Tonal geometry.
pub mod geometry;

/// Input records.
pub mod model;

/// Corpus-relative song profiles.
pub mod profile;

/// Complexity and novelty scoring.
pub mod scoring;

/// Tension calculation.
pub mod tension;
