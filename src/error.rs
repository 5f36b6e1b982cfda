//! Errors
//!
//! Every failure the engine can report, from a single unreadable chord symbol up to a
//! run invoked out of order.

use thiserror::Error;

use crate::corpus::SnapshotId;
use crate::fingerprint::FingerprintColumn;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised while analysing a corpus.
///
/// `MalformedChord` and `DegenerateFingerprint` are recovered where they occur.
/// `MissingKey`, `EmptySong` and `NonFiniteFingerprint` skip a single song.
/// `StaleStatistics` and `InvalidConfig` abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A chord root or quality could not be read.
    #[error("malformed chord `{symbol}`: {msg}")]
    MalformedChord {
        /// The offending symbol, as received.
        symbol: String,
        /// What was wrong with it.
        msg: String,
    },

    /// A song has no usable key or mode, so it has no tonal center.
    #[error("song `{song_id}` has no usable key")]
    MissingKey {
        /// The song lacking a key.
        song_id: String,
    },

    /// A song has no chord events.
    #[error("song `{song_id}` has no chord events")]
    EmptySong {
        /// The empty song.
        song_id: String,
    },

    /// Novelty was requested without a completed statistics snapshot, or against a
    /// snapshot other than the current one.
    #[error("corpus statistics are stale: {msg}")]
    StaleStatistics {
        /// The snapshot the caller scored against, if any.
        snapshot: Option<SnapshotId>,
        /// Description of the ordering violation.
        msg: String,
    },

    /// A fingerprint column has no variance across the corpus.
    #[error("fingerprint column `{column}` has zero variance across the corpus")]
    DegenerateFingerprint {
        /// The constant column.
        column: FingerprintColumn,
    },

    /// A fingerprint component came out as NaN or infinite.
    #[error("song `{song_id}` produced a non-finite `{column}`")]
    NonFiniteFingerprint {
        /// The song whose fingerprint is invalid.
        song_id: String,
        /// The non-finite component.
        column: FingerprintColumn,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration `{field}`: {msg}")]
    InvalidConfig {
        /// The name of the invalid field.
        field: &'static str,
        /// A description of the problem.
        msg: String,
    },
}

impl AnalysisError {
    /// True for errors that skip one song instead of aborting the run.
    pub fn is_song_scoped(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingKey { .. }
                | AnalysisError::EmptySong { .. }
                | AnalysisError::NonFiniteFingerprint { .. }
        )
    }
}
