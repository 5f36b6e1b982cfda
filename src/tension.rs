//! Tension
//!
//! Distance between a chord and its song's tonal center on the tonal spiral. Each
//! event is scored on its own; sequence statistics belong to the fingerprint.

use crate::chord::{Chord, Key};
use crate::geometry::{TonalPoint, TonalSpiral};

/// Scores chords against a key.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TensionCalculator {
    spiral: TonalSpiral,
}

impl TensionCalculator {
    /// Calculator over the given spiral.
    pub fn new(spiral: TonalSpiral) -> Self {
        TensionCalculator { spiral }
    }

    /// Tension of `chord` in `key`. Always `>= 0`, and exactly `0.0` for the key's
    /// tonic triad.
    pub fn tension(&self, chord: &Chord, key: &Key) -> f64 {
        self.frame(*key).tension(chord)
    }

    /// Precompute the tonal center of `key` for scoring many chords.
    pub fn frame(&self, key: Key) -> KeyFrame {
        KeyFrame {
            spiral: self.spiral,
            center: self.spiral.key_point(&key),
            key,
        }
    }
}

/// A key with its tonal center resolved.
#[derive(Debug, Copy, Clone)]
pub struct KeyFrame {
    spiral: TonalSpiral,
    key: Key,
    center: TonalPoint,
}

impl KeyFrame {
    /// The key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The tonal center.
    pub fn center(&self) -> TonalPoint {
        self.center
    }

    /// Tension of `chord` against this frame's center.
    pub fn tension(&self, chord: &Chord) -> f64 {
        self.spiral
            .chord_point_in(chord, self.key.tonic)
            .distance(&self.center)
    }
}
