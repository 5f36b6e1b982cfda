//! Tonal geometry
//!
//! Pitch classes live on a spiral in three dimensions: every perfect fifth turns the
//! spiral by a fixed angle and lifts it by a fixed height. Chords and keys are
//! weighted centroids of their pitch classes.
//!
//! Positions are taken relative to an anchor pitch class, with fifth-steps wrapped
//! into `-5..=6` around it. `TonalSpiral::pitch_point` anchors on C; the `_in`
//! variants anchor anywhere, which is how keys are placed so that a piece and its
//! transposition share the same geometry.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, Key, NoteName, ToneRole};
use crate::config::SpiralConfig;

/// Tolerance for `TonalPoint` equality.
pub const POINT_TOLERANCE: f64 = 1e-9;

/// Centroid weight of the root; the heaviest, so chords lean toward their root.
const ROOT_WEIGHT: f64 = 0.536;
const FIFTH_WEIGHT: f64 = 0.274;
const THIRD_WEIGHT: f64 = 0.19;
const SEVENTH_WEIGHT: f64 = 0.15;
const EXTENSION_WEIGHT: f64 = 0.1;

/// A point in the three-dimensional tonal space.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct TonalPoint {
    /// Horizontal coordinate.
    pub x: f64,
    /// Depth coordinate.
    pub y: f64,
    /// Height along the spiral axis.
    pub z: f64,
}

impl TonalPoint {
    /// The origin.
    pub const ORIGIN: TonalPoint = TonalPoint {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Construct a point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        TonalPoint { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &TonalPoint) -> f64 {
        let d = *self - *other;
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }

    /// Coordinates as an array.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl PartialEq for TonalPoint {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() <= POINT_TOLERANCE
            && (self.y - other.y).abs() <= POINT_TOLERANCE
            && (self.z - other.z).abs() <= POINT_TOLERANCE
    }
}

impl Add for TonalPoint {
    type Output = TonalPoint;

    fn add(self, rhs: TonalPoint) -> TonalPoint {
        TonalPoint::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for TonalPoint {
    type Output = TonalPoint;

    fn sub(self, rhs: TonalPoint) -> TonalPoint {
        TonalPoint::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for TonalPoint {
    type Output = TonalPoint;

    fn mul(self, k: f64) -> TonalPoint {
        TonalPoint::new(self.x * k, self.y * k, self.z * k)
    }
}

fn role_weight(role: ToneRole) -> f64 {
    match role {
        ToneRole::Root => ROOT_WEIGHT,
        ToneRole::Fifth => FIFTH_WEIGHT,
        ToneRole::Third => THIRD_WEIGHT,
        ToneRole::Seventh => SEVENTH_WEIGHT,
        ToneRole::Extension => EXTENSION_WEIGHT,
    }
}

/// Number of fifth-steps from `anchor` to `pc`, wrapped into `-5..=6`.
pub fn fifth_steps(pc: u8, anchor: u8) -> i32 {
    let interval = (i32::from(pc) - i32::from(anchor)).rem_euclid(12);
    let steps = (interval * 7) % 12;
    if steps > 6 {
        steps - 12
    } else {
        steps
    }
}

/// Builder for `TonalSpiral`
pub struct TonalSpiralBuilder {
    config: SpiralConfig,
}

impl TonalSpiralBuilder {
    /// Start from the default geometry: a third of a turn and `sqrt(2/15)` of height
    /// per fifth, unit radius.
    pub fn new() -> Self {
        TonalSpiralBuilder {
            config: SpiralConfig::default(),
        }
    }

    /// Set the rotation per fifth-step, in radians.
    pub fn fifth_angle(mut self, radians: f64) -> Self {
        self.config.fifth_angle = radians;
        self
    }

    /// Set the rise per fifth-step.
    pub fn height(mut self, height: f64) -> Self {
        self.config.height = height;
        self
    }

    /// Set the spiral radius.
    pub fn radius(mut self, radius: f64) -> Self {
        self.config.radius = radius;
        self
    }

    /// Build the `TonalSpiral`.
    pub fn build(self) -> TonalSpiral {
        TonalSpiral::new(self.config)
    }
}

impl Default for TonalSpiralBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps pitch classes, chords and keys to `TonalPoint`s. Stateless apart from its
/// geometry, so every mapping is a pure function.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TonalSpiral {
    config: SpiralConfig,
}

impl TonalSpiral {
    /// Return a builder to customize the geometry.
    pub fn builder() -> TonalSpiralBuilder {
        TonalSpiralBuilder::new()
    }

    /// Spiral with the given geometry.
    pub fn new(config: SpiralConfig) -> Self {
        TonalSpiral { config }
    }

    /// The geometry in use.
    pub fn config(&self) -> &SpiralConfig {
        &self.config
    }

    /// Point of pitch class `pc` (wrapped by octave), anchored on C.
    pub fn pitch_point(&self, pc: u8) -> TonalPoint {
        self.pitch_point_in(pc, NoteName::C)
    }

    /// Point of pitch class `pc` (wrapped by octave), anchored on `anchor`.
    pub fn pitch_point_in(&self, pc: u8, anchor: NoteName) -> TonalPoint {
        let k = f64::from(fifth_steps(pc % 12, anchor.pitch_class()));
        let angle = k * self.config.fifth_angle;
        TonalPoint::new(
            self.config.radius * angle.sin(),
            self.config.radius * angle.cos(),
            k * self.config.height,
        )
    }

    /// Point of a chord, anchored on C.
    pub fn chord_point(&self, chord: &Chord) -> TonalPoint {
        self.chord_point_in(chord, NoteName::C)
    }

    /// Weighted centroid of the chord's tones, anchored on `anchor`.
    ///
    /// The root weighs most, then fifth, third, seventh and extensions. A tone
    /// present twice (a sixth on a diminished chord, say) counts twice.
    pub fn chord_point_in(&self, chord: &Chord, anchor: NoteName) -> TonalPoint {
        let mut sum = TonalPoint::ORIGIN;
        let mut total = 0.0;
        for (note, role) in chord.tones() {
            let w = role_weight(role);
            sum = sum + self.pitch_point_in(note.pitch_class(), anchor) * w;
            total += w;
        }
        // every quality has a root, so total > 0
        sum * (1.0 / total)
    }

    /// Tonal center of a key: its tonic triad, anchored on the tonic.
    pub fn key_point(&self, key: &Key) -> TonalPoint {
        self.chord_point_in(&key.tonic_triad(), key.tonic)
    }
}

impl Default for TonalSpiral {
    fn default() -> Self {
        TonalSpiral::new(SpiralConfig::default())
    }
}
