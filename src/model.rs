//! Input records
//!
//! Songs and chord events as handed over by the data loader. The engine only reads
//! them.

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, ChordQuality, Extensions, Key, Mode, NoteName, Tonality};
use crate::error::{AnalysisError, Result};

/// One chord of one song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    /// The song this event belongs to.
    pub song_id: String,
    /// Position within the song; events are ordered by this value.
    pub sequence_index: u32,
    /// Root pitch class, expected in `0..12`.
    pub root_pitch_class: u8,
    /// Chord quality.
    pub quality: ChordQuality,
    /// Added or altered tones.
    #[serde(default)]
    pub extensions: Extensions,
    /// Length of the chord in beats.
    pub duration_beats: f64,
}

impl ChordEvent {
    /// Build an event from a parsed chord.
    pub fn new(
        song_id: impl Into<String>,
        sequence_index: u32,
        chord: Chord,
        duration_beats: f64,
    ) -> Self {
        ChordEvent {
            song_id: song_id.into(),
            sequence_index,
            root_pitch_class: chord.root.pitch_class(),
            quality: chord.quality,
            extensions: chord.extensions,
            duration_beats,
        }
    }

    /// The chord this event plays. An out-of-range root wraps by octave.
    pub fn chord(&self) -> Chord {
        Chord {
            root: NoteName::from_pitch_class(self.root_pitch_class),
            quality: self.quality,
            extensions: self.extensions,
        }
    }

    /// Range check on the root, reported as a recoverable `MalformedChord`.
    pub fn check_root(&self) -> Result<()> {
        if self.root_pitch_class < 12 {
            return Ok(());
        }
        Err(AnalysisError::MalformedChord {
            symbol: format!("{}#{}", self.song_id, self.sequence_index),
            msg: format!("root pitch class {} outside 0..12", self.root_pitch_class),
        })
    }

    /// Duration if it can be used for irregularity scoring.
    pub fn usable_duration(&self) -> Option<f64> {
        (self.duration_beats.is_finite() && self.duration_beats >= 0.0)
            .then_some(self.duration_beats)
    }
}

/// Descriptive song fields the engine carries but never interprets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMetadata {
    /// Performing artist.
    pub artist: Option<String>,
    /// Song title.
    pub title: Option<String>,
    /// Genre label.
    pub genre: Option<String>,
}

/// A song and its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Unique song identifier.
    pub song_id: String,
    /// Tonic pitch class, `None` when unknown.
    pub key_pitch_class: Option<u8>,
    /// Mode of the key.
    pub mode: Mode,
    /// Opaque descriptive fields.
    #[serde(default)]
    pub metadata: SongMetadata,
}

impl Song {
    /// A song with a known key and no metadata.
    pub fn new(song_id: impl Into<String>, key_pitch_class: u8, mode: Mode) -> Self {
        Song {
            song_id: song_id.into(),
            key_pitch_class: Some(key_pitch_class),
            mode,
            metadata: SongMetadata::default(),
        }
    }

    /// A song whose key is given by name, e.g. `"Db Major"`. Unreadable names leave
    /// the key unknown.
    pub fn from_key_name(song_id: impl Into<String>, key_name: &str) -> Self {
        let (key_pitch_class, mode) = match Key::parse(key_name) {
            Some(key) => (
                Some(key.tonic.pitch_class()),
                match key.tonality {
                    Tonality::Major => Mode::Major,
                    Tonality::Minor => Mode::Minor,
                },
            ),
            None => (None, Mode::Other),
        };
        Song {
            song_id: song_id.into(),
            key_pitch_class,
            mode,
            metadata: SongMetadata::default(),
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: SongMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The song's key, or `MissingKey` when the tonic is unknown or out of range, or
    /// the mode has no tonal center.
    pub fn key(&self) -> Result<Key> {
        let missing = || AnalysisError::MissingKey {
            song_id: self.song_id.clone(),
        };
        let pc = self.key_pitch_class.filter(|pc| *pc < 12).ok_or_else(missing)?;
        let tonality = self.mode.tonality().ok_or_else(missing)?;
        Ok(Key::new(NoteName::from_pitch_class(pc), tonality))
    }
}
