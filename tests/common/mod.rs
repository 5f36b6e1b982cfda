//! Shared corpus fixtures for the integration tests.
#![allow(dead_code)]

use harmonic_fingerprint::{
    AnalysisConfig, AnalysisEngine, Chord, ChordEvent, Mode, Song, SongFingerprint,
};
use lazy_static::lazy_static;

/// A progression written in one key and transposed per song.
pub struct Style {
    pub name: &'static str,
    pub mode: Mode,
    /// Tonic pitch class the chords below are written in
    pub home: u8,
    /// (chord symbol, beats)
    pub chords: &'static [(&'static str, f64)],
}

pub const POP: Style = Style {
    name: "pop",
    mode: Mode::Major,
    home: 0,
    chords: &[("C", 4.0), ("F", 4.0), ("G", 4.0), ("C", 4.0)],
};

pub const JAZZ: Style = Style {
    name: "jazz",
    mode: Mode::Major,
    home: 0,
    chords: &[("Dm9", 2.0), ("G7b9", 2.0), ("Cmaj7", 4.0), ("Cmaj7", 4.0)],
};

pub const MINOR: Style = Style {
    name: "minor",
    mode: Mode::Minor,
    home: 9,
    chords: &[("Am", 4.0), ("Dm", 4.0), ("E7", 4.0), ("Am", 4.0)],
};

pub const STYLES: [&Style; 3] = [&POP, &JAZZ, &MINOR];

/// Transpositions every style is played in.
pub const SHIFTS: [u8; 4] = [0, 2, 5, 7];

/// One song of `style`, moved up by `shift` semitones.
pub fn progression(song_id: &str, style: &Style, shift: u8) -> (Song, Vec<ChordEvent>) {
    let song = Song::new(song_id, (style.home + shift) % 12, style.mode);
    let events = style
        .chords
        .iter()
        .enumerate()
        .map(|(i, (symbol, beats))| {
            let chord: Chord = symbol.parse().unwrap();
            let chord = Chord {
                root: chord.root.transpose(shift),
                ..chord
            };
            ChordEvent::new(song_id, i as u32, chord, *beats)
        })
        .collect();
    (song, events)
}

/// Songs and their events, as a loader would hand them over.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub songs: Vec<Song>,
    pub events: Vec<ChordEvent>,
}

impl Corpus {
    pub fn push(&mut self, song: Song, events: Vec<ChordEvent>) {
        self.songs.push(song);
        self.events.extend(events);
    }
}

/// Every style in every transposition: three groups of identical fingerprints.
pub fn planted_corpus() -> Corpus {
    let mut corpus = Corpus {
        songs: Vec::new(),
        events: Vec::new(),
    };
    for style in STYLES {
        for shift in SHIFTS {
            let (song, events) = progression(&format!("{}-{shift}", style.name), style, shift);
            corpus.push(song, events);
        }
    }
    corpus
}

/// Style name encoded in a fixture song id.
pub fn style_of(song_id: &str) -> &str {
    song_id.split('-').next().unwrap()
}

/// Fingerprints of the planted corpus under the default configuration.
pub fn planted_fingerprints() -> Vec<SongFingerprint> {
    let mut engine = AnalysisEngine::new(AnalysisConfig::default()).unwrap();
    engine.build_statistics(&PLANTED.events);
    let table = engine.fingerprint_corpus(&PLANTED.songs, &PLANTED.events).unwrap();
    assert!(table.skipped.is_empty());
    table.fingerprints
}

/// A fingerprint with explicit components.
pub fn fingerprint(song_id: &str, v: [f64; 4], vocabulary: usize, length: usize) -> SongFingerprint {
    SongFingerprint {
        song_id: song_id.to_string(),
        mean_tension: v[0],
        tension_variance: v[1],
        mean_complexity: v[2],
        mean_novelty: v[3],
        chord_vocabulary_size: vocabulary,
        progression_length: length,
    }
}

lazy_static! {
    pub static ref PLANTED: Corpus = planted_corpus();
}
