//! Chords
//!
//! Pitch classes, chord qualities, extensions and keys, plus parsing of the chord and
//! key spellings found in lead sheets (`C#m7`, `Bb7b9`, `Eb Minor`, `F♯ major`).

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnalysisError, Result};

const SEMITONES: u8 = 12;

/// Number of chord qualities
const NUM_QUALITIES: usize = 8;

/// Every chord quality, in the order of `QUALITY_TONES`
pub const CHORD_QUALITIES: [ChordQuality; NUM_QUALITIES] = [
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Diminished,
    ChordQuality::Augmented,
    ChordQuality::DominantSeventh,
    ChordQuality::MajorSeventh,
    ChordQuality::MinorSeventh,
    ChordQuality::Other,
];

/// Chord tones (semitones above the root, role) matching `CHORD_QUALITIES` order
const QUALITY_TONES: [&[(u8, ToneRole)]; NUM_QUALITIES] = [
    &[(0, ToneRole::Root), (4, ToneRole::Third), (7, ToneRole::Fifth)],
    &[(0, ToneRole::Root), (3, ToneRole::Third), (7, ToneRole::Fifth)],
    &[(0, ToneRole::Root), (3, ToneRole::Third), (6, ToneRole::Fifth)],
    &[(0, ToneRole::Root), (4, ToneRole::Third), (8, ToneRole::Fifth)],
    &[(0, ToneRole::Root), (4, ToneRole::Third), (7, ToneRole::Fifth), (10, ToneRole::Seventh)],
    &[(0, ToneRole::Root), (4, ToneRole::Third), (7, ToneRole::Fifth), (11, ToneRole::Seventh)],
    &[(0, ToneRole::Root), (3, ToneRole::Third), (7, ToneRole::Fifth), (10, ToneRole::Seventh)],
    // neutral shape: the third is unknown
    &[(0, ToneRole::Root), (7, ToneRole::Fifth)],
];

const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const NATURAL_MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
const HARMONIC_LEADING_TONE: u8 = 11;

/// Twelve chromatic pitch classes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteName {
    /// C
    C,
    /// C sharp / D flat
    Cs,
    /// D
    D,
    /// D sharp / E flat
    Ds,
    /// E
    E,
    /// F
    F,
    /// F sharp / G flat
    Fs,
    /// G
    G,
    /// G sharp / A flat
    Gs,
    /// A
    A,
    /// A sharp / B flat
    As,
    /// B
    B,
}

impl NoteName {
    const ALL: [NoteName; SEMITONES as usize] = [
        NoteName::C,
        NoteName::Cs,
        NoteName::D,
        NoteName::Ds,
        NoteName::E,
        NoteName::F,
        NoteName::Fs,
        NoteName::G,
        NoteName::Gs,
        NoteName::A,
        NoteName::As,
        NoteName::B,
    ];

    /// Note for a pitch class; values above 11 wrap by octave.
    pub const fn from_pitch_class(pc: u8) -> NoteName {
        NoteName::ALL[(pc % SEMITONES) as usize]
    }

    /// Pitch class in `0..12`, C = 0.
    pub const fn pitch_class(self) -> u8 {
        self as u8
    }

    /// Position on the circle of fifths: C = 0, G = 1, D = 2, ..., F = 11.
    pub const fn fifths_index(self) -> u8 {
        (self.pitch_class() * 7) % SEMITONES
    }

    /// Angle on the circle of fifths in degrees, C at 0 and G at 30.
    pub fn fifths_angle_degrees(self) -> f64 {
        f64::from(self.fifths_index()) * 30.0
    }

    /// The pitch class `semitones` above this one.
    pub const fn transpose(self, semitones: u8) -> NoteName {
        NoteName::from_pitch_class(self.pitch_class() + semitones % SEMITONES)
    }

    /// Split a leading note spelling (`C`, `F#`, `Bb`, `E♭`) off `text`.
    fn split_prefix(text: &str) -> Option<(NoteName, &str)> {
        let letter = text.chars().next()?;
        let natural: u8 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        // wrap per accidental; runs of any length stay in range
        let mut pc = natural;
        let mut rest = &text[letter.len_utf8()..];
        loop {
            if let Some(r) = rest.strip_prefix('#').or_else(|| rest.strip_prefix('♯')) {
                pc = (pc + 1) % SEMITONES;
                rest = r;
            } else if let Some(r) = rest.strip_prefix('b').or_else(|| rest.strip_prefix('♭')) {
                pc = (pc + SEMITONES - 1) % SEMITONES;
                rest = r;
            } else {
                break;
            }
        }
        Some((NoteName::from_pitch_class(pc), rest))
    }
}

impl Display for NoteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [&str; SEMITONES as usize] =
            ["C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"];
        f.write_str(NAMES[self.pitch_class() as usize])
    }
}

impl FromStr for NoteName {
    type Err = AnalysisError;

    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        let normalized: String = match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        };
        match NoteName::split_prefix(&normalized) {
            Some((note, "")) => Ok(note),
            _ => Err(AnalysisError::MalformedChord {
                symbol: text.to_string(),
                msg: "not a note name".to_string(),
            }),
        }
    }
}

/// Supported chord qualities
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChordQuality {
    /// Major triad (e.g., C-E-G)
    Major,
    /// Minor triad (e.g., C-Eb-G)
    Minor,
    /// Diminished triad (e.g., C-Eb-Gb)
    Diminished,
    /// Augmented triad (e.g., C-E-G#)
    Augmented,
    /// Dominant seventh (e.g., C-E-G-Bb)
    DominantSeventh,
    /// Major seventh (e.g., C-E-G-B)
    MajorSeventh,
    /// Minor seventh (e.g., C-Eb-G-Bb)
    MinorSeventh,
    /// Anything else (suspended, power chords, unreadable qualities); mapped as root
    /// and fifth only.
    Other,
}

impl ChordQuality {
    /// Chord tones as (semitones above root, role).
    pub fn tones(self) -> &'static [(u8, ToneRole)] {
        QUALITY_TONES[self as usize]
    }
}

impl Display for ChordQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Function of a tone within a chord; drives its weight in the chord centroid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ToneRole {
    /// The root
    Root,
    /// The third
    Third,
    /// The fifth
    Fifth,
    /// The seventh of a seventh chord
    Seventh,
    /// An added tone from `Extensions`
    Extension,
}

/// Scale-degree alterations a chord may carry on top of its quality
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Extension {
    /// Added sixth
    Sixth,
    /// Added (minor) seventh on a chord whose quality has none
    Seventh,
    /// Ninth
    Ninth,
    /// Eleventh
    Eleventh,
    /// Thirteenth
    Thirteenth,
    /// Raised or lowered fifth
    AlteredFifth,
    /// Raised or lowered ninth
    AlteredNinth,
}

impl Extension {
    /// Every extension, in bit order.
    pub const ALL: [Extension; 7] = [
        Extension::Sixth,
        Extension::Seventh,
        Extension::Ninth,
        Extension::Eleventh,
        Extension::Thirteenth,
        Extension::AlteredFifth,
        Extension::AlteredNinth,
    ];

    /// Semitones above the root of the tone this extension adds.
    ///
    /// Altered fifths and ninths are placed on their flat spelling.
    pub const fn interval(self) -> u8 {
        match self {
            Extension::Sixth => 9,
            Extension::Seventh => 10,
            Extension::Ninth => 2,
            Extension::Eleventh => 5,
            Extension::Thirteenth => 9,
            Extension::AlteredFifth => 6,
            Extension::AlteredNinth => 1,
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A set of `Extension`s, stored as a bitmask
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Extension>", into = "Vec<Extension>")]
pub struct Extensions(u8);

impl Extensions {
    /// The empty set.
    pub const NONE: Extensions = Extensions(0);

    /// Add an extension.
    pub fn insert(&mut self, ext: Extension) {
        self.0 |= ext.bit();
    }

    /// Builder-style `insert`.
    pub fn with(mut self, ext: Extension) -> Self {
        self.insert(ext);
        self
    }

    /// Whether `ext` is present.
    pub fn contains(self, ext: Extension) -> bool {
        self.0 & ext.bit() != 0
    }

    /// Number of extensions present.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// True when no extension is present.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Present extensions in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Extension> {
        Extension::ALL.into_iter().filter(move |e| self.contains(*e))
    }
}

impl FromIterator<Extension> for Extensions {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        let mut set = Extensions::NONE;
        for ext in iter {
            set.insert(ext);
        }
        set
    }
}

impl From<Vec<Extension>> for Extensions {
    fn from(list: Vec<Extension>) -> Self {
        list.into_iter().collect()
    }
}

impl From<Extensions> for Vec<Extension> {
    fn from(set: Extensions) -> Self {
        set.iter().collect()
    }
}

/// A chord: root, quality and extensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    /// The root note.
    pub root: NoteName,
    /// The chord quality.
    pub quality: ChordQuality,
    /// Added or altered tones.
    pub extensions: Extensions,
}

impl Chord {
    /// A chord without extensions.
    pub fn new(root: NoteName, quality: ChordQuality) -> Self {
        Chord {
            root,
            quality,
            extensions: Extensions::NONE,
        }
    }

    /// Builder-style extension.
    pub fn with_extension(mut self, ext: Extension) -> Self {
        self.extensions.insert(ext);
        self
    }

    /// Pitch classes of the chord with their roles; quality tones first, then extensions.
    pub fn tones(&self) -> impl Iterator<Item = (NoteName, ToneRole)> + '_ {
        let root = self.root;
        let quality = self
            .quality
            .tones()
            .iter()
            .map(move |&(iv, role)| (root.transpose(iv), role));
        let extra = self
            .extensions
            .iter()
            .map(move |ext| (root.transpose(ext.interval()), ToneRole::Extension));
        quality.chain(extra)
    }

    /// True when every quality tone belongs to the key's scale. Extensions are ignored.
    pub fn is_diatonic_in(&self, key: &Key) -> bool {
        self.quality
            .tones()
            .iter()
            .all(|&(iv, _)| key.contains(self.root.transpose(iv)))
    }

    /// Parse a chord symbol, recovering an unreadable quality as `ChordQuality::Other`.
    ///
    /// Fails only when the root itself cannot be read.
    pub fn parse_lenient(symbol: &str) -> Result<Chord> {
        match symbol.parse::<Chord>() {
            Ok(chord) => Ok(chord),
            Err(err) => {
                let body = symbol.trim();
                match NoteName::split_prefix(body) {
                    Some((root, _)) => {
                        warn!("{err}; falling back to a neutral chord on {root}");
                        Ok(Chord::new(root, ChordQuality::Other))
                    }
                    None => Err(err),
                }
            }
        }
    }
}

impl Display for Chord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.root, self.quality)?;
        for ext in self.extensions.iter() {
            write!(f, " +{ext:?}")?;
        }
        Ok(())
    }
}

/// What the text following the root says about the quality
#[derive(Copy, Clone)]
enum Head {
    Plain,
    Major,
    Minor,
    HalfDiminished,
    Diminished,
    Augmented,
    Suspended,
}

const HEADS: &[(&str, Head)] = &[
    ("maj", Head::Major),
    ("Maj", Head::Major),
    ("M", Head::Major),
    ("Δ", Head::Major),
    ("m7b5", Head::HalfDiminished),
    ("ø", Head::HalfDiminished),
    ("dim", Head::Diminished),
    ("°", Head::Diminished),
    ("aug", Head::Augmented),
    ("+", Head::Augmented),
    ("min", Head::Minor),
    ("m", Head::Minor),
    ("-", Head::Minor),
    ("sus2", Head::Suspended),
    ("sus4", Head::Suspended),
    ("sus", Head::Suspended),
    ("5", Head::Suspended),
];

/// Alteration tokens, longest spellings first
const ALTERATIONS: &[(&str, Alteration)] = &[
    ("maj7", Alteration::MajorSeventh),
    ("Maj7", Alteration::MajorSeventh),
    ("M7", Alteration::MajorSeventh),
    ("add13", Alteration::Add(Extension::Thirteenth)),
    ("add11", Alteration::Add(Extension::Eleventh)),
    ("add9", Alteration::Add(Extension::Ninth)),
    ("add4", Alteration::Add(Extension::Eleventh)),
    ("add2", Alteration::Add(Extension::Ninth)),
    ("sus2", Alteration::Suspend),
    ("sus4", Alteration::Suspend),
    ("sus", Alteration::Suspend),
    ("b13", Alteration::Add(Extension::Thirteenth)),
    ("#11", Alteration::Add(Extension::Eleventh)),
    ("13", Alteration::Add(Extension::Thirteenth)),
    ("11", Alteration::Add(Extension::Eleventh)),
    ("b9", Alteration::Add(Extension::AlteredNinth)),
    ("#9", Alteration::Add(Extension::AlteredNinth)),
    ("b5", Alteration::Add(Extension::AlteredFifth)),
    ("#5", Alteration::Add(Extension::AlteredFifth)),
    ("-5", Alteration::Add(Extension::AlteredFifth)),
    ("+5", Alteration::Add(Extension::AlteredFifth)),
    ("-9", Alteration::Add(Extension::AlteredNinth)),
    ("+9", Alteration::Add(Extension::AlteredNinth)),
    ("9", Alteration::Add(Extension::Ninth)),
    ("6", Alteration::Add(Extension::Sixth)),
];

#[derive(Copy, Clone)]
enum Alteration {
    Add(Extension),
    MajorSeventh,
    Suspend,
}

fn malformed(symbol: &str, msg: &str) -> AnalysisError {
    AnalysisError::MalformedChord {
        symbol: symbol.to_string(),
        msg: msg.to_string(),
    }
}

/// Split a leading chord-size number (6, 7, 9, 11, 13) off `text`.
fn split_size(text: &str) -> (Option<u8>, &str) {
    let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    match text[..digits].parse::<u8>() {
        Ok(n) => (Some(n), &text[digits..]),
        Err(_) => (None, text),
    }
}

fn size_extension(size: u8) -> Option<Extension> {
    match size {
        9 => Some(Extension::Ninth),
        11 => Some(Extension::Eleventh),
        13 => Some(Extension::Thirteenth),
        _ => None,
    }
}

impl FromStr for Chord {
    type Err = AnalysisError;

    fn from_str(symbol: &str) -> Result<Self> {
        let trimmed = symbol.trim();
        // slash bass is not part of the harmony model
        let body = trimmed.split_once('/').map_or(trimmed, |(chord, _)| chord);
        let (root, rest) =
            NoteName::split_prefix(body).ok_or_else(|| malformed(symbol, "missing root note"))?;

        let (head, rest) = HEADS
            .iter()
            .find_map(|&(prefix, head)| rest.strip_prefix(prefix).map(|r| (head, r)))
            .unwrap_or((Head::Plain, rest));
        let (size, mut rest) = split_size(rest);

        let mut extensions = Extensions::NONE;
        let mut quality = match (head, size) {
            (Head::Plain, None) | (Head::Major, None) => ChordQuality::Major,
            (Head::Plain, Some(6)) | (Head::Major, Some(6)) => {
                extensions.insert(Extension::Sixth);
                ChordQuality::Major
            }
            (Head::Plain, Some(7)) => ChordQuality::DominantSeventh,
            (Head::Major, Some(7)) => ChordQuality::MajorSeventh,
            (Head::Minor, None) => ChordQuality::Minor,
            (Head::Minor, Some(6)) => {
                extensions.insert(Extension::Sixth);
                ChordQuality::Minor
            }
            (Head::Minor, Some(7)) => ChordQuality::MinorSeventh,
            (Head::HalfDiminished, None) => {
                extensions.insert(Extension::AlteredFifth);
                ChordQuality::MinorSeventh
            }
            (Head::HalfDiminished, Some(7)) => {
                extensions.insert(Extension::AlteredFifth);
                ChordQuality::MinorSeventh
            }
            (Head::Diminished, None) => ChordQuality::Diminished,
            (Head::Diminished, Some(7)) => {
                // the diminished seventh sits on the sixth
                extensions.insert(Extension::Sixth);
                ChordQuality::Diminished
            }
            (Head::Augmented, None) => ChordQuality::Augmented,
            (Head::Augmented, Some(7)) => {
                extensions.insert(Extension::Seventh);
                ChordQuality::Augmented
            }
            (Head::Suspended, None) => ChordQuality::Other,
            // `C2`: suspended second
            (Head::Plain, Some(2)) => {
                extensions.insert(Extension::Ninth);
                ChordQuality::Other
            }
            (Head::Suspended, Some(7)) => {
                extensions.insert(Extension::Seventh);
                ChordQuality::Other
            }
            (head, Some(n)) => {
                let ext = size_extension(n)
                    .ok_or_else(|| malformed(symbol, &format!("unsupported chord size {n}")))?;
                extensions.insert(ext);
                match head {
                    Head::Plain => ChordQuality::DominantSeventh,
                    Head::Major => ChordQuality::MajorSeventh,
                    Head::Minor => ChordQuality::MinorSeventh,
                    Head::Augmented => {
                        extensions.insert(Extension::Seventh);
                        ChordQuality::Augmented
                    }
                    Head::Suspended => {
                        extensions.insert(Extension::Seventh);
                        ChordQuality::Other
                    }
                    Head::HalfDiminished | Head::Diminished => {
                        return Err(malformed(symbol, "unsupported diminished extension"));
                    }
                }
            }
        };

        loop {
            rest = rest.trim_start_matches(['(', ')', ',', ' ']);
            if rest.is_empty() {
                break;
            }
            let (alteration, r) = ALTERATIONS
                .iter()
                .find_map(|&(token, alt)| rest.strip_prefix(token).map(|r| (alt, r)))
                .ok_or_else(|| malformed(symbol, &format!("unrecognized quality `{rest}`")))?;
            match alteration {
                Alteration::Add(ext) => extensions.insert(ext),
                // `Cm(maj7)` has no quality of its own; the seventh degree is tagged
                Alteration::MajorSeventh => match quality {
                    ChordQuality::Major => quality = ChordQuality::MajorSeventh,
                    _ => extensions.insert(Extension::Seventh),
                },
                Alteration::Suspend => {
                    if quality == ChordQuality::DominantSeventh {
                        extensions.insert(Extension::Seventh);
                    }
                    quality = ChordQuality::Other;
                }
            }
            rest = r;
        }

        Ok(Chord {
            root,
            quality,
            extensions,
        })
    }
}

/// Song mode as supplied by the data loader
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Major (Ionian)
    Major,
    /// Minor (Aeolian)
    Minor,
    /// Anything else, including unknown
    #[default]
    Other,
}

impl Mode {
    /// The tonality this mode analyses in, if any.
    pub fn tonality(self) -> Option<Tonality> {
        match self {
            Mode::Major => Some(Tonality::Major),
            Mode::Minor => Some(Tonality::Minor),
            Mode::Other => None,
        }
    }
}

impl FromStr for Mode {
    type Err = std::convert::Infallible;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match text.trim().to_ascii_lowercase().as_str() {
            "major" | "maj" | "ionian" => Mode::Major,
            "minor" | "min" | "aeolian" => Mode::Minor,
            _ => Mode::Other,
        })
    }
}

/// The two tonalities with a defined tonal center
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tonality {
    /// Major key
    Major,
    /// Minor key
    Minor,
}

/// A usable key: tonic plus tonality.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// The tonic.
    pub tonic: NoteName,
    /// Major or minor.
    pub tonality: Tonality,
}

impl Key {
    /// Construct a key.
    pub fn new(tonic: NoteName, tonality: Tonality) -> Self {
        Key { tonic, tonality }
    }

    /// Parse names such as `"F# Major"`, `"Eb minor"`, `"A"` (major implied).
    ///
    /// Returns `None` for unknown tonics and for modes without a tonal center.
    pub fn parse(name: &str) -> Option<Key> {
        let mut words = name.split_whitespace();
        let tonic = words.next()?.parse::<NoteName>().ok()?;
        let mode = match words.next() {
            Some(word) => word.parse::<Mode>().ok()?,
            None => Mode::Major,
        };
        mode.tonality().map(|t| Key::new(tonic, t))
    }

    /// Whether `note` belongs to the key's scale. Minor keys also admit the
    /// harmonic-minor leading tone.
    pub fn contains(&self, note: NoteName) -> bool {
        let degree = (note.pitch_class() + SEMITONES - self.tonic.pitch_class()) % SEMITONES;
        match self.tonality {
            Tonality::Major => MAJOR_SCALE.contains(&degree),
            Tonality::Minor => {
                NATURAL_MINOR_SCALE.contains(&degree) || degree == HARMONIC_LEADING_TONE
            }
        }
    }

    /// The tonic triad.
    pub fn tonic_triad(&self) -> Chord {
        let quality = match self.tonality {
            Tonality::Major => ChordQuality::Major,
            Tonality::Minor => ChordQuality::Minor,
        };
        Chord::new(self.tonic, quality)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.tonic, self.tonality)
    }
}
