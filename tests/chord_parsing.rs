//! Integration tests for chord, note and key spellings and the input records.

use harmonic_fingerprint::{
    AnalysisError, Chord, ChordEvent, ChordQuality, Extension, Extensions, Key, Mode, NoteName,
    Song, Tonality,
};

fn expect(symbol: &str, root: NoteName, quality: ChordQuality, extensions: &[Extension]) {
    let chord: Chord = symbol
        .parse()
        .unwrap_or_else(|e| panic!("`{symbol}` failed to parse: {e}"));
    assert_eq!(chord.root, root, "root of `{symbol}`");
    assert_eq!(chord.quality, quality, "quality of `{symbol}`");
    assert_eq!(
        chord.extensions,
        extensions.iter().copied().collect::<Extensions>(),
        "extensions of `{symbol}`"
    );
}

#[test]
fn test_triads() {
    expect("C", NoteName::C, ChordQuality::Major, &[]);
    expect("Am", NoteName::A, ChordQuality::Minor, &[]);
    expect("Amin", NoteName::A, ChordQuality::Minor, &[]);
    expect("F#m", NoteName::Fs, ChordQuality::Minor, &[]);
    expect("Dbm", NoteName::Cs, ChordQuality::Minor, &[]);
    expect("E♭", NoteName::Ds, ChordQuality::Major, &[]);
    expect("Bb", NoteName::As, ChordQuality::Major, &[]);
    expect("Bdim", NoteName::B, ChordQuality::Diminished, &[]);
    expect("Caug", NoteName::C, ChordQuality::Augmented, &[]);
    expect("C+", NoteName::C, ChordQuality::Augmented, &[]);
}

#[test]
fn test_sevenths() {
    expect("G7", NoteName::G, ChordQuality::DominantSeventh, &[]);
    expect("Fmaj7", NoteName::F, ChordQuality::MajorSeventh, &[]);
    expect("CM7", NoteName::C, ChordQuality::MajorSeventh, &[]);
    expect("Bbmaj7", NoteName::As, ChordQuality::MajorSeventh, &[]);
    expect("Em7", NoteName::E, ChordQuality::MinorSeventh, &[]);
    expect("C-7", NoteName::C, ChordQuality::MinorSeventh, &[]);
    expect("Bb7", NoteName::As, ChordQuality::DominantSeventh, &[]);
    expect("Bm7b5", NoteName::B, ChordQuality::MinorSeventh, &[Extension::AlteredFifth]);
    expect("Bø", NoteName::B, ChordQuality::MinorSeventh, &[Extension::AlteredFifth]);
    expect("Cdim7", NoteName::C, ChordQuality::Diminished, &[Extension::Sixth]);
    expect("Caug7", NoteName::C, ChordQuality::Augmented, &[Extension::Seventh]);
}

#[test]
fn test_extended_and_altered() {
    expect("C6", NoteName::C, ChordQuality::Major, &[Extension::Sixth]);
    expect("Am6", NoteName::A, ChordQuality::Minor, &[Extension::Sixth]);
    expect("C9", NoteName::C, ChordQuality::DominantSeventh, &[Extension::Ninth]);
    expect("Cmaj9", NoteName::C, ChordQuality::MajorSeventh, &[Extension::Ninth]);
    expect("Dm11", NoteName::D, ChordQuality::MinorSeventh, &[Extension::Eleventh]);
    expect("C13", NoteName::C, ChordQuality::DominantSeventh, &[Extension::Thirteenth]);
    expect("G7b9", NoteName::G, ChordQuality::DominantSeventh, &[Extension::AlteredNinth]);
    expect("C7#5", NoteName::C, ChordQuality::DominantSeventh, &[Extension::AlteredFifth]);
    expect(
        "G7(b9,#5)",
        NoteName::G,
        ChordQuality::DominantSeventh,
        &[Extension::AlteredNinth, Extension::AlteredFifth],
    );
    expect("Cadd9", NoteName::C, ChordQuality::Major, &[Extension::Ninth]);
}

#[test]
fn test_neutral_shapes() {
    expect("Csus4", NoteName::C, ChordQuality::Other, &[]);
    expect("Dsus2", NoteName::D, ChordQuality::Other, &[]);
    expect("C5", NoteName::C, ChordQuality::Other, &[]);
    expect("G7sus4", NoteName::G, ChordQuality::Other, &[Extension::Seventh]);
    // slash bass is dropped
    expect("C/E", NoteName::C, ChordQuality::Major, &[]);
    expect("Am7/G", NoteName::A, ChordQuality::MinorSeventh, &[]);
}

#[test]
fn test_lead_sheet_variants() {
    expect("C2", NoteName::C, ChordQuality::Other, &[Extension::Ninth]);
    expect("Cm(maj7)", NoteName::C, ChordQuality::Minor, &[Extension::Seventh]);
    expect("CmMaj7", NoteName::C, ChordQuality::Minor, &[Extension::Seventh]);
    expect("C(maj7)", NoteName::C, ChordQuality::MajorSeventh, &[]);
    expect("C7+5", NoteName::C, ChordQuality::DominantSeventh, &[Extension::AlteredFifth]);
    expect("E7-9", NoteName::E, ChordQuality::DominantSeventh, &[Extension::AlteredNinth]);

    let c2: Chord = "C2".parse().unwrap();
    assert_eq!(c2.extensions, Extensions::NONE.with(Extension::Ninth));
}

#[test]
fn test_long_accidental_runs_wrap() {
    let sharps = format!("B{}", "#".repeat(120));
    let chord: Chord = sharps.parse().unwrap();
    assert_eq!(chord, Chord::new(NoteName::B, ChordQuality::Major));
    assert_eq!(sharps.parse::<NoteName>().unwrap(), NoteName::B);
    assert_eq!(
        Key::parse(&format!("{sharps} Major")),
        Some(Key::new(NoteName::B, Tonality::Major))
    );

    let flats = format!("C{}m7", "b".repeat(130));
    assert_eq!(
        Chord::parse_lenient(&flats).unwrap(),
        Chord::new(NoteName::D, ChordQuality::MinorSeventh)
    );
    assert_eq!(
        Song::from_key_name("s", &format!("E{} minor", "♭".repeat(200))).key().unwrap(),
        Key::new(NoteName::Gs, Tonality::Minor)
    );
}

#[test]
fn test_malformed_symbols() {
    for symbol in ["", "H7", "xyz", "Cxyz", "C15", "Cdim9"] {
        match symbol.parse::<Chord>() {
            Err(AnalysisError::MalformedChord { .. }) => {}
            other => panic!("`{symbol}` should be malformed, got {other:?}"),
        }
    }
}

#[test]
fn test_lenient_parse_falls_back_to_neutral() {
    let chord = Chord::parse_lenient("Cxyz").unwrap();
    assert_eq!(chord, Chord::new(NoteName::C, ChordQuality::Other));

    let chord = Chord::parse_lenient("F#m7").unwrap();
    assert_eq!(chord, Chord::new(NoteName::Fs, ChordQuality::MinorSeventh));

    assert!(Chord::parse_lenient("xyz").is_err());
}

#[test]
fn test_note_names() {
    assert_eq!("f#".parse::<NoteName>().unwrap(), NoteName::Fs);
    assert_eq!("Gb".parse::<NoteName>().unwrap(), NoteName::Fs);
    assert_eq!("e♭".parse::<NoteName>().unwrap(), NoteName::Ds);
    assert_eq!("Cb".parse::<NoteName>().unwrap(), NoteName::B);
    assert!("F#m".parse::<NoteName>().is_err());

    assert_eq!(NoteName::from_pitch_class(14), NoteName::D);
    assert_eq!(NoteName::A.transpose(3), NoteName::C);
    assert_eq!(NoteName::As.to_string(), "Bb");

    assert_eq!(NoteName::C.fifths_index(), 0);
    assert_eq!(NoteName::G.fifths_index(), 1);
    assert_eq!(NoteName::F.fifths_index(), 11);
    assert_eq!(NoteName::D.fifths_angle_degrees(), 60.0);
}

#[test]
fn test_keys() {
    assert_eq!(
        Key::parse("F# Major"),
        Some(Key::new(NoteName::Fs, Tonality::Major))
    );
    assert_eq!(
        Key::parse("Eb minor"),
        Some(Key::new(NoteName::Ds, Tonality::Minor))
    );
    assert_eq!(
        Key::parse("F♯ major"),
        Some(Key::new(NoteName::Fs, Tonality::Major))
    );
    assert_eq!(Key::parse("A"), Some(Key::new(NoteName::A, Tonality::Major)));
    assert_eq!(Key::parse("C dorian"), None);
    assert_eq!(Key::parse("X major"), None);

    let a_minor = Key::new(NoteName::A, Tonality::Minor);
    assert!(a_minor.contains(NoteName::G));
    assert!(a_minor.contains(NoteName::Gs));
    assert!(!a_minor.contains(NoteName::Cs));
    assert_eq!(a_minor.tonic_triad(), Chord::new(NoteName::A, ChordQuality::Minor));

    let c_major = Key::new(NoteName::C, Tonality::Major);
    assert!(!c_major.contains(NoteName::Fs));
    assert!("Dm7".parse::<Chord>().unwrap().is_diatonic_in(&c_major));
    assert!(!"Eb".parse::<Chord>().unwrap().is_diatonic_in(&c_major));
    assert!("E7".parse::<Chord>().unwrap().is_diatonic_in(&a_minor));
}

#[test]
fn test_song_keys() {
    let song = Song::from_key_name("s", "Db Major");
    assert_eq!(song.key_pitch_class, Some(1));
    assert_eq!(song.mode, Mode::Major);
    assert_eq!(song.key().unwrap(), Key::new(NoteName::Cs, Tonality::Major));

    for song in [
        Song::from_key_name("modal", "D dorian"),
        Song::new("out-of-range", 14, Mode::Major),
        Song::new("other", 2, Mode::Other),
    ] {
        match song.key() {
            Err(AnalysisError::MissingKey { song_id }) => assert_eq!(song_id, song.song_id),
            other => panic!("{}: expected MissingKey, got {other:?}", song.song_id),
        }
    }

    assert_eq!("Minor".parse::<Mode>().unwrap(), Mode::Minor);
    assert_eq!("mixolydian".parse::<Mode>().unwrap(), Mode::Other);
}

#[test]
fn test_chord_event_records() {
    let json = r#"{"song_id":"a","sequence_index":3,"root_pitch_class":7,
                   "quality":"DominantSeventh","duration_beats":2.0}"#;
    let event: ChordEvent = serde_json::from_str(json).unwrap();
    assert!(event.extensions.is_empty());
    assert_eq!(event.chord(), Chord::new(NoteName::G, ChordQuality::DominantSeventh));
    assert!(event.check_root().is_ok());

    let json = r#"{"song_id":"a","sequence_index":4,"root_pitch_class":19,
                   "quality":"Major","extensions":["Ninth","AlteredFifth"],
                   "duration_beats":-1.0}"#;
    let event: ChordEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.extensions.len(), 2);
    assert!(event.extensions.contains(Extension::AlteredFifth));
    assert_eq!(event.chord().root, NoteName::G);
    assert!(matches!(
        event.check_root(),
        Err(AnalysisError::MalformedChord { .. })
    ));
    assert_eq!(event.usable_duration(), None);

    let back = serde_json::to_value(&event).unwrap();
    assert_eq!(back["extensions"], serde_json::json!(["Ninth", "AlteredFifth"]));
}
