//! Integration tests for the tonal spiral and tension against a key.

use harmonic_fingerprint::geometry::fifth_steps;
use harmonic_fingerprint::{
    Chord, ChordQuality, Extension, Key, NoteName, TensionCalculator, TonalPoint, TonalSpiral,
    Tonality, CHORD_QUALITIES,
};
use lazy_static::lazy_static;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::sync::{Arc, Mutex};

/// Every major and minor key
fn all_keys() -> Vec<Key> {
    (0..12u8)
        .flat_map(|pc| {
            [Tonality::Major, Tonality::Minor]
                .into_iter()
                .map(move |t| Key::new(NoteName::from_pitch_class(pc), t))
        })
        .collect()
}

/// Every root and quality, bare and with each single extension
fn all_chords() -> Vec<Chord> {
    let mut chords = Vec::new();
    for pc in 0..12u8 {
        for quality in CHORD_QUALITIES {
            let chord = Chord::new(NoteName::from_pitch_class(pc), quality);
            chords.push(chord);
            for ext in Extension::ALL {
                chords.push(chord.with_extension(ext));
            }
        }
    }
    chords
}

lazy_static! {
    static ref KEYS: Vec<Key> = all_keys();
    static ref CHORDS: Vec<Chord> = all_chords();
}

#[test]
fn test_pitch_point_wraps_by_octave() {
    let spiral = TonalSpiral::default();
    for pc in 0..=255u8 {
        assert_eq!(
            spiral.pitch_point(pc),
            spiral.pitch_point(pc % 12),
            "pitch class {pc} does not wrap"
        );
    }
}

#[test]
fn test_pitch_point_coordinates() {
    let spiral = TonalSpiral::default();
    let h = (2.0f64 / 15.0).sqrt();
    let third_turn = 2.0 * std::f64::consts::PI / 3.0;

    assert_eq!(spiral.pitch_point(0), TonalPoint::new(0.0, 1.0, 0.0));
    assert_eq!(
        spiral.pitch_point(7),
        TonalPoint::new(third_turn.sin(), third_turn.cos(), h)
    );
    // F is one fifth below C
    assert_eq!(
        spiral.pitch_point(5),
        TonalPoint::new(-third_turn.sin(), third_turn.cos(), -h)
    );

    let wide = TonalSpiral::builder().radius(2.0).height(1.0).build();
    assert_eq!(wide.pitch_point(0), TonalPoint::new(0.0, 2.0, 0.0));
    assert!((wide.pitch_point(2).z - 2.0).abs() < 1e-12);
}

#[test]
fn test_fifth_steps_wrap_around_anchor() {
    assert_eq!(fifth_steps(0, 0), 0);
    assert_eq!(fifth_steps(7, 0), 1);
    assert_eq!(fifth_steps(5, 0), -1);
    assert_eq!(fifth_steps(6, 0), 6);
    assert_eq!(fifth_steps(1, 0), -5);
    // relative to the anchor only
    for anchor in 0..12u8 {
        for pc in 0..12u8 {
            let steps = fifth_steps((pc + anchor) % 12, anchor);
            assert_eq!(steps, fifth_steps(pc, 0));
            assert!((-5..=6).contains(&steps));
        }
    }
}

#[test]
fn test_chord_point_leans_to_root() {
    let spiral = TonalSpiral::default();
    for pc in 0..12u8 {
        let root = NoteName::from_pitch_class(pc);
        let chord = Chord::new(root, ChordQuality::Other);
        let center = spiral.chord_point(&chord);
        let to_root = center.distance(&spiral.pitch_point(pc));
        let to_fifth = center.distance(&spiral.pitch_point(root.transpose(7).pitch_class()));
        assert!(to_root < to_fifth, "{chord}: root {to_root} fifth {to_fifth}");
    }
}

#[test]
fn test_chord_point_is_deterministic() {
    let spiral = TonalSpiral::default();
    let chord: Chord = "G7b9".parse().unwrap();
    let a = spiral.chord_point(&chord);
    let b = spiral.chord_point(&chord);
    assert_eq!(a.to_array(), b.to_array());
}

#[test]
fn test_tonic_triad_has_zero_tension() {
    let calc = TensionCalculator::default();
    for key in KEYS.iter() {
        assert_eq!(calc.tension(&key.tonic_triad(), key), 0.0, "key {key}");
    }
}

#[test]
fn test_tension_is_non_negative_and_finite() {
    let calc = TensionCalculator::default();
    let failures = Arc::new(Mutex::new(Vec::<String>::new()));

    KEYS.par_iter().for_each(|key| {
        let frame = calc.frame(*key);
        for chord in CHORDS.iter() {
            let t = frame.tension(chord);
            if !(t.is_finite() && t >= 0.0) {
                failures.lock().unwrap().push(format!("{chord} in {key}: {t}"));
            }
            if (t - calc.tension(chord, key)).abs() > 1e-12 {
                failures
                    .lock()
                    .unwrap()
                    .push(format!("{chord} in {key}: frame and calculator disagree"));
            }
        }
    });

    let failures = Arc::try_unwrap(failures).unwrap().into_inner().unwrap();
    assert!(failures.is_empty(), "{} failures:\n{}", failures.len(), failures.join("\n"));
}

#[test]
fn test_tension_is_transposition_invariant() {
    let calc = TensionCalculator::default();
    let failures = Arc::new(Mutex::new(Vec::<String>::new()));

    KEYS.par_iter().for_each(|key| {
        for chord in CHORDS.iter() {
            let base = calc.tension(chord, key);
            for shift in 1..12u8 {
                let moved_key = Key::new(key.tonic.transpose(shift), key.tonality);
                let moved = Chord {
                    root: chord.root.transpose(shift),
                    ..*chord
                };
                let t = calc.tension(&moved, &moved_key);
                if (t - base).abs() > 1e-12 {
                    failures
                        .lock()
                        .unwrap()
                        .push(format!("{chord} in {key} up {shift}: {base} vs {t}"));
                }
            }
        }
    });

    let failures = Arc::try_unwrap(failures).unwrap().into_inner().unwrap();
    assert!(failures.is_empty(), "{} failures:\n{}", failures.len(), failures.join("\n"));
}

#[test]
fn test_non_tonic_chords_have_tension() {
    let calc = TensionCalculator::default();
    let c_major = Key::new(NoteName::C, Tonality::Major);
    for symbol in ["G", "F", "Am", "Dm7", "C7", "Cm"] {
        let chord: Chord = symbol.parse().unwrap();
        assert!(calc.tension(&chord, &c_major) > 0.0, "{symbol}");
    }
}

#[test]
fn test_key_center_matches_frame() {
    let spiral = TonalSpiral::default();
    let calc = TensionCalculator::new(spiral);
    let a_minor = Key::new(NoteName::A, Tonality::Minor);
    let frame = calc.frame(a_minor);
    assert_eq!(frame.center(), spiral.key_point(&a_minor));
    assert_eq!(*frame.key(), a_minor);
}
