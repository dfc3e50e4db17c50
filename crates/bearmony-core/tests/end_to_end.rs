use bearmony_core::{
    chord_track, progression_track, ChordEngine, ExportOptions, NoteValue, PitchClass, PlaybackPattern, Tempo,
    TICKS_PER_BEAT,
};
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};

fn note_ons(smf: &Smf<'_>) -> Vec<(u8, u8)> {
    smf.tracks[0]
        .iter()
        .filter_map(|e| match e.kind {
            TrackEventKind::Midi { message: MidiMessage::NoteOn { key, vel }, .. } => Some((key.as_int(), vel.as_int())),
            _ => None,
        })
        .collect()
}

fn note_off_deltas(smf: &Smf<'_>) -> Vec<u32> {
    smf.tracks[0]
        .iter()
        .filter(|e| matches!(e.kind, TrackEventKind::Midi { message: MidiMessage::NoteOff { .. }, .. }))
        .map(|e| e.delta.as_int())
        .collect()
}

#[test]
fn c_major_triad_exports_one_tact_with_tempo() {
    let engine = ChordEngine::builtin().unwrap();
    let chord = engine.chord(PitchClass::C, 3, None, 0).unwrap();
    assert_eq!(chord.pitches, vec![60, 64, 67]);

    let options = ExportOptions { tempo: Tempo::new(120).unwrap(), tacts: 1, ..Default::default() };
    let bytes = chord_track(&chord, &options, &mut fastrand::Rng::with_seed(5))
        .unwrap()
        .encode()
        .unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    let tempo = smf.tracks[0].iter().find_map(|e| match e.kind {
        TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
        _ => None,
    });
    assert_eq!(tempo, Some(500_000));
    assert_eq!(note_ons(&smf), vec![(60, 75), (64, 75), (67, 75)]);
    assert_eq!(note_off_deltas(&smf), vec![TICKS_PER_BEAT as u32 * 4, 0, 0]);
}

#[test]
fn progression_resolves_and_exports_in_order() {
    let engine = ChordEngine::builtin().unwrap();
    let progression = engine.progression("I-IV-V-I", PitchClass::C, 3, None).unwrap();
    let roots: Vec<&str> = progression.chords.iter().map(|c| c.root.name()).collect();
    assert_eq!(roots, vec!["C", "F", "G", "C"]);
    let pitches: Vec<Vec<i32>> = progression.chords.iter().map(|c| c.pitches.clone()).collect();
    assert_eq!(
        pitches,
        vec![vec![60, 64, 67], vec![65, 69, 72], vec![67, 71, 74], vec![60, 64, 67]]
    );

    let options = ExportOptions { tacts: 2, include_velocity_info: false, ..Default::default() };
    let bytes = progression_track(&progression.chords, &options, &mut fastrand::Rng::with_seed(5))
        .unwrap()
        .encode()
        .unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    assert!(
        !smf.tracks[0]
            .iter()
            .any(|e| matches!(e.kind, TrackEventKind::Meta(MetaMessage::Tempo(_))))
    );
    let keys: Vec<u8> = note_ons(&smf).iter().map(|&(key, _)| key).collect();
    let one_pass: [u8; 12] = [60, 64, 67, 65, 69, 72, 67, 71, 74, 60, 64, 67];
    assert_eq!(keys, [one_pass, one_pass].concat());
    assert!(note_ons(&smf).iter().all(|&(_, vel)| vel == 100));
}

#[test]
fn arpeggio_export_uses_note_value_ticks() {
    let engine = ChordEngine::builtin().unwrap();
    let chord = engine.chord(PitchClass::parse("A").unwrap(), 3, Some("m"), -1).unwrap();
    let options = ExportOptions {
        tacts: 1,
        pattern: PlaybackPattern::ArpeggioDescending,
        note_value: NoteValue::Quarter,
        ..Default::default()
    };
    let bytes = chord_track(&chord, &options, &mut fastrand::Rng::with_seed(5))
        .unwrap()
        .encode()
        .unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    let keys: Vec<u8> = note_ons(&smf).iter().map(|&(key, _)| key).collect();
    assert_eq!(keys, vec![64, 60, 57]);
    assert_eq!(note_off_deltas(&smf), vec![480, 480, 480]);
}

#[test]
fn out_of_range_chord_fails_export_but_engine_recovers() {
    let engine = ChordEngine::builtin().unwrap();
    let high = engine.chord(PitchClass::parse("B").unwrap(), 7, None, 5).unwrap();
    let options = ExportOptions::default();
    let err = chord_track(&high, &options, &mut fastrand::Rng::with_seed(5))
        .unwrap()
        .encode()
        .unwrap_err();
    assert!(matches!(err, bearmony_core::BearmonyError::PitchOutOfRange(_)));

    let ok = engine.chord(PitchClass::parse("B").unwrap(), 7, None, 0).unwrap();
    assert!(chord_track(&ok, &options, &mut fastrand::Rng::with_seed(5)).unwrap().encode().is_ok());
}
