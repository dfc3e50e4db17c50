//! Export planning: resolved chords -> MIDI track

use serde::{Deserialize, Serialize};

use crate::chord::ResolvedChord;
use crate::error::{BearmonyError, Result};
use crate::midi_file::{group_ticks, MidiGroup, MidiTrack};
use crate::random::RandomSource;
use crate::sequencer::{arrange, PlaybackPattern};
use crate::timing::{export_seconds, NoteValue, Tempo};
use crate::velocity::Dynamics;

/// Velocity written for every note when velocity info is left out
pub const FLAT_VELOCITY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub tempo: Tempo,
    /// Repetitions of the whole chord or progression
    pub tacts: u32,
    /// Write the tempo event and curve velocities; otherwise every note is 100
    pub include_velocity_info: bool,
    pub note_value: NoteValue,
    pub pattern: PlaybackPattern,
    pub dynamics: Dynamics,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            tempo: Tempo::default(),
            tacts: 4,
            include_velocity_info: true,
            note_value: NoteValue::Whole,
            pattern: PlaybackPattern::Chord,
            dynamics: Dynamics::default(),
        }
    }
}

impl ExportOptions {
    /// Wall-clock length as shown next to the tacts setting
    pub fn seconds(&self) -> f64 {
        export_seconds(self.tempo, self.tacts)
    }
}

/// Track for a single chord repeated `tacts` times
pub fn chord_track<R: RandomSource>(chord: &ResolvedChord, options: &ExportOptions, rng: &mut R) -> Result<MidiTrack> {
    build_track(std::slice::from_ref(chord), options, rng)
}

/// Track for a whole progression, the full sequence repeated `tacts` times
pub fn progression_track<R: RandomSource>(
    chords: &[ResolvedChord],
    options: &ExportOptions,
    rng: &mut R,
) -> Result<MidiTrack> {
    build_track(chords, options, rng)
}

fn build_track<R: RandomSource>(chords: &[ResolvedChord], options: &ExportOptions, rng: &mut R) -> Result<MidiTrack> {
    if options.tacts == 0 {
        return Err(BearmonyError::InvalidTacts(0));
    }
    if chords.is_empty() || chords.iter().any(ResolvedChord::is_empty) {
        return Err(BearmonyError::EmptyChord);
    }

    let ticks = group_ticks(options.note_value);
    let tempo = options.include_velocity_info.then_some(options.tempo);
    let mut track = MidiTrack::new(tempo);
    for _ in 0..options.tacts {
        for chord in chords {
            for pitches in arrange(&chord.pitches, options.pattern, &mut *rng) {
                let velocity = if options.include_velocity_info {
                    options.dynamics.velocity(&mut *rng)
                } else {
                    FLAT_VELOCITY
                };
                track.push(MidiGroup { pitches, velocity, ticks });
            }
        }
    }
    Ok(track)
}
