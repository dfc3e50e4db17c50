//! Chord building: root + octave shift + formula -> absolute pitches

use serde::{Deserialize, Serialize};

use crate::error::{BearmonyError, Result};
use crate::notes::{note_name, PitchClass, MIDDLE_C};
use crate::tables::{ChordFormula, ProgressionSpec};

/// Absolute pitches of one chord, in formula order.
///
/// Pitches are not clamped: anything outside 0..=127 is reported by
/// [`ResolvedChord::midi_pitches`] and by the MIDI encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedChord {
    pub root: PitchClass,
    pub pitches: Vec<i32>,
}

impl ResolvedChord {
    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Pitches as MIDI note numbers, failing on the first one out of range
    pub fn midi_pitches(&self) -> Result<Vec<u8>> {
        self.pitches.iter().map(|&p| midi_pitch(p)).collect()
    }

    /// Note names such as `C4, E4, G4`
    pub fn note_names(&self) -> Vec<String> {
        self.pitches.iter().map(|&p| note_name(p)).collect()
    }
}

/// Check that a pitch is a valid MIDI note number
pub fn midi_pitch(pitch: i32) -> Result<u8> {
    u8::try_from(pitch)
        .ok()
        .filter(|&p| p <= 127)
        .ok_or(BearmonyError::PitchOutOfRange(pitch))
}

/// `60 + root + 12 * octave + interval` for each interval of the formula
pub fn build_chord(root: PitchClass, octave: i32, intervals: &[u8]) -> ResolvedChord {
    let base = MIDDLE_C + root.index() as i32 + 12 * octave;
    ResolvedChord {
        root,
        pitches: intervals.iter().map(|&i| base + i as i32).collect(),
    }
}

/// Chords for every step of a progression in the key of `tonic`.
///
/// Each step's root is `(tonic + degree offset) mod 12` and is voiced from
/// middle C; progressions do not take an octave shift.
pub fn build_progression(
    tonic: PitchClass,
    progression: &ProgressionSpec,
    formula: &ChordFormula,
) -> Result<Vec<ResolvedChord>> {
    progression
        .offsets()?
        .into_iter()
        .map(|offset| Ok(build_chord(tonic.transpose(offset as i32), 0, &formula.intervals)))
        .collect()
}
