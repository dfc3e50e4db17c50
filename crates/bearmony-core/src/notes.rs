//! Pitch classes, note names and the General MIDI instrument list

use serde::{Deserialize, Serialize};

use crate::error::{BearmonyError, Result};

/// Chromatic note names, indexed by pitch class starting at C
pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Middle C; chord roots are placed relative to it
pub const MIDDLE_C: i32 = 60;

/// A note name without octave, 0 = C .. 11 = B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: Self = Self(0);

    /// Wraps any integer into 0..12
    pub fn new(value: i32) -> Self {
        Self(value.rem_euclid(12) as u8)
    }

    /// Parse a note name such as `C`, `f#` or `Bb`
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next().map(|c| c.to_ascii_uppercase());
        let base = match letter {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(BearmonyError::UnknownRoot(name.to_string())),
        };
        // E#, B#, Cb and Fb are not on the note list
        let pc = match (base, chars.as_str()) {
            (base, "") => base,
            (4 | 11, "#" | "♯") | (0 | 5, "b" | "♭") => {
                return Err(BearmonyError::UnknownRoot(name.to_string()));
            }
            (base, "#" | "♯") => base + 1,
            (base, "b" | "♭") => base - 1,
            _ => return Err(BearmonyError::UnknownRoot(name.to_string())),
        };
        Ok(Self::new(pc))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.0 as usize]
    }

    /// Move up by a number of semitones, wrapping at the octave
    pub fn transpose(self, semitones: i32) -> Self {
        Self::new(self.0 as i32 + semitones)
    }
}

impl TryFrom<u8> for PitchClass {
    type Error = BearmonyError;

    fn try_from(value: u8) -> Result<Self> {
        if value < 12 {
            Ok(Self(value))
        } else {
            Err(BearmonyError::UnknownRoot(value.to_string()))
        }
    }
}

impl From<PitchClass> for u8 {
    fn from(pc: PitchClass) -> Self {
        pc.0
    }
}

impl std::fmt::Display for PitchClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Scientific pitch name for a MIDI note, e.g. 60 -> `C4`
pub fn note_name(pitch: i32) -> String {
    format!("{}{}", PitchClass::new(pitch).name(), pitch.div_euclid(12) - 1)
}

/// Display label for a chord, e.g. `C` + `maj7` -> `Cmaj7`
pub fn chord_label(root: PitchClass, chord_type: &str) -> String {
    format!("{}{}", root.name(), chord_type)
}

/// General MIDI programs offered for playback
pub const INSTRUMENTS: [(&str, u8); 15] = [
    ("Acoustic Piano", 0),
    ("Electric Piano", 4),
    ("Organ", 100),
    ("Hammond Organ", 19),
    ("Acoustic Grand", 1),
    ("Bright Acoustic", 2),
    ("Electric Grand", 3),
    ("Honky Tonk", 5),
    ("Acoustic Guitar", 24),
    ("Electric Guitar", 27),
    ("Bass", 32),
    ("Violin", 40),
    ("Cello", 42),
    ("Trumpet", 56),
    ("Sax", 64),
];

/// Look up a GM program number by instrument name (case-insensitive)
pub fn instrument_program(name: &str) -> Option<u8> {
    INSTRUMENTS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
        .map(|&(_, program)| program)
}
