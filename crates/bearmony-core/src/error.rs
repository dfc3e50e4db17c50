//! Error types for bearmony

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BearmonyError {
    #[error("Failed to load {table}: {reason}")]
    TableLoad { table: String, reason: String },
    #[error("Invalid Roman numeral: {0}")]
    InvalidDegree(String),
    #[error("Invalid tempo: {0} BPM (must be > 0)")]
    InvalidTempo(i32),
    #[error("Pitch {0} is outside the MIDI range 0..=127")]
    PitchOutOfRange(i32),
    #[error("Invalid note value: {0} (expected 1, 2, 4, 8 or 16)")]
    InvalidNoteValue(u32),
    #[error("Invalid swing ratio: {0} (expected 0.0..=1.0)")]
    InvalidSwing(f64),
    #[error("Invalid volume: {0} (expected 0..=127)")]
    InvalidVolume(u8),
    #[error("Unknown root note: {0}")]
    UnknownRoot(String),
    #[error("No chord formulas with {0} notes")]
    UnknownChordSize(usize),
    #[error("Unknown {size}-note chord type: {name}")]
    UnknownChordType { size: usize, name: String },
    #[error("Unknown progression: {0}")]
    UnknownProgression(String),
    #[error("Invalid export length: {0} tacts (must be >= 1)")]
    InvalidTacts(u32),
    #[error("Chord has no notes")]
    EmptyChord,
    #[error("MIDI encoding error: {0}")]
    Midi(String),
}

impl BearmonyError {
    pub(crate) fn table_load(table: impl Into<String>, reason: impl ToString) -> Self {
        Self::TableLoad { table: table.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, BearmonyError>;
