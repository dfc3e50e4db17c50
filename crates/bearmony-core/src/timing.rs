//! Tempo and note-value arithmetic

use serde::{Deserialize, Serialize};

use crate::error::{BearmonyError, Result};
use crate::sequencer::PlaybackPattern;

/// Beats per minute, always > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Tempo(u32);

impl Tempo {
    pub fn new(bpm: i32) -> Result<Self> {
        if bpm <= 0 {
            return Err(BearmonyError::InvalidTempo(bpm));
        }
        Ok(Self(bpm as u32))
    }

    pub fn bpm(self) -> u32 {
        self.0
    }

    /// Seconds per beat (quarter note)
    pub fn beat_seconds(self) -> f64 {
        60.0 / self.0 as f64
    }

    /// MIDI tempo: microseconds per quarter note
    pub fn micros_per_quarter(self) -> u32 {
        60_000_000 / self.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(120)
    }
}

impl TryFrom<i32> for Tempo {
    type Error = BearmonyError;

    fn try_from(bpm: i32) -> Result<Self> {
        Self::new(bpm)
    }
}

impl From<Tempo> for i32 {
    fn from(tempo: Tempo) -> Self {
        tempo.0 as i32
    }
}

/// Note length as the denominator of a whole note (4 = quarter = one beat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum NoteValue {
    Whole,
    Half,
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
}

impl NoteValue {
    pub const ALL: [Self; 5] = [Self::Whole, Self::Half, Self::Quarter, Self::Eighth, Self::Sixteenth];

    pub fn denominator(self) -> u32 {
        match self {
            Self::Whole => 1,
            Self::Half => 2,
            Self::Quarter => 4,
            Self::Eighth => 8,
            Self::Sixteenth => 16,
        }
    }

    /// Length in beats
    pub fn beats(self) -> f64 {
        4.0 / self.denominator() as f64
    }
}

impl TryFrom<u32> for NoteValue {
    type Error = BearmonyError;

    fn try_from(denominator: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.denominator() == denominator)
            .ok_or(BearmonyError::InvalidNoteValue(denominator))
    }
}

impl From<NoteValue> for u32 {
    fn from(value: NoteValue) -> Self {
        value.denominator()
    }
}

/// Converts tempo and note value into wall-clock durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timing {
    pub tempo: Tempo,
    pub note_value: NoteValue,
}

impl Timing {
    pub fn new(tempo: Tempo, note_value: NoteValue) -> Self {
        Self { tempo, note_value }
    }

    pub fn beat_seconds(&self) -> f64 {
        self.tempo.beat_seconds()
    }

    /// Length of a single note event
    pub fn event_seconds(&self) -> f64 {
        self.beat_seconds() * self.note_value.beats()
    }

    /// One playthrough of a `chord_size`-note chord in `pattern`
    pub fn playthrough_seconds(&self, pattern: PlaybackPattern, chord_size: usize) -> f64 {
        self.event_seconds() * pattern.event_count(chord_size) as f64
    }

    pub fn total_seconds(&self, pattern: PlaybackPattern, chord_size: usize, loops: u32) -> f64 {
        self.playthrough_seconds(pattern, chord_size) * loops as f64
    }
}

/// Length of a MIDI export in seconds: 4/4 tacts at `tempo`
pub fn export_seconds(tempo: Tempo, tacts: u32) -> f64 {
    tacts as f64 * 4.0 * tempo.beat_seconds()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(bpm: i32, denominator: u32) -> Timing {
        Timing::new(Tempo::new(bpm).unwrap(), NoteValue::try_from(denominator).unwrap())
    }

    #[test]
    fn test_event_duration() {
        assert_eq!(timing(120, 4).event_seconds(), 0.5);
        assert_eq!(timing(120, 1).event_seconds(), 2.0);
        assert_eq!(timing(120, 8).event_seconds(), 0.25);
        assert_eq!(timing(60, 16).event_seconds(), 0.25);
    }

    #[test]
    fn test_playthrough_per_pattern() {
        let t = timing(120, 4);
        assert_eq!(t.playthrough_seconds(PlaybackPattern::Chord, 4), 0.5);
        assert_eq!(t.playthrough_seconds(PlaybackPattern::ArpeggioAscending, 4), 2.0);
        assert_eq!(t.playthrough_seconds(PlaybackPattern::ArpeggioDescending, 3), 1.5);
        assert_eq!(t.playthrough_seconds(PlaybackPattern::RandomArpeggio, 3), 1.5);
        assert_eq!(t.playthrough_seconds(PlaybackPattern::UpDown, 3), 2.5);
    }

    #[test]
    fn test_total_scales_with_loops() {
        let t = timing(120, 4);
        assert_eq!(t.total_seconds(PlaybackPattern::UpDown, 3, 4), 10.0);
        assert_eq!(t.total_seconds(PlaybackPattern::Chord, 3, 0), 0.0);
    }

    #[test]
    fn test_invalid_tempo() {
        assert!(matches!(Tempo::new(0), Err(BearmonyError::InvalidTempo(0))));
        assert!(matches!(Tempo::new(-90), Err(BearmonyError::InvalidTempo(-90))));
        assert_eq!(Tempo::new(1).unwrap().bpm(), 1);
    }

    #[test]
    fn test_invalid_note_value() {
        for bad in [0, 3, 5, 32] {
            assert!(matches!(NoteValue::try_from(bad), Err(BearmonyError::InvalidNoteValue(v)) if v == bad));
        }
    }

    #[test]
    fn test_micros_per_quarter() {
        assert_eq!(Tempo::new(120).unwrap().micros_per_quarter(), 500_000);
        assert_eq!(Tempo::new(60).unwrap().micros_per_quarter(), 1_000_000);
    }

    #[test]
    fn test_export_seconds() {
        assert_eq!(export_seconds(Tempo::new(120).unwrap(), 4), 8.0);
        assert_eq!(export_seconds(Tempo::new(60).unwrap(), 3), 12.0);
    }

    #[test]
    fn test_serde_rejects_bad_values() {
        assert!(serde_json::from_str::<Tempo>("0").is_err());
        assert_eq!(serde_json::from_str::<Tempo>("96").unwrap().bpm(), 96);
        assert!(serde_json::from_str::<NoteValue>("3").is_err());
        assert_eq!(serde_json::from_str::<NoteValue>("8").unwrap(), NoteValue::Eighth);
    }
}
