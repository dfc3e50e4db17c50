//! bearmony-core: chord and progression engine
//!
//! Pure computation only: table lookup, Roman-numeral resolution, chord
//! building, pattern sequencing, velocity curves, timing and MIDI encoding.

pub mod chord;
pub mod engine;
mod error;
pub mod export;
pub mod midi_file;
pub mod notes;
pub mod random;
mod roman;
pub mod sequencer;
pub mod tables;
pub mod timing;
pub mod velocity;

pub use chord::{build_chord, build_progression, midi_pitch, ResolvedChord};
pub use engine::{ChordEngine, ResolvedProgression};
pub use error::{BearmonyError, Result};
pub use export::{chord_track, progression_track, ExportOptions};
pub use midi_file::{MidiGroup, MidiTrack, TICKS_PER_BEAT};
pub use notes::{chord_label, instrument_program, note_name, PitchClass, INSTRUMENTS, NOTE_NAMES};
pub use random::RandomSource;
pub use roman::roman_to_offset;
pub use sequencer::{NoteEvent, NoteGroup, PlaybackPattern, Sequencer, Swing};
pub use tables::{ChordFormula, ChordTable, ProgressionSpec, ProgressionTable, Tables};
pub use timing::{export_seconds, NoteValue, Tempo, Timing};
pub use velocity::{Dynamics, VelocityMode};
