//! bearmony-services: live playback and MIDI file export

pub mod midi_export;
pub mod playback;
pub mod synth;

pub use midi_export::{export_chord, export_progression, with_mid_extension, write_track, ExportError};
pub use playback::{
    CancelToken, PlaybackError, PlaybackEvent, PlaybackHandle, PlaybackRequest, Player, Repeat,
};
pub use synth::{ConsoleSynth, Reverb, Synth, REVERB_WIDTH};
