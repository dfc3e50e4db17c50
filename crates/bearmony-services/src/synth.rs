//! Synthesizer capability used by the playback driver

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::playback::PlaybackError;

/// Reverb width is not user-adjustable
pub const REVERB_WIDTH: f32 = 0.5;

/// Anything that can sound MIDI notes.
///
/// Playback only talks to the synth through this trait; the pure engine
/// never sees it.
pub trait Synth: Send {
    fn program_select(&mut self, channel: u8, program: u8);
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, pitch: u8);
    fn set_reverb(&mut self, reverb: &Reverb);
}

/// Reverb settings passed through to the synth unchanged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReverb")]
pub struct Reverb {
    room_size: f32,
    damping: f32,
    level: f32,
}

impl Default for Reverb {
    fn default() -> Self {
        Self { room_size: 0.5, damping: 0.5, level: 0.5 }
    }
}

impl Reverb {
    /// Each parameter must be within 0.0..=1.0
    pub fn new(room_size: f32, damping: f32, level: f32) -> Result<Self, PlaybackError> {
        for (name, value) in [("room size", room_size), ("damping", damping), ("level", level)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PlaybackError::InvalidReverb { name, value });
            }
        }
        Ok(Self { room_size, damping, level })
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn width(&self) -> f32 {
        REVERB_WIDTH
    }
}

#[derive(Deserialize)]
struct RawReverb {
    room_size: f32,
    damping: f32,
    level: f32,
}

impl TryFrom<RawReverb> for Reverb {
    type Error = PlaybackError;

    fn try_from(raw: RawReverb) -> Result<Self, PlaybackError> {
        Self::new(raw.room_size, raw.damping, raw.level)
    }
}

/// Synth that only logs what it would play
#[derive(Debug, Default)]
pub struct ConsoleSynth {
    sounding: usize,
}

impl ConsoleSynth {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Synth for ConsoleSynth {
    fn program_select(&mut self, channel: u8, program: u8) {
        info!(channel, program, "Program select");
    }

    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.sounding += 1;
        info!(channel, pitch, velocity, note = %bearmony_core::note_name(pitch as i32), "Note on");
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        self.sounding = self.sounding.saturating_sub(1);
        debug!(channel, pitch, sounding = self.sounding, "Note off");
    }

    fn set_reverb(&mut self, reverb: &Reverb) {
        info!(
            room_size = reverb.room_size(),
            damping = reverb.damping(),
            level = reverb.level(),
            width = reverb.width(),
            "Reverb"
        );
    }
}
