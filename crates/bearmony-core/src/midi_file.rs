//! Standard MIDI File encoding (format 0, one track)

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, TrackEvent, TrackEventKind};

use crate::chord::midi_pitch;
use crate::error::{BearmonyError, Result};
use crate::timing::{NoteValue, Tempo};

/// Fixed resolution for every exported file
pub const TICKS_PER_BEAT: u16 = 480;

const MAX_DELTA: u32 = 0x0FFF_FFFF;
const MAX_TEMPO: u32 = 0x00FF_FFFF;

/// One 4/4 bar
pub fn ticks_per_tact() -> u32 {
    TICKS_PER_BEAT as u32 * 4
}

/// Hold length of one note group for `note_value`; a whole note is one tact
pub fn group_ticks(note_value: NoteValue) -> u32 {
    ticks_per_tact() / note_value.denominator()
}

/// Notes switched on together and held for `ticks`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiGroup {
    pub pitches: Vec<i32>,
    pub velocity: u8,
    pub ticks: u32,
}

/// A single-track file: optional tempo followed by note groups in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiTrack {
    pub tempo: Option<Tempo>,
    pub groups: Vec<MidiGroup>,
}

impl MidiTrack {
    pub fn new(tempo: Option<Tempo>) -> Self {
        Self { tempo, groups: Vec::new() }
    }

    pub fn push(&mut self, group: MidiGroup) {
        self.groups.push(group);
    }

    /// Total length in ticks
    pub fn ticks(&self) -> u64 {
        self.groups.iter().filter(|g| !g.pitches.is_empty()).map(|g| g.ticks as u64).sum()
    }

    /// Serialize to SMF bytes.
    ///
    /// Every pitch is checked before anything is emitted, so an out-of-range
    /// pitch fails the whole encode rather than producing a partial track.
    /// For each group all note-ons go out at delta 0, then the first pitch's
    /// note-off carries the group's full duration and the rest follow at 0.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut checked = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let keys = group.pitches.iter().map(|&p| midi_pitch(p)).collect::<Result<Vec<u8>>>()?;
            if group.ticks > MAX_DELTA {
                return Err(BearmonyError::Midi(format!("group of {} ticks exceeds delta range", group.ticks)));
            }
            if !keys.is_empty() {
                checked.push((keys, group.velocity.clamp(1, 127), group.ticks));
            }
        }

        let mut events: Vec<TrackEvent<'static>> = Vec::new();
        if let Some(tempo) = self.tempo {
            let micros = tempo.micros_per_quarter();
            if micros > MAX_TEMPO {
                return Err(BearmonyError::Midi(format!("{} bpm is too slow for a tempo event", tempo.bpm())));
            }
            events.push(TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros))),
            });
        }

        for (keys, velocity, ticks) in checked {
            for &key in &keys {
                events.push(note(0, MidiMessage::NoteOn { key: u7::new(key), vel: u7::new(velocity) }));
            }
            for (i, &key) in keys.iter().enumerate() {
                let delta = if i == 0 { ticks } else { 0 };
                events.push(note(delta, MidiMessage::NoteOff { key: u7::new(key), vel: u7::new(0) }));
            }
        }

        events.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        let smf = Smf {
            header: Header::new(Format::SingleTrack, midly::Timing::Metrical(u15::new(TICKS_PER_BEAT))),
            tracks: vec![events],
        };
        let mut bytes = Vec::new();
        smf.write(&mut bytes).map_err(|e| BearmonyError::Midi(e.to_string()))?;
        Ok(bytes)
    }
}

fn note(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi { channel: u4::new(0), message },
    }
}
