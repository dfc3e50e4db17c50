//! Pattern sequencing: chord pitches -> timed note groups
//!
//! A chord is realized either as one simultaneous group (Chord) or as a
//! run of single-note groups (the arpeggio patterns). Timing inside a
//! realization is relative: `start` is measured from the first group.

use serde::{Deserialize, Serialize};

use crate::error::{BearmonyError, Result};
use crate::random::RandomSource;
use crate::velocity::Dynamics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackPattern {
    #[default]
    Chord,
    ArpeggioAscending,
    ArpeggioDescending,
    /// Up then back down, turnaround note played once
    UpDown,
    /// Fresh random order on every realization
    RandomArpeggio,
}

impl PlaybackPattern {
    pub const ALL: [Self; 5] = [
        Self::Chord,
        Self::ArpeggioAscending,
        Self::ArpeggioDescending,
        Self::UpDown,
        Self::RandomArpeggio,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chord => "Chord",
            Self::ArpeggioAscending => "Arpeggio Asc",
            Self::ArpeggioDescending => "Arpeggio Desc",
            Self::UpDown => "Up-Down",
            Self::RandomArpeggio => "Random Arp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn is_arpeggio(&self) -> bool {
        !matches!(self, Self::Chord)
    }

    /// Number of note events one playthrough of an `n`-note chord takes
    pub fn event_count(&self, n: usize) -> usize {
        match self {
            Self::Chord => 1,
            Self::UpDown => (2 * n).saturating_sub(1),
            _ => n,
        }
    }
}

/// Long-short ratio for alternating arpeggio notes, 0.0 = straight
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Swing(f64);

impl Swing {
    pub fn new(ratio: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(BearmonyError::InvalidSwing(ratio));
        }
        Ok(Self(ratio))
    }

    pub fn ratio(self) -> f64 {
        self.0
    }

    /// Duration factor for the event at `index` (0-based)
    fn factor(self, index: usize) -> f64 {
        if index % 2 == 0 { 1.0 + self.0 } else { 1.0 - self.0 }
    }
}

impl TryFrom<f64> for Swing {
    type Error = BearmonyError;

    fn try_from(ratio: f64) -> Result<Self> {
        Self::new(ratio)
    }
}

impl From<Swing> for f64 {
    fn from(swing: Swing) -> Self {
        swing.0
    }
}

/// A single sounding note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: i32,
    pub velocity: u8,
    /// Seconds from the start of the realization
    pub start: f64,
    /// Seconds between note-on and note-off
    pub hold: f64,
}

/// Notes that start and stop together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteGroup {
    pub pitches: Vec<i32>,
    pub velocity: u8,
    pub start: f64,
    pub hold: f64,
}

impl NoteGroup {
    pub fn events(&self) -> impl Iterator<Item = NoteEvent> + '_ {
        self.pitches.iter().map(|&pitch| NoteEvent {
            pitch,
            velocity: self.velocity,
            start: self.start,
            hold: self.hold,
        })
    }
}

/// Order the pitches of a chord into note groups for `pattern`
pub fn arrange<R: RandomSource>(pitches: &[i32], pattern: PlaybackPattern, rng: &mut R) -> Vec<Vec<i32>> {
    let order: Vec<i32> = match pattern {
        PlaybackPattern::Chord => return vec![pitches.to_vec()],
        PlaybackPattern::ArpeggioAscending => pitches.to_vec(),
        PlaybackPattern::ArpeggioDescending => pitches.iter().rev().copied().collect(),
        PlaybackPattern::UpDown => pitches
            .iter()
            .copied()
            .chain(pitches.iter().rev().skip(1).copied())
            .collect(),
        PlaybackPattern::RandomArpeggio => {
            let mut shuffled = pitches.to_vec();
            rng.shuffle(shuffled.as_mut_slice());
            shuffled
        }
    };
    order.into_iter().map(|p| vec![p]).collect()
}

/// Pattern, swing and dynamics applied to each chord realization
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sequencer {
    pub pattern: PlaybackPattern,
    pub swing: Swing,
    pub dynamics: Dynamics,
}

impl Sequencer {
    pub fn new(pattern: PlaybackPattern) -> Self {
        Self { pattern, ..Default::default() }
    }

    pub fn with_swing(mut self, swing: Swing) -> Self {
        self.swing = swing;
        self
    }

    pub fn with_dynamics(mut self, dynamics: Dynamics) -> Self {
        self.dynamics = dynamics;
        self
    }

    /// Realize one chord over `span` seconds.
    ///
    /// Chord pattern: one group held for the whole span. Arpeggios: each of
    /// the `L` groups gets `span / L`, stretched by `1 + swing` on even
    /// indices and shrunk by `1 - swing` on odd ones when `L > 1`.
    pub fn realize<R: RandomSource>(&self, pitches: &[i32], span: f64, rng: &mut R) -> Result<Vec<NoteGroup>> {
        if pitches.is_empty() {
            return Err(BearmonyError::EmptyChord);
        }

        let steps = arrange(pitches, self.pattern, &mut *rng);
        if !self.pattern.is_arpeggio() {
            return Ok(steps
                .into_iter()
                .map(|pitches| NoteGroup { pitches, velocity: self.dynamics.velocity(&mut *rng), start: 0.0, hold: span })
                .collect());
        }

        let base = span / steps.len() as f64;
        let swung = steps.len() > 1;
        let mut start = 0.0;
        let mut groups = Vec::with_capacity(steps.len());
        for (i, pitches) in steps.into_iter().enumerate() {
            let hold = if swung { base * self.swing.factor(i) } else { base };
            groups.push(NoteGroup { pitches, velocity: self.dynamics.velocity(&mut *rng), start, hold });
            start += hold;
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::testing::Scripted;
    use crate::velocity::VelocityMode;

    const TRIAD: [i32; 3] = [60, 64, 67];

    fn flat(groups: &[NoteGroup]) -> Vec<i32> {
        groups.iter().flat_map(|g| g.pitches.iter().copied()).collect()
    }

    fn rng() -> fastrand::Rng {
        fastrand::Rng::with_seed(11)
    }

    #[test]
    fn test_chord_is_single_group() {
        let groups = Sequencer::new(PlaybackPattern::Chord).realize(&TRIAD, 2.0, &mut rng()).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pitches, TRIAD.to_vec());
        assert_eq!(groups[0].start, 0.0);
        assert_eq!(groups[0].hold, 2.0);
        assert_eq!(groups[0].events().count(), 3);
    }

    #[test]
    fn test_swing_ignored_for_chord() {
        let seq = Sequencer::new(PlaybackPattern::Chord).with_swing(Swing::new(0.5).unwrap());
        let groups = seq.realize(&TRIAD, 1.0, &mut rng()).unwrap();
        assert_eq!(groups[0].hold, 1.0);
    }

    #[test]
    fn test_arpeggio_orders() {
        let asc = Sequencer::new(PlaybackPattern::ArpeggioAscending).realize(&TRIAD, 3.0, &mut rng()).unwrap();
        assert_eq!(flat(&asc), vec![60, 64, 67]);
        let desc = Sequencer::new(PlaybackPattern::ArpeggioDescending).realize(&TRIAD, 3.0, &mut rng()).unwrap();
        assert_eq!(flat(&desc), vec![67, 64, 60]);
        // Formula order is kept, not sorted
        let unsorted = Sequencer::new(PlaybackPattern::ArpeggioAscending).realize(&[64, 60, 67], 3.0, &mut rng()).unwrap();
        assert_eq!(flat(&unsorted), vec![64, 60, 67]);
    }

    #[test]
    fn test_up_down() {
        let groups = Sequencer::new(PlaybackPattern::UpDown).realize(&TRIAD, 5.0, &mut rng()).unwrap();
        assert_eq!(flat(&groups), vec![60, 64, 67, 64, 60]);
        for n in 1..8 {
            let pitches: Vec<i32> = (0..n).map(|i| 60 + i).collect();
            let groups = Sequencer::new(PlaybackPattern::UpDown).realize(&pitches, 1.0, &mut rng()).unwrap();
            assert_eq!(groups.len(), 2 * n as usize - 1);
            assert_eq!(groups.len(), PlaybackPattern::UpDown.event_count(n as usize));
        }
    }

    #[test]
    fn test_random_arpeggio_is_permutation() {
        let pitches = [60, 63, 67, 70, 74, 60];
        let mut sorted_input = pitches.to_vec();
        sorted_input.sort();
        let seq = Sequencer::new(PlaybackPattern::RandomArpeggio);
        let mut rng = fastrand::Rng::with_seed(99);
        let mut orders = std::collections::HashSet::new();
        for _ in 0..300 {
            let mut out = flat(&seq.realize(&pitches, 1.0, &mut rng).unwrap());
            orders.insert(out.clone());
            out.sort();
            assert_eq!(out, sorted_input);
        }
        assert!(orders.len() > 1, "random arpeggio never changed order");
    }

    #[test]
    fn test_random_arpeggio_with_scripted_source() {
        let seq = Sequencer::new(PlaybackPattern::RandomArpeggio);
        let groups = seq.realize(&TRIAD, 3.0, &mut Scripted::new(&[0, 1])).unwrap();
        assert_eq!(flat(&groups), vec![67, 64, 60]);
    }

    #[test]
    fn test_equal_split_without_swing() {
        let groups = Sequencer::new(PlaybackPattern::ArpeggioAscending).realize(&[60, 64, 67, 71], 2.0, &mut rng()).unwrap();
        let holds: Vec<f64> = groups.iter().map(|g| g.hold).collect();
        let starts: Vec<f64> = groups.iter().map(|g| g.start).collect();
        assert_eq!(holds, vec![0.5; 4]);
        assert_eq!(starts, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_swing_alternates_long_short() {
        let seq = Sequencer::new(PlaybackPattern::ArpeggioAscending).with_swing(Swing::new(0.5).unwrap());
        let groups = seq.realize(&[60, 64, 67, 71], 4.0, &mut rng()).unwrap();
        let holds: Vec<f64> = groups.iter().map(|g| g.hold).collect();
        assert_eq!(holds, vec![1.5, 0.5, 1.5, 0.5]);
        assert_eq!(groups[2].start, 2.0);
    }

    #[test]
    fn test_swing_resets_per_realization() {
        let seq = Sequencer::new(PlaybackPattern::UpDown).with_swing(Swing::new(0.25).unwrap());
        let mut rng = rng();
        let first = seq.realize(&TRIAD, 5.0, &mut rng).unwrap();
        let second = seq.realize(&TRIAD, 5.0, &mut rng).unwrap();
        // Odd-length realization: the second starts long again
        assert_eq!(first[0].hold, 1.25);
        assert_eq!(second[0].hold, 1.25);
        assert_eq!(first[4].hold, 1.25);
    }

    #[test]
    fn test_single_note_arpeggio_not_swung() {
        let seq = Sequencer::new(PlaybackPattern::ArpeggioAscending).with_swing(Swing::new(0.9).unwrap());
        let groups = seq.realize(&[60], 1.0, &mut rng()).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].hold, 1.0);
    }

    #[test]
    fn test_velocity_per_note() {
        let dynamics = Dynamics::new(100, VelocityMode::Dynamic).unwrap();
        let seq = Sequencer::new(PlaybackPattern::ArpeggioAscending).with_dynamics(dynamics);
        let groups = seq.realize(&TRIAD, 1.0, &mut Scripted::new(&[0, 50, 10])).unwrap();
        let velocities: Vec<u8> = groups.iter().map(|g| g.velocity).collect();
        assert_eq!(velocities, vec![50, 100, 60]);

        let chord = Sequencer::new(PlaybackPattern::Chord).with_dynamics(dynamics);
        let groups = chord.realize(&TRIAD, 1.0, &mut Scripted::new(&[25])).unwrap();
        assert!(groups[0].events().all(|e| e.velocity == 75));
    }

    #[test]
    fn test_empty_chord_rejected() {
        assert!(matches!(
            Sequencer::default().realize(&[], 1.0, &mut rng()),
            Err(BearmonyError::EmptyChord)
        ));
    }

    #[test]
    fn test_swing_bounds() {
        assert!(Swing::new(0.0).is_ok());
        assert!(Swing::new(1.0).is_ok());
        assert!(matches!(Swing::new(1.5), Err(BearmonyError::InvalidSwing(_))));
        assert!(Swing::new(-0.1).is_err());
        assert!(Swing::new(f64::NAN).is_err());
    }

    #[test]
    fn test_pattern_names_round_trip() {
        for pattern in PlaybackPattern::ALL {
            assert_eq!(PlaybackPattern::from_name(pattern.name()), Some(pattern));
        }
        assert_eq!(PlaybackPattern::from_name("up-down"), Some(PlaybackPattern::UpDown));
    }
}
