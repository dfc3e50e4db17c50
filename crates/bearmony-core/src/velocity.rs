//! Velocity curves: base volume + mode -> note-on velocity

use serde::{Deserialize, Serialize};

use crate::error::{BearmonyError, Result};
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VelocityMode {
    Light,
    #[default]
    Normal,
    Strong,
    /// Random per note between the Light value and full volume
    Dynamic,
}

impl VelocityMode {
    pub const ALL: [Self; 4] = [Self::Light, Self::Normal, Self::Strong, Self::Dynamic];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Normal => "Normal",
            Self::Strong => "Strong",
            Self::Dynamic => "Dynamic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Base volume and velocity mode.
///
/// Every velocity produced is at least 1: a note-on with velocity 0 is a
/// note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDynamics")]
pub struct Dynamics {
    volume: u8,
    pub mode: VelocityMode,
}

impl Default for Dynamics {
    fn default() -> Self {
        Self { volume: 100, mode: VelocityMode::Normal }
    }
}

impl Dynamics {
    pub fn new(volume: u8, mode: VelocityMode) -> Result<Self> {
        if volume > 127 {
            return Err(BearmonyError::InvalidVolume(volume));
        }
        Ok(Self { volume, mode })
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Lowest and highest velocity this curve can emit
    pub fn range(&self) -> (u8, u8) {
        let v = self.volume;
        match self.mode {
            VelocityMode::Light => fixed(scaled(v, 0.5)),
            VelocityMode::Normal => fixed(scaled(v, 0.75)),
            VelocityMode::Strong => fixed(v.max(1)),
            VelocityMode::Dynamic => {
                let low = scaled(v, 0.5);
                (low, v.max(low))
            }
        }
    }

    /// Velocity for one note; Dynamic draws a fresh value on every call
    pub fn velocity(&self, rng: &mut impl RandomSource) -> u8 {
        let (low, high) = self.range();
        if low == high {
            low
        } else {
            rng.inclusive(low, high)
        }
    }
}

#[derive(Deserialize)]
struct RawDynamics {
    volume: u8,
    mode: VelocityMode,
}

impl TryFrom<RawDynamics> for Dynamics {
    type Error = BearmonyError;

    fn try_from(raw: RawDynamics) -> Result<Self> {
        Self::new(raw.volume, raw.mode)
    }
}

fn scaled(volume: u8, factor: f64) -> u8 {
    ((volume as f64 * factor).round() as u8).max(1)
}

fn fixed(v: u8) -> (u8, u8) {
    (v, v)
}
