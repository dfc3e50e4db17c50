//! Chord-formula and progression tables
//!
//! Both tables are read once from JSON objects (name -> list) and are
//! immutable afterwards. Key order from the file is preserved: the first
//! chord type listed for a size is that size's default type.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{BearmonyError, Result};
use crate::roman::roman_to_offset;

const BUILTIN_CHORD_FORMULAS: &str = include_str!("../data/chord_formulas.json");
const BUILTIN_PROGRESSIONS: &str = include_str!("../data/progressions.json");

const CHORD_TABLE: &str = "chord formulas";
const PROGRESSION_TABLE: &str = "progressions";

/// Named set of semitone offsets from a chord root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordFormula {
    pub name: String,
    pub intervals: Vec<u8>,
}

impl ChordFormula {
    /// Number of notes in the chord
    pub fn size(&self) -> usize {
        self.intervals.len()
    }
}

/// Chord formulas grouped by chord size
#[derive(Debug, Clone, Default)]
pub struct ChordTable {
    groups: BTreeMap<usize, Vec<ChordFormula>>,
}

impl ChordTable {
    /// Build from (name, intervals) pairs, keeping their order within each size
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let mut groups: BTreeMap<usize, Vec<ChordFormula>> = BTreeMap::new();
        for (name, intervals) in entries {
            let name = name.into();
            if intervals.is_empty() {
                return Err(BearmonyError::table_load(CHORD_TABLE, format!("'{name}' has no intervals")));
            }
            if let Some(bad) = intervals.iter().find(|&&i| i > 127) {
                return Err(BearmonyError::table_load(
                    CHORD_TABLE,
                    format!("'{name}' has interval {bad} outside 0..=127"),
                ));
            }
            groups
                .entry(intervals.len())
                .or_default()
                .push(ChordFormula { name, intervals });
        }
        if groups.is_empty() {
            return Err(BearmonyError::table_load(CHORD_TABLE, "table is empty"));
        }
        Ok(Self { groups })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries = parse_object(CHORD_TABLE, json)?
            .into_iter()
            .map(|(name, value)| {
                let intervals: Vec<u8> = serde_json::from_value(value).map_err(|e| {
                    BearmonyError::table_load(CHORD_TABLE, format!("'{name}': {e}"))
                })?;
                Ok((name, intervals))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_entries(entries)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::from_json_str(&read_table(CHORD_TABLE, path)?)?;
        debug!(path = %path.display(), sizes = ?table.sizes(), "Loaded chord formulas");
        Ok(table)
    }

    /// The formulas shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CHORD_FORMULAS)
    }

    /// Available chord sizes, ascending
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.keys().copied().collect()
    }

    /// Type names for a chord size, in table order
    pub fn types(&self, size: usize) -> Vec<&str> {
        self.groups
            .get(&size)
            .map(|group| group.iter().map(|f| f.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, size: usize, name: &str) -> Result<&ChordFormula> {
        let group = self.groups.get(&size).ok_or(BearmonyError::UnknownChordSize(size))?;
        group
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| BearmonyError::UnknownChordType { size, name: name.to_string() })
    }

    /// First formula listed for a size
    pub fn default_for(&self, size: usize) -> Result<&ChordFormula> {
        self.groups
            .get(&size)
            .and_then(|group| group.first())
            .ok_or(BearmonyError::UnknownChordSize(size))
    }

    /// Named lookup, or the size's default when no name is given
    pub fn lookup(&self, size: usize, name: Option<&str>) -> Result<&ChordFormula> {
        match name {
            Some(name) => self.get(size, name),
            None => self.default_for(size),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChordFormula> {
        self.groups.values().flatten()
    }
}

/// A named sequence of Roman-numeral degrees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionSpec {
    pub name: String,
    pub degrees: Vec<String>,
}

impl ProgressionSpec {
    /// Semitone offset of every step from the tonic. Fails on the first
    /// unrecognized degree.
    pub fn offsets(&self) -> Result<Vec<u8>> {
        self.degrees.iter().map(|d| roman_to_offset(d)).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressionTable {
    entries: Vec<ProgressionSpec>,
}

impl ProgressionTable {
    pub fn from_entries<I, S, D>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<D>)>,
        S: Into<String>,
        D: Into<String>,
    {
        let mut specs = Vec::new();
        for (name, degrees) in entries {
            let name = name.into();
            if degrees.is_empty() {
                return Err(BearmonyError::table_load(PROGRESSION_TABLE, format!("'{name}' has no steps")));
            }
            specs.push(ProgressionSpec {
                name,
                degrees: degrees.into_iter().map(Into::into).collect(),
            });
        }
        if specs.is_empty() {
            return Err(BearmonyError::table_load(PROGRESSION_TABLE, "table is empty"));
        }
        Ok(Self { entries: specs })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries = parse_object(PROGRESSION_TABLE, json)?
            .into_iter()
            .map(|(name, value)| {
                let degrees: Vec<String> = serde_json::from_value(value).map_err(|e| {
                    BearmonyError::table_load(PROGRESSION_TABLE, format!("'{name}': {e}"))
                })?;
                Ok((name, degrees))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_entries(entries)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::from_json_str(&read_table(PROGRESSION_TABLE, path)?)?;
        debug!(path = %path.display(), count = table.entries.len(), "Loaded progressions");
        Ok(table)
    }

    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_PROGRESSIONS)
    }

    pub fn get(&self, name: &str) -> Result<&ProgressionSpec> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| BearmonyError::UnknownProgression(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgressionSpec> {
        self.entries.iter()
    }
}

/// Both lookup tables, injected into the engine at construction
#[derive(Debug, Clone)]
pub struct Tables {
    pub chords: ChordTable,
    pub progressions: ProgressionTable,
}

impl Tables {
    pub fn new(chords: ChordTable, progressions: ProgressionTable) -> Self {
        Self { chords, progressions }
    }

    pub fn builtin() -> Result<Self> {
        Ok(Self::new(ChordTable::builtin()?, ProgressionTable::builtin()?))
    }

    pub fn load(chords_path: &Path, progressions_path: &Path) -> Result<Self> {
        Ok(Self::new(ChordTable::load(chords_path)?, ProgressionTable::load(progressions_path)?))
    }
}

fn read_table(table: &str, path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| BearmonyError::table_load(table, format!("{}: {e}", path.display())))
}

fn parse_object(table: &str, json: &str) -> Result<Map<String, Value>> {
    let map: Map<String, Value> =
        serde_json::from_str(json).map_err(|e| BearmonyError::table_load(table, e))?;
    if map.is_empty() {
        return Err(BearmonyError::table_load(table, "table is empty"));
    }
    Ok(map)
}
