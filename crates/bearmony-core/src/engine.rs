//! Chord engine: table lookups + chord building behind one handle

use crate::chord::{build_chord, build_progression, ResolvedChord};
use crate::error::Result;
use crate::notes::{chord_label, PitchClass};
use crate::tables::{ChordFormula, Tables};

/// Resolves chords and progressions against the tables it was built with.
///
/// Holds no mutable state; share it freely across threads.
#[derive(Debug, Clone)]
pub struct ChordEngine {
    tables: Tables,
}

/// A progression resolved in a key, with the formula used for every step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProgression {
    pub name: String,
    pub tonic: PitchClass,
    pub formula: ChordFormula,
    pub chords: Vec<ResolvedChord>,
}

impl ResolvedProgression {
    /// Labels such as `C`, `F`, `G`, `C` for display
    pub fn labels(&self) -> Vec<String> {
        self.chords.iter().map(|c| chord_label(c.root, &self.formula.name)).collect()
    }
}

impl ChordEngine {
    pub fn new(tables: Tables) -> Self {
        Self { tables }
    }

    /// Engine over the tables shipped with the crate
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(Tables::builtin()?))
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Formula for a size and optional type name (default type when `None`)
    pub fn formula(&self, size: usize, chord_type: Option<&str>) -> Result<&ChordFormula> {
        self.tables.chords.lookup(size, chord_type)
    }

    pub fn chord(&self, root: PitchClass, size: usize, chord_type: Option<&str>, octave: i32) -> Result<ResolvedChord> {
        let formula = self.formula(size, chord_type)?;
        Ok(build_chord(root, octave, &formula.intervals))
    }

    /// Every step of the named progression in `tonic`, voiced from middle C
    pub fn progression(
        &self,
        name: &str,
        tonic: PitchClass,
        size: usize,
        chord_type: Option<&str>,
    ) -> Result<ResolvedProgression> {
        let spec = self.tables.progressions.get(name)?;
        let formula = self.formula(size, chord_type)?;
        let chords = build_progression(tonic, spec, formula)?;
        Ok(ResolvedProgression {
            name: spec.name.clone(),
            tonic,
            formula: formula.clone(),
            chords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BearmonyError;
    use crate::tables::{ChordTable, ProgressionTable};

    fn fixture() -> ChordEngine {
        let chords = ChordTable::from_entries([
            ("maj", vec![0, 4, 7]),
            ("m", vec![0, 3, 7]),
            ("7", vec![0, 4, 7, 10]),
        ])
        .unwrap();
        let progressions = ProgressionTable::from_entries([
            ("I-IV-V-I", vec!["I", "IV", "V", "I"]),
            ("broken", vec!["I", "IIX"]),
        ])
        .unwrap();
        ChordEngine::new(Tables::new(chords, progressions))
    }

    #[test]
    fn test_chord_default_and_named_type() {
        let engine = fixture();
        let d = PitchClass::parse("D").unwrap();
        assert_eq!(engine.chord(d, 3, None, 0).unwrap().pitches, vec![62, 66, 69]);
        assert_eq!(engine.chord(d, 3, Some("m"), -1).unwrap().pitches, vec![50, 53, 57]);
        assert_eq!(engine.chord(d, 4, None, 0).unwrap().pitches, vec![62, 66, 69, 72]);
    }

    #[test]
    fn test_unknown_type_is_not_a_fallback() {
        let engine = fixture();
        assert!(matches!(
            engine.chord(PitchClass::C, 3, Some("dim"), 0),
            Err(BearmonyError::UnknownChordType { size: 3, .. })
        ));
        assert!(matches!(engine.chord(PitchClass::C, 5, None, 0), Err(BearmonyError::UnknownChordSize(5))));
    }

    #[test]
    fn test_progression_resolution() {
        let engine = fixture();
        let resolved = engine.progression("I-IV-V-I", PitchClass::C, 3, None).unwrap();
        assert_eq!(resolved.labels(), vec!["Cmaj", "Fmaj", "Gmaj", "Cmaj"]);
        assert_eq!(resolved.chords[2].pitches, vec![67, 71, 74]);
    }

    #[test]
    fn test_progression_errors() {
        let engine = fixture();
        assert!(matches!(
            engine.progression("missing", PitchClass::C, 3, None),
            Err(BearmonyError::UnknownProgression(_))
        ));
        assert!(matches!(
            engine.progression("broken", PitchClass::C, 3, None),
            Err(BearmonyError::InvalidDegree(s)) if s == "IIX"
        ));
        // Engine stays usable after a failed request
        assert!(engine.progression("I-IV-V-I", PitchClass::C, 3, Some("m")).is_ok());
    }
}
