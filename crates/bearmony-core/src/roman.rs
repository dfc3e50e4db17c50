//! Roman-numeral scale degrees (I..VII with an optional accidental)

use crate::error::{BearmonyError, Result};

/// Major-scale semitone offset of each numeral
const DEGREE_OFFSETS: [(&str, i32); 7] = [
    ("I", 0),
    ("II", 2),
    ("III", 4),
    ("IV", 5),
    ("V", 7),
    ("VI", 9),
    ("VII", 11),
];

/// Resolve a degree symbol such as `IV`, `bVII` or `#iv` to a semitone
/// offset from the tonic in 0..12.
///
/// One leading accidental is recognized (`b`/`♭` lowers, `#`/`♯` raises);
/// the numeral itself is case-insensitive.
///
/// # Example
/// ```
/// use bearmony_core::roman_to_offset;
/// assert_eq!(roman_to_offset("bVII").unwrap(), 10);
/// assert_eq!(roman_to_offset("#IV").unwrap(), 6);
/// ```
pub fn roman_to_offset(symbol: &str) -> Result<u8> {
    let (accidental, numeral) = split_accidental(symbol);
    let numeral = numeral.to_ascii_uppercase();

    let base = DEGREE_OFFSETS
        .iter()
        .find(|(name, _)| *name == numeral)
        .map(|&(_, offset)| offset)
        .ok_or_else(|| BearmonyError::InvalidDegree(symbol.to_string()))?;

    Ok((base + accidental).rem_euclid(12) as u8)
}

fn split_accidental(symbol: &str) -> (i32, &str) {
    let mut chars = symbol.chars();
    match chars.next() {
        Some('b' | '♭') => (-1, chars.as_str()),
        Some('#' | '♯') => (1, chars.as_str()),
        _ => (0, symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numerals() {
        assert_eq!(roman_to_offset("I").unwrap(), 0);
        assert_eq!(roman_to_offset("II").unwrap(), 2);
        assert_eq!(roman_to_offset("III").unwrap(), 4);
        assert_eq!(roman_to_offset("IV").unwrap(), 5);
        assert_eq!(roman_to_offset("V").unwrap(), 7);
        assert_eq!(roman_to_offset("VI").unwrap(), 9);
        assert_eq!(roman_to_offset("VII").unwrap(), 11);
    }

    #[test]
    fn test_accidentals() {
        assert_eq!(roman_to_offset("bV").unwrap(), 6);
        assert_eq!(roman_to_offset("#IV").unwrap(), 6);
        assert_eq!(roman_to_offset("bIII").unwrap(), 3);
        assert_eq!(roman_to_offset("♭VII").unwrap(), 10);
        assert_eq!(roman_to_offset("♯I").unwrap(), 1);
        // Wraps below the tonic and above the octave
        assert_eq!(roman_to_offset("bI").unwrap(), 11);
        assert_eq!(roman_to_offset("#VII").unwrap(), 0);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(roman_to_offset("vi").unwrap(), 9);
        assert_eq!(roman_to_offset("bvii").unwrap(), 10);
        assert_eq!(roman_to_offset("iV").unwrap(), 5);
    }

    #[test]
    fn test_every_accepted_symbol_is_in_range() {
        for (numeral, _) in DEGREE_OFFSETS {
            for prefix in ["", "b", "#", "♭", "♯"] {
                for symbol in [format!("{prefix}{numeral}"), format!("{prefix}{}", numeral.to_lowercase())] {
                    let first = roman_to_offset(&symbol).unwrap();
                    assert!(first < 12, "{symbol} -> {first}");
                    assert_eq!(roman_to_offset(&symbol).unwrap(), first);
                }
            }
        }
    }

    #[test]
    fn test_invalid_symbols() {
        for symbol in ["", "b", "#", "VIII", "IIII", "X", "bbII", "#bIV", "I ", "1", "Vb", "IX"] {
            match roman_to_offset(symbol) {
                Err(BearmonyError::InvalidDegree(s)) => assert_eq!(s, symbol),
                other => panic!("{symbol:?} should be invalid, got {other:?}"),
            }
        }
    }
}
