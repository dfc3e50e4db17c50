//! Writing `.mid` files

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use bearmony_core::{chord_track, progression_track, BearmonyError, ExportOptions, MidiTrack, ResolvedChord};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write MIDI file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Engine(#[from] BearmonyError),
}

/// Append `.mid` when the path has no extension
pub fn with_mid_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("mid")
    }
}

/// Encode `track` and write it to `path`. Returns the path actually written.
///
/// Encoding happens before the file is created, so a rejected track leaves
/// nothing on disk.
pub fn write_track(path: &Path, track: &MidiTrack) -> Result<PathBuf, ExportError> {
    let bytes = track.encode()?;
    let path = with_mid_extension(path);

    let mut file = File::create(&path)?;
    file.write_all(&bytes)?;
    file.flush()?;

    info!(
        path = %path.display(),
        bytes = bytes.len(),
        groups = track.groups.len(),
        ticks = track.ticks(),
        "Exported MIDI"
    );
    Ok(path)
}

pub fn export_chord(path: &Path, chord: &ResolvedChord, options: &ExportOptions) -> Result<PathBuf, ExportError> {
    let track = chord_track(chord, options, &mut fastrand::Rng::new())?;
    write_track(path, &track)
}

pub fn export_progression(
    path: &Path,
    chords: &[ResolvedChord],
    options: &ExportOptions,
) -> Result<PathBuf, ExportError> {
    let track = progression_track(chords, options, &mut fastrand::Rng::new())?;
    write_track(path, &track)
}
