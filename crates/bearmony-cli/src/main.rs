mod settings;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bearmony_core::{
    chord_label, instrument_program, note_name, ChordEngine, Dynamics, ExportOptions, NoteValue, PitchClass,
    PlaybackPattern, ResolvedChord, Sequencer, Swing, Tables, Tempo, Timing, VelocityMode, INSTRUMENTS,
};
use bearmony_services::{
    export_chord, export_progression, ConsoleSynth, PlaybackEvent, PlaybackRequest, Player, Repeat,
};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::Settings;

/// Chord and progression generator with MIDI export
#[derive(Parser)]
#[command(name = "bearmony")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Settings file (default: <config dir>/bearmony/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chord formula table (JSON: name -> intervals)
    #[arg(long, global = true)]
    chords: Option<PathBuf>,

    /// Progression table (JSON: name -> degrees)
    #[arg(long, global = true)]
    progressions: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List chord sizes and their types
    Chords {
        /// Only this size
        #[arg(long)]
        size: Option<usize>,
    },
    /// List progressions and their degrees
    Progressions,
    /// List playback instruments
    Instruments,
    /// Resolve a chord (or a progression with --progression) and print it
    Show {
        #[command(flatten)]
        chord: ChordArgs,
        /// Resolve this progression in the key of ROOT instead
        #[arg(long)]
        progression: Option<String>,
        #[command(flatten)]
        sound: SoundArgs,
    },
    /// Write a chord to a MIDI file
    ExportChord {
        #[command(flatten)]
        chord: ChordArgs,
        #[command(flatten)]
        sound: SoundArgs,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Write a progression to a MIDI file
    ExportProgression {
        #[command(flatten)]
        progression: ProgressionArgs,
        #[command(flatten)]
        sound: SoundArgs,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Play a chord through the console synth
    PlayChord {
        #[command(flatten)]
        chord: ChordArgs,
        #[command(flatten)]
        sound: SoundArgs,
        #[command(flatten)]
        play: PlayArgs,
    },
    /// Play a progression through the console synth
    PlayProgression {
        #[command(flatten)]
        progression: ProgressionArgs,
        #[command(flatten)]
        sound: SoundArgs,
        #[command(flatten)]
        play: PlayArgs,
    },
}

#[derive(Args)]
struct ChordArgs {
    /// Root note (C, F#, Bb, ...)
    #[arg(default_value = "C")]
    root: String,
    /// Number of notes
    #[arg(long, default_value_t = 3)]
    size: usize,
    /// Chord type; the first type of SIZE when omitted
    #[arg(long = "type")]
    chord_type: Option<String>,
    /// Octave shift, single chords only
    #[arg(long, allow_hyphen_values = true)]
    octave: Option<i32>,
}

#[derive(Args)]
struct ProgressionArgs {
    /// Progression name
    name: String,
    /// Key (tonic)
    #[arg(long, default_value = "C")]
    key: String,
    #[arg(long, default_value_t = 3)]
    size: usize,
    #[arg(long = "type")]
    chord_type: Option<String>,
}

#[derive(Args)]
struct SoundArgs {
    /// Beats per minute
    #[arg(long, allow_hyphen_values = true)]
    tempo: Option<i32>,
    /// Note value: 1, 2, 4, 8 or 16
    #[arg(long)]
    note_value: Option<u32>,
    /// Chord, "Arpeggio Asc", "Arpeggio Desc", Up-Down or "Random Arp"
    #[arg(long)]
    pattern: Option<String>,
    /// Swing ratio 0.0..=1.0
    #[arg(long)]
    swing: Option<f64>,
    /// Base volume 0..=127
    #[arg(long)]
    volume: Option<u8>,
    /// Light, Normal, Strong or Dynamic
    #[arg(long)]
    velocity: Option<String>,
}

#[derive(Args)]
struct ExportArgs {
    /// Output file; `.mid` is appended when there is no extension
    #[arg(short, long)]
    output: PathBuf,
    /// Length in tacts
    #[arg(long)]
    tacts: Option<u32>,
    /// Leave out the tempo event and write every note at velocity 100
    #[arg(long)]
    no_velocity_info: bool,
}

#[derive(Args)]
struct PlayArgs {
    /// Play-throughs
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,
    /// Instrument name
    #[arg(long)]
    instrument: Option<String>,
}

impl SoundArgs {
    fn timing(&self, settings: &Settings) -> Result<Timing> {
        let tempo = self.tempo.map(Tempo::new).transpose()?.unwrap_or(settings.tempo);
        let note_value = self.note_value.map(NoteValue::try_from).transpose()?.unwrap_or(settings.note_value);
        Ok(Timing::new(tempo, note_value))
    }

    fn pattern(&self) -> Result<PlaybackPattern> {
        match &self.pattern {
            None => Ok(PlaybackPattern::Chord),
            Some(name) => PlaybackPattern::from_name(name).with_context(|| format!("Unknown pattern: {name}")),
        }
    }

    fn dynamics(&self, settings: &Settings) -> Result<Dynamics> {
        let mode = match &self.velocity {
            None => settings.velocity_mode,
            Some(name) => VelocityMode::from_name(name).with_context(|| format!("Unknown velocity mode: {name}"))?,
        };
        Ok(Dynamics::new(self.volume.unwrap_or(settings.volume), mode)?)
    }

    fn sequencer(&self, settings: &Settings) -> Result<Sequencer> {
        let swing = self.swing.map(Swing::new).transpose()?.unwrap_or(settings.swing);
        Ok(Sequencer::new(self.pattern()?)
            .with_swing(swing)
            .with_dynamics(self.dynamics(settings)?))
    }

    fn export_options(&self, export: &ExportArgs, settings: &Settings) -> Result<ExportOptions> {
        Ok(ExportOptions {
            tempo: self.tempo.map(Tempo::new).transpose()?.unwrap_or(settings.tempo),
            tacts: export.tacts.unwrap_or(settings.export.tacts),
            include_velocity_info: settings.export.include_velocity_info && !export.no_velocity_info,
            note_value: self.note_value.map(NoteValue::try_from).transpose()?.unwrap_or(settings.export.note_value),
            pattern: self.pattern()?,
            dynamics: self.dynamics(settings)?,
        })
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let default = format!("bearmony={level},bearmony_core={level},bearmony_services={level}");
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    Ok(())
}

fn load_engine(cli: &Cli, settings: &Settings) -> Result<ChordEngine> {
    let chords = cli.chords.as_ref().or(settings.tables.chords.as_ref());
    let progressions = cli.progressions.as_ref().or(settings.tables.progressions.as_ref());
    let mut tables = Tables::builtin()?;
    if let Some(path) = chords {
        tables.chords = bearmony_core::ChordTable::load(path)?;
    }
    if let Some(path) = progressions {
        tables.progressions = bearmony_core::ProgressionTable::load(path)?;
    }
    Ok(ChordEngine::new(tables))
}

fn resolve_chord(engine: &ChordEngine, args: &ChordArgs, settings: &Settings) -> Result<(ResolvedChord, String)> {
    let root = PitchClass::parse(&args.root)?;
    let formula = engine.formula(args.size, args.chord_type.as_deref())?;
    let chord = engine.chord(root, args.size, Some(formula.name.as_str()), args.octave.unwrap_or(settings.octave))?;
    Ok((chord, chord_label(root, &formula.name)))
}

fn print_chord(label: &str, chord: &ResolvedChord) {
    let names: Vec<String> = chord.pitches.iter().map(|&p| note_name(p)).collect();
    println!("{label:<10} {:?}  {}", chord.pitches, names.join(", "));
}

fn play(player: &Player, request: PlaybackRequest) -> Result<()> {
    let handle = player.play(request)?;
    for event in handle.events().iter() {
        match event {
            PlaybackEvent::StepStarted { names, .. } => println!("{}", names.join(", ")),
            PlaybackEvent::Finished { .. } | PlaybackEvent::Failed { .. } => break,
        }
    }
    if handle.wait()? {
        info!("Playback stopped");
    }
    Ok(())
}

fn program(args: &PlayArgs, settings: &Settings) -> Result<u8> {
    let name = args.instrument.as_deref().unwrap_or(&settings.instrument);
    instrument_program(name).with_context(|| format!("Unknown instrument: {name}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let settings = Settings::load(cli.config.as_deref())?;
    let engine = load_engine(&cli, &settings).context("Failed to load tables")?;

    match &cli.command {
        Commands::Chords { size } => {
            let chords = &engine.tables().chords;
            let sizes = match size {
                Some(size) => vec![*size],
                None => chords.sizes(),
            };
            for size in sizes {
                let types = chords.types(size);
                if types.is_empty() {
                    bail!("No chord formulas with {size} notes");
                }
                let shown: Vec<&str> = types.iter().map(|&t| if t.is_empty() { "(major)" } else { t }).collect();
                println!("{size}: {}", shown.join(" "));
            }
        }
        Commands::Progressions => {
            for spec in engine.tables().progressions.iter() {
                println!("{:<20} {}", spec.name, spec.degrees.join(" "));
            }
        }
        Commands::Instruments => {
            for (name, number) in INSTRUMENTS {
                println!("{number:>3}  {name}");
            }
        }
        Commands::Show { chord, progression, sound } => {
            let timing = sound.timing(&settings)?;
            let pattern = sound.pattern()?;
            let chords: Vec<(String, ResolvedChord)> = match progression {
                Some(name) => {
                    let tonic = PitchClass::parse(&chord.root)?;
                    let resolved = engine.progression(name, tonic, chord.size, chord.chord_type.as_deref())?;
                    resolved.labels().into_iter().zip(resolved.chords).collect()
                }
                None => {
                    let (resolved, label) = resolve_chord(&engine, chord, &settings)?;
                    vec![(label, resolved)]
                }
            };
            for (label, resolved) in &chords {
                print_chord(label, resolved);
            }
            let per_step = chords
                .first()
                .map(|(_, c)| timing.playthrough_seconds(pattern, c.len()))
                .unwrap_or_default();
            println!(
                "{} bpm, 1/{} notes, {}: {:.2}s per event, {:.2}s per step, {:.2}s total",
                timing.tempo.bpm(),
                timing.note_value.denominator(),
                pattern.name(),
                timing.event_seconds(),
                per_step,
                per_step * chords.len() as f64
            );
        }
        Commands::ExportChord { chord, sound, export } => {
            let (resolved, label) = resolve_chord(&engine, chord, &settings)?;
            let options = sound.export_options(export, &settings)?;
            let path = export_chord(&export.output, &resolved, &options)?;
            println!("{label}: {} tacts ({:.1}s) -> {}", options.tacts, options.seconds(), path.display());
        }
        Commands::ExportProgression { progression, sound, export } => {
            let tonic = PitchClass::parse(&progression.key)?;
            let resolved = engine.progression(
                &progression.name,
                tonic,
                progression.size,
                progression.chord_type.as_deref(),
            )?;
            let options = sound.export_options(export, &settings)?;
            let path = export_progression(&export.output, &resolved.chords, &options)?;
            println!(
                "{} in {tonic}: {} tacts ({:.1}s) -> {}",
                resolved.name,
                options.tacts,
                options.seconds(),
                path.display()
            );
        }
        Commands::PlayChord { chord, sound, play: args } => {
            let (resolved, label) = resolve_chord(&engine, chord, &settings)?;
            info!(chord = %label, "Playing chord");
            let request = PlaybackRequest::chord(resolved)
                .with_sequencer(sound.sequencer(&settings)?)
                .with_timing(sound.timing(&settings)?)
                .with_repeat(Repeat::Times(args.repeat))
                .with_program(program(args, &settings)?)
                .with_reverb(settings.reverb);
            play(&Player::new(ConsoleSynth::new()), request)?;
        }
        Commands::PlayProgression { progression, sound, play: args } => {
            let tonic = PitchClass::parse(&progression.key)?;
            let resolved = engine.progression(
                &progression.name,
                tonic,
                progression.size,
                progression.chord_type.as_deref(),
            )?;
            info!(progression = %resolved.name, key = %tonic, "Playing progression");
            let request = PlaybackRequest::progression(resolved.chords)
                .with_sequencer(sound.sequencer(&settings)?)
                .with_timing(sound.timing(&settings)?)
                .with_repeat(Repeat::Times(args.repeat))
                .with_program(program(args, &settings)?)
                .with_reverb(settings.reverb);
            play(&Player::new(ConsoleSynth::new()), request)?;
        }
    }

    Ok(())
}
