//! Live playback driver
//!
//! Runs sequenced chords against a [`Synth`] on a background thread. At
//! most one session runs at a time. Cancellation is cooperative: the loop
//! checks the token between note groups and before each repetition, and a
//! group that is already sounding always gets its note-offs first.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use bearmony_core::{midi_pitch, BearmonyError, NoteGroup, ResolvedChord, Sequencer, Timing};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::synth::{Reverb, Synth};

const CHANNEL: u8 = 0;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("No synthesizer available for playback")]
    NoActiveSynth,
    #[error("A playback session is already running")]
    AlreadyPlaying,
    #[error("Synth backend failed: {0}")]
    SynthFailed(String),
    #[error("Invalid reverb {name}: {value} (expected 0.0..=1.0)")]
    InvalidReverb { name: &'static str, value: f32 },
    #[error(transparent)]
    Engine(#[from] BearmonyError),
}

/// How many times the chord steps are played through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Once,
    Times(u32),
    /// Until stopped
    Forever,
}

impl Repeat {
    fn allows(self, pass: u32) -> bool {
        match self {
            Self::Once => pass < 1,
            Self::Times(n) => pass < n,
            Self::Forever => true,
        }
    }
}

/// Everything one session needs
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub steps: Vec<ResolvedChord>,
    pub sequencer: Sequencer,
    pub timing: Timing,
    pub repeat: Repeat,
    /// GM program selected before the first note
    pub program: Option<u8>,
    pub reverb: Option<Reverb>,
    /// Fixed seed for random arpeggios and dynamic velocity
    pub seed: Option<u64>,
}

impl PlaybackRequest {
    /// A single chord
    pub fn chord(chord: ResolvedChord) -> Self {
        Self::progression(vec![chord])
    }

    /// Chords played in order, one per step
    pub fn progression(steps: Vec<ResolvedChord>) -> Self {
        Self {
            steps,
            sequencer: Sequencer::default(),
            timing: Timing::default(),
            repeat: Repeat::Once,
            program: None,
            reverb: None,
            seed: None,
        }
    }

    pub fn with_sequencer(mut self, sequencer: Sequencer) -> Self {
        self.sequencer = sequencer;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_program(mut self, program: u8) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_reverb(mut self, reverb: Reverb) -> Self {
        self.reverb = Some(reverb);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Playthrough length for one step: one event per arpeggio note
    fn span(&self, step: &ResolvedChord) -> f64 {
        self.timing.playthrough_seconds(self.sequencer.pattern, step.len())
    }

    fn validate(&self) -> Result<(), BearmonyError> {
        if self.steps.is_empty() {
            return Err(BearmonyError::EmptyChord);
        }
        for step in &self.steps {
            if step.is_empty() {
                return Err(BearmonyError::EmptyChord);
            }
            step.midi_pitches()?;
        }
        Ok(())
    }
}

/// Progress reported by a running session
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A step began sounding; repeated identical steps are reported once
    StepStarted { index: usize, pitches: Vec<i32>, names: Vec<String> },
    Finished { cancelled: bool },
    /// The synth backend failed; no further notes were sent
    Failed { reason: String },
}

/// Shared stop signal polled by the playback loop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Handle for a running session
pub struct PlaybackHandle {
    done_rx: Receiver<Result<bool, PlaybackError>>,
    events: Receiver<PlaybackEvent>,
    cancel: CancelToken,
}

impl PlaybackHandle {
    /// Block until the session ends; `Ok(true)` when it was cancelled
    pub fn wait(self) -> Result<bool, PlaybackError> {
        self.done_rx
            .recv()
            .map_err(|_| PlaybackError::SynthFailed("playback thread exited without a result".to_string()))?
    }

    pub fn is_done(&self) -> bool {
        !self.done_rx.is_empty()
    }

    pub fn events(&self) -> &Receiver<PlaybackEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Owns the synth and enforces a single active session
pub struct Player {
    synth: Option<Arc<Mutex<dyn Synth>>>,
    /// Token of the running session; `None` when idle
    current: Arc<Mutex<Option<CancelToken>>>,
}

/// Clears the session slot when the worker exits, unwinding included
struct SessionGuard {
    current: Arc<Mutex<Option<CancelToken>>>,
    token: CancelToken,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut current = lock_slot(&self.current);
        if current.as_ref().is_some_and(|t| t.same(&self.token)) {
            *current = None;
        }
    }
}

// The slot holds no invariant a panic could break
fn lock_slot(slot: &Mutex<Option<CancelToken>>) -> MutexGuard<'_, Option<CancelToken>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Player {
    pub fn new(synth: impl Synth + 'static) -> Self {
        Self {
            synth: Some(Arc::new(Mutex::new(synth))),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// A player with no backend; every play request fails with `NoActiveSynth`
    pub fn without_synth() -> Self {
        Self { synth: None, current: Arc::new(Mutex::new(None)) }
    }

    pub fn has_synth(&self) -> bool {
        self.synth.is_some()
    }

    pub fn is_playing(&self) -> bool {
        lock_slot(&self.current).is_some()
    }

    /// Start a session on a background thread
    pub fn play(&self, request: PlaybackRequest) -> Result<PlaybackHandle, PlaybackError> {
        let synth = self.synth.clone().ok_or(PlaybackError::NoActiveSynth)?;
        request.validate()?;

        let cancel = CancelToken::new();
        {
            let mut current = lock_slot(&self.current);
            if current.is_some() {
                return Err(PlaybackError::AlreadyPlaying);
            }
            *current = Some(cancel.clone());
        }

        let (done_tx, done_rx) = bounded(1);
        let (events_tx, events) = unbounded();
        let guard = SessionGuard { current: self.current.clone(), token: cancel.clone() };

        info!(
            steps = request.steps.len(),
            pattern = request.sequencer.pattern.name(),
            bpm = request.timing.tempo.bpm(),
            repeat = ?request.repeat,
            "Starting playback"
        );

        thread::spawn(move || {
            let token = guard.token.clone();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                run_session(synth.as_ref(), &request, &token, &events_tx)
            }))
            .unwrap_or_else(|_| {
                // The panicking call held the lock; later sessions may use the synth again
                synth.clear_poison();
                Err(PlaybackError::SynthFailed("synth backend panicked".to_string()))
            });
            drop(guard);

            let event = match &outcome {
                Ok(cancelled) => {
                    info!(cancelled, "Playback finished");
                    PlaybackEvent::Finished { cancelled: *cancelled }
                }
                Err(e) => {
                    error!(error = %e, "Playback failed");
                    PlaybackEvent::Failed { reason: e.to_string() }
                }
            };
            let _ = events_tx.send(event);
            let _ = done_tx.send(outcome);
        });

        Ok(PlaybackHandle { done_rx, events, cancel })
    }

    /// Request the running session to stop; no-op when idle
    pub fn stop(&self) {
        if let Some(token) = lock_slot(&self.current).as_ref() {
            debug!("Stop requested");
            token.cancel();
        }
    }
}

fn lock_synth(synth: &Mutex<dyn Synth>) -> Result<MutexGuard<'_, dyn Synth + 'static>, PlaybackError> {
    synth
        .lock()
        .map_err(|_| PlaybackError::SynthFailed("synth lock poisoned".to_string()))
}

/// `Ok(true)` when the session ended because of cancellation
fn run_session(
    synth: &Mutex<dyn Synth>,
    request: &PlaybackRequest,
    cancel: &CancelToken,
    events: &Sender<PlaybackEvent>,
) -> Result<bool, PlaybackError> {
    let mut rng = match request.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    {
        let mut synth = lock_synth(synth)?;
        if let Some(program) = request.program {
            synth.program_select(CHANNEL, program);
        }
        if let Some(reverb) = &request.reverb {
            synth.set_reverb(reverb);
        }
    }

    let mut last: Option<&[i32]> = None;
    let mut pass = 0;
    while request.repeat.allows(pass) {
        if cancel.is_cancelled() {
            return Ok(true);
        }
        for (index, step) in request.steps.iter().enumerate() {
            if last != Some(step.pitches.as_slice()) {
                let _ = events.send(PlaybackEvent::StepStarted {
                    index,
                    pitches: step.pitches.clone(),
                    names: step.note_names(),
                });
                last = Some(step.pitches.as_slice());
            }

            let groups = match request.sequencer.realize(&step.pitches, request.span(step), &mut rng) {
                Ok(groups) => groups,
                Err(e) => {
                    warn!(index, error = %e, "Skipping step");
                    continue;
                }
            };
            for group in &groups {
                if cancel.is_cancelled() {
                    return Ok(true);
                }
                sound(synth, group)?;
            }
        }
        pass += 1;
    }
    Ok(false)
}

/// Note-ons, hold, note-offs for one group
fn sound(synth: &Mutex<dyn Synth>, group: &NoteGroup) -> Result<(), PlaybackError> {
    let keys: Vec<u8> = group.pitches.iter().filter_map(|&p| midi_pitch(p).ok()).collect();
    {
        let mut synth = lock_synth(synth)?;
        for &key in &keys {
            synth.note_on(CHANNEL, key, group.velocity);
        }
    }
    thread::sleep(Duration::from_secs_f64(group.hold.max(0.0)));
    let mut synth = lock_synth(synth)?;
    for &key in &keys {
        synth.note_off(CHANNEL, key);
    }
    Ok(())
}
