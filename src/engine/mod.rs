//! Tick-driven mini-game engine.
//!
//! One [`Engine`] drives any game described by a [`Rules`] policy table
//! (spawn policy, motion + hit zone, input handling, terminal condition). The
//! engine owns the authoritative run state; after every tick or input it
//! publishes an immutable [`Snapshot`] that renderers read but never mutate.
//!
//! ```text
//!   Idle --start--> Playing --stop / time up--> Idle
//!                      |
//!                      +--out of lives--> GameOver --start--> Playing
//! ```

use std::fmt;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::audio::{AudioFeedback, Cue};
use crate::score::{GameId, ScoreSink};

pub mod shot_drop;
pub mod vinyl_scratch;
pub mod wing_catcher;

pub use shot_drop::ShotDrop;
pub use vinyl_scratch::VinylScratch;
pub use wing_catcher::WingCatcher;

// --- Run state ---------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Idle,
    Playing,
    GameOver,
}

/// Mutable per-run counters. Reset on every start.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunState {
    /// Points in the current attempt; only ever goes up within an attempt.
    pub score: u32,
    pub misses: u32,
    /// Milliseconds since `start`.
    pub elapsed_ms: f64,
    /// Best score seen this session (seeded from the leaderboard).
    pub best: u32,
}

/// Player actions. Each game reacts to the subset it cares about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input {
    /// Drop-catch: open the dispenser.
    Release,
    /// Catch-falling: pointer x in field percent.
    Pointer { x: f64 },
    /// Rhythm-tap: hit the needle.
    Tap,
}

/// What the rules report back to the engine while stepping or handling input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Hit,
    Miss,
    /// A player-launched entity entered the field.
    Released,
}

/// Hits and misses applied during the current tick or input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub hits: u32,
    pub misses: u32,
}

/// Terminal-condition decision taken after each tick and input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    /// Bank the attempt, zero the score, keep playing.
    ResetScore,
    /// Bank the attempt and stop in `GameOver`.
    GameOver,
    /// Bank the attempt and return to `Idle`.
    TimeUp,
}

/// Per-game policy table.
pub trait Rules {
    const GAME: GameId;
    const HIT_TEXT: &'static str;
    const MISS_TEXT: &'static str;
    /// Shown when a run ends on its own (`GameOver` / `TimeUp`).
    const END_TEXT: Option<&'static str> = None;

    /// Render-facing view of the field.
    type Bodies: Clone + fmt::Debug + Serialize;

    /// Clear the field for a new run starting at `now_ms`.
    fn reset(&mut self, now_ms: f64);

    /// Spawn policy. Games without autonomous spawns keep the default.
    fn spawn(&mut self, _run: &RunState, _now_ms: f64, _rng: &mut SmallRng) {}

    /// Advance every entity one tick and evaluate passive hit zones.
    fn step(&mut self, run: &RunState, signals: &mut Vec<Signal>);

    /// React to a player action while playing.
    fn input(&mut self, input: Input, run: &RunState, signals: &mut Vec<Signal>);

    fn verdict(&self, run: &RunState, tally: Tally) -> Verdict;

    fn bodies(&self) -> Self::Bodies;

    /// Fixed round length for time-boxed games.
    fn round_ms(&self) -> Option<f64> {
        None
    }
}

// --- Snapshot ----------------------------------------------------------------

/// Immutable copy of everything a renderer needs after a tick.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<B> {
    pub game: GameId,
    pub phase: Phase,
    pub score: u32,
    pub misses: u32,
    pub best: u32,
    pub remaining_ms: Option<f64>,
    pub feedback: Option<&'static str>,
    pub bodies: B,
}

// --- Engine ------------------------------------------------------------------

pub struct Engine<R: Rules> {
    rules: R,
    phase: Phase,
    run: RunState,
    started_ms: f64,
    /// True while the current attempt has not been banked yet.
    attempt_open: bool,
    player: String,
    feedback: Option<&'static str>,
    rng: SmallRng,
    audio: Box<dyn AudioFeedback>,
    scores: Box<dyn ScoreSink>,
    signals: Vec<Signal>,
    snapshot: Snapshot<R::Bodies>,
}

impl<R: Rules> Engine<R> {
    pub fn new(rules: R, audio: Box<dyn AudioFeedback>, scores: Box<dyn ScoreSink>) -> Self {
        let snapshot = Snapshot {
            game: R::GAME,
            phase: Phase::Idle,
            score: 0,
            misses: 0,
            best: 0,
            remaining_ms: rules.round_ms(),
            feedback: None,
            bodies: rules.bodies(),
        };
        Self {
            rules,
            phase: Phase::Idle,
            run: RunState::default(),
            started_ms: 0.0,
            attempt_open: false,
            player: String::new(),
            feedback: None,
            rng: SmallRng::from_entropy(),
            audio,
            scores,
            signals: Vec::with_capacity(8),
            snapshot,
        }
    }

    /// Deterministic spawns (tests, replays).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn with_best(mut self, best: u32) -> Self {
        self.run.best = best;
        self.publish();
        self
    }

    pub fn set_player(&mut self, name: &str) {
        self.player = name.to_string();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Direct access for pre-round configuration. Ignored while playing.
    pub fn rules_mut(&mut self) -> Option<&mut R> {
        (self.phase != Phase::Playing).then_some(&mut self.rules)
    }

    pub fn snapshot(&self) -> &Snapshot<R::Bodies> {
        &self.snapshot
    }

    /// `Idle`/`GameOver` -> `Playing`. Restarting while playing is a no-op.
    pub fn start(&mut self, now_ms: f64) {
        if self.phase == Phase::Playing {
            return;
        }
        self.audio.ensure_ready();
        let best = self.run.best;
        self.run = RunState {
            best,
            ..RunState::default()
        };
        self.started_ms = now_ms;
        self.attempt_open = true;
        self.feedback = None;
        self.rules.reset(now_ms);
        self.phase = Phase::Playing;
        tracing::info!(game = %R::GAME, "run started");
        self.publish();
    }

    /// Leave `Playing` on request (navigation, stop button), banking the score.
    pub fn stop(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }
        self.close_attempt();
        self.phase = Phase::Idle;
        tracing::info!(game = %R::GAME, score = self.run.score, "run stopped");
        self.publish();
    }

    /// One animation frame. Ignored unless playing.
    pub fn tick(&mut self, now_ms: f64) {
        if self.phase != Phase::Playing {
            return;
        }
        self.run.elapsed_ms = (now_ms - self.started_ms).max(0.0);
        self.signals.clear();
        self.rules.spawn(&self.run, now_ms, &mut self.rng);
        self.rules.step(&self.run, &mut self.signals);
        self.settle();
    }

    pub fn handle(&mut self, input: Input) {
        if self.phase != Phase::Playing {
            return;
        }
        self.signals.clear();
        self.rules.input(input, &self.run, &mut self.signals);
        self.settle();
    }

    /// Apply collected signals, then the terminal policy, then publish.
    fn settle(&mut self) {
        let mut tally = Tally::default();
        for i in 0..self.signals.len() {
            match self.signals[i] {
                Signal::Hit => {
                    tally.hits += 1;
                    self.run.score += 1;
                    self.run.best = self.run.best.max(self.run.score);
                    self.feedback = Some(R::HIT_TEXT);
                    self.audio.play(Cue::Hit);
                }
                Signal::Miss => {
                    tally.misses += 1;
                    self.run.misses += 1;
                    self.feedback = Some(R::MISS_TEXT);
                    self.audio.play(Cue::Miss);
                }
                Signal::Released => {
                    self.feedback = None;
                    self.audio.play(Cue::Drop);
                }
            }
        }

        match self.rules.verdict(&self.run, tally) {
            Verdict::Continue => {}
            Verdict::ResetScore => {
                self.close_attempt();
                self.run.score = 0;
                self.attempt_open = true;
            }
            Verdict::GameOver => {
                self.close_attempt();
                self.phase = Phase::GameOver;
                self.feedback = R::END_TEXT.or(self.feedback);
                self.audio.play(Cue::GameOver);
                tracing::info!(game = %R::GAME, score = self.run.score, "game over");
            }
            Verdict::TimeUp => {
                self.close_attempt();
                self.phase = Phase::Idle;
                self.feedback = R::END_TEXT.or(self.feedback);
                tracing::info!(game = %R::GAME, score = self.run.score, "time up");
            }
        }
        self.publish();
    }

    /// Bank the current attempt once.
    fn close_attempt(&mut self) {
        if !self.attempt_open {
            return;
        }
        self.attempt_open = false;
        if self.run.score > 0 {
            self.scores
                .record_score(R::GAME, &self.player, i64::from(self.run.score));
        }
    }

    fn publish(&mut self) {
        self.snapshot = Snapshot {
            game: R::GAME,
            phase: self.phase,
            score: self.run.score,
            misses: self.run.misses,
            best: self.run.best,
            remaining_ms: self
                .rules
                .round_ms()
                .map(|round| (round - self.run.elapsed_ms).max(0.0)),
            feedback: self.feedback,
            bodies: self.rules.bodies(),
        };
    }
}

// --- Object-safe facade for the web shell ------------------------------------

/// Type-erased engine, so the shell can drive whichever game is mounted.
pub trait Cabinet {
    fn game(&self) -> GameId;
    fn phase(&self) -> Phase;
    fn set_player(&mut self, name: &str);
    fn start(&mut self, now_ms: f64);
    fn stop(&mut self);
    fn tick(&mut self, now_ms: f64);
    fn handle(&mut self, input: Input);
    fn snapshot_json(&self) -> String;
}

impl<R: Rules> Cabinet for Engine<R> {
    fn game(&self) -> GameId {
        R::GAME
    }

    fn phase(&self) -> Phase {
        Engine::phase(self)
    }

    fn set_player(&mut self, name: &str) {
        Engine::set_player(self, name);
    }

    fn start(&mut self, now_ms: f64) {
        Engine::start(self, now_ms);
    }

    fn stop(&mut self) {
        Engine::stop(self);
    }

    fn tick(&mut self, now_ms: f64) {
        Engine::tick(self, now_ms);
    }

    fn handle(&mut self, input: Input) {
        Engine::handle(self, input);
    }

    fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.snapshot).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "snapshot serialization failed");
            String::from("null")
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Cues, Recorded};
    use super::*;

    fn shot_engine() -> (Engine<ShotDrop>, Recorded, Cues) {
        let rec = Recorded::default();
        let cues = Cues::default();
        let mut e = Engine::new(ShotDrop::new(), Box::new(cues.clone()), Box::new(rec.clone()));
        e.set_player("Mina");
        (e, rec, cues)
    }

    #[test]
    fn test_start_readies_audio_and_enters_playing() {
        let (mut e, _rec, cues) = shot_engine();
        assert_eq!(e.phase(), Phase::Idle);
        e.start(0.0);
        assert_eq!(e.phase(), Phase::Playing);
        assert_eq!(*cues.1.borrow(), 1);
        // A second start while playing changes nothing.
        e.start(10.0);
        assert_eq!(*cues.1.borrow(), 1);
    }

    #[test]
    fn test_ticks_and_input_are_ignored_when_idle() {
        let (mut e, rec, cues) = shot_engine();
        e.handle(Input::Release);
        e.tick(16.0);
        assert!(cues.0.borrow().is_empty());
        assert!(rec.calls().is_empty());
        assert!(e.snapshot().bodies.shot.is_none());
    }

    #[test]
    fn test_stop_banks_positive_score_once() {
        let (mut e, rec, _cues) = shot_engine();
        e.start(0.0);
        e.run.score = 3;
        e.stop();
        e.stop();
        assert_eq!(e.phase(), Phase::Idle);
        assert_eq!(rec.calls(), vec![(GameId::DropCatch, "Mina".to_string(), 3)]);
    }

    #[test]
    fn test_stop_with_zero_score_records_nothing() {
        let (mut e, rec, _cues) = shot_engine();
        e.start(0.0);
        e.stop();
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn test_snapshot_tracks_state_and_serializes() {
        let (mut e, _rec, _cues) = shot_engine();
        e.start(0.0);
        e.tick(16.0);
        let snap = e.snapshot();
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.game, GameId::DropCatch);
        let json = Cabinet::snapshot_json(&e);
        assert!(json.contains(r#""game":"shot-drop""#), "{json}");
        assert!(json.contains(r#""phase":"playing""#), "{json}");
    }

    #[test]
    fn test_best_is_seeded_and_survives_restart() {
        let (e, _rec, _cues) = shot_engine();
        let mut e = e.with_best(4);
        assert_eq!(e.snapshot().best, 4);
        e.start(0.0);
        assert_eq!(e.run().best, 4);
        assert_eq!(e.run().score, 0);
    }

    #[test]
    fn test_rules_are_locked_while_playing() {
        let (mut e, _rec, _cues) = shot_engine();
        assert!(e.rules_mut().is_some());
        e.start(0.0);
        assert!(e.rules_mut().is_none());
    }
}
