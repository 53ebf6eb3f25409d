//! Shot drop (drop-catch, "Bokbunja POP").
//!
//! A glass slides back and forth on its own, faster as the score grows. The
//! player releases one shot at a time from the centred dispenser and must
//! time it so the shot lands in the glass. A spilled shot banks the streak
//! and resets the score, but the session keeps going.

use serde::Serialize;

use super::{Input, Rules, RunState, Signal, Tally, Verdict};
use crate::score::GameId;
use crate::tuning::{
    GLASS_BASE_SPEED, GLASS_MAX_X, GLASS_MIN_X, GLASS_SPEED_PER_POINT, GLASS_START_X,
    SHOT_FALL_PER_TICK, SHOT_FLOOR_Y, SHOT_HIT_BAND, SHOT_HIT_DISTANCE, SHOT_RELEASE_X,
    SHOT_RELEASE_Y,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Shot {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotDropView {
    pub glass_x: f64,
    pub shot: Option<Shot>,
}

#[derive(Debug, Clone)]
pub struct ShotDrop {
    glass_x: f64,
    /// +1 moving right, -1 moving left.
    glass_dir: f64,
    shot: Option<Shot>,
}

impl Default for ShotDrop {
    fn default() -> Self {
        Self::new()
    }
}

impl ShotDrop {
    pub fn new() -> Self {
        Self {
            glass_x: GLASS_START_X,
            glass_dir: 1.0,
            shot: None,
        }
    }
}

/// Glass speed in field percent per tick.
pub fn glass_speed(score: u32) -> f64 {
    GLASS_BASE_SPEED + f64::from(score) * GLASS_SPEED_PER_POINT
}

/// Whether a shot at height `y` is inside the catch band.
pub fn in_catch_band(y: f64) -> bool {
    y > SHOT_HIT_BAND.0 && y < SHOT_HIT_BAND.1
}

/// Lateral hit test between a shot and the glass.
pub fn shot_lands(shot_x: f64, glass_x: f64) -> bool {
    (shot_x - glass_x).abs() < SHOT_HIT_DISTANCE
}

impl Rules for ShotDrop {
    const GAME: GameId = GameId::DropCatch;
    const HIT_TEXT: &'static str = "DAEBAK!";
    const MISS_TEXT: &'static str = "STAINED!";

    type Bodies = ShotDropView;

    fn reset(&mut self, _now_ms: f64) {
        *self = Self::new();
    }

    fn step(&mut self, run: &RunState, signals: &mut Vec<Signal>) {
        // The glass reverses once it has passed a bound; it is not clamped.
        let next = self.glass_x + self.glass_dir * glass_speed(run.score);
        if next > GLASS_MAX_X {
            self.glass_dir = -1.0;
        }
        if next < GLASS_MIN_X {
            self.glass_dir = 1.0;
        }
        self.glass_x = next;

        let Some(shot) = self.shot.as_mut() else {
            return;
        };
        shot.y += SHOT_FALL_PER_TICK;
        if in_catch_band(shot.y) && shot_lands(shot.x, self.glass_x) {
            self.shot = None;
            signals.push(Signal::Hit);
        } else if shot.y > SHOT_FLOOR_Y {
            self.shot = None;
            signals.push(Signal::Miss);
        }
    }

    fn input(&mut self, input: Input, _run: &RunState, signals: &mut Vec<Signal>) {
        if input != Input::Release || self.shot.is_some() {
            return;
        }
        self.shot = Some(Shot {
            x: SHOT_RELEASE_X,
            y: SHOT_RELEASE_Y,
        });
        signals.push(Signal::Released);
    }

    fn verdict(&self, _run: &RunState, tally: Tally) -> Verdict {
        if tally.misses > 0 {
            Verdict::ResetScore
        } else {
            Verdict::Continue
        }
    }

    fn bodies(&self) -> ShotDropView {
        ShotDropView {
            glass_x: self.glass_x,
            shot: self.shot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Cue;
    use crate::engine::testing::{Cues, Recorded};
    use crate::engine::{Engine, Phase};

    fn engine() -> (Engine<ShotDrop>, Recorded, Cues) {
        let rec = Recorded::default();
        let cues = Cues::default();
        let mut e = Engine::new(ShotDrop::new(), Box::new(cues.clone()), Box::new(rec.clone()));
        e.set_player("Jin");
        e.start(0.0);
        (e, rec, cues)
    }

    /// Put a shot just above the band and park the glass so it reaches
    /// `glass_after` on the next tick.
    fn arm(e: &mut Engine<ShotDrop>, shot_x: f64, glass_after: f64) {
        let speed = glass_speed(e.run.score);
        e.rules.glass_x = glass_after - speed;
        e.rules.glass_dir = 1.0;
        e.rules.shot = Some(Shot { x: shot_x, y: 74.0 });
    }

    #[test]
    fn test_lateral_threshold_is_strict() {
        assert!(shot_lands(61.0, 50.0));
        assert!(!shot_lands(62.0, 50.0));
        assert!(!shot_lands(63.0, 50.0));
        assert!(shot_lands(39.5, 50.0));
    }

    #[test]
    fn test_band_is_open_interval() {
        assert!(!in_catch_band(75.0));
        assert!(in_catch_band(82.0));
        assert!(!in_catch_band(85.0));
    }

    #[test]
    fn test_glass_speed_grows_with_score() {
        assert_eq!(glass_speed(0), 2.0);
        assert!((glass_speed(10) - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_glass_bounces_between_bounds() {
        let mut rules = ShotDrop::new();
        let run = RunState::default();
        let mut signals = Vec::new();
        let mut max_seen: f64 = 0.0;
        let mut min_seen: f64 = 100.0;
        for _ in 0..200 {
            rules.step(&run, &mut signals);
            max_seen = max_seen.max(rules.glass_x);
            min_seen = min_seen.min(rules.glass_x);
        }
        assert!(max_seen > GLASS_MAX_X && max_seen <= GLASS_MAX_X + glass_speed(0));
        assert!(min_seen < GLASS_MIN_X && min_seen >= GLASS_MIN_X - glass_speed(0));
        assert!(signals.is_empty());
    }

    #[test]
    fn test_release_spawns_one_shot_at_a_time() {
        let (mut e, _rec, cues) = engine();
        e.handle(Input::Release);
        e.handle(Input::Release);
        assert_eq!(
            e.snapshot().bodies.shot,
            Some(Shot { x: SHOT_RELEASE_X, y: SHOT_RELEASE_Y })
        );
        assert_eq!(*cues.0.borrow(), vec![Cue::Drop]);
        e.handle(Input::Tap);
        assert_eq!(cues.0.borrow().len(), 1);
    }

    #[test]
    fn test_shot_within_twelve_is_caught() {
        let (mut e, rec, cues) = engine();
        arm(&mut e, 61.0, 50.0);
        e.tick(16.0);
        assert_eq!(e.rules.glass_x, 50.0);
        assert_eq!(e.run().score, 1);
        assert!(e.snapshot().bodies.shot.is_none());
        assert_eq!(e.snapshot().feedback, Some("DAEBAK!"));
        assert_eq!(*cues.0.borrow(), vec![Cue::Hit]);
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn test_shot_thirteen_away_spills_and_resets_score() {
        let (mut e, rec, _cues) = engine();
        e.run.score = 2;
        arm(&mut e, 63.0, 50.0);
        e.rules.glass_dir = -1.0;
        e.rules.glass_x = 50.0 + glass_speed(2);
        let mut t = 0.0;
        while e.rules.shot.is_some() {
            t += 16.0;
            e.tick(t);
        }
        assert_eq!(e.run().score, 0);
        assert_eq!(e.run().misses, 1);
        assert_eq!(e.phase(), Phase::Playing, "a spill never ends the session");
        assert_eq!(e.snapshot().feedback, Some("STAINED!"));
        assert_eq!(rec.calls(), vec![(GameId::DropCatch, "Jin".to_string(), 2)]);
    }

    #[test]
    fn test_spill_with_zero_score_records_nothing() {
        let (mut e, rec, _cues) = engine();
        e.handle(Input::Release);
        e.rules.glass_x = 15.0;
        e.rules.glass_dir = 0.0;
        for i in 1..=20 {
            e.tick(i as f64 * 16.0);
        }
        assert_eq!(e.run().misses, 1);
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn test_new_streak_after_spill_is_banked_separately() {
        let (mut e, rec, _cues) = engine();
        e.run.score = 3;
        e.rules.shot = Some(Shot { x: 50.0, y: 99.0 });
        e.rules.glass_x = 15.0;
        e.tick(16.0);
        arm(&mut e, 50.0, 50.0);
        e.tick(32.0);
        assert_eq!(e.run().score, 1);
        e.stop();
        let scores: Vec<i64> = rec.calls().into_iter().map(|c| c.2).collect();
        assert_eq!(scores, vec![3, 1]);
    }
}
