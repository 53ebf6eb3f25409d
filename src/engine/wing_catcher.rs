//! Wing catcher (catch-falling).
//!
//! Wings drop from the top at random columns and speeds; the player drags a
//! bucket along the bottom. Spawns speed up as the score climbs. Five dropped
//! wings end the run.

use rand::Rng;
use rand::rngs::SmallRng;
use serde::Serialize;

use super::{Input, Rules, RunState, Signal, Tally, Verdict};
use crate::score::GameId;
use crate::tuning::{
    BUCKET_MAX_X, BUCKET_MIN_X, BUCKET_START_X, WING_BASE_SPEED, WING_FLOOR_Y, WING_HIT_BAND,
    WING_HIT_DISTANCE, WING_MAX_MISSES, WING_MAX_SPIN, WING_SPAWN_BASE_MS, WING_SPAWN_FLOOR_MS,
    WING_SPAWN_STEP_MS, WING_SPAWN_X_MIN, WING_SPAWN_X_SPAN, WING_SPAWN_Y, WING_SPEED_JITTER,
    WING_SPEED_PER_POINT,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Wing {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub rotation: f64,
    pub spin: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WingCatcherView {
    pub bucket_x: f64,
    pub wings: Vec<Wing>,
    pub lives_left: u32,
}

#[derive(Debug, Clone)]
pub struct WingCatcher {
    bucket_x: f64,
    wings: Vec<Wing>,
    last_spawn_ms: f64,
    next_id: u64,
    misses: u32,
}

impl Default for WingCatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WingCatcher {
    pub fn new() -> Self {
        Self {
            bucket_x: BUCKET_START_X,
            wings: Vec::new(),
            last_spawn_ms: 0.0,
            next_id: 0,
            misses: 0,
        }
    }

    pub fn bucket_x(&self) -> f64 {
        self.bucket_x
    }

    pub fn wings(&self) -> &[Wing] {
        &self.wings
    }

    fn spawn_wing(&mut self, score: u32, rng: &mut SmallRng) {
        let wing = Wing {
            id: self.next_id,
            x: WING_SPAWN_X_MIN + rng.r#gen::<f64>() * WING_SPAWN_X_SPAN,
            y: WING_SPAWN_Y,
            speed: WING_BASE_SPEED
                + rng.r#gen::<f64>() * WING_SPEED_JITTER
                + f64::from(score) * WING_SPEED_PER_POINT,
            rotation: rng.r#gen::<f64>() * 360.0,
            spin: (rng.r#gen::<f64>() * 2.0 - 1.0) * WING_MAX_SPIN,
        };
        self.next_id += 1;
        tracing::debug!(id = wing.id, x = wing.x, speed = wing.speed, "wing spawned");
        self.wings.push(wing);
    }
}

/// Milliseconds between spawns; shrinks with score down to a floor.
pub fn spawn_interval_ms(score: u32) -> f64 {
    (WING_SPAWN_BASE_MS - f64::from(score) * WING_SPAWN_STEP_MS).max(WING_SPAWN_FLOOR_MS)
}

/// Map a pointer's client x into field percent.
pub fn pointer_to_field(client_x: f64, field_left: f64, field_width: f64) -> f64 {
    if field_width <= 0.0 {
        return BUCKET_START_X;
    }
    (client_x - field_left) / field_width * 100.0
}

/// Catch test for a wing at height `y` and column `x` against the bucket.
pub fn bucket_catches(x: f64, y: f64, bucket_x: f64) -> bool {
    (WING_HIT_BAND.0..=WING_HIT_BAND.1).contains(&y) && (x - bucket_x).abs() < WING_HIT_DISTANCE
}

impl Rules for WingCatcher {
    const GAME: GameId = GameId::CatchFalling;
    const HIT_TEXT: &'static str = "YUM!";
    const MISS_TEXT: &'static str = "DROPPED!";
    const END_TEXT: Option<&'static str> = Some("GAME OVER");

    type Bodies = WingCatcherView;

    fn reset(&mut self, now_ms: f64) {
        let bucket_x = self.bucket_x;
        *self = Self::new();
        self.bucket_x = bucket_x;
        self.last_spawn_ms = now_ms;
    }

    fn spawn(&mut self, run: &RunState, now_ms: f64, rng: &mut SmallRng) {
        if now_ms - self.last_spawn_ms > spawn_interval_ms(run.score) {
            self.spawn_wing(run.score, rng);
            self.last_spawn_ms = now_ms;
        }
    }

    fn step(&mut self, run: &RunState, signals: &mut Vec<Signal>) {
        let bucket_x = self.bucket_x;
        self.wings.retain_mut(|wing| {
            let next_y = wing.y + wing.speed;
            if bucket_catches(wing.x, next_y, bucket_x) {
                signals.push(Signal::Hit);
                return false;
            }
            if next_y > WING_FLOOR_Y {
                signals.push(Signal::Miss);
                return false;
            }
            wing.y = next_y;
            wing.rotation += wing.spin;
            true
        });
        self.misses = run.misses
            + signals.iter().filter(|s| **s == Signal::Miss).count() as u32;
    }

    fn input(&mut self, input: Input, _run: &RunState, _signals: &mut Vec<Signal>) {
        if let Input::Pointer { x } = input {
            if x.is_finite() {
                self.bucket_x = x.clamp(BUCKET_MIN_X, BUCKET_MAX_X);
            }
        }
    }

    fn verdict(&self, run: &RunState, _tally: Tally) -> Verdict {
        if run.misses >= WING_MAX_MISSES {
            Verdict::GameOver
        } else {
            Verdict::Continue
        }
    }

    fn bodies(&self) -> WingCatcherView {
        WingCatcherView {
            bucket_x: self.bucket_x,
            wings: self.wings.clone(),
            lives_left: WING_MAX_MISSES.saturating_sub(self.misses),
        }
    }
}
