//! Gameplay tuning constants shared by the three cabinets.
//!
//! All positions are percentages of the play field (0 = top/left, 100 =
//! bottom/right). Per-tick values assume one tick per animation frame.

// --- Leaderboard ---------------------------------------------------------------

/// Records kept per game board.
pub const LEADERBOARD_SIZE: usize = 10;
/// Welcome form limit on the player's name.
pub const PLAYER_NAME_MAX_CHARS: usize = 12;
pub const ANONYMOUS_PLAYER: &str = "Anonymous";

// --- Shot drop (drop-catch) ------------------------------------------------------

pub const GLASS_START_X: f64 = 50.0;
pub const GLASS_MIN_X: f64 = 15.0;
pub const GLASS_MAX_X: f64 = 85.0;
pub const GLASS_BASE_SPEED: f64 = 2.0;
pub const GLASS_SPEED_PER_POINT: f64 = 0.12;
/// The dispenser sits centred above the field.
pub const SHOT_RELEASE_X: f64 = 50.0;
pub const SHOT_RELEASE_Y: f64 = 10.0;
pub const SHOT_FALL_PER_TICK: f64 = 8.0;
/// Open band (exclusive on both ends).
pub const SHOT_HIT_BAND: (f64, f64) = (75.0, 85.0);
pub const SHOT_HIT_DISTANCE: f64 = 12.0;
pub const SHOT_FLOOR_Y: f64 = 100.0;

// --- Wing catcher (catch-falling) -------------------------------------------------

pub const BUCKET_START_X: f64 = 50.0;
pub const BUCKET_MIN_X: f64 = 10.0;
pub const BUCKET_MAX_X: f64 = 90.0;
pub const WING_SPAWN_BASE_MS: f64 = 1500.0;
pub const WING_SPAWN_STEP_MS: f64 = 50.0;
pub const WING_SPAWN_FLOOR_MS: f64 = 400.0;
pub const WING_SPAWN_Y: f64 = -10.0;
/// Spawn x is drawn from `[WING_SPAWN_X_MIN, WING_SPAWN_X_MIN + WING_SPAWN_X_SPAN)`.
pub const WING_SPAWN_X_MIN: f64 = 10.0;
pub const WING_SPAWN_X_SPAN: f64 = 80.0;
pub const WING_BASE_SPEED: f64 = 1.5;
pub const WING_SPEED_JITTER: f64 = 2.0;
pub const WING_SPEED_PER_POINT: f64 = 0.1;
pub const WING_MAX_SPIN: f64 = 5.0;
/// Closed band (inclusive on both ends).
pub const WING_HIT_BAND: (f64, f64) = (80.0, 90.0);
pub const WING_HIT_DISTANCE: f64 = 15.0;
pub const WING_FLOOR_Y: f64 = 105.0;
pub const WING_MAX_MISSES: u32 = 5;

// --- Vinyl scratch (rhythm-tap) ---------------------------------------------------

pub const VINYL_ROUND_MS: f64 = 30_000.0;
/// Platter advance per tick is `(bpm / 60) * PLATTER_DEGREES_PER_BEAT_HZ`.
pub const PLATTER_DEGREES_PER_BEAT_HZ: f64 = 1.6;
pub const STRIKE_ANGLE: f64 = 0.0;
pub const NOTE_HIT_ZONE_DEG: f64 = 28.0;
/// Older notes are dropped once this many are on the platter.
pub const MAX_NOTES: usize = 16;
