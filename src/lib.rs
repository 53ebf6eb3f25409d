//! B.O.P arcade core crate.
//!
//! Three bar mini-games (shot drop, wing catcher, vinyl scratch) share one
//! tick-driven [`engine::Engine`]; finished runs land on per-game top-10
//! boards in device storage ([`score`]); the mixer, oracle and cocktail quiz
//! talk to a generative-text service ([`advisor`]). The [`web`] module binds
//! all of it to the browser; everything else also builds and tests natively.

use wasm_bindgen::prelude::*;

pub mod advisor;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod score;
pub mod tuning;
pub mod web;

pub use advisor::{BoilermakerPairing, CocktailIdentity, MOODS, QUIZ_QUESTIONS};
pub use engine::vinyl_scratch::TRACKS;
pub use engine::{Cabinet, Engine, Input, Phase, Snapshot};
pub use error::{AdvisorError, ConfigError, StoreError};
pub use score::{GameId, MemoryStore, ScoreRecord, ScoreSink, ScoreStore};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
