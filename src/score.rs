//! Local high-score boards.
//!
//! Each game owns one storage key holding a JSON array of [`ScoreRecord`]s,
//! sorted by score (descending) and capped at [`LEADERBOARD_SIZE`]. Every
//! failure path degrades to "no board" or "not saved": losing a leaderboard is
//! cosmetic and must never interrupt play.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::tuning::{ANONYMOUS_PLAYER, LEADERBOARD_SIZE, PLAYER_NAME_MAX_CHARS};

// --- Game identifiers --------------------------------------------------------

/// The closed set of scored games. Serialized with the in-product names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameId {
    /// Drop-catch: release a shot into an oscillating glass.
    #[serde(rename = "shot-drop")]
    DropCatch,
    /// Catch-falling: steer a bucket under falling wings.
    #[serde(rename = "wing-catcher")]
    CatchFalling,
    /// Rhythm-tap: tap notes as they pass the needle on a spinning platter.
    #[serde(rename = "vinyl-scratch")]
    RhythmTap,
}

impl GameId {
    /// Hall of Fame display order.
    pub const ALL: [GameId; 3] = [GameId::DropCatch, GameId::CatchFalling, GameId::RhythmTap];

    pub fn slug(self) -> &'static str {
        match self {
            GameId::DropCatch => "shot-drop",
            GameId::CatchFalling => "wing-catcher",
            GameId::RhythmTap => "vinyl-scratch",
        }
    }

    pub fn from_slug(slug: &str) -> Option<GameId> {
        GameId::ALL.into_iter().find(|g| g.slug() == slug)
    }

    /// Storage partition key for this game's board.
    pub fn storage_key(self) -> &'static str {
        match self {
            GameId::DropCatch => "bop_scores_shot_drop",
            GameId::CatchFalling => "bop_scores_wing_catcher",
            GameId::RhythmTap => "bop_scores_vinyl_scratch",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameId::DropCatch => "Bokbunja POP",
            GameId::CatchFalling => "Wing Catcher",
            GameId::RhythmTap => "Vinyl Scratch",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// --- Records -----------------------------------------------------------------

/// One finished attempt. Built once at the end of a run and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub player_name: String,
    pub score: u32,
    pub date: String,
}

impl ScoreRecord {
    pub fn new(player_name: &str, score: u32, date: String) -> Self {
        Self {
            player_name: display_name(player_name),
            score,
            date,
        }
    }
}

/// Trim and truncate a player name for the board; blank names are anonymous.
pub fn display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ANONYMOUS_PLAYER.to_string();
    }
    trimmed.chars().take(PLAYER_NAME_MAX_CHARS).collect()
}

/// Insert `record` into `board` keeping it sorted descending by score and at
/// most [`LEADERBOARD_SIZE`] long. Equal scores keep insertion order.
pub fn insert_ranked(board: &mut Vec<ScoreRecord>, record: ScoreRecord) {
    board.push(record);
    // sort_by is stable, so earlier equal scores stay ahead.
    board.sort_by(|a, b| b.score.cmp(&a.score));
    board.truncate(LEADERBOARD_SIZE);
}

// --- Storage backends --------------------------------------------------------

/// Minimal string key-value store (the shape of `window.localStorage`).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process store used natively and in tests.
#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, e.g. to simulate corrupted storage.
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `window.localStorage`.
pub struct BrowserStorage {
    storage: web_sys::Storage,
}

impl BrowserStorage {
    pub fn open() -> Result<Self, StoreError> {
        let win = web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".into()))?;
        let storage = win
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::WriteRejected {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })
    }
}

/// Whatever the device offers: `localStorage`, or memory when it is blocked.
pub enum DeviceStore {
    Browser(BrowserStorage),
    Memory(MemoryStore),
}

impl DeviceStore {
    pub fn open() -> Self {
        match BrowserStorage::open() {
            Ok(storage) => DeviceStore::Browser(storage),
            Err(err) => {
                tracing::warn!(error = %err, "scores will only last for this visit");
                DeviceStore::Memory(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for DeviceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            DeviceStore::Browser(s) => s.get(key),
            DeviceStore::Memory(s) => s.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            DeviceStore::Browser(s) => s.set(key, value),
            DeviceStore::Memory(s) => s.set(key, value),
        }
    }
}

// --- Score store -------------------------------------------------------------

/// What a game engine needs from the score store.
pub trait ScoreSink {
    /// Record a finished attempt. Non-positive scores are ignored.
    fn record_score(&mut self, game: GameId, player_name: &str, score: i64);
}

/// Engines and the leaderboard view share one store.
impl<T: ScoreSink> ScoreSink for Rc<RefCell<T>> {
    fn record_score(&mut self, game: GameId, player_name: &str, score: i64) {
        self.borrow_mut().record_score(game, player_name, score);
    }
}

/// Leaderboards on top of any [`KeyValueStore`].
pub struct ScoreStore<S> {
    storage: S,
    today: Box<dyn Fn() -> String>,
}

impl<S: KeyValueStore> ScoreStore<S> {
    /// `today` yields the caller-locale calendar date stamped on new records.
    pub fn new(storage: S, today: impl Fn() -> String + 'static) -> Self {
        Self {
            storage,
            today: Box::new(today),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// The persisted board for `game`; empty when absent, unreadable or corrupt.
    pub fn leaderboard(&self, game: GameId) -> Vec<ScoreRecord> {
        match self.load(game) {
            Ok(board) => board,
            Err(err) => {
                tracing::warn!(%game, error = %err, "leaderboard unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// All boards in display order.
    pub fn leaderboards(&self) -> Vec<(GameId, Vec<ScoreRecord>)> {
        GameId::ALL
            .into_iter()
            .map(|g| (g, self.leaderboard(g)))
            .collect()
    }

    /// Top score on the board, 0 if empty.
    pub fn best(&self, game: GameId) -> u32 {
        self.leaderboard(game).first().map_or(0, |r| r.score)
    }

    fn load(&self, game: GameId) -> Result<Vec<ScoreRecord>, StoreError> {
        let key = game.storage_key();
        match self.storage.get(key)? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&mut self, game: GameId, board: &[ScoreRecord]) -> Result<(), StoreError> {
        let key = game.storage_key();
        let json = serde_json::to_string(board).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        self.storage.set(key, &json)
    }
}

impl<S: KeyValueStore> ScoreSink for ScoreStore<S> {
    fn record_score(&mut self, game: GameId, player_name: &str, score: i64) {
        if score <= 0 {
            return;
        }
        let score = u32::try_from(score).unwrap_or(u32::MAX);
        let mut board = self.leaderboard(game);
        let record = ScoreRecord::new(player_name, score, (self.today)());
        insert_ranked(&mut board, record);
        match self.save(game, &board) {
            Ok(()) => tracing::info!(%game, score, "score recorded"),
            Err(err) => tracing::warn!(%game, score, error = %err, "score not saved"),
        }
    }
}

/// Locale calendar date from the JS `Date` object (e.g. `10/16/2026` in en-US).
pub fn browser_today() -> String {
    js_sys::Date::new_0()
        .to_locale_date_string("default", &wasm_bindgen::JsValue::UNDEFINED)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ScoreStore<MemoryStore> {
        ScoreStore::new(MemoryStore::new(), || "10/16/2026".to_string())
    }

    struct FullDisk;

    impl KeyValueStore for FullDisk {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteRejected {
                key: key.to_string(),
                reason: "QuotaExceededError".into(),
            })
        }
    }

    #[test]
    fn test_slugs_round_trip_and_keys_are_distinct() {
        for g in GameId::ALL {
            assert_eq!(GameId::from_slug(g.slug()), Some(g));
        }
        assert_eq!(GameId::from_slug("pinball"), None);
        assert_ne!(GameId::DropCatch.storage_key(), GameId::RhythmTap.storage_key());
    }

    #[test]
    fn test_display_name_rules() {
        assert_eq!(display_name(""), "Anonymous");
        assert_eq!(display_name("   "), "Anonymous");
        assert_eq!(display_name("  Jin "), "Jin");
        assert_eq!(display_name("ABCDEFGHIJKLMNOP"), "ABCDEFGHIJKL");
    }

    #[test]
    fn test_records_serialize_camel_case() {
        let r = ScoreRecord::new("Mina", 7, "1/2/2026".into());
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"playerName":"Mina","score":7,"date":"1/2/2026"}"#);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut s = store();
        s.record_score(GameId::DropCatch, "first", 5);
        s.record_score(GameId::DropCatch, "second", 5);
        s.record_score(GameId::DropCatch, "top", 9);
        let names: Vec<_> = s
            .leaderboard(GameId::DropCatch)
            .into_iter()
            .map(|r| r.player_name)
            .collect();
        assert_eq!(names, ["top", "first", "second"]);
    }

    #[test]
    fn test_boards_are_partitioned_per_game() {
        let mut s = store();
        s.record_score(GameId::CatchFalling, "a", 3);
        assert!(s.leaderboard(GameId::DropCatch).is_empty());
        assert_eq!(s.best(GameId::CatchFalling), 3);
        assert_eq!(s.leaderboards().len(), 3);
    }

    #[test]
    fn test_corrupt_board_is_overwritten_on_next_write() {
        let mut s = store();
        s.storage_mut().insert_raw(GameId::RhythmTap.storage_key(), "{not json");
        assert!(s.leaderboard(GameId::RhythmTap).is_empty());
        s.record_score(GameId::RhythmTap, "b", 4);
        assert_eq!(s.leaderboard(GameId::RhythmTap).len(), 1);
    }

    #[test]
    fn test_device_store_forwards_to_memory() {
        let mut s = ScoreStore::new(DeviceStore::Memory(MemoryStore::new()), || "d".to_string());
        s.record_score(GameId::DropCatch, "m", 2);
        assert_eq!(s.best(GameId::DropCatch), 2);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut s = ScoreStore::new(FullDisk, || "today".to_string());
        s.record_score(GameId::DropCatch, "x", 12);
        assert!(s.leaderboard(GameId::DropCatch).is_empty());
    }
}
