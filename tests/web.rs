// Browser-only checks: `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use bop_arcade::score::{BrowserStorage, KeyValueStore, ScoreRecord, browser_today};
use bop_arcade::web::{self, FrameLoop};
use bop_arcade::{GameId, ScoreSink, ScoreStore};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_round_trip() {
    let storage = BrowserStorage::open().expect("localStorage available");
    let mut store = ScoreStore::new(storage, browser_today);
    store
        .storage_mut()
        .set(GameId::DropCatch.storage_key(), "[]")
        .unwrap();
    store.record_score(GameId::DropCatch, "Web", 3);
    let board = store.leaderboard(GameId::DropCatch);
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].score, 3);
    assert!(!board[0].date.is_empty());
}

#[wasm_bindgen_test]
fn unknown_game_is_rejected() {
    assert!(bop_arcade::web::mount_game("darts").is_err());
    assert!(bop_arcade::web::mount_game("wing-catcher").is_ok());
    let snapshot = bop_arcade::web::snapshot_json();
    assert!(snapshot.contains(r#""phase":"idle""#), "{snapshot}");
    bop_arcade::web::unmount_game();
    assert_eq!(bop_arcade::web::snapshot_json(), "null");
}

/// Resolves on the next animation frame, after any callbacks queued earlier.
async fn next_frame() {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        web_sys::window()
            .unwrap()
            .request_animation_frame(&resolve)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

fn clear_board(game: GameId) {
    BrowserStorage::open()
        .unwrap()
        .set(game.storage_key(), "[]")
        .unwrap();
}

fn board(game: GameId) -> Vec<ScoreRecord> {
    serde_json::from_str(&web::leaderboard_json(game.slug()).unwrap()).unwrap()
}

fn phase() -> String {
    let snapshot: serde_json::Value = serde_json::from_str(&web::snapshot_json()).unwrap();
    snapshot["phase"].as_str().unwrap().to_string()
}

#[wasm_bindgen_test]
async fn unmounting_a_running_game_cancels_frames_and_banks_once() {
    clear_board(GameId::RhythmTap);
    web::set_player_name("Frame");
    web::mount_game("vinyl-scratch").unwrap();
    web::start_game().unwrap();
    assert!(web::frame_pending());

    // The first frame drops a note under the needle; tapping right after hits it.
    next_frame().await;
    web::tap();
    assert_eq!(phase(), "playing");
    let snapshot: serde_json::Value = serde_json::from_str(&web::snapshot_json()).unwrap();
    assert!(snapshot["score"].as_u64().unwrap() > 0, "{snapshot}");

    web::unmount_game();
    assert!(!web::frame_pending());
    next_frame().await;
    next_frame().await;

    assert_eq!(web::snapshot_json(), "null");
    let records = board(GameId::RhythmTap);
    assert_eq!(records.len(), 1, "{records:?}");
    assert_eq!(records[0].player_name, "Frame");
}

#[wasm_bindgen_test]
async fn stop_cancels_the_pending_frame_and_stays_idle() {
    clear_board(GameId::CatchFalling);
    web::mount_game("wing-catcher").unwrap();
    web::start_game().unwrap();
    next_frame().await;
    assert_eq!(phase(), "playing");

    web::stop_game();
    assert!(!web::frame_pending());
    let stopped = web::snapshot_json();
    next_frame().await;
    next_frame().await;

    assert_eq!(phase(), "idle");
    assert_eq!(web::snapshot_json(), stopped, "no tick may run after stop");
    assert!(!web::frame_pending());
    assert!(board(GameId::CatchFalling).is_empty());
    web::unmount_game();
}

#[wasm_bindgen_test]
async fn frame_loop_stops_rescheduling_when_told_to() {
    let calls = Rc::new(Cell::new(0u32));
    let seen = calls.clone();
    let frames = FrameLoop::start(move |_ts| {
        seen.set(seen.get() + 1);
        seen.get() < 2
    })
    .unwrap();
    assert!(frames.is_pending());

    for _ in 0..5 {
        next_frame().await;
    }
    assert_eq!(calls.get(), 2);
    assert!(!frames.is_pending());
    drop(frames);
    // The dropped loop's closure must not be invoked again.
    next_frame().await;
    assert_eq!(calls.get(), 2);
}

#[wasm_bindgen_test]
async fn dropping_a_loop_cancels_its_frame() {
    let calls = Rc::new(Cell::new(0u32));
    let seen = calls.clone();
    let mut frames = FrameLoop::start(move |_ts| {
        seen.set(seen.get() + 1);
        true
    })
    .unwrap();
    frames.cancel();
    assert!(!frames.is_pending());
    drop(frames);
    next_frame().await;
    next_frame().await;
    assert_eq!(calls.get(), 0);
}

#[wasm_bindgen_test]
fn oracle_greets_in_character() {
    assert!(web::oracle_greeting().contains("Chicken Sensei"));
}
