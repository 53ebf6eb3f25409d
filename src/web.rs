//! Browser bindings.
//!
//! One shell per page, kept in a `thread_local!`. At most one engine is
//! mounted; while it plays, a [`FrameLoop`] ticks it on every animation
//! frame. The JS view pulls JSON snapshots and pushes inputs; it never owns
//! game state.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::advisor::{
    AdvisorKind, AdvisorReply, GeminiClient, MOODS, ORACLE_GREETING, QUIZ_QUESTIONS, QuizProgress, QuizStep,
    RequestGate, Ticket,
};
use crate::audio::WebAudio;
use crate::config::ArcadeConfig;
use crate::engine::vinyl_scratch::TRACKS;
use crate::engine::{Cabinet, Engine, Input, Phase, ShotDrop, VinylScratch, WingCatcher};
use crate::error::{AdvisorError, AdvisorResult};
use crate::score::{DeviceStore, GameId, ScoreRecord, ScoreStore, browser_today};

// --- Frame loop --------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_frame(window: &web_sys::Window, callback: &Closure<dyn FnMut(f64)>) -> Option<i32> {
    window
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| tracing::warn!(?err, "requestAnimationFrame failed"))
        .ok()
}

/// Self-rescheduling `requestAnimationFrame` loop.
///
/// `on_frame` returns whether to keep going. Dropping the loop cancels the
/// pending frame and frees the closure; it must not be dropped from inside
/// its own callback, so a finished loop simply stops rescheduling.
pub struct FrameLoop {
    window: web_sys::Window,
    callback: FrameCallback,
    handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    pub fn start(mut on_frame: impl FnMut(f64) -> bool + 'static) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let handle = Rc::new(Cell::new(None));

        let f = callback.clone();
        let h = handle.clone();
        let w = window.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
            h.set(None);
            if !on_frame(ts) {
                return;
            }
            if let Some(cb) = f.borrow().as_ref() {
                h.set(request_frame(&w, cb));
            }
        }) as Box<dyn FnMut(f64)>));

        let first = callback.borrow().as_ref().and_then(|cb| request_frame(&window, cb));
        if first.is_none() {
            callback.borrow_mut().take();
            return Err(JsValue::from_str("could not schedule the first frame"));
        }
        handle.set(first);
        Ok(Self {
            window,
            callback,
            handle,
        })
    }

    /// Whether a frame is scheduled and not yet run.
    pub fn is_pending(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(id) = self.handle.take() {
            if let Err(err) = self.window.cancel_animation_frame(id) {
                tracing::warn!(?err, "cancelAnimationFrame failed");
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
        // Breaks the closure -> callback cell cycle.
        self.callback.borrow_mut().take();
    }
}

// --- Shell state -------------------------------------------------------------

enum Mounted {
    Shot(Engine<ShotDrop>),
    Wings(Engine<WingCatcher>),
    Vinyl(Engine<VinylScratch>),
}

impl Mounted {
    fn cabinet(&mut self) -> &mut dyn Cabinet {
        match self {
            Mounted::Shot(e) => e,
            Mounted::Wings(e) => e,
            Mounted::Vinyl(e) => e,
        }
    }

    fn cabinet_ref(&self) -> &dyn Cabinet {
        match self {
            Mounted::Shot(e) => e,
            Mounted::Wings(e) => e,
            Mounted::Vinyl(e) => e,
        }
    }
}

struct Shell {
    scores: Rc<RefCell<ScoreStore<DeviceStore>>>,
    audio: Rc<RefCell<WebAudio>>,
    player: String,
    mounted: Option<Mounted>,
    frames: Option<FrameLoop>,
    advisor: Option<Rc<GeminiClient>>,
    gate: RequestGate,
    quiz: QuizProgress,
}

impl Shell {
    fn new() -> Self {
        // No-op when `configure` already installed a subscriber.
        crate::logging::init(crate::config::DEFAULT_LOG_LEVEL);
        Self {
            scores: Rc::new(RefCell::new(ScoreStore::new(DeviceStore::open(), browser_today))),
            audio: Rc::new(RefCell::new(WebAudio::new())),
            player: String::new(),
            mounted: None,
            frames: None,
            advisor: None,
            gate: RequestGate::default(),
            quiz: QuizProgress::new(),
        }
    }

    fn mount(&mut self, game: GameId) {
        self.unmount();
        let best = self.scores.borrow().best(game);
        let audio = Box::new(self.audio.clone());
        let sink = Box::new(self.scores.clone());
        let mut mounted = match game {
            GameId::DropCatch => Mounted::Shot(Engine::new(ShotDrop::new(), audio, sink).with_best(best)),
            GameId::CatchFalling => {
                Mounted::Wings(Engine::new(WingCatcher::new(), audio, sink).with_best(best))
            }
            GameId::RhythmTap => {
                Mounted::Vinyl(Engine::new(VinylScratch::new(), audio, sink).with_best(best))
            }
        };
        mounted.cabinet().set_player(&self.player);
        tracing::info!(%game, best, "game mounted");
        self.mounted = Some(mounted);
    }

    fn unmount(&mut self) {
        self.frames = None;
        if let Some(mut mounted) = self.mounted.take() {
            mounted.cabinet().stop();
            tracing::info!(game = %mounted.cabinet_ref().game(), "game unmounted");
        }
    }

    fn playing(&self) -> bool {
        self.mounted
            .as_ref()
            .is_some_and(|m| m.cabinet_ref().phase() == Phase::Playing)
    }
}

thread_local! {
    static SHELL: RefCell<Option<Shell>> = const { RefCell::new(None) };
}

/// Run `f` on the shell, creating it on first use. `None` on re-entry.
fn with_shell<T>(f: impl FnOnce(&mut Shell) -> T) -> Option<T> {
    SHELL.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        let shell = guard.get_or_insert_with(Shell::new);
        Some(f(shell))
    })
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |p| p.now())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "serialization failed");
        String::from("null")
    })
}

fn unknown_game(slug: &str) -> JsValue {
    JsValue::from_str(&format!("unknown game id {slug:?}"))
}

// --- Session & games ---------------------------------------------------------

/// Apply the JSON configuration from the host page.
#[wasm_bindgen]
pub fn configure(config_json: &str) -> Result<(), JsValue> {
    let config = ArcadeConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    crate::logging::init(&config.log_level);
    let has_advisor = config.advisor.is_some();
    with_shell(|shell| {
        shell.advisor = config.advisor.map(|c| Rc::new(GeminiClient::new(c)));
    });
    tracing::info!(has_advisor, "arcade configured");
    Ok(())
}

#[wasm_bindgen]
pub fn set_player_name(name: &str) {
    let name = name.trim().to_string();
    with_shell(|shell| {
        if let Some(m) = shell.mounted.as_mut() {
            m.cabinet().set_player(&name);
        }
        shell.player = name;
    });
}

#[wasm_bindgen]
pub fn player_name() -> String {
    with_shell(|shell| shell.player.clone()).unwrap_or_default()
}

/// Mount the game with this id, unmounting (and banking) whatever ran before.
#[wasm_bindgen]
pub fn mount_game(game_id: &str) -> Result<(), JsValue> {
    let game = GameId::from_slug(game_id).ok_or_else(|| unknown_game(game_id))?;
    with_shell(|shell| shell.mount(game));
    Ok(())
}

#[wasm_bindgen]
pub fn unmount_game() {
    with_shell(Shell::unmount);
}

fn frame(ts: f64) -> bool {
    with_shell(|shell| {
        let Some(mounted) = shell.mounted.as_mut() else {
            return false;
        };
        let cabinet = mounted.cabinet();
        cabinet.tick(ts);
        cabinet.phase() == Phase::Playing
    })
    .unwrap_or(false)
}

/// Start (or retry) the mounted game and its frame loop.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    let started = with_shell(|shell| {
        let Some(mounted) = shell.mounted.as_mut() else {
            return Err(JsValue::from_str("no game mounted"));
        };
        if mounted.cabinet_ref().phase() == Phase::Playing {
            return Ok(());
        }
        mounted.cabinet().start(now_ms());
        shell.frames = Some(FrameLoop::start(frame)?);
        Ok(())
    });
    started.unwrap_or(Ok(()))
}

/// Whether the mounted game still has an animation frame scheduled.
#[wasm_bindgen]
pub fn frame_pending() -> bool {
    with_shell(|shell| shell.frames.as_ref().is_some_and(FrameLoop::is_pending)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn stop_game() {
    with_shell(|shell| {
        shell.frames = None;
        if let Some(m) = shell.mounted.as_mut() {
            m.cabinet().stop();
        }
    });
}

fn send(input: Input) {
    with_shell(|shell| {
        if let Some(m) = shell.mounted.as_mut() {
            m.cabinet().handle(input);
        }
    });
}

/// Drop-catch action. The first press also starts the round.
#[wasm_bindgen]
pub fn release() -> Result<(), JsValue> {
    if with_shell(|shell| shell.playing()).unwrap_or(false) {
        send(Input::Release);
        Ok(())
    } else {
        start_game()
    }
}

#[wasm_bindgen]
pub fn tap() {
    send(Input::Tap);
}

/// Pointer position over the play field, in viewport pixels.
#[wasm_bindgen]
pub fn pointer_move(client_x: f64, field_left: f64, field_width: f64) {
    let x = crate::engine::wing_catcher::pointer_to_field(client_x, field_left, field_width);
    send(Input::Pointer { x });
}

/// Pick a vinyl track before the round. False while playing or out of range.
#[wasm_bindgen]
pub fn select_track(index: usize) -> bool {
    with_shell(|shell| match shell.mounted.as_mut() {
        Some(Mounted::Vinyl(engine)) => engine
            .rules_mut()
            .is_some_and(|rules| rules.select_track(index)),
        _ => false,
    })
    .unwrap_or(false)
}

#[wasm_bindgen]
pub fn snapshot_json() -> String {
    with_shell(|shell| {
        shell
            .mounted
            .as_ref()
            .map(|m| m.cabinet_ref().snapshot_json())
    })
    .flatten()
    .unwrap_or_else(|| String::from("null"))
}

// --- Leaderboards & catalogues -----------------------------------------------

#[wasm_bindgen]
pub fn leaderboard_json(game_id: &str) -> Result<String, JsValue> {
    let game = GameId::from_slug(game_id).ok_or_else(|| unknown_game(game_id))?;
    let board = with_shell(|shell| shell.scores.borrow().leaderboard(game)).unwrap_or_default();
    Ok(to_json(&board))
}

#[derive(Serialize)]
struct HallEntry<'a> {
    game: GameId,
    label: &'a str,
    scores: Vec<ScoreRecord>,
}

#[wasm_bindgen]
pub fn hall_of_fame_json() -> String {
    let boards = with_shell(|shell| shell.scores.borrow().leaderboards()).unwrap_or_default();
    let entries: Vec<HallEntry<'_>> = boards
        .into_iter()
        .map(|(game, scores)| HallEntry {
            game,
            label: game.label(),
            scores,
        })
        .collect();
    to_json(&entries)
}

#[wasm_bindgen]
pub fn tracks_json() -> String {
    to_json(TRACKS)
}

#[wasm_bindgen]
pub fn moods_json() -> String {
    to_json(MOODS)
}

#[wasm_bindgen]
pub fn quiz_json() -> String {
    to_json(QUIZ_QUESTIONS)
}

// --- Advisors ----------------------------------------------------------------

fn advisor_client() -> Option<Rc<GeminiClient>> {
    with_shell(|shell| shell.advisor.clone()).flatten()
}

fn issue_ticket() -> Option<Ticket> {
    with_shell(|shell| shell.gate.issue())
}

/// Hand a finished request to the view, unless the player moved on.
fn deliver<T: Serialize>(kind: AdvisorKind, ticket: Option<Ticket>, callback: &Function, result: AdvisorResult<T>) {
    let current = ticket
        .and_then(|t| with_shell(|shell| shell.gate.is_current(t)))
        .unwrap_or(false);
    if !current {
        tracing::debug!(?kind, "dropping superseded advisor reply");
        return;
    }
    let reply = AdvisorReply::from_result(kind, result);
    if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&to_json(&reply))) {
        tracing::warn!(?err, "advisor callback threw");
    }
}

#[wasm_bindgen]
pub fn oracle_greeting() -> String {
    ORACLE_GREETING.to_string()
}

/// Ask the oracle; `callback` receives `{"status":"ok"|"fallback","data":...}`.
#[wasm_bindgen]
pub fn ask_oracle(question: String, callback: Function) {
    let ticket = issue_ticket();
    let client = advisor_client();
    spawn_local(async move {
        let result = match client {
            Some(client) => client.wisdom(&question).await,
            None => Err(AdvisorError::NotConfigured),
        };
        deliver(AdvisorKind::Oracle, ticket, &callback, result);
    });
}

#[wasm_bindgen]
pub fn mix_boilermaker(mood: String, callback: Function) {
    let ticket = issue_ticket();
    let client = advisor_client();
    spawn_local(async move {
        let result = match client {
            Some(client) => client.boilermaker(&mood).await,
            None => Err(AdvisorError::NotConfigured),
        };
        deliver(AdvisorKind::Mixer, ticket, &callback, result);
    });
}

fn request_cocktail(answers: Vec<String>, callback: Function) {
    let ticket = issue_ticket();
    let client = advisor_client();
    spawn_local(async move {
        let result = match client {
            Some(client) => client.cocktail_identity(&answers).await,
            None => Err(AdvisorError::NotConfigured),
        };
        deliver(AdvisorKind::Quiz, ticket, &callback, result);
    });
}

/// Reveal the cocktail for a full list of quiz answers (JSON string array).
#[wasm_bindgen]
pub fn reveal_cocktail(answers_json: &str, callback: Function) -> Result<(), JsValue> {
    let answers: Vec<String> =
        serde_json::from_str(answers_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    request_cocktail(answers, callback);
    Ok(())
}

/// Answer the current quiz question. Returns the next question index, or -1
/// once the last answer was given and the reveal request is on its way.
#[wasm_bindgen]
pub fn quiz_answer(choice: usize, callback: Function) -> i32 {
    let step = with_shell(|shell| shell.quiz.answer(choice)).flatten();
    match step {
        Some(QuizStep::Next(index)) => i32::try_from(index).unwrap_or(-1),
        Some(QuizStep::Complete(answers)) => {
            with_shell(|shell| shell.quiz.reset());
            request_cocktail(answers, callback);
            -1
        }
        None => with_shell(|shell| i32::try_from(shell.quiz.current()).unwrap_or(-1)).unwrap_or(0),
    }
}

/// Leaving an advisor screen discards any reply still in flight.
#[wasm_bindgen]
pub fn leave_advisor() {
    with_shell(|shell| {
        shell.gate.supersede();
        shell.quiz.reset();
    });
}
