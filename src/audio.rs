//! Audio feedback as an injected capability.
//!
//! Engines only see [`AudioFeedback`]; the browser implementation synthesizes
//! short oscillator blips with Web Audio. Any failure (no `AudioContext`,
//! autoplay policy, node errors) drops the backend into silent mode for the
//! rest of its life. Sound is never required for correct play.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsValue;
use web_sys::{AudioContext, AudioContextState, AudioScheduledSourceNode, OscillatorType};

/// Feedback events an engine can signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Drop-catch shot released.
    Drop,
    Hit,
    Miss,
    /// Catch-falling ran out of lives.
    GameOver,
}

pub trait AudioFeedback {
    /// Lazily acquire the output device. Called on every start action.
    fn ensure_ready(&mut self);
    fn play(&mut self, cue: Cue);
}

/// One output device shared by every engine the shell mounts.
impl<T: AudioFeedback> AudioFeedback for Rc<RefCell<T>> {
    fn ensure_ready(&mut self) {
        self.borrow_mut().ensure_ready();
    }

    fn play(&mut self, cue: Cue) {
        self.borrow_mut().play(cue);
    }
}

/// No-op backend.
#[derive(Default, Debug, Clone, Copy)]
pub struct SilentAudio;

impl AudioFeedback for SilentAudio {
    fn ensure_ready(&mut self) {}
    fn play(&mut self, _cue: Cue) {}
}

/// Envelope of one synthesized blip.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Blip {
    wave: OscillatorType,
    freq_from: f64,
    freq_to: Option<(f64, Ramp)>,
    gain: f64,
    gain_to: (f64, Ramp),
    seconds: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Ramp {
    Linear,
    Exponential,
}

fn blip_for(cue: Cue) -> Blip {
    match cue {
        Cue::Drop => Blip {
            wave: OscillatorType::Sine,
            freq_from: 440.0,
            freq_to: Some((110.0, Ramp::Exponential)),
            gain: 0.1,
            gain_to: (0.01, Ramp::Exponential),
            seconds: 0.1,
        },
        Cue::Hit => Blip {
            wave: OscillatorType::Sine,
            freq_from: 600.0,
            freq_to: Some((1200.0, Ramp::Exponential)),
            gain: 0.1,
            gain_to: (0.01, Ramp::Exponential),
            seconds: 0.1,
        },
        Cue::Miss => Blip {
            wave: OscillatorType::Triangle,
            freq_from: 200.0,
            freq_to: Some((50.0, Ramp::Linear)),
            gain: 0.1,
            gain_to: (0.01, Ramp::Exponential),
            seconds: 0.2,
        },
        Cue::GameOver => Blip {
            wave: OscillatorType::Sawtooth,
            freq_from: 150.0,
            freq_to: Some((30.0, Ramp::Linear)),
            gain: 0.2,
            gain_to: (0.0, Ramp::Linear),
            seconds: 1.0,
        },
    }
}

/// Web Audio backend. Created empty; the context is opened on `ensure_ready`
/// because browsers only allow it after a user gesture.
#[derive(Default)]
pub struct WebAudio {
    ctx: Option<AudioContext>,
    failed: bool,
}

impl WebAudio {
    pub fn new() -> Self {
        Self::default()
    }

    fn degrade(&mut self, what: &str, err: JsValue) {
        tracing::warn!(?err, "{what} failed, continuing without sound");
        self.failed = true;
        self.ctx = None;
    }

    fn schedule(ctx: &AudioContext, blip: Blip) -> Result<(), JsValue> {
        if ctx.state() == AudioContextState::Suspended {
            // Resolves asynchronously; the blip is scheduled on the context clock either way.
            let _ = ctx.resume()?;
        }
        let osc = ctx.create_oscillator()?;
        let gain = ctx.create_gain()?;
        osc.set_type(blip.wave);
        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&ctx.destination())?;

        let now = ctx.current_time();
        let end = now + blip.seconds;
        let freq = osc.frequency();
        freq.set_value_at_time(blip.freq_from as f32, now)?;
        if let Some((to, ramp)) = blip.freq_to {
            match ramp {
                Ramp::Linear => freq.linear_ramp_to_value_at_time(to as f32, end)?,
                Ramp::Exponential => freq.exponential_ramp_to_value_at_time(to as f32, end)?,
            };
        }
        let level = gain.gain();
        level.set_value_at_time(blip.gain as f32, now)?;
        match blip.gain_to.1 {
            Ramp::Linear => level.linear_ramp_to_value_at_time(blip.gain_to.0 as f32, end)?,
            Ramp::Exponential => level.exponential_ramp_to_value_at_time(blip.gain_to.0 as f32, end)?,
        };

        let source: &AudioScheduledSourceNode = osc.as_ref();
        source.start_with_when(now)?;
        source.stop_with_when(end)?;
        Ok(())
    }
}

impl AudioFeedback for WebAudio {
    fn ensure_ready(&mut self) {
        if self.ctx.is_some() || self.failed {
            return;
        }
        match AudioContext::new() {
            Ok(ctx) => self.ctx = Some(ctx),
            Err(err) => self.degrade("AudioContext creation", err),
        }
    }

    fn play(&mut self, cue: Cue) {
        let Some(ctx) = self.ctx.as_ref() else {
            return;
        };
        if let Err(err) = Self::schedule(ctx, blip_for(cue)) {
            self.degrade("cue playback", err);
        }
    }
}
