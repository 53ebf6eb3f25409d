//! Vinyl scratch (rhythm-tap).
//!
//! A record spins at a speed derived from the selected track's BPM. One note
//! is dropped under the needle on every beat and then rides the platter; the
//! player taps when a note comes back around to the needle. Rounds last 30
//! seconds.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use serde::Serialize;

use super::{Input, Rules, RunState, Signal, Tally, Verdict};
use crate::score::GameId;
use crate::tuning::{
    MAX_NOTES, NOTE_HIT_ZONE_DEG, PLATTER_DEGREES_PER_BEAT_HZ, STRIKE_ANGLE, VINYL_ROUND_MS,
};

// --- Track catalogue ---------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TrackCategory {
    Modern,
    Iconic,
    Retro,
    #[serde(rename = "B.O.P")]
    Bop,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Track {
    pub title: &'static str,
    pub artist: &'static str,
    pub genre: &'static str,
    pub category: TrackCategory,
    pub bpm: f64,
    pub url: &'static str,
    pub color: &'static str,
}

pub const TRACKS: &[Track] = &[
    Track {
        title: "PINK VENOMOUS",
        artist: "B.O.P PINK",
        genre: "K-Pop Trap",
        category: TrackCategory::Modern,
        bpm: 130.0,
        url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3",
        color: "#FF10F0",
    },
    Track {
        title: "DYNAMITE DISCO",
        artist: "B.O.P ARMY",
        genre: "K-Pop Funk",
        category: TrackCategory::Iconic,
        bpm: 114.0,
        url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-10.mp3",
        color: "#FFD700",
    },
    Track {
        title: "WONDER BEAT",
        artist: "RETRO QUEENS",
        genre: "K-Pop Retro",
        category: TrackCategory::Retro,
        bpm: 120.0,
        url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-3.mp3",
        color: "#60a5fa",
    },
    Track {
        title: "FANTASTIC BLAZE",
        artist: "BIG BANGERS",
        genre: "K-Pop Club",
        category: TrackCategory::Iconic,
        bpm: 126.0,
        url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3",
        color: "#fbbf24",
    },
    Track {
        title: "HYPE PONY",
        artist: "NEW BOP",
        genre: "K-Pop R&B",
        category: TrackCategory::Modern,
        bpm: 100.0,
        url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-4.mp3",
        color: "#a78bfa",
    },
    Track {
        title: "FEEL SPECIAL",
        artist: "BOP ONCE",
        genre: "K-Pop Pop",
        category: TrackCategory::Modern,
        bpm: 124.0,
        url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-8.mp3",
        color: "#f472b6",
    },
    Track {
        title: "BOILERMAKER ANTHEM",
        artist: "B.O.P CREW",
        genre: "House",
        category: TrackCategory::Bop,
        bpm: 128.0,
        url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-16.mp3",
        color: "#E51D37",
    },
];

// --- Platter geometry --------------------------------------------------------

/// Degrees the platter turns per tick at `bpm`.
pub fn platter_step(bpm: f64) -> f64 {
    bpm / 60.0 * PLATTER_DEGREES_PER_BEAT_HZ
}

pub fn beat_interval_ms(bpm: f64) -> f64 {
    60_000.0 / bpm
}

/// Shortest distance between two angles in degrees, wrapping at 0/360.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Where a note placed at `angle` currently sits after `rotation` degrees.
pub fn note_position(angle: f64, rotation: f64) -> f64 {
    (angle + rotation).rem_euclid(360.0)
}

// --- Rules -------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Note {
    pub id: u64,
    /// Angle on the record, fixed at spawn.
    pub angle: f64,
    pub active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NoteView {
    pub id: u64,
    /// Current angle relative to the field.
    pub position: f64,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VinylView {
    pub track: usize,
    pub rotation: f64,
    pub strike_angle: f64,
    pub notes: Vec<NoteView>,
}

#[derive(Debug, Clone)]
pub struct VinylScratch {
    track: usize,
    rotation: f64,
    strike_angle: f64,
    notes: VecDeque<Note>,
    last_note_ms: f64,
    next_id: u64,
}

impl Default for VinylScratch {
    fn default() -> Self {
        Self::new()
    }
}

impl VinylScratch {
    pub fn new() -> Self {
        Self {
            track: 0,
            rotation: 0.0,
            strike_angle: STRIKE_ANGLE,
            notes: VecDeque::with_capacity(MAX_NOTES + 1),
            last_note_ms: f64::NEG_INFINITY,
            next_id: 0,
        }
    }

    /// Move the needle (mainly for alternative cabinet layouts).
    pub fn with_strike_angle(mut self, degrees: f64) -> Self {
        self.strike_angle = degrees.rem_euclid(360.0);
        self
    }

    pub fn track(&self) -> &'static Track {
        &TRACKS[self.track]
    }

    /// Pick the round's track; out-of-range indices are rejected.
    pub fn select_track(&mut self, index: usize) -> bool {
        if index < TRACKS.len() {
            self.track = index;
            true
        } else {
            false
        }
    }

    fn drop_note(&mut self) {
        let note = Note {
            id: self.next_id,
            angle: (self.strike_angle - self.rotation).rem_euclid(360.0),
            active: true,
        };
        self.next_id += 1;
        self.notes.push_back(note);
        while self.notes.len() > MAX_NOTES {
            self.notes.pop_front();
        }
    }
}

impl Rules for VinylScratch {
    const GAME: GameId = GameId::RhythmTap;
    const HIT_TEXT: &'static str = "BOOM!";
    const MISS_TEXT: &'static str = "MISS!";
    const END_TEXT: Option<&'static str> = Some("TIME'S UP!");

    type Bodies = VinylView;

    fn reset(&mut self, _now_ms: f64) {
        self.rotation = 0.0;
        self.notes.clear();
        // First note lands on the first frame.
        self.last_note_ms = f64::NEG_INFINITY;
    }

    fn spawn(&mut self, _run: &RunState, now_ms: f64, _rng: &mut SmallRng) {
        if now_ms - self.last_note_ms > beat_interval_ms(self.track().bpm) {
            self.drop_note();
            self.last_note_ms = now_ms;
        }
    }

    fn step(&mut self, _run: &RunState, _signals: &mut Vec<Signal>) {
        self.rotation = (self.rotation + platter_step(self.track().bpm)) % 360.0;
    }

    fn input(&mut self, input: Input, _run: &RunState, signals: &mut Vec<Signal>) {
        if input != Input::Tap {
            return;
        }
        let (rotation, strike) = (self.rotation, self.strike_angle);
        let mut hit = false;
        for note in self.notes.iter_mut().filter(|n| n.active) {
            if angular_distance(note_position(note.angle, rotation), strike) < NOTE_HIT_ZONE_DEG {
                note.active = false;
                hit = true;
                signals.push(Signal::Hit);
            }
        }
        if !hit {
            signals.push(Signal::Miss);
        }
    }

    fn verdict(&self, run: &RunState, _tally: Tally) -> Verdict {
        if run.elapsed_ms >= VINYL_ROUND_MS {
            Verdict::TimeUp
        } else {
            Verdict::Continue
        }
    }

    fn bodies(&self) -> VinylView {
        VinylView {
            track: self.track,
            rotation: self.rotation,
            strike_angle: self.strike_angle,
            notes: self
                .notes
                .iter()
                .map(|n| NoteView {
                    id: n.id,
                    position: note_position(n.angle, self.rotation),
                    active: n.active,
                })
                .collect(),
        }
    }

    fn round_ms(&self) -> Option<f64> {
        Some(VINYL_ROUND_MS)
    }
}
