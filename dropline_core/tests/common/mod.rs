#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dropline_core::layout::Viewport;
use dropline_core::render::{NoEffects, NoteSprite, Surface};
use dropline_core::time::{
    ManualWallClock, MediaElement, PlayerBridge, PlayerCommand, RemotePlayer, TimeSource, WallClock,
};
use dropline_core::{PlaybackError, SessionConfig, SessionController};
use futures::channel::oneshot;

#[derive(Default)]
struct FakeMediaState {
    plays: Cell<u32>,
    stops: Cell<u32>,
    playing: Cell<bool>,
    position: Cell<f64>,
    reject: Cell<bool>,
    source: RefCell<Option<String>>,
}

/// Media element whose position is set by the test.
#[derive(Clone, Default)]
pub struct FakeMedia {
    state: Rc<FakeMediaState>,
}

impl FakeMedia {
    pub fn plays(&self) -> u32 {
        self.state.plays.get()
    }

    pub fn stops(&self) -> u32 {
        self.state.stops.get()
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing.get()
    }

    pub fn current_position(&self) -> f64 {
        self.state.position.get()
    }

    pub fn set_position(&self, seconds: f64) {
        self.state.position.set(seconds);
    }

    pub fn reject_play(&self) {
        self.state.reject.set(true);
    }

    pub fn source(&self) -> Option<String> {
        self.state.source.borrow().clone()
    }
}

impl MediaElement for FakeMedia {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.state.plays.set(self.state.plays.get() + 1);
        if self.state.reject.get() {
            return Err(PlaybackError::Rejected("autoplay".to_string()));
        }
        self.state.playing.set(true);
        Ok(())
    }

    fn stop(&mut self) {
        self.state.stops.set(self.state.stops.get() + 1);
        self.state.playing.set(false);
        self.state.position.set(0.0);
    }

    fn position(&self) -> f64 {
        self.state.position.get()
    }

    fn load(&mut self, url: &str) -> Result<(), PlaybackError> {
        *self.state.source.borrow_mut() = Some(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    pub clears: usize,
    pub tracks: usize,
    pub notes: Vec<NoteSprite>,
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.clears += 1;
    }

    fn draw_track(&mut self, _lane: usize, _x: f32, _width: f32, _hit_line_y: f32) {
        self.tracks += 1;
    }

    fn draw_note(&mut self, sprite: NoteSprite) {
        self.notes.push(sprite);
    }
}

pub struct Harness {
    pub session: SessionController,
    pub clock: ManualWallClock,
    pub media: FakeMedia,
    pub bridge: PlayerBridge,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let clock = ManualWallClock::new();
        let media = FakeMedia::default();
        let (player, bridge) = RemotePlayer::new();
        let source = TimeSource::new(Box::new(media.clone()), Box::new(player));
        let session = SessionController::new(
            config,
            Box::new(clock.clone()),
            source,
            Box::new(NoEffects),
            Viewport::new(800.0, 600.0),
        );
        Self {
            session,
            clock,
            media,
            bridge,
        }
    }

    pub fn now(&self) -> f64 {
        self.clock.now_seconds()
    }

    /// Advances the wall clock in 100ms steps, ticking the session after each.
    pub fn step(&mut self, steps: usize) {
        for _ in 0..steps {
            self.clock.advance(0.1);
            self.session.tick().unwrap();
        }
    }

    /// Answer senders for every time query the player has received, in
    /// request order. Other commands are discarded.
    pub fn time_queries(&self) -> Vec<oneshot::Sender<f64>> {
        self.bridge
            .drain()
            .into_iter()
            .filter_map(|cmd| match cmd {
                PlayerCommand::QueryTime(reply) => Some(reply),
                _ => None,
            })
            .collect()
    }
}
