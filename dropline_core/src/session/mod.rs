pub mod state;

use std::{cell::Cell, rc::Rc};

use anyhow::Context;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use log::{debug, info, warn};
use sheet_schema::{Seconds, Sheet, Song, SourceMode};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::input::events::HostEvent;
use crate::input::{Capture, InputQueue, InputRecorder, Take};
use crate::lane::{LaneSet, LaneStats, NoteTiming};
use crate::layout::{self, Layout, LayoutParams, Viewport};
use crate::render::{CancelToken, EffectRenderer, LoopControl, Surface};
use crate::store::SheetStore;
use crate::time::{PlaybackStart, TimeSource, WallClock};

use self::state::{PlayClock, Timer, TimerGeneration, TimerKind};
pub use self::state::{Session, SessionState};

/// Owns one play session: the lanes, the time source, the input recorder and
/// the working sheet.
///
/// Everything runs on the host's event-loop thread. The host calls
/// [`tick`](Self::tick) from its timer/idle callback, [`frame`](Self::frame)
/// once per display refresh, and [`handle`](Self::handle) for input.
pub struct SessionController {
    config: SessionConfig,
    wall: Box<dyn WallClock>,
    source: TimeSource,
    lanes: LaneSet,
    recorder: InputRecorder,
    take: Take,
    effects: Box<dyn EffectRenderer>,
    store: Option<Box<dyn SheetStore>>,
    pool: LocalPool,
    session: Session,
    play_clock: PlayClock,
    generation: TimerGeneration,
    poll_in_flight: Rc<Cell<Option<u64>>>,
    timer: Option<Timer>,
    token: CancelToken,
    layout: Layout,
    last_start: Option<PlaybackStart>,
    current_song: Option<String>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        wall: Box<dyn WallClock>,
        source: TimeSource,
        effects: Box<dyn EffectRenderer>,
        viewport: Viewport,
    ) -> Self {
        let session = Session::new(config.lead_time_seconds);
        let timing = NoteTiming {
            lead_time: config.lead_time_seconds,
            tolerance: config.hit_tolerance_seconds,
        };
        let lanes = LaneSet::from_bindings(&config.key_bindings, timing);
        let take = Take::new();
        let recorder = InputRecorder::new(config.key_bindings.clone(), take.clone());
        let layout = layout::compute(viewport, layout_params(&config, session.lead_time_seconds));

        let mut controller = Self {
            config,
            wall,
            source,
            lanes,
            recorder,
            take,
            effects,
            store: None,
            pool: LocalPool::new(),
            session,
            play_clock: PlayClock::default(),
            generation: TimerGeneration::default(),
            poll_in_flight: Rc::new(Cell::new(None)),
            timer: None,
            token: CancelToken::new(),
            layout,
            last_start: None,
            current_song: None,
        };
        controller.relayout();
        controller
    }

    pub fn with_store(mut self, store: Box<dyn SheetStore>) -> Self {
        self.set_store(store);
        self
    }

    pub fn set_store(&mut self, store: Box<dyn SheetStore>) {
        self.store = Some(store);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn is_recording(&self) -> bool {
        self.session.recording
    }

    pub fn elapsed_play_time(&self) -> Seconds {
        self.play_clock.get()
    }

    pub fn lanes(&self) -> &LaneSet {
        &self.lanes
    }

    pub fn lane_stats(&self) -> Vec<LaneStats> {
        self.lanes.stats()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn time_source(&self) -> &TimeSource {
        &self.source
    }

    pub fn last_start(&self) -> Option<&PlaybackStart> {
        self.last_start.as_ref()
    }

    pub fn current_song(&self) -> Option<&str> {
        self.current_song.as_deref()
    }

    pub fn has_active_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Copy of the working sheet: the loaded chart, or the presses recorded
    /// so far.
    pub fn sheet(&self) -> Sheet {
        self.take.snapshot()
    }

    /// Plays `song` with its own sheet as the working sheet.
    pub fn start_song(&mut self, song: Song) -> Result<(), SessionError> {
        self.begin(song, TakeSource::Song)
    }

    /// Plays `song` against the working sheet as it is, ignoring the song's
    /// own sheet. Used after [`load_sheet`](Self::load_sheet) or
    /// [`load_demo`](Self::load_demo).
    pub fn play_loaded(&mut self, song: Song) -> Result<(), SessionError> {
        self.begin(song, TakeSource::Loaded)
    }

    /// Starts the song with an empty working sheet and records every bound
    /// key press into it.
    pub fn start_recording(&mut self, song: Song) -> Result<(), SessionError> {
        self.begin(song, TakeSource::Empty)
    }

    fn begin(&mut self, song: Song, take: TakeSource) -> Result<(), SessionError> {
        if self.is_destroyed() {
            return Err(SessionError::Destroyed);
        }
        self.reset_playing(false);

        self.source.set_mode(song.src_mode)?;
        self.session.source_mode = song.src_mode;
        self.session.lead_time_seconds = song
            .lead_time_seconds
            .unwrap_or(self.config.lead_time_seconds);

        let media_id = match song.src_mode {
            SourceMode::Url => song.url.as_deref(),
            SourceMode::EmbeddedVideo => song.video_id.as_deref(),
        };
        if let Some(id) = media_id {
            self.source.load_source(id)?;
        }
        self.current_song = song.url.clone();
        self.effects.select(song.visualizer.unwrap_or(0));

        let recording = take == TakeSource::Empty;
        match take {
            TakeSource::Song => self.take.replace(song.sheet),
            TakeSource::Empty => self.take.clear(),
            TakeSource::Loaded => {}
        }
        self.lanes.set_timing(self.note_timing());
        self.lanes.load(&self.take.snapshot());
        self.relayout();
        self.session.recording = recording;

        info!(
            "starting {} ({} notes, {:?} source, lead {:.2}s)",
            if recording { "recording" } else { "song" },
            self.take.len(),
            self.session.source_mode,
            self.session.lead_time_seconds
        );
        self.count_in();
        Ok(())
    }

    fn count_in(&mut self) {
        let now = self.wall.now_seconds();
        self.session.state = SessionState::CountingIn;
        self.timer = Some(Timer::new(
            TimerKind::CountIn { started_at: now },
            now,
            self.config.poll_interval(),
            self.generation.current(),
        ));
    }

    /// Advances the active timer against the wall clock and runs any async
    /// work that is ready.
    pub fn tick(&mut self) -> Result<(), SessionError> {
        if self.is_destroyed() {
            return Ok(());
        }
        let now = self.wall.now_seconds();
        // settle finished queries first so an answered poll frees its slot
        self.pool.run_until_stalled();
        let fired = match self.timer.as_mut() {
            Some(timer) => timer.poll(now).then_some(timer.kind),
            None => None,
        };
        match fired {
            Some(TimerKind::CountIn { started_at }) => self.count_in_beat(now, now - started_at),
            Some(TimerKind::LivePoll) => self.poll_source()?,
            None => {}
        }
        self.pool.run_until_stalled();
        Ok(())
    }

    /// Drives pending time queries without touching the timers.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    fn count_in_beat(&mut self, now: Seconds, elapsed: Seconds) {
        self.play_clock.set(elapsed);
        if elapsed <= self.session.lead_time_seconds {
            return;
        }

        let start = self.source.play();
        if start.is_failed() {
            warn!("count-in finished but playback did not start; notes will scroll without sound");
        }
        self.last_start = Some(start);
        self.session.state = SessionState::Live;
        self.timer = Some(Timer::new(
            TimerKind::LivePoll,
            now,
            self.config.poll_interval(),
            self.generation.current(),
        ));
        info!("count-in finished after {:.2}s, live", elapsed);
    }

    fn poll_source(&mut self) -> Result<(), SessionError> {
        let Some(issued) = self.timer.as_ref().map(|t| t.generation) else {
            return Ok(());
        };
        if self.poll_in_flight.get() == Some(issued) {
            debug!("previous playback time query still pending, skipping poll");
            return Ok(());
        }
        let query = self.source.current_time();
        let clock = self.play_clock.clone();
        let generation = self.generation.clone();
        let token = self.token.clone();
        let in_flight = self.poll_in_flight.clone();
        let lead = self.session.lead_time_seconds;

        self.poll_in_flight.set(Some(issued));
        self.pool.spawner().spawn_local(async move {
            let answer = query.await;
            if in_flight.get() == Some(issued) {
                in_flight.set(None);
            }
            let Some(time) = answer else {
                debug!("playback time query dropped");
                return;
            };
            if token.is_cancelled() || generation.current() != issued {
                debug!("discarding stale playback time {:.3}s", time);
                return;
            }
            clock.set(time + lead);
        })?;
        Ok(())
    }

    /// Cancels the active timer, stops the time source and rewinds session
    /// time. Safe to call from any state.
    pub fn reset_playing(&mut self, clear_sheet: bool) {
        self.timer = None;
        self.generation.bump();
        self.source.stop();
        if clear_sheet {
            self.take.clear();
        }
        self.lanes.clear();
        self.play_clock.set(0.0);
        self.session.recording = false;
        if matches!(self.session.state, SessionState::CountingIn | SessionState::Live) {
            info!("session stopped");
            self.session.state = SessionState::Stopped;
        }
    }

    /// Stops playback and keeps the working sheet, including anything
    /// recorded.
    pub fn stop(&mut self) {
        self.reset_playing(false);
    }

    /// Makes the session inert. The next frame returns [`LoopControl::Stop`]
    /// and async results still in flight are dropped.
    pub fn destroy(&mut self) {
        self.token.cancel();
        self.reset_playing(false);
        self.session.state = SessionState::Stopped;
    }

    pub fn handle(&mut self, event: HostEvent) -> Result<(), SessionError> {
        match event {
            HostEvent::KeyDown(key) => self.key_down(&key),
            HostEvent::TouchStart(xs) => {
                for x in xs {
                    if let Some(key) = self.lanes.key_at(x).map(str::to_string) {
                        self.key_down(&key)?;
                    }
                }
                Ok(())
            }
            HostEvent::Resize(viewport) => {
                self.resize(viewport);
                Ok(())
            }
        }
    }

    /// Handles every queued host event. Returns how many were processed.
    pub fn drain_input(&mut self, queue: &InputQueue) -> Result<usize, SessionError> {
        let mut handled = 0;
        while let Some(event) = queue.pop() {
            self.handle(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    pub fn key_down(&mut self, key: &str) -> Result<(), SessionError> {
        if self.is_destroyed() {
            return Ok(());
        }
        let capture = if self.session.recording && self.recorder.is_bound(key) {
            Some(Capture {
                query: self.source.current_time(),
                spawner: self.pool.spawner(),
                token: self.token.clone(),
                generation: self.generation.clone(),
                issued: self.generation.current(),
            })
        } else {
            None
        };
        let elapsed = self.play_clock.get();
        self.recorder.on_key_down(key, &mut self.lanes, elapsed, capture)?;
        self.pool.run_until_stalled();
        Ok(())
    }

    /// Geometry only: session time and pending notes are untouched.
    pub fn resize(&mut self, viewport: Viewport) {
        self.layout = layout::compute(
            viewport,
            layout_params(&self.config, self.session.lead_time_seconds),
        );
        self.lanes.apply_layout(&self.layout.lanes);
    }

    fn relayout(&mut self) {
        self.resize(self.layout.viewport);
    }

    fn note_timing(&self) -> NoteTiming {
        NoteTiming {
            lead_time: self.session.lead_time_seconds,
            tolerance: self.config.hit_tolerance_seconds,
        }
    }

    /// One display refresh. Runs in every state until the session is
    /// destroyed.
    pub fn frame(&mut self, surface: &mut dyn Surface) -> LoopControl {
        if self.is_destroyed() {
            return LoopControl::Stop;
        }
        surface.clear();
        self.effects.render(surface);
        self.lanes.update(self.play_clock.get());
        self.lanes.render(self.layout.scroll, surface);
        LoopControl::Continue
    }

    pub fn save_sheet(&mut self, name: &str) -> anyhow::Result<()> {
        let sheet = self.take.snapshot();
        let store = self.store.as_mut().context("no sheet store configured")?;
        store
            .save(name, &sheet)
            .with_context(|| format!("failed to save sheet {:?}", name))
    }

    /// Replaces the working sheet with a stored one. Stops playback and
    /// queues the sheet's notes; [`play_loaded`](Self::play_loaded) plays it.
    pub fn load_sheet(&mut self, name: &str) -> anyhow::Result<()> {
        let store = self.store.as_ref().context("no sheet store configured")?;
        let sheet = store
            .load(name)
            .with_context(|| format!("failed to load sheet {:?}", name))?;
        self.install_sheet(sheet);
        Ok(())
    }

    pub fn load_demo(&mut self, name: &str) -> anyhow::Result<()> {
        let store = self.store.as_ref().context("no sheet store configured")?;
        let sheet = store
            .load_demo(name)
            .with_context(|| format!("failed to load demo {:?}", name))?;
        self.install_sheet(sheet);
        Ok(())
    }

    fn install_sheet(&mut self, sheet: Sheet) {
        self.reset_playing(false);
        self.take.replace(sheet);
        self.lanes.load(&self.take.snapshot());
        debug!("working sheet replaced ({} notes)", self.take.len());
    }
}

/// Where the working sheet comes from when a song starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TakeSource {
    Song,
    Loaded,
    Empty,
}

fn layout_params(config: &SessionConfig, lead_time: Seconds) -> LayoutParams {
    LayoutParams {
        lane_count: config.key_bindings.len(),
        lane_max_width: config.lane_max_width,
        lane_gap: config.lane_gap,
        hit_line_ratio: config.hit_line_ratio,
        lead_time,
    }
}
