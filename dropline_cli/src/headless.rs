use dropline_core::layout::Viewport;
use dropline_core::render::{NoEffects, NoteSprite, Surface};
use dropline_core::time::{
    ManualWallClock, PlayerBridge, PlayerCommand, RemotePlayer, TimeSource, WallClock, WallMedia,
};
use dropline_core::{SessionConfig, SessionController, SessionState};
use log::debug;
use sheet_schema::Seconds;

const VIEWPORT: Viewport = Viewport {
    width: 800.0,
    height: 600.0,
};

/// Stands in for the embedded video player: follows the wall clock while
/// playing and answers time queries immediately.
pub struct VideoEmulator {
    bridge: PlayerBridge,
    clock: ManualWallClock,
    started_at: Option<Seconds>,
}

impl VideoEmulator {
    pub fn new(bridge: PlayerBridge, clock: ManualWallClock) -> Self {
        Self {
            bridge,
            clock,
            started_at: None,
        }
    }

    pub fn position(&self) -> Seconds {
        match self.started_at {
            Some(start) => (self.clock.now_seconds() - start).max(0.0),
            None => 0.0,
        }
    }

    pub fn pump(&mut self) {
        while let Some(command) = self.bridge.try_next() {
            match command {
                PlayerCommand::Play => {
                    if self.started_at.is_none() {
                        self.started_at = Some(self.clock.now_seconds());
                    }
                }
                PlayerCommand::Reset => self.started_at = None,
                PlayerCommand::Load(id) => {
                    debug!("video emulator loaded {}", id);
                    self.started_at = None;
                }
                PlayerCommand::QueryTime(reply) => {
                    let _ = reply.send(self.position());
                }
            }
        }
    }
}

/// Surface that only counts what would have been drawn.
#[derive(Debug, Default)]
pub struct TallySurface {
    pub frames: usize,
    pub notes_drawn: usize,
}

impl Surface for TallySurface {
    fn clear(&mut self) {
        self.frames += 1;
    }

    fn draw_track(&mut self, _lane: usize, _x: f32, _width: f32, _hit_line_y: f32) {}

    fn draw_note(&mut self, _sprite: NoteSprite) {
        self.notes_drawn += 1;
    }
}

/// A session wired to a manual clock, wall-driven media and an emulated
/// video player.
pub struct Rig {
    pub session: SessionController,
    pub clock: ManualWallClock,
    video: VideoEmulator,
}

impl Rig {
    pub fn new(config: SessionConfig) -> Self {
        let clock = ManualWallClock::new();
        let media = WallMedia::new(clock.clone());
        let (player, bridge) = RemotePlayer::new();
        let source = TimeSource::new(Box::new(media), Box::new(player));
        let session = SessionController::new(
            config,
            Box::new(clock.clone()),
            source,
            Box::new(NoEffects),
            VIEWPORT,
        );
        Self {
            session,
            video: VideoEmulator::new(bridge, clock.clone()),
            clock,
        }
    }

    pub fn now(&self) -> Seconds {
        self.clock.now_seconds()
    }

    /// Lets the player answer and runs whatever became ready.
    pub fn settle(&mut self) {
        self.video.pump();
        self.session.run_until_stalled();
    }

    pub fn advance(&mut self, dt: Seconds) -> anyhow::Result<()> {
        self.clock.advance(dt);
        self.video.pump();
        self.session.tick()?;
        self.settle();
        Ok(())
    }

    pub fn key_down(&mut self, key: &str) -> anyhow::Result<()> {
        self.session.key_down(key)?;
        self.settle();
        Ok(())
    }

    /// Steps until the count-in finishes. Returns the wall time playback
    /// was started at.
    pub fn run_count_in(&mut self, dt: Seconds, limit: Seconds) -> anyhow::Result<Seconds> {
        let deadline = self.now() + limit;
        while self.session.state() == SessionState::CountingIn {
            if self.now() > deadline {
                anyhow::bail!("count-in did not finish within {:.1}s", limit);
            }
            self.advance(dt)?;
        }
        Ok(self.now())
    }
}
