use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use atomic_float::AtomicF64;
use parking_lot::Mutex;
use sheet_schema::Seconds;

use crate::error::PlaybackError;
use crate::time::wall::WallClock;

/// A raw media element: the host's audio player.
///
/// Reading the position is synchronous; `TimeSource` wraps it into a ready
/// future so callers see the same interface as the embedded player.
pub trait MediaElement {
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Halts playback and rewinds to the start.
    fn stop(&mut self);

    fn position(&self) -> Seconds;

    fn load(&mut self, url: &str) -> Result<(), PlaybackError>;
}

/// Media clock fed by an audio thread.
///
/// The audio side holds a [`MediaHandle`], watches the play flag and
/// publishes its playback position; the session side reads it.
pub struct SharedMedia {
    position: Arc<AtomicF64>,
    playing: Arc<AtomicBool>,
    source: Arc<Mutex<Option<String>>>,
}

/// Producer side of a [`SharedMedia`].
#[derive(Clone)]
pub struct MediaHandle {
    position: Arc<AtomicF64>,
    playing: Arc<AtomicBool>,
    source: Arc<Mutex<Option<String>>>,
}

impl SharedMedia {
    pub fn new() -> (Self, MediaHandle) {
        let position = Arc::new(AtomicF64::new(0.0));
        let playing = Arc::new(AtomicBool::new(false));
        let source = Arc::new(Mutex::new(None));
        (
            Self {
                position: position.clone(),
                playing: playing.clone(),
                source: source.clone(),
            },
            MediaHandle {
                position,
                playing,
                source,
            },
        )
    }
}

impl MediaElement for SharedMedia {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.source.lock().is_none() {
            return Err(PlaybackError::NoSource);
        }
        self.playing.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) {
        self.playing.store(false, Ordering::Release);
        self.position.store(0.0, Ordering::Release);
    }

    fn position(&self) -> Seconds {
        self.position.load(Ordering::Acquire)
    }

    fn load(&mut self, url: &str) -> Result<(), PlaybackError> {
        *self.source.lock() = Some(url.to_string());
        self.position.store(0.0, Ordering::Release);
        Ok(())
    }
}

impl MediaHandle {
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn source(&self) -> Option<String> {
        self.source.lock().clone()
    }

    /// Publishes the current playback position. Ignored while stopped so a
    /// late write from the audio thread cannot undo a rewind.
    pub fn publish(&self, position: Seconds) {
        if self.is_playing() {
            self.position.store(position, Ordering::Release);
        }
    }

    pub fn advance(&self, delta: Seconds) {
        if self.is_playing() {
            let current = self.position.load(Ordering::Acquire);
            self.position.store(current + delta, Ordering::Release);
        }
    }
}

/// Media whose position follows a wall clock while playing. Used for
/// headless runs where no audio device exists.
pub struct WallMedia<C: WallClock> {
    clock: C,
    started_at: Option<Seconds>,
    source: Option<String>,
    autoplay_blocked: bool,
}

impl<C: WallClock> WallMedia<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            started_at: None,
            source: None,
            autoplay_blocked: false,
        }
    }

    /// A media element whose host refuses to start playback, as a browser
    /// does when autoplay is not allowed.
    pub fn blocked(clock: C) -> Self {
        Self {
            autoplay_blocked: true,
            ..Self::new(clock)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }
}

impl<C: WallClock> MediaElement for WallMedia<C> {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.autoplay_blocked {
            return Err(PlaybackError::Rejected("autoplay is not allowed".to_string()));
        }
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now_seconds());
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.started_at = None;
    }

    fn position(&self) -> Seconds {
        match self.started_at {
            Some(start) => (self.clock.now_seconds() - start).max(0.0),
            None => 0.0,
        }
    }

    fn load(&mut self, url: &str) -> Result<(), PlaybackError> {
        self.source = Some(url.to_string());
        self.started_at = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::wall::ManualWallClock;

    #[test]
    fn shared_media_requires_a_source() {
        let (mut media, handle) = SharedMedia::new();
        assert_eq!(media.play(), Err(PlaybackError::NoSource));

        media.load("song.ogg").unwrap();
        media.play().unwrap();
        assert!(handle.is_playing());
        assert_eq!(handle.source().as_deref(), Some("song.ogg"));
    }

    #[test]
    fn shared_media_stop_rewinds_and_ignores_late_writes() {
        let (mut media, handle) = SharedMedia::new();
        media.load("song.ogg").unwrap();
        media.play().unwrap();

        handle.publish(1.25);
        assert_eq!(media.position(), 1.25);

        media.stop();
        handle.advance(0.5);
        assert_eq!(media.position(), 0.0);
    }

    #[test]
    fn wall_media_follows_clock_while_playing() {
        let clock = ManualWallClock::new();
        let mut media = WallMedia::new(clock.clone());

        clock.set(5.0);
        assert_eq!(media.position(), 0.0);
        media.play().unwrap();
        clock.advance(1.5);
        assert!((media.position() - 1.5).abs() < 1e-9);

        media.stop();
        assert_eq!(media.position(), 0.0);
        assert!(!media.is_playing());
    }

    #[test]
    fn blocked_wall_media_rejects_play() {
        let mut media = WallMedia::blocked(ManualWallClock::new());
        assert!(matches!(media.play(), Err(PlaybackError::Rejected(_))));
        assert!(!media.is_playing());
    }
}
