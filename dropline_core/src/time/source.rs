use futures::future::{self, FutureExt};
use log::{debug, warn};
use sheet_schema::SourceMode;

use crate::error::{PlaybackError, SessionError};
use crate::time::media::MediaElement;
use crate::time::player::{EmbeddedPlayer, TimeQuery};

/// Result of asking the active clock to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStart {
    Started,
    /// The command was delivered but the clock gives no confirmation.
    Unconfirmed,
    /// Playback did not start. The session keeps running without sound.
    Failed(PlaybackError),
}

impl PlaybackStart {
    pub fn is_failed(&self) -> bool {
        matches!(self, PlaybackStart::Failed(_))
    }
}

/// One clock for the session, backed by either the raw media element or the
/// embedded player depending on the source mode.
pub struct TimeSource {
    media: Box<dyn MediaElement>,
    player: Box<dyn EmbeddedPlayer>,
    mode: SourceMode,
    playing: bool,
}

impl TimeSource {
    pub fn new(media: Box<dyn MediaElement>, player: Box<dyn EmbeddedPlayer>) -> Self {
        Self {
            media,
            player,
            mode: SourceMode::Url,
            playing: false,
        }
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_mode(&mut self, mode: SourceMode) -> Result<(), SessionError> {
        if self.playing && mode != self.mode {
            return Err(SessionError::SourceBusy);
        }
        self.mode = mode;
        Ok(())
    }

    pub fn play(&mut self) -> PlaybackStart {
        let result = match self.mode {
            SourceMode::Url => self.media.play().map(|_| PlaybackStart::Started),
            SourceMode::EmbeddedVideo => self.player.play().map(|_| PlaybackStart::Unconfirmed),
        };
        match result {
            Ok(start) => {
                self.playing = true;
                start
            }
            Err(err) => {
                warn!("playback did not start ({:?} source): {}", self.mode, err);
                PlaybackStart::Failed(err)
            }
        }
    }

    /// Halts the active clock and rewinds both clocks. Idempotent.
    pub fn stop(&mut self) {
        self.media.stop();
        self.player.reset();
        self.playing = false;
    }

    pub fn current_time(&self) -> TimeQuery {
        match self.mode {
            SourceMode::Url => future::ready(Some(self.media.position())).boxed_local(),
            SourceMode::EmbeddedVideo => self.player.request_time(),
        }
    }

    /// Swaps the media for the active mode. Must be stopped first.
    pub fn load_source(&mut self, id_or_url: &str) -> Result<(), SessionError> {
        if self.playing {
            return Err(SessionError::SourceBusy);
        }
        debug!("loading {:?} source: {}", self.mode, id_or_url);
        match self.mode {
            SourceMode::Url => self.media.load(id_or_url)?,
            SourceMode::EmbeddedVideo => self.player.load(id_or_url)?,
        }
        Ok(())
    }
}
