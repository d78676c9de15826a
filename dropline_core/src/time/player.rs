use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use sheet_schema::Seconds;

use crate::error::PlaybackError;

/// Pending answer to a playback position request. `None` means the clock
/// dropped the request and the caller must discard it.
pub type TimeQuery = LocalBoxFuture<'static, Option<Seconds>>;

/// An embedded video player that can only be reached through messages.
pub trait EmbeddedPlayer {
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Stops the video and seeks back to the start.
    fn reset(&mut self);

    fn load(&mut self, video_id: &str) -> Result<(), PlaybackError>;

    fn request_time(&self) -> TimeQuery;
}

#[derive(Debug)]
pub enum PlayerCommand {
    Play,
    Reset,
    Load(String),
    QueryTime(oneshot::Sender<Seconds>),
}

/// Session side of a message-driven player.
pub struct RemotePlayer {
    command_tx: Sender<PlayerCommand>,
}

/// Player side: receives commands and answers time queries.
pub struct PlayerBridge {
    command_rx: Receiver<PlayerCommand>,
}

impl RemotePlayer {
    pub fn new() -> (Self, PlayerBridge) {
        let (tx, rx) = unbounded();
        (Self { command_tx: tx }, PlayerBridge { command_rx: rx })
    }

    fn send(&self, command: PlayerCommand) -> Result<(), PlaybackError> {
        self.command_tx
            .send(command)
            .map_err(|_| PlaybackError::Backend("player bridge disconnected".to_string()))
    }
}

impl EmbeddedPlayer for RemotePlayer {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.send(PlayerCommand::Play)
    }

    fn reset(&mut self) {
        let _ = self.send(PlayerCommand::Reset);
    }

    fn load(&mut self, video_id: &str) -> Result<(), PlaybackError> {
        self.send(PlayerCommand::Load(video_id.to_string()))
    }

    fn request_time(&self) -> TimeQuery {
        let (tx, rx) = oneshot::channel();
        if self.send(PlayerCommand::QueryTime(tx)).is_err() {
            return future::ready(None).boxed_local();
        }
        async move { rx.await.ok() }.boxed_local()
    }
}

impl PlayerBridge {
    /// Non-blocking. Returns None if no command is waiting.
    pub fn try_next(&self) -> Option<PlayerCommand> {
        self.command_rx.try_recv().ok()
    }

    pub fn drain(&self) -> Vec<PlayerCommand> {
        self.command_rx.try_iter().collect()
    }
}
