use futures::task::SpawnError;
use thiserror::Error;

/// Why a media clock refused to start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("playback rejected by host: {0}")]
    Rejected(String),

    #[error("no media source loaded")]
    NoSource,

    #[error("media backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot swap media source while playing; stop first")]
    SourceBusy,

    #[error("session has been destroyed")]
    Destroyed,

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("failed to schedule time query: {0}")]
    Spawn(#[from] SpawnError),
}
