pub mod media;
pub mod player;
pub mod source;
pub mod wall;

pub use media::{MediaElement, MediaHandle, SharedMedia, WallMedia};
pub use player::{EmbeddedPlayer, PlayerBridge, PlayerCommand, RemotePlayer, TimeQuery};
pub use source::{PlaybackStart, TimeSource};
pub use wall::{ManualWallClock, SystemWallClock, WallClock};
