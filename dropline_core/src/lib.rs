pub mod config;
pub mod error;
pub mod input;
pub mod lane;
pub mod layout;
pub mod render;
pub mod session;
pub mod store;
pub mod time;

pub use config::SessionConfig;
pub use error::{PlaybackError, SessionError};
pub use session::{Session, SessionController, SessionState};
