use crate::layout::Viewport;

/// Raw events from the host's input and display surface.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    KeyDown(String),
    /// Horizontal coordinates of every touch that started in this event.
    TouchStart(Vec<f32>),
    Resize(Viewport),
}

impl HostEvent {
    pub fn key(key: impl Into<String>) -> Self {
        HostEvent::KeyDown(key.into())
    }
}
