pub mod frame;

pub use frame::{CancelToken, LoopControl};

pub const NOTE_HEIGHT: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSprite {
    pub lane: usize,
    /// Index of the note in the session's sheet.
    pub note_index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Drawing target the session renders into once per frame.
pub trait Surface {
    fn clear(&mut self);

    fn draw_track(&mut self, lane: usize, x: f32, width: f32, hit_line_y: f32);

    fn draw_note(&mut self, sprite: NoteSprite);
}

/// Background visual effects, drawn before the lanes.
pub trait EffectRenderer {
    fn render(&mut self, surface: &mut dyn Surface);

    fn select(&mut self, preset: u32) {
        let _ = preset;
    }
}

#[derive(Debug, Default)]
pub struct NoEffects;

impl EffectRenderer for NoEffects {
    fn render(&mut self, _surface: &mut dyn Surface) {}
}
