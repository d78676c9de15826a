use std::collections::VecDeque;

use log::trace;
use sheet_schema::{Seconds, Sheet};

use crate::layout::{LaneRect, Scroll};
use crate::render::{NoteSprite, Surface, NOTE_HEIGHT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteTiming {
    pub lead_time: Seconds,
    /// Half-width of the hit window.
    pub tolerance: Seconds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyOutcome {
    /// The key belongs to another lane.
    Unbound,
    /// No pending note inside the hit window.
    Ignored,
    Hit { note_index: usize, delta: Seconds },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneStats {
    pub hits: u32,
    pub misses: u32,
}

#[derive(Debug, Clone, Copy)]
struct PendingNote {
    index: usize,
    time: Seconds,
}

/// One scrolling column bound to a single key.
///
/// Session time runs `lead_time` ahead of media time: a note with media time
/// `t` enters at the top edge when the session reaches `t` and crosses the
/// hit line at `t + lead_time`.
#[derive(Debug)]
pub struct Lane {
    slot: usize,
    key: String,
    rect: LaneRect,
    timing: NoteTiming,
    pending: VecDeque<PendingNote>,
    elapsed: Seconds,
    stats: LaneStats,
}

impl Lane {
    pub fn new(slot: usize, key: impl Into<String>, timing: NoteTiming) -> Self {
        Self {
            slot,
            key: key.into(),
            rect: LaneRect { x: 0.0, width: 0.0 },
            timing,
            pending: VecDeque::new(),
            elapsed: 0.0,
            stats: LaneStats::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn rect(&self) -> LaneRect {
        self.rect
    }

    pub fn stats(&self) -> LaneStats {
        self.stats
    }

    pub fn timing(&self) -> NoteTiming {
        self.timing
    }

    pub fn set_timing(&mut self, timing: NoteTiming) {
        self.timing = timing;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Media time of the note next in line for a key press.
    pub fn next_note_time(&self) -> Option<Seconds> {
        self.pending.front().map(|n| n.time)
    }

    /// Half-open: `[x, x + width)`.
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.rect.x && x < self.rect.x + self.rect.width
    }

    /// Geometry only; takes effect on the next render.
    pub fn configure(&mut self, x: f32, width: f32) {
        self.rect = LaneRect { x, width };
    }

    /// Queues this lane's notes in sheet order. Times are not re-sorted.
    pub fn load(&mut self, sheet: &Sheet) {
        self.clear();
        self.stats = LaneStats::default();
        self.pending.extend(
            sheet
                .for_key(&self.key)
                .map(|(index, event)| PendingNote { index, time: event.time }),
        );
    }

    /// Drops pending notes and rewinds. Hit and miss counts survive until
    /// the next load.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.elapsed = 0.0;
    }

    fn hit_moment(&self, note: &PendingNote) -> Seconds {
        note.time + self.timing.lead_time
    }

    /// Only the front of the queue is eligible, so of two close notes the
    /// earlier queued one always takes the press.
    pub fn on_key_down(&mut self, key: &str, elapsed: Seconds) -> KeyOutcome {
        if key != self.key {
            return KeyOutcome::Unbound;
        }
        let Some(note) = self.pending.front().copied() else {
            return KeyOutcome::Ignored;
        };

        let delta = elapsed - self.hit_moment(&note);
        if delta.abs() > self.timing.tolerance {
            return KeyOutcome::Ignored;
        }

        self.pending.pop_front();
        self.stats.hits += 1;
        trace!("lane {} hit note {} ({:+.3}s)", self.key, note.index, delta);
        KeyOutcome::Hit {
            note_index: note.index,
            delta,
        }
    }

    /// Records the session time for the next render and drops notes that
    /// passed the hit line by more than the tolerance. Returns the number of
    /// notes missed on this call.
    pub fn update(&mut self, elapsed: Seconds) -> usize {
        self.elapsed = elapsed;
        let mut missed = 0;
        while let Some(note) = self.pending.front().copied() {
            if elapsed - self.hit_moment(&note) <= self.timing.tolerance {
                break;
            }
            self.pending.pop_front();
            missed += 1;
            trace!("lane {} missed note {}", self.key, note.index);
        }
        self.stats.misses += missed as u32;
        missed
    }

    pub fn note_y(&self, time: Seconds, scroll: Scroll) -> f32 {
        let until_hit = time + self.timing.lead_time - self.elapsed;
        scroll.hit_line_y - until_hit as f32 * scroll.speed_px_per_sec
    }

    /// Draws the track and every pending note that has entered the screen.
    pub fn render(&self, scroll: Scroll, surface: &mut dyn Surface) {
        surface.draw_track(self.slot, self.rect.x, self.rect.width, scroll.hit_line_y);
        for note in &self.pending {
            let y = self.note_y(note.time, scroll);
            if y < -NOTE_HEIGHT {
                continue;
            }
            surface.draw_note(NoteSprite {
                lane: self.slot,
                note_index: note.index,
                x: self.rect.x,
                y,
                width: self.rect.width,
                height: NOTE_HEIGHT,
            });
        }
    }
}

/// Receives every key press; each lane filters by its own key.
pub trait KeySink {
    fn key_down(&mut self, key: &str, elapsed: Seconds);
}

#[derive(Debug, Default)]
pub struct LaneSet {
    lanes: Vec<Lane>,
}

impl LaneSet {
    pub fn from_bindings(keys: &[String], timing: NoteTiming) -> Self {
        Self {
            lanes: keys
                .iter()
                .enumerate()
                .map(|(slot, key)| Lane::new(slot, key.clone(), timing))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.iter()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Lane> {
        self.lanes.get(slot)
    }

    pub fn set_timing(&mut self, timing: NoteTiming) {
        for lane in &mut self.lanes {
            lane.set_timing(timing);
        }
    }

    pub fn load(&mut self, sheet: &Sheet) {
        for lane in &mut self.lanes {
            lane.load(sheet);
        }
    }

    pub fn clear(&mut self) {
        for lane in &mut self.lanes {
            lane.clear();
        }
    }

    pub fn apply_layout(&mut self, rects: &[LaneRect]) {
        for (lane, rect) in self.lanes.iter_mut().zip(rects) {
            lane.configure(rect.x, rect.width);
        }
    }

    /// Key of the lane under a touch at `x`.
    pub fn key_at(&self, x: f32) -> Option<&str> {
        self.lanes.iter().find(|l| l.contains_x(x)).map(|l| l.key())
    }

    pub fn update(&mut self, elapsed: Seconds) -> usize {
        self.lanes.iter_mut().map(|l| l.update(elapsed)).sum()
    }

    pub fn render(&self, scroll: Scroll, surface: &mut dyn Surface) {
        for lane in &self.lanes {
            lane.render(scroll, surface);
        }
    }

    pub fn stats(&self) -> Vec<LaneStats> {
        self.lanes.iter().map(|l| l.stats()).collect()
    }
}

impl KeySink for LaneSet {
    fn key_down(&mut self, key: &str, elapsed: Seconds) {
        for lane in &mut self.lanes {
            lane.on_key_down(key, elapsed);
        }
    }
}
