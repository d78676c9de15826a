use std::{cell::Cell, rc::Rc, time::Instant};

use sheet_schema::Seconds;

/// Monotonic wall clock used for the count-in and the timer cadence.
pub trait WallClock {
    /// Seconds since an arbitrary epoch.
    fn now_seconds(&self) -> Seconds;
}

pub struct SystemWallClock {
    start: Instant,
}

impl SystemWallClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemWallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemWallClock {
    fn now_seconds(&self) -> Seconds {
        self.start.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock. Clones share the same time, so a test or headless
/// driver can keep one handle while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualWallClock {
    now: Rc<Cell<Seconds>>,
}

impl ManualWallClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, seconds: Seconds) {
        self.now.set(seconds);
    }

    pub fn advance(&self, delta: Seconds) {
        self.now.set(self.now.get() + delta);
    }
}

impl WallClock for ManualWallClock {
    fn now_seconds(&self) -> Seconds {
        self.now.get()
    }
}
