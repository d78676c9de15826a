use std::{cell::Cell, rc::Rc};

use sheet_schema::{Seconds, SourceMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    CountingIn,
    Live,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub state: SessionState,
    pub source_mode: SourceMode,
    pub lead_time_seconds: Seconds,
    pub recording: bool,
}

impl Session {
    pub fn new(lead_time_seconds: Seconds) -> Self {
        Self {
            state: SessionState::Idle,
            source_mode: SourceMode::Url,
            lead_time_seconds,
            recording: false,
        }
    }
}

/// Session time, written by the count-in and live-poll timers and read by
/// every frame.
#[derive(Debug, Clone, Default)]
pub(crate) struct PlayClock(Rc<Cell<Seconds>>);

impl PlayClock {
    pub fn get(&self) -> Seconds {
        self.0.get()
    }

    pub fn set(&self, seconds: Seconds) {
        self.0.set(seconds);
    }
}

/// Bumped whenever the active timer is cancelled; async results carrying an
/// older generation are dropped.
#[derive(Debug, Clone, Default)]
pub struct TimerGeneration(Rc<Cell<u64>>);

impl TimerGeneration {
    pub fn current(&self) -> u64 {
        self.0.get()
    }

    pub fn bump(&self) {
        self.0.set(self.0.get().wrapping_add(1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TimerKind {
    CountIn { started_at: Seconds },
    LivePoll,
}

const MIN_PERIOD: Seconds = 0.001;
const EPSILON: Seconds = 1e-9;

/// Repeating timer polled by the host loop.
///
/// Fires at most once per poll; beats the host missed are skipped, not
/// replayed.
#[derive(Debug, Clone)]
pub(crate) struct Timer {
    pub kind: TimerKind,
    pub generation: u64,
    start: Seconds,
    period: Seconds,
    fired: u64,
}

impl Timer {
    pub fn new(kind: TimerKind, now: Seconds, period: Seconds, generation: u64) -> Self {
        Self {
            kind,
            generation,
            start: now,
            period: period.max(MIN_PERIOD),
            fired: 0,
        }
    }

    pub fn poll(&mut self, now: Seconds) -> bool {
        let next = self.start + (self.fired + 1) as Seconds * self.period;
        if now + EPSILON < next {
            return false;
        }
        let beats = ((now + EPSILON - self.start) / self.period).floor() as u64;
        self.fired = beats.max(self.fired + 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once_per_period() {
        let mut timer = Timer::new(TimerKind::LivePoll, 10.0, 0.1, 0);
        assert!(!timer.poll(10.05));
        assert!(timer.poll(10.1));
        assert!(!timer.poll(10.15));
        assert!(timer.poll(10.2));
    }

    #[test]
    fn timer_skips_missed_beats() {
        let mut timer = Timer::new(TimerKind::LivePoll, 0.0, 0.1, 0);
        assert!(timer.poll(0.55));
        assert!(!timer.poll(0.58));
        assert!(timer.poll(0.6));
    }

    #[test]
    fn generation_bumps() {
        let gen = TimerGeneration::default();
        let shared = gen.clone();
        gen.bump();
        assert_eq!(shared.current(), 1);
    }
}
