pub mod events;
pub mod recorder;

use crossbeam_channel::{unbounded, Receiver, Sender};

use self::events::HostEvent;

pub use recorder::{Capture, InputRecorder, Take};

/// Host events waiting for the session.
///
/// Window and touch callbacks may fire off the session thread; they push
/// through a cloned [`sender`](Self::sender) and the session drains the
/// queue from its own loop.
pub struct InputQueue {
    tx: Sender<HostEvent>,
    rx: Receiver<HostEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn push(&self, event: HostEvent) {
        // the queue owns a receiver, so the channel cannot be disconnected
        let _ = self.tx.send(event);
    }

    pub fn push_key(&self, key: impl Into<String>) {
        self.push(HostEvent::key(key));
    }

    /// Next event, or None when nothing is waiting.
    pub fn pop(&self) -> Option<HostEvent> {
        self.rx.try_recv().ok()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn sender(&self) -> Sender<HostEvent> {
        self.tx.clone()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
