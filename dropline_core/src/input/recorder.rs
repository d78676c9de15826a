use std::{cell::RefCell, rc::Rc};

use futures::executor::LocalSpawner;
use futures::task::LocalSpawnExt;
use log::debug;
use sheet_schema::{Seconds, Sheet, SheetEvent};

use crate::error::SessionError;
use crate::lane::KeySink;
use crate::render::CancelToken;
use crate::session::state::TimerGeneration;
use crate::time::TimeQuery;

/// The session's working sheet. Clones share the same sheet, giving the
/// recorder an append-only handle without access to the rest of the session.
#[derive(Debug, Clone, Default)]
pub struct Take {
    sheet: Rc<RefCell<Sheet>>,
}

impl Take {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: SheetEvent) {
        self.sheet.borrow_mut().push(event);
    }

    pub fn replace(&self, sheet: Sheet) {
        *self.sheet.borrow_mut() = sheet;
    }

    pub fn clear(&self) {
        self.sheet.borrow_mut().clear();
    }

    pub fn snapshot(&self) -> Sheet {
        self.sheet.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.sheet.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheet.borrow().is_empty()
    }
}

/// Everything needed to timestamp one recorded press.
///
/// `issued` is the take generation at press time; a result arriving after
/// the take was reset or restarted is dropped.
pub struct Capture {
    pub query: TimeQuery,
    pub spawner: LocalSpawner,
    pub token: CancelToken,
    pub generation: TimerGeneration,
    pub issued: u64,
}

pub struct InputRecorder {
    bindings: Vec<String>,
    take: Take,
}

impl InputRecorder {
    pub fn new(bindings: Vec<String>, take: Take) -> Self {
        Self { bindings, take }
    }

    pub fn bindings(&self) -> &[String] {
        &self.bindings
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.bindings.iter().any(|k| k == key)
    }

    /// Forwards the press to every lane, then, when a capture is given,
    /// appends `{time, key}` once the time query resolves.
    ///
    /// Appends land in completion order: a press whose query resolves first
    /// is recorded first even if it was pressed later.
    pub fn on_key_down(
        &self,
        key: &str,
        lanes: &mut dyn KeySink,
        elapsed: Seconds,
        capture: Option<Capture>,
    ) -> Result<(), SessionError> {
        lanes.key_down(key, elapsed);

        let Some(Capture {
            query,
            spawner,
            token,
            generation,
            issued,
        }) = capture
        else {
            return Ok(());
        };
        if !self.is_bound(key) {
            return Ok(());
        }

        let take = self.take.clone();
        let key = key.to_string();
        spawner.spawn_local(async move {
            let Some(time) = query.await else {
                debug!("time query for {:?} was dropped; press not recorded", key);
                return;
            };
            if token.is_cancelled() {
                debug!("discarding press {:?} at {:.3}s after destroy", key, time);
                return;
            }
            if generation.current() != issued {
                debug!("discarding press {:?} at {:.3}s from a reset take", key, time);
                return;
            }
            take.append(SheetEvent::new(time, key));
        })?;
        Ok(())
    }
}
