//! Listener trait and registry.
//!
//! Listeners receive every admitted event in admission order, synchronously on
//! the dispatch thread, plus one periodic tick per dispatch cycle. A slow
//! listener delays subsequent drains and the tick for everyone — callbacks are
//! expected to be non-blocking; that is the delivery contract, not something
//! the engine enforces.
//!
//! Registration is safe from any thread at any time and takes effect for
//! dispatch cycles starting after the change: the dispatch loop iterates a
//! copy-on-write snapshot rebuilt lazily on the first read after a mutation,
//! never the live collection.

use std::sync::{Arc, Mutex};

use crate::error::PenError;
use crate::event::{ButtonEvent, KindEvent, LevelEvent, ScrollEvent};

/// Handle returned by [`add`](ListenerRegistry::add); used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Receiver of dispatched pen events. All callbacks default to no-ops so
/// implementations only override what they care about.
pub trait PenListener: Send {
    fn on_level_change(&mut self, event: &LevelEvent) {
        let _ = event;
    }

    fn on_button_change(&mut self, event: &ButtonEvent) {
        let _ = event;
    }

    fn on_scroll_change(&mut self, event: &ScrollEvent) {
        let _ = event;
    }

    fn on_kind_change(&mut self, event: &KindEvent) {
        let _ = event;
    }

    /// Delivered once per dispatch cycle with the milliseconds of slack left
    /// in the period. Negative slack means the cycle overran its period.
    fn on_period_tick(&mut self, slack_millis: i64) {
        let _ = slack_millis;
    }
}

pub(crate) type SharedListener = Arc<Mutex<dyn PenListener>>;

struct RegistryInner {
    next_id: u64,
    entries: Vec<(ListenerId, SharedListener)>,
    /// Stable iteration snapshot; invalidated on add/remove, rebuilt on read.
    snapshot: Option<Arc<[SharedListener]>>,
}

/// Id-keyed listener set with a lazily rebuilt dispatch snapshot.
///
/// Guarded by its own lock, independent of the admission lock, so
/// registration churn never contends with high-frequency admission traffic.
pub(crate) struct ListenerRegistry {
    inner: Mutex<RegistryInner>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 0,
                entries: Vec::new(),
                snapshot: None,
            }),
        }
    }

    pub fn add(&self, listener: impl PenListener + 'static) -> ListenerId {
        let mut inner = self.inner.lock().expect("listener registry lock poisoned");
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push((id, Arc::new(Mutex::new(listener))));
        inner.snapshot = None;
        id
    }

    pub fn remove(&self, id: ListenerId) -> Result<(), PenError> {
        let mut inner = self.inner.lock().expect("listener registry lock poisoned");
        let index = inner
            .entries
            .iter()
            .position(|(entry_id, _)| *entry_id == id)
            .ok_or(PenError::UnknownListener(id))?;
        inner.entries.remove(index);
        inner.snapshot = None;
        Ok(())
    }

    /// The stable snapshot the dispatch loop iterates for one cycle.
    pub fn snapshot(&self) -> Arc<[SharedListener]> {
        let mut inner = self.inner.lock().expect("listener registry lock poisoned");
        if inner.snapshot.is_none() {
            inner.snapshot = Some(
                inner
                    .entries
                    .iter()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect(),
            );
        }
        Arc::clone(inner.snapshot.as_ref().expect("snapshot just rebuilt"))
    }
}
