//! The pen: admission API, aggregated state, and dispatch worker lifecycle.
//!
//! A [`Pen`] merges samples from any number of producer threads into one
//! time-ordered event stream. Producers call the `schedule_*` operations;
//! each admission is validated and deduplicated against the aggregated state
//! under a single admission lock, appended to the publish-once queue, and the
//! dispatch worker is woken to deliver it. Producers never block on the
//! dispatch thread — they hold the admission lock just long enough to mutate
//! state and link the event, then return.
//!
//! Delivery order equals admission order for all listeners; a kind change is
//! always delivered before the level event that triggered it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, trace};

use crate::device::PenDevice;
use crate::dispatch::{self, CancelToken, WakeShared, WorkerContext};
use crate::error::PenError;
use crate::event::{
    Button, ButtonEvent, ClipRect, KindEvent, Level, LevelEvent, PenEvent, PenKind, Scroll,
    ScrollEvent,
};
use crate::listener::{ListenerId, ListenerRegistry, PenListener};
use crate::phantom::PhantomFilter;
use crate::queue::{DrainCursor, EventQueue};
use crate::state::PenState;

/// Dispatch frequency a new pen starts at, in Hz.
pub const DEFAULT_FREQUENCY: u32 = 60;

/// Everything the admission lock guards: the authoritative state, the phantom
/// filter, and the queue's append pointer.
struct Admission {
    state: PenState,
    phantom: PhantomFilter,
    queue: EventQueue,
}

struct Worker {
    token: Arc<CancelToken>,
    handle: std::thread::JoinHandle<DrainCursor>,
}

/// Scheduling and dispatch engine for one logical pen.
///
/// `Pen` is `Send + Sync`; share it behind an [`Arc`] between producer
/// threads and whoever owns the listener registrations.
pub struct Pen {
    admission: Mutex<Admission>,
    listeners: Arc<ListenerRegistry>,
    wake: Arc<WakeShared>,
    worker: Mutex<Option<Worker>>,
    frequency: AtomicU32,
}

impl Pen {
    /// Creates a pen and starts its dispatch worker at [`DEFAULT_FREQUENCY`].
    pub fn new() -> Self {
        let (queue, cursor) = EventQueue::new();
        let pen = Self {
            admission: Mutex::new(Admission {
                state: PenState::new(),
                phantom: PhantomFilter::new(),
                queue,
            }),
            listeners: Arc::new(ListenerRegistry::new()),
            wake: Arc::new(WakeShared::new()),
            worker: Mutex::new(None),
            frequency: AtomicU32::new(DEFAULT_FREQUENCY),
        };
        let worker = pen.spawn_worker(DEFAULT_FREQUENCY, cursor);
        *pen.worker.lock().expect("worker lock poisoned") = Some(worker);
        pen
    }

    /// Current dispatch frequency in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency.load(Ordering::SeqCst)
    }

    /// Replaces the dispatch worker with one running at `hz`.
    ///
    /// Rejects `hz == 0` synchronously with no state mutated. Otherwise the
    /// running worker is cancelled, woken out of whichever park it is in, and
    /// joined before the replacement starts — at most one dispatch thread per
    /// pen exists at any time, and no two cycles ever overlap. The queue
    /// persists across the handover, so an admitted-but-undispatched event
    /// shows up in the first cycle of the new worker.
    ///
    /// The period is `1000 / hz` in whole milliseconds. Above 1000 Hz it
    /// truncates to zero and the worker stops sleeping between cycles
    /// entirely: it drains, ticks (with non-positive slack), yields, and
    /// immediately starts over — dispatch-as-fast-as-events-arrive rather
    /// than a fixed cadence.
    pub fn set_frequency(&self, hz: u32) -> Result<(), PenError> {
        if hz == 0 {
            return Err(PenError::InvalidFrequency(hz));
        }
        // Hold the worker slot across stop + spawn so concurrent frequency
        // changes serialize and the one-worker invariant holds.
        let mut slot = self.worker.lock().expect("worker lock poisoned");
        if let Some(worker) = slot.take() {
            let cursor = self.stop_worker(worker);
            *slot = Some(self.spawn_worker(hz, cursor));
        }
        self.frequency.store(hz, Ordering::SeqCst);
        info!("dispatch frequency set to {hz} Hz");
        Ok(())
    }

    /// Registers a listener; takes effect for cycles starting after the call.
    pub fn add_listener(&self, listener: impl PenListener + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregisters a listener. Removing an id that is not registered is a
    /// bookkeeping bug upstream and is surfaced, not ignored.
    pub fn remove_listener(&self, id: ListenerId) -> Result<(), PenError> {
        self.listeners.remove(id)
    }

    /// Admits a batch of axis samples from `device`.
    ///
    /// `time_millis` is the admission timestamp (milliseconds since the Unix
    /// epoch as observed by the caller); it is used for the phantom-filter
    /// threshold and stamped on the synthesized events. Admission steps:
    ///
    /// 1. Phantom suppression for non-digitizer reports right after digitizer
    ///    activity.
    /// 2. Axes whose value is bit-for-bit unchanged are dropped.
    /// 3. If `clip` is given and any retained movement value falls outside
    ///    it, the whole batch is discarded — state untouched.
    /// 4. A kind mismatch synthesizes a kind-change event ahead of the level
    ///    event, sharing its timestamp.
    /// 5. The surviving axes become one level event; state and the filter's
    ///    last-admission record are updated and the dispatcher is woken.
    ///
    /// Returns true iff a level event was appended.
    pub fn schedule_level_event(
        &self,
        device: &dyn PenDevice,
        time_millis: u64,
        levels: &[Level],
        clip: Option<ClipRect>,
    ) -> bool {
        let mut admission = self.lock_admission();
        if admission
            .phantom
            .filter(device.id(), device.is_digitizer(), time_millis)
        {
            trace!("suppressed phantom level report from {}", device.name());
            return false;
        }

        let changed: Vec<Level> = levels
            .iter()
            .filter(|level| {
                level.value.to_bits() != admission.state.level_value(level.type_number).to_bits()
            })
            .copied()
            .collect();
        if changed.is_empty() {
            return false;
        }
        if let Some(clip) = clip {
            if changed.iter().any(|level| !clip.admits(level)) {
                trace!("discarded out-of-bounds level batch from {}", device.name());
                return false;
            }
        }

        let kind = device.kind();
        if admission.state.kind() != kind {
            admission.state.set_kind(kind);
            self.append(
                &mut admission,
                PenEvent::Kind(KindEvent { time_millis, kind }),
            );
        }

        for level in &changed {
            admission.state.set_level_value(level.type_number, level.value);
        }
        admission.phantom.record_level_event(time_millis);
        self.append(
            &mut admission,
            PenEvent::Level(LevelEvent {
                time_millis,
                levels: changed,
            }),
        );
        true
    }

    /// Applies a button edge. An event is admitted only when the effective
    /// boolean state changes; returns whether a transition occurred.
    pub fn schedule_button_event(&self, button: Button) -> bool {
        let mut admission = self.lock_admission();
        if !admission.state.set_button_value(button) {
            return false;
        }
        self.append(
            &mut admission,
            PenEvent::Button(ButtonEvent {
                time_millis: now_millis(),
                button,
            }),
        );
        true
    }

    /// Admits a scroll step unconditionally: scroll deltas are incremental,
    /// never idempotent, so there is nothing to deduplicate.
    pub fn schedule_scroll_event(&self, scroll: Scroll) {
        let mut admission = self.lock_admission();
        self.append(
            &mut admission,
            PenEvent::Scroll(ScrollEvent {
                time_millis: now_millis(),
                scroll,
            }),
        );
    }

    /// Synthesizes a release for every currently pressed button, so
    /// downstream consumers never observe a stuck button when input is
    /// forcibly quiesced (e.g. on pause).
    pub fn schedule_button_released_events(&self) {
        let mut admission = self.lock_admission();
        let time_millis = now_millis();
        for type_number in admission.state.pressed_button_numbers() {
            let button = Button {
                type_number,
                pressed: false,
            };
            if admission.state.set_button_value(button) {
                self.append(
                    &mut admission,
                    PenEvent::Button(ButtonEvent {
                        time_millis,
                        button,
                    }),
                );
            }
        }
    }

    /// Owned snapshot of the aggregated state.
    pub fn state(&self) -> PenState {
        self.lock_admission().state.clone()
    }

    /// Most recently admitted value for the axis.
    pub fn level_value(&self, type_number: u16) -> f32 {
        self.lock_admission().state.level_value(type_number)
    }

    /// Effective pressed state of the button.
    pub fn button_value(&self, type_number: u16) -> bool {
        self.lock_admission().state.button_value(type_number)
    }

    /// Current implement kind.
    pub fn kind(&self) -> PenKind {
        self.lock_admission().state.kind()
    }

    pub fn has_pressed_buttons(&self) -> bool {
        self.lock_admission().state.has_pressed_buttons()
    }

    fn lock_admission(&self) -> MutexGuard<'_, Admission> {
        self.admission.lock().expect("admission lock poisoned")
    }

    /// Appends under the admission lock and wakes the dispatcher if it is
    /// parked waiting for events.
    fn append(&self, admission: &mut Admission, event: PenEvent) {
        debug!("admitted {event:?}");
        admission.queue.append(event);
        self.wake.notify_if_waiting();
    }

    fn spawn_worker(&self, hz: u32, cursor: DrainCursor) -> Worker {
        let token = Arc::new(CancelToken::new());
        let ctx = WorkerContext {
            wake: Arc::clone(&self.wake),
            token: Arc::clone(&token),
            listeners: Arc::clone(&self.listeners),
            period_millis: u64::from(1000 / hz),
        };
        let handle = std::thread::Builder::new()
            .name("pen-dispatch".into())
            .spawn(move || dispatch::run(cursor, ctx))
            .expect("failed to spawn pen dispatch thread");
        Worker { token, handle }
    }

    /// Cancels and joins a worker, recovering its drain cursor. The join is
    /// blocking: the handover is complete before the caller proceeds.
    fn stop_worker(&self, worker: Worker) -> DrainCursor {
        worker.token.cancel();
        self.wake.notify_all();
        match worker.handle.join() {
            Ok(cursor) => cursor,
            // The worker has no defined recovery if its wait state was
            // corrupted by a panic; propagate instead of limping on.
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Pen {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.worker.lock() {
            if let Some(worker) = slot.take() {
                worker.token.cancel();
                self.wake.notify_all();
                // Ignore a panicked worker here: unwinding out of drop while
                // already panicking would abort.
                let _ = worker.handle.join();
            }
        }
    }
}

/// Milliseconds since the Unix epoch, the admission clock for button and
/// scroll events (level admissions carry the caller's timestamp).
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
