//! Periodic dispatch worker.
//!
//! One worker thread per pen runs the dispatch cycle: park until events
//! arrive, drain the queue in admission order, deliver the periodic tick,
//! then sleep out whatever is left of the period. The park for new events is
//! interruptible by admissions; the period sleep is not — once begun it runs
//! to completion (only cancellation cuts it short), which keeps the cadence
//! stable. When a cycle overruns its period the next one starts immediately:
//! the engine self-throttles to real time but never drops backlog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::event::PenEvent;
use crate::listener::{ListenerRegistry, SharedListener};
use crate::queue::DrainCursor;

/// Cooperative stop flag for one worker. `set_frequency` cancels the old
/// worker and joins it before spawning a replacement, so at most one worker
/// per pen is ever live.
pub(crate) struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct WakeState {
    /// True only while the worker is parked waiting for new events. Mirrors
    /// the check producers make before bothering to notify.
    waiting_for_events: bool,
}

/// Condvar plumbing shared between producers and the worker.
pub(crate) struct WakeShared {
    state: Mutex<WakeState>,
    condvar: Condvar,
}

impl WakeShared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WakeState::default()),
            condvar: Condvar::new(),
        }
    }

    /// Called by producers after an append. Only wakes the worker when it is
    /// parked waiting for events; the period sleep ignores event arrivals.
    pub fn notify_if_waiting(&self) {
        let state = self.state.lock().expect("wake lock poisoned");
        if state.waiting_for_events {
            self.condvar.notify_all();
        }
    }

    /// Called on cancellation: wakes the worker out of either park.
    pub fn notify_all(&self) {
        let _state = self.state.lock().expect("wake lock poisoned");
        self.condvar.notify_all();
    }
}

pub(crate) struct WorkerContext {
    pub wake: Arc<WakeShared>,
    pub token: Arc<CancelToken>,
    pub listeners: Arc<ListenerRegistry>,
    pub period_millis: u64,
}

/// Body of the dispatch thread. Returns the drain cursor on exit so a
/// replacement worker resumes exactly where this one stopped — the queue
/// persists across frequency changes, only the thread is replaced.
pub(crate) fn run(mut cursor: DrainCursor, ctx: WorkerContext) -> DrainCursor {
    debug!("dispatch worker started (period {} ms)", ctx.period_millis);
    let period = Duration::from_millis(ctx.period_millis);

    loop {
        wait_for_events(&mut cursor, &ctx);
        if ctx.token.is_cancelled() {
            break;
        }

        let cycle_start = Instant::now();
        let listeners = ctx.listeners.snapshot();

        while let Some(node) = cursor.take_next() {
            deliver(node.event(), &listeners);
        }

        let slack = ctx.period_millis as i64 - cycle_start.elapsed().as_millis() as i64;
        trace!("period tick, slack {slack} ms");
        for listener in listeners.iter() {
            listener
                .lock()
                .expect("listener poisoned by an earlier panic")
                .on_period_tick(slack);
        }

        match period.checked_sub(cycle_start.elapsed()) {
            Some(remaining) if !remaining.is_zero() => sleep_out_period(&ctx, remaining),
            // Overrun: start the next cycle immediately.
            _ => std::thread::yield_now(),
        }
        if ctx.token.is_cancelled() {
            break;
        }
    }

    debug!("dispatch worker stopped");
    cursor
}

/// Parks until an undispatched event is linked or the worker is cancelled.
fn wait_for_events(cursor: &mut DrainCursor, ctx: &WorkerContext) {
    let mut state = ctx.wake.state.lock().expect("wake lock poisoned");
    while !cursor.has_pending() && !ctx.token.is_cancelled() {
        state.waiting_for_events = true;
        state = ctx
            .wake
            .condvar
            .wait(state)
            .expect("wake lock poisoned");
    }
    state.waiting_for_events = false;
}

/// Sleeps out the remainder of the period. Event notifications may wake the
/// wait spuriously but never shorten it; only cancellation exits early.
fn sleep_out_period(ctx: &WorkerContext, remaining: Duration) {
    let deadline = Instant::now() + remaining;
    let mut state = ctx.wake.state.lock().expect("wake lock poisoned");
    while !ctx.token.is_cancelled() {
        let Some(left) = deadline.checked_duration_since(Instant::now()) else {
            break;
        };
        let (guard, _) = ctx
            .wake
            .condvar
            .wait_timeout(state, left)
            .expect("wake lock poisoned");
        state = guard;
    }
}

fn deliver(event: &PenEvent, listeners: &[SharedListener]) {
    for listener in listeners {
        let mut listener = listener
            .lock()
            .expect("listener poisoned by an earlier panic");
        match event {
            PenEvent::Level(e) => listener.on_level_change(e),
            PenEvent::Button(e) => listener.on_button_change(e),
            PenEvent::Scroll(e) => listener.on_scroll_change(e),
            PenEvent::Kind(e) => listener.on_kind_change(e),
        }
    }
}
