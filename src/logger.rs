//! A listener that logs every delivery.

use log::{debug, trace};

use crate::event::{ButtonEvent, KindEvent, LevelEvent, ScrollEvent};
use crate::listener::PenListener;

/// Logs data events at `debug` and period ticks at `trace`. Handy while
/// bringing up a provider backend.
#[derive(Default)]
pub struct LogListener;

impl LogListener {
    pub fn new() -> Self {
        LogListener
    }
}

impl PenListener for LogListener {
    fn on_level_change(&mut self, event: &LevelEvent) {
        debug!("[pen] {event:?}");
    }

    fn on_button_change(&mut self, event: &ButtonEvent) {
        debug!("[pen] {event:?}");
    }

    fn on_scroll_change(&mut self, event: &ScrollEvent) {
        debug!("[pen] {event:?}");
    }

    fn on_kind_change(&mut self, event: &KindEvent) {
        debug!("[pen] {event:?}");
    }

    fn on_period_tick(&mut self, slack_millis: i64) {
        trace!("[pen] tick, slack {slack_millis} ms");
    }
}
