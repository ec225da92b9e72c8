//! Penstream — event scheduling and dispatch engine for pen/tablet input.
//!
//! Merges asynchronous samples from any number of pointing-device sources
//! (pen digitizers, mice, platform HID bridges) into a single time-ordered
//! event stream and delivers it to listeners at a configurable rate.
//!
//! Platform polling code stays outside this crate: backends implement
//! [`PenDevice`] and feed raw samples into the `schedule_*` operations on
//! [`Pen`] (or through a [`PenManager`], which adds device bookkeeping and
//! pause gating). Admissions are filtered — phantom reports from
//! device-switch artifacts are suppressed and unchanged axis values are
//! deduplicated — then queued and dispatched in admission order by a
//! per-pen worker thread, which also delivers a periodic tick carrying the
//! period's remaining slack.

pub mod device;
mod dispatch;
pub mod error;
pub mod event;
pub mod listener;
pub mod logger;
pub mod manager;
pub mod pen;
mod phantom;
mod queue;
pub mod state;

pub use device::{DeviceId, PenDevice};
pub use error::PenError;
pub use event::{
    AxisType, Button, ButtonEvent, ButtonType, ClipRect, KindEvent, Level, LevelEvent, PenEvent,
    PenKind, Scroll, ScrollDirection, ScrollEvent,
};
pub use listener::{ListenerId, PenListener};
pub use logger::LogListener;
pub use manager::PenManager;
pub use pen::{Pen, DEFAULT_FREQUENCY};
pub use state::PenState;
