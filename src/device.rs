//! Collaborator-facing device contract.
//!
//! Platform backends (tablet digitizers, system mouse hooks, HID bridges) live
//! outside this crate; they reach the engine by implementing [`PenDevice`] and
//! calling the schedule operations on [`Pen`](crate::pen::Pen) or
//! [`PenManager`](crate::manager::PenManager).

use serde::{Deserialize, Serialize};

use crate::event::PenKind;

/// Identity of a registered input device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub u8);

/// A source of raw pen samples.
pub trait PenDevice: Send + Sync {
    /// Stable identity used by the phantom filter and the device registry.
    fn id(&self) -> DeviceId;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Whether the device is a true digitizer. Level reports from
    /// non-digitizers are subject to phantom suppression right after
    /// digitizer activity.
    fn is_digitizer(&self) -> bool;

    /// The implement kind the device currently reports. A mismatch with the
    /// aggregated state triggers a kind-change event ahead of the level event.
    fn kind(&self) -> PenKind;
}
