//! Error taxonomy for the scheduling engine.
//!
//! There are no transient/retryable errors here: an admission either succeeds,
//! is filtered (not an error), or the input is malformed and rejected at the
//! call site. Everything else is a bookkeeping bug upstream and is surfaced
//! immediately instead of being swallowed.

use crate::device::DeviceId;
use crate::listener::ListenerId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PenError {
    /// Dispatch frequency must be strictly positive.
    #[error("invalid frequency: {0} Hz (must be greater than zero)")]
    InvalidFrequency(u32),

    /// A listener id was removed twice or never registered.
    #[error("listener not registered: {0:?}")]
    UnknownListener(ListenerId),

    /// Two devices were registered under the same id.
    #[error("device id already registered: {0:?}")]
    DuplicateDevice(DeviceId),

    /// A device id was unregistered twice or never registered.
    #[error("device not registered: {0:?}")]
    UnknownDevice(DeviceId),
}
