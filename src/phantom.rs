//! Phantom level suppression.
//!
//! When control switches from a digitizer back to a generic pointing device,
//! some platforms inject a burst of spurious position reports (the cursor
//! "jumping" to the mouse location). The filter suppresses those: the first
//! generic report after any digitizer activity is always dropped once per
//! switch, and further reports from a device other than the last admitted one
//! are dropped while they arrive within [`THRESHOLD_MILLIS`] of the last
//! admitted level event.

use crate::device::DeviceId;

/// How long after digitizer activity reports from another, non-digitizer
/// device are considered phantoms.
pub(crate) const THRESHOLD_MILLIS: u64 = 200;

#[derive(Debug, Default)]
pub(crate) struct PhantomFilter {
    /// Last device whose report passed the filter.
    last_device: Option<DeviceId>,
    /// Admission time of the last level event that made it into the queue.
    last_level_time: Option<u64>,
    /// Whether the one-shot suppression for the current non-digitizer run has
    /// already fired.
    filtered_first_in_sequence: bool,
}

impl PhantomFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the report must be suppressed.
    ///
    /// Suppressed reports do not update the last-device record, so a phantom
    /// burst cannot launder itself into looking like the active device.
    pub fn filter(&mut self, device: DeviceId, is_digitizer: bool, now_millis: u64) -> bool {
        if is_digitizer {
            self.filtered_first_in_sequence = false;
        } else {
            if !self.filtered_first_in_sequence {
                self.filtered_first_in_sequence = true;
                return true;
            }
            if let (Some(last_device), Some(last_time)) = (self.last_device, self.last_level_time) {
                if last_device != device && now_millis.saturating_sub(last_time) <= THRESHOLD_MILLIS
                {
                    return true;
                }
            }
        }
        self.last_device = Some(device);
        false
    }

    /// Records the admission time of a level event that passed the filter.
    pub fn record_level_event(&mut self, time_millis: u64) {
        self.last_level_time = Some(time_millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGITIZER: DeviceId = DeviceId(1);
    const MOUSE: DeviceId = DeviceId(2);

    fn filter_after_digitizer_at_zero() -> PhantomFilter {
        let mut filter = PhantomFilter::new();
        assert!(!filter.filter(DIGITIZER, true, 0));
        filter.record_level_event(0);
        filter
    }

    #[test]
    fn digitizer_reports_always_pass() {
        let mut filter = PhantomFilter::new();
        for t in [0, 1, 500] {
            assert!(!filter.filter(DIGITIZER, true, t));
            filter.record_level_event(t);
        }
    }

    #[test]
    fn report_within_threshold_is_suppressed() {
        let mut filter = filter_after_digitizer_at_zero();
        // First report after the switch: one-shot suppression.
        assert!(filter.filter(MOUSE, false, 100));
        // Still within 200ms of the digitizer's last admitted event.
        assert!(filter.filter(MOUSE, false, 150));
    }

    #[test]
    fn report_after_threshold_passes() {
        let mut filter = filter_after_digitizer_at_zero();
        assert!(filter.filter(MOUSE, false, 100));
        assert!(!filter.filter(MOUSE, false, 300));
        filter.record_level_event(300);
        // Same device keeps passing from here on.
        assert!(!filter.filter(MOUSE, false, 301));
    }

    #[test]
    fn first_report_of_each_non_digitizer_run_is_suppressed_once() {
        let mut filter = filter_after_digitizer_at_zero();
        assert!(filter.filter(MOUSE, false, 500));
        assert!(!filter.filter(MOUSE, false, 501));
        filter.record_level_event(501);

        // Digitizer reasserts itself; the one-shot arms again.
        assert!(!filter.filter(DIGITIZER, true, 600));
        filter.record_level_event(600);
        assert!(filter.filter(MOUSE, false, 1000));
        assert!(!filter.filter(MOUSE, false, 1001));
    }

    #[test]
    fn very_first_report_from_a_generic_device_is_suppressed() {
        let mut filter = PhantomFilter::new();
        assert!(filter.filter(MOUSE, false, 0));
        assert!(!filter.filter(MOUSE, false, 1));
    }

    #[test]
    fn suppressed_reports_do_not_become_the_last_device() {
        let mut filter = filter_after_digitizer_at_zero();
        let other = DeviceId(3);
        // Both generic devices report inside the window; neither may claim
        // last-device status through a suppressed report.
        assert!(filter.filter(MOUSE, false, 50));
        assert!(filter.filter(other, false, 60));
        assert!(filter.filter(MOUSE, false, 70));
    }
}
