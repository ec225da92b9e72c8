//! Device registry and pause gating around a [`Pen`].
//!
//! Providers register the devices they discover here and route their raw
//! samples through the forwarding methods, which no-op while the manager is
//! paused. Pausing forcibly quiesces input: every pressed button gets a
//! synthesized release so consumers never observe a stuck button across the
//! pause.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::info;

use crate::device::{DeviceId, PenDevice};
use crate::error::PenError;
use crate::event::{Button, ClipRect, Level, Scroll};
use crate::pen::Pen;

pub struct PenManager {
    pen: Arc<Pen>,
    devices: Mutex<HashMap<DeviceId, Arc<dyn PenDevice>>>,
    paused: AtomicBool,
}

impl PenManager {
    pub fn new() -> Self {
        Self {
            pen: Arc::new(Pen::new()),
            devices: Mutex::new(HashMap::new()),
            paused: AtomicBool::new(false),
        }
    }

    /// The pen this manager feeds. Clone the `Arc` to register listeners or
    /// query state from other threads.
    pub fn pen(&self) -> &Arc<Pen> {
        &self.pen
    }

    /// Registers a device. An id collision means two providers are fighting
    /// over the same slot — a bookkeeping bug, surfaced immediately.
    pub fn register_device(&self, device: Arc<dyn PenDevice>) -> Result<(), PenError> {
        let mut devices = self.devices.lock().expect("device registry lock poisoned");
        match devices.entry(device.id()) {
            Entry::Occupied(_) => Err(PenError::DuplicateDevice(device.id())),
            Entry::Vacant(slot) => {
                info!("registered device {:?} ({})", device.id(), device.name());
                slot.insert(device);
                Ok(())
            }
        }
    }

    /// Unregisters a device; unknown ids are surfaced, not ignored.
    pub fn unregister_device(&self, id: DeviceId) -> Result<Arc<dyn PenDevice>, PenError> {
        let mut devices = self.devices.lock().expect("device registry lock poisoned");
        let device = devices.remove(&id).ok_or(PenError::UnknownDevice(id))?;
        info!("unregistered device {:?} ({})", id, device.name());
        Ok(device)
    }

    pub fn device(&self, id: DeviceId) -> Option<Arc<dyn PenDevice>> {
        self.devices
            .lock()
            .expect("device registry lock poisoned")
            .get(&id)
            .cloned()
    }

    pub fn devices(&self) -> Vec<Arc<dyn PenDevice>> {
        self.devices
            .lock()
            .expect("device registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Pauses or resumes sample admission. Entering the paused state
    /// schedules a release for every pressed button.
    pub fn set_paused(&self, paused: bool) {
        if self.paused.swap(paused, Ordering::SeqCst) == paused {
            return;
        }
        info!("pen manager {}", if paused { "paused" } else { "resumed" });
        if paused {
            self.pen.schedule_button_released_events();
        }
    }

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Forwards a level batch to the pen unless paused.
    pub fn schedule_level_event(
        &self,
        device: &dyn PenDevice,
        time_millis: u64,
        levels: &[Level],
        clip: Option<ClipRect>,
    ) -> bool {
        if self.paused() {
            return false;
        }
        self.pen.schedule_level_event(device, time_millis, levels, clip)
    }

    /// Forwards a button edge to the pen unless paused.
    pub fn schedule_button_event(&self, button: Button) -> bool {
        if self.paused() {
            return false;
        }
        self.pen.schedule_button_event(button)
    }

    /// Forwards a scroll step to the pen unless paused.
    pub fn schedule_scroll_event(&self, scroll: Scroll) {
        if self.paused() {
            return;
        }
        self.pen.schedule_scroll_event(scroll);
    }
}

impl Default for PenManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AxisType, ButtonType, PenKind};

    struct FakeDevice {
        id: DeviceId,
        digitizer: bool,
    }

    impl PenDevice for FakeDevice {
        fn id(&self) -> DeviceId {
            self.id
        }
        fn name(&self) -> &str {
            "fake"
        }
        fn is_digitizer(&self) -> bool {
            self.digitizer
        }
        fn kind(&self) -> PenKind {
            PenKind::Stylus
        }
    }

    fn tablet(id: u8) -> Arc<dyn PenDevice> {
        Arc::new(FakeDevice {
            id: DeviceId(id),
            digitizer: true,
        })
    }

    #[test]
    fn duplicate_device_ids_are_rejected() {
        let manager = PenManager::new();
        manager.register_device(tablet(1)).unwrap();
        assert_eq!(
            manager.register_device(tablet(1)),
            Err(PenError::DuplicateDevice(DeviceId(1)))
        );
        manager.register_device(tablet(2)).unwrap();
        assert_eq!(manager.devices().len(), 2);
    }

    #[test]
    fn unregistering_an_unknown_device_is_an_error() {
        let manager = PenManager::new();
        manager.register_device(tablet(1)).unwrap();
        manager.unregister_device(DeviceId(1)).unwrap();
        assert!(matches!(
            manager.unregister_device(DeviceId(1)),
            Err(PenError::UnknownDevice(_))
        ));
    }

    #[test]
    fn paused_manager_drops_admissions() {
        let manager = PenManager::new();
        let device = FakeDevice {
            id: DeviceId(1),
            digitizer: true,
        };
        manager.set_paused(true);
        assert!(manager.paused());

        assert!(!manager.schedule_level_event(
            &device,
            0,
            &[Level::new(AxisType::X, 3.0)],
            None
        ));
        assert!(!manager.schedule_button_event(Button::new(ButtonType::Left, true)));
        assert_eq!(manager.pen().level_value(AxisType::X.type_number()), 0.0);

        manager.set_paused(false);
        assert!(manager.schedule_level_event(
            &device,
            0,
            &[Level::new(AxisType::X, 3.0)],
            None
        ));
    }

    #[test]
    fn pausing_releases_pressed_buttons() {
        let manager = PenManager::new();
        manager.schedule_button_event(Button::new(ButtonType::Left, true));
        assert!(manager.pen().has_pressed_buttons());

        manager.set_paused(true);
        assert!(!manager.pen().has_pressed_buttons());

        // Repeated calls with the same value are no-ops.
        manager.set_paused(true);
        assert!(manager.paused());
    }
}
