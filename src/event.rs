//! Events and input channel descriptions.
//!
//! Penstream represents pen input as small, device-agnostic records: axis
//! (level) changes, button edges, scroll steps, and implement-kind switches.
//! Every record is immutable once admitted and carries the admission timestamp
//! in milliseconds since the Unix epoch.
//!
//! ## Value conventions
//! - **Axes:** each well-known axis ([`AxisType`]) has a stable numeric id;
//!   ids at or beyond [`AxisType::COUNT`] denote extension axes reported by
//!   exotic hardware. Axis values are `f32` in device units — penstream does
//!   not normalize; mapping to screen or pressure ranges belongs to the
//!   providing backend.
//! - **Buttons:** boolean state expressed as press/release edges. Extension
//!   buttons use ids at or beyond [`ButtonType::COUNT`].
//! - **Scroll:** a direction plus a magnitude in device ticks. Scroll deltas
//!   are incremental and never deduplicated.

use serde::{Deserialize, Serialize};

/// Well-known continuous input channels.
///
/// The discriminant doubles as the channel's stable `type_number`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisType {
    X,
    Y,
    Pressure,
    TiltX,
    TiltY,
    SidePressure,
    Rotation,
}

impl AxisType {
    /// Number of well-known axes; ids at or beyond this are extension axes.
    pub const COUNT: usize = 7;

    pub fn type_number(self) -> u16 {
        self as u16
    }

    pub fn from_type_number(type_number: u16) -> Option<AxisType> {
        match type_number {
            0 => Some(AxisType::X),
            1 => Some(AxisType::Y),
            2 => Some(AxisType::Pressure),
            3 => Some(AxisType::TiltX),
            4 => Some(AxisType::TiltY),
            5 => Some(AxisType::SidePressure),
            6 => Some(AxisType::Rotation),
            _ => None,
        }
    }
}

/// A single axis sample: which channel, and its current value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub type_number: u16,
    pub value: f32,
}

impl Level {
    pub fn new(axis: AxisType, value: f32) -> Self {
        Self {
            type_number: axis.type_number(),
            value,
        }
    }

    /// Sample for an extension axis identified only by its numeric id.
    pub fn ext(type_number: u16, value: f32) -> Self {
        Self { type_number, value }
    }

    /// The well-known axis this sample belongs to, if any.
    pub fn axis(&self) -> Option<AxisType> {
        AxisType::from_type_number(self.type_number)
    }
}

/// Well-known pen barrel / mouse buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonType {
    Left,
    Center,
    Right,
}

impl ButtonType {
    /// Number of well-known buttons; ids at or beyond this are extension buttons.
    pub const COUNT: usize = 3;

    pub fn type_number(self) -> u16 {
        self as u16
    }

    pub fn from_type_number(type_number: u16) -> Option<ButtonType> {
        match type_number {
            0 => Some(ButtonType::Left),
            1 => Some(ButtonType::Center),
            2 => Some(ButtonType::Right),
            _ => None,
        }
    }
}

/// A button edge: which button, and whether it is now pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub type_number: u16,
    pub pressed: bool,
}

impl Button {
    pub fn new(button: ButtonType, pressed: bool) -> Self {
        Self {
            type_number: button.type_number(),
            pressed,
        }
    }

    pub fn ext(type_number: u16, pressed: bool) -> Self {
        Self {
            type_number,
            pressed,
        }
    }
}

/// Scroll direction reported by wheel or touch-strip hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// One scroll step: direction plus magnitude in device ticks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scroll {
    pub direction: ScrollDirection,
    pub magnitude: f32,
}

/// Classification of the active input implement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenKind {
    /// Mouse-like pointer; the state a pen starts in.
    #[default]
    Cursor,
    /// Stylus tip.
    Stylus,
    /// Stylus eraser end.
    Eraser,
    /// Implement kind outside the well-known set, identified numerically.
    Custom(u16),
}

impl PenKind {
    pub fn type_number(self) -> u16 {
        match self {
            PenKind::Cursor => 0,
            PenKind::Stylus => 1,
            PenKind::Eraser => 2,
            PenKind::Custom(n) => n,
        }
    }

    pub fn from_type_number(type_number: u16) -> PenKind {
        match type_number {
            0 => PenKind::Cursor,
            1 => PenKind::Stylus,
            2 => PenKind::Eraser,
            n => PenKind::Custom(n),
        }
    }
}

/// Admission clip bounds for the movement axes.
///
/// When supplied to a level admission, a batch containing an `X` value outside
/// `[min_x, max_x]` or a `Y` value outside `[min_y, max_y]` is discarded whole:
/// either all retained axes are admitted or none are.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl ClipRect {
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Whether the given sample is inside the bounds. Non-movement axes always pass.
    pub fn admits(&self, level: &Level) -> bool {
        match level.axis() {
            Some(AxisType::X) => level.value >= self.min_x && level.value <= self.max_x,
            Some(AxisType::Y) => level.value >= self.min_y && level.value <= self.max_y,
            _ => true,
        }
    }
}

/// One or more axis values that changed together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelEvent {
    /// Milliseconds since the Unix epoch at admission.
    pub time_millis: u64,
    /// The surviving (changed) axis samples, in the order the device reported them.
    pub levels: Vec<Level>,
}

/// An effective button state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub time_millis: u64,
    pub button: Button,
}

/// A scroll step. Never filtered or deduplicated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollEvent {
    pub time_millis: u64,
    pub scroll: Scroll,
}

/// The active implement changed (e.g. the stylus was flipped to its eraser).
///
/// Always delivered before the level event that triggered it, with the same
/// timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindEvent {
    pub time_millis: u64,
    pub kind: PenKind,
}

/// Tagged union stored in the event queue.
///
/// The periodic tick is synthetic and never takes this form; it is delivered
/// directly once per dispatch cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum PenEvent {
    Level(LevelEvent),
    Button(ButtonEvent),
    Scroll(ScrollEvent),
    Kind(KindEvent),
}

impl PenEvent {
    pub fn time_millis(&self) -> u64 {
        match self {
            PenEvent::Level(e) => e.time_millis,
            PenEvent::Button(e) => e.time_millis,
            PenEvent::Scroll(e) => e.time_millis,
            PenEvent::Kind(e) => e.time_millis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_type_numbers_round_trip() {
        for n in 0..AxisType::COUNT as u16 {
            let axis = AxisType::from_type_number(n).unwrap();
            assert_eq!(axis.type_number(), n);
        }
        assert!(AxisType::from_type_number(AxisType::COUNT as u16).is_none());
    }

    #[test]
    fn kind_type_numbers_round_trip() {
        assert_eq!(PenKind::from_type_number(0), PenKind::Cursor);
        assert_eq!(PenKind::from_type_number(2), PenKind::Eraser);
        assert_eq!(PenKind::from_type_number(9), PenKind::Custom(9));
        assert_eq!(PenKind::Custom(9).type_number(), 9);
    }

    #[test]
    fn clip_rect_checks_movement_axes_only() {
        let clip = ClipRect::new(0.0, 100.0, 0.0, 50.0);
        assert!(clip.admits(&Level::new(AxisType::X, 100.0)));
        assert!(!clip.admits(&Level::new(AxisType::X, 100.5)));
        assert!(!clip.admits(&Level::new(AxisType::Y, -1.0)));
        // Pressure is unconstrained by the rectangle.
        assert!(clip.admits(&Level::new(AxisType::Pressure, 1e6)));
        assert!(clip.admits(&Level::ext(40, -5.0)));
    }
}
