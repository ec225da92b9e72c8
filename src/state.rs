//! Aggregated pen state.
//!
//! [`PenState`] is the authoritative "last known value" record the scheduler
//! deduplicates against: the most recently admitted value per axis, an integer
//! press count per button, and the current implement kind. The scheduler
//! mutates it only inside the admission lock; [`Pen::state`](crate::pen::Pen::state)
//! hands out owned, serializable snapshots for everyone else.
//!
//! Buttons are counted, not flagged. A button is pressed iff its count is
//! strictly positive; the aggregate pressed count moves only on 0→positive and
//! positive→0 transitions, so overlapping press calls from multiple producers
//! cannot under- or over-count.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::{AxisType, Button, ButtonType, PenKind};

/// Snapshot of the pen's current levels, button press counts, and kind.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PenState {
    kind: PenKind,
    level_values: [f32; AxisType::COUNT],
    /// Sparse values for extension axes, keyed by numeric type id.
    ext_level_values: HashMap<u16, f32>,
    button_counts: [u32; ButtonType::COUNT],
    /// Sparse press counts for extension buttons, keyed by numeric type id.
    ext_button_counts: HashMap<u16, u32>,
    pressed_buttons_count: u32,
}

impl PenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently admitted value for the axis, `0.0` if never reported.
    pub fn level_value(&self, type_number: u16) -> f32 {
        match usize::from(type_number) {
            n if n < AxisType::COUNT => self.level_values[n],
            _ => self
                .ext_level_values
                .get(&type_number)
                .copied()
                .unwrap_or(0.0),
        }
    }

    pub(crate) fn set_level_value(&mut self, type_number: u16, value: f32) {
        match usize::from(type_number) {
            n if n < AxisType::COUNT => self.level_values[n] = value,
            _ => {
                self.ext_level_values.insert(type_number, value);
            }
        }
    }

    /// Effective boolean state: pressed iff the press count is positive.
    pub fn button_value(&self, type_number: u16) -> bool {
        self.button_count(type_number) > 0
    }

    fn button_count(&self, type_number: u16) -> u32 {
        match usize::from(type_number) {
            n if n < ButtonType::COUNT => self.button_counts[n],
            _ => self
                .ext_button_counts
                .get(&type_number)
                .copied()
                .unwrap_or(0),
        }
    }

    fn set_button_count(&mut self, type_number: u16, count: u32) {
        match usize::from(type_number) {
            n if n < ButtonType::COUNT => self.button_counts[n] = count,
            _ => {
                self.ext_button_counts.insert(type_number, count);
            }
        }
    }

    /// Applies a press/release edge to the count and reports whether the
    /// effective boolean state changed.
    ///
    /// A press always increments the count (bumping the aggregate only on the
    /// 0→1 transition); a release clamps the count back to zero, decrementing
    /// the aggregate only if the button was pressed. N presses followed by N
    /// releases therefore produce exactly one `true` and one `false` transition.
    pub(crate) fn set_button_value(&mut self, button: Button) -> bool {
        let old = self.button_value(button.type_number);
        let count = self.button_count(button.type_number);
        if button.pressed {
            if count == 0 {
                self.pressed_buttons_count += 1;
            }
            self.set_button_count(button.type_number, count + 1);
        } else {
            if count > 0 {
                self.pressed_buttons_count -= 1;
            }
            self.set_button_count(button.type_number, 0);
        }
        old != self.button_value(button.type_number)
    }

    pub fn kind(&self) -> PenKind {
        self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: PenKind) {
        self.kind = kind;
    }

    pub fn has_pressed_buttons(&self) -> bool {
        self.pressed_buttons_count > 0
    }

    pub fn pressed_buttons_count(&self) -> u32 {
        self.pressed_buttons_count
    }

    /// Type numbers of every currently pressed button, well-known and
    /// extension, in ascending order.
    pub(crate) fn pressed_button_numbers(&self) -> Vec<u16> {
        let mut numbers: Vec<u16> = (0..ButtonType::COUNT as u16)
            .filter(|&n| self.button_counts[usize::from(n)] > 0)
            .collect();
        numbers.extend(
            self.ext_button_counts
                .iter()
                .filter(|(_, &count)| count > 0)
                .map(|(&n, _)| n),
        );
        numbers.sort_unstable();
        numbers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Level;

    #[test]
    fn level_values_hold_last_admitted_value() {
        let mut state = PenState::new();
        assert_eq!(state.level_value(AxisType::X.type_number()), 0.0);

        state.set_level_value(AxisType::X.type_number(), 10.0);
        state.set_level_value(AxisType::X.type_number(), 11.0);
        assert_eq!(state.level_value(AxisType::X.type_number()), 11.0);
        assert_eq!(state.level_value(AxisType::Y.type_number()), 0.0);
    }

    #[test]
    fn extension_axes_live_in_the_overflow_map() {
        let mut state = PenState::new();
        let ext = Level::ext(42, 0.5);
        state.set_level_value(ext.type_number, ext.value);
        assert_eq!(state.level_value(42), 0.5);
        assert_eq!(state.level_value(43), 0.0);
    }

    #[test]
    fn press_count_round_trip_yields_one_transition_each_way() {
        let mut state = PenState::new();
        let press = Button::new(ButtonType::Left, true);
        let release = Button::new(ButtonType::Left, false);

        assert!(state.set_button_value(press));
        assert!(!state.set_button_value(press));
        assert!(!state.set_button_value(press));
        assert!(state.button_value(press.type_number));
        assert_eq!(state.pressed_buttons_count(), 1);

        assert!(state.set_button_value(release));
        assert!(!state.set_button_value(release));
        assert!(!state.set_button_value(release));
        assert!(!state.button_value(press.type_number));
        assert_eq!(state.pressed_buttons_count(), 0);
    }

    #[test]
    fn aggregate_count_tracks_distinct_buttons() {
        let mut state = PenState::new();
        state.set_button_value(Button::new(ButtonType::Left, true));
        state.set_button_value(Button::new(ButtonType::Right, true));
        state.set_button_value(Button::ext(17, true));
        assert_eq!(state.pressed_buttons_count(), 3);
        assert!(state.has_pressed_buttons());

        assert_eq!(
            state.pressed_button_numbers(),
            vec![
                ButtonType::Left.type_number(),
                ButtonType::Right.type_number(),
                17
            ]
        );

        state.set_button_value(Button::new(ButtonType::Left, false));
        assert_eq!(state.pressed_buttons_count(), 2);
    }

    #[test]
    fn release_of_unpressed_button_is_a_no_op() {
        let mut state = PenState::new();
        assert!(!state.set_button_value(Button::new(ButtonType::Center, false)));
        assert_eq!(state.pressed_buttons_count(), 0);
    }

    #[test]
    fn snapshot_serializes() {
        let mut state = PenState::new();
        state.set_kind(PenKind::Eraser);
        state.set_level_value(AxisType::Pressure.type_number(), 0.75);
        state.set_button_value(Button::new(ButtonType::Left, true));

        let json = serde_json::to_string(&state).unwrap();
        let back: PenState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), PenKind::Eraser);
        assert_eq!(back.level_value(AxisType::Pressure.type_number()), 0.75);
        assert!(back.button_value(ButtonType::Left.type_number()));
        assert_eq!(back.pressed_buttons_count(), 1);
    }
}
