//! Button edge detection
//!
//! Turns successive button levels into discrete pointer actions under one of
//! two trigger policies:
//!
//! | Policy      | released → pressed | pressed → released | unchanged |
//! |-------------|--------------------|--------------------|-----------|
//! | `EdgeClick` | `Click`            | -                  | -         |
//! | `PressHold` | `Press`            | `Release`          | -         |
//!
//! Any nonzero level counts as pressed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical button reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => f.write_str("left"),
            MouseButton::Right => f.write_str("right"),
        }
    }
}

/// Discrete action to forward to pointer injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Atomic press + release
    Click(MouseButton),
    Press(MouseButton),
    Release(MouseButton),
}

/// How level changes map to actions. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Single click on the rising edge; falling edge ignored
    #[default]
    EdgeClick,
    /// Press on rising edge, release on falling edge (drag support)
    PressHold,
}

/// Last observed level of each button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    left: bool,
    right: bool,
}

impl ButtonState {
    /// Both buttons released.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Right => self.right,
        }
    }

    /// Feed the levels from one decoded frame.
    ///
    /// Returns the actions to emit, left before right. The stored levels are
    /// replaced by the new ones regardless of whether anything was emitted.
    pub fn update(&mut self, left: i64, right: i64, policy: TriggerPolicy) -> Vec<ButtonAction> {
        let mut actions = Vec::new();

        for (button, level) in [(MouseButton::Left, left), (MouseButton::Right, right)] {
            let now = level != 0;
            let slot = self.slot_mut(button);
            if let Some(action) = transition(*slot, now, button, policy) {
                actions.push(action);
            }
            *slot = now;
        }

        actions
    }

    /// Actions that leave no button held down.
    ///
    /// Only `PressHold` can leave a button held; the state is reset to
    /// released afterwards.
    pub fn release_all(&mut self, policy: TriggerPolicy) -> Vec<ButtonAction> {
        match policy {
            TriggerPolicy::EdgeClick => {
                *self = Self::new();
                Vec::new()
            }
            TriggerPolicy::PressHold => self.update(0, 0, policy),
        }
    }

    fn slot_mut(&mut self, button: MouseButton) -> &mut bool {
        match button {
            MouseButton::Left => &mut self.left,
            MouseButton::Right => &mut self.right,
        }
    }
}

fn transition(
    was: bool,
    now: bool,
    button: MouseButton,
    policy: TriggerPolicy,
) -> Option<ButtonAction> {
    match (policy, was, now) {
        (TriggerPolicy::EdgeClick, false, true) => Some(ButtonAction::Click(button)),
        (TriggerPolicy::PressHold, false, true) => Some(ButtonAction::Press(button)),
        (TriggerPolicy::PressHold, true, false) => Some(ButtonAction::Release(button)),
        _ => None,
    }
}
