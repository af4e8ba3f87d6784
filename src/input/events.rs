use serde::{Deserialize, Serialize};

use crate::core::geo::Point;

/// Primary button state for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ButtonState {
    #[default]
    Up,
    /// Held down; `frames` counts consecutive frames including this one
    Down { frames: u32 },
    /// Released during this frame
    Released,
}

impl ButtonState {
    pub fn is_down(&self) -> bool {
        matches!(self, ButtonState::Down { .. })
    }

    pub fn is_released(&self) -> bool {
        matches!(self, ButtonState::Released)
    }
}

/// Pointer snapshot polled by the host once per frame, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerState {
    pub position: Point,
    pub left: ButtonState,
    /// Wheel delta accumulated this frame; negative scrolls away from the user
    pub wheel: f64,
}

impl PointerState {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            ..Self::default()
        }
    }

    pub fn with_left(mut self, left: ButtonState) -> Self {
        self.left = left;
        self
    }

    pub fn with_wheel(mut self, wheel: f64) -> Self {
        self.wheel = wheel;
        self
    }
}

/// Cursor hint for the host to display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapCursor {
    #[default]
    Grab,
    Grabbing,
    Pointer,
}
