//! Discrete pointer messages driving the editor.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    /// Click selection adds to (or toggles within) the current selection.
    pub fn is_additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Pointer input in canvas coordinates.
///
/// Hosts convert screen positions with [`Viewport::screen_to_canvas`](crate::viewport::Viewport::screen_to_canvas)
/// before handing events to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        button: PointerButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Pointer capture was lost; any gesture in progress is dropped.
    Cancel,
}

impl PointerEvent {
    pub fn down(position: Point) -> Self {
        PointerEvent::Down {
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(position: Point) -> Self {
        PointerEvent::Move {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(position: Point) -> Self {
        PointerEvent::Up {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => Some(*position),
            PointerEvent::Cancel => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            PointerEvent::Down { modifiers, .. }
            | PointerEvent::Move { modifiers, .. }
            | PointerEvent::Up { modifiers, .. } => *modifiers,
            PointerEvent::Cancel => Modifiers::NONE,
        }
    }
}
