//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and stylus events into a unified `InputEvent`
//! enum consumed by the editor. Coordinates are canvas (document) space;
//! the host converts from screen space before calling in.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub const CMD: Self = Self {
        meta: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// Platform command key: `meta` or `ctrl`.
    pub fn cmd(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event from any pointing device or the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pencil contact).
    PointerDown {
        x: f32,
        y: f32,
        /// Pressure from 0.0 (none) to 1.0 (max). Mouse is always 1.0.
        pressure: f32,
        modifiers: Modifiers,
    },

    /// Pointer moved.
    PointerMove {
        x: f32,
        y: f32,
        pressure: f32,
        modifiers: Modifiers,
    },

    /// Pointer released.
    PointerUp { x: f32, y: f32, modifiers: Modifiers },

    /// The host lost the pointer (button released outside the window,
    /// touch cancelled, capture lost).
    PointerCancel,

    DoubleClick { x: f32, y: f32 },

    /// Key press. `key` is the `KeyboardEvent.key` value.
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            x,
            y,
            pressure: 1.0,
            modifiers,
        }
    }

    pub fn pointer_move(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerMove {
            x,
            y,
            pressure: 1.0,
            modifiers,
        }
    }

    pub fn pointer_up(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerUp { x, y, modifiers }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::DoubleClick { x, y } => Some((*x, *y)),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Key { modifiers, .. } => *modifiers,
            _ => Modifiers::NONE,
        }
    }
}
