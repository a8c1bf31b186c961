//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Bindings follow
//! common design-tool conventions:
//! - ⌘G / ⌘⇧G group and ungroup
//! - ⌥A/D/W/S/H/V align, ⌥⇧H/V distribute
//! - arrows nudge, ⇧ for the large step
//! - ⌘⌥K creates a component, ⌘⌥B detaches an instance

use planar_core::{Alignment, Axis};

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    ToolSelect,
    ToolFrame,
    ToolRect,
    ToolEllipse,
    ToolText,
    /// Toggle between current and previous tool.
    ToggleLastTool,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    SelectAll,
    Duplicate,
    Copy,
    Cut,
    Paste,
    Group,
    Ungroup,

    // ── Components ──
    CreateComponent,
    DetachInstance,

    // ── Arrangement ──
    Align(Alignment),
    Distribute(Axis),
    /// Move the selection by one step; `large` uses the big step.
    Nudge { dx: i8, dy: i8, large: bool },

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,

    // ── Navigation ──
    /// Exit editing, instance context, selection, or container (in that order).
    Escape,
    /// Edit the selected text or enter the selected container.
    Enter,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: crate::input::Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.cmd();
        let shift = modifiers.shift;
        let alt = modifiers.alt;

        if let Some((dx, dy)) = arrow(key) {
            if cmd || alt {
                return None;
            }
            return Some(ShortcutAction::Nudge {
                dx,
                dy,
                large: shift,
            });
        }

        // ── Modifier combos first (most specific) ──
        if cmd && alt {
            return match key {
                "k" | "K" => Some(ShortcutAction::CreateComponent),
                "b" | "B" => Some(ShortcutAction::DetachInstance),
                _ => None,
            };
        }

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "g" | "G" => Some(ShortcutAction::Ungroup),
                "[" => Some(ShortcutAction::SendToBack),
                "]" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "c" | "C" => Some(ShortcutAction::Copy),
                "x" | "X" => Some(ShortcutAction::Cut),
                "v" | "V" => Some(ShortcutAction::Paste),
                "g" | "G" => Some(ShortcutAction::Group),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        if alt && shift {
            return match key {
                "h" | "H" => Some(ShortcutAction::Distribute(Axis::Horizontal)),
                "v" | "V" => Some(ShortcutAction::Distribute(Axis::Vertical)),
                _ => None,
            };
        }

        if alt {
            let alignment = match key {
                "a" | "A" => Alignment::Left,
                "d" | "D" => Alignment::Right,
                "h" | "H" => Alignment::CenterHorizontal,
                "w" | "W" => Alignment::Top,
                "s" | "S" => Alignment::Bottom,
                "v" | "V" => Alignment::CenterVertical,
                _ => return None,
            };
            return Some(ShortcutAction::Align(alignment));
        }

        if shift {
            return None;
        }

        // ── Single keys (no modifiers) ──
        match key {
            "v" | "V" => Some(ShortcutAction::ToolSelect),
            "f" | "F" => Some(ShortcutAction::ToolFrame),
            "r" | "R" => Some(ShortcutAction::ToolRect),
            "o" | "O" => Some(ShortcutAction::ToolEllipse),
            "t" | "T" => Some(ShortcutAction::ToolText),
            "Tab" => Some(ShortcutAction::ToggleLastTool),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Escape),
            "Enter" => Some(ShortcutAction::Enter),
            _ => None,
        }
    }
}

fn arrow(key: &str) -> Option<(i8, i8)> {
    match key {
        "ArrowLeft" => Some((-1, 0)),
        "ArrowRight" => Some((1, 0)),
        "ArrowUp" => Some((0, -1)),
        "ArrowDown" => Some((0, 1)),
        _ => None,
    }
}
