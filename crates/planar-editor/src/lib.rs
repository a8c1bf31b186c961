pub mod editor;
pub mod input;
pub mod shortcuts;
pub mod tools;

pub use editor::{Editor, EditorConfig, Feedback};
pub use input::{InputEvent, Modifiers};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{Gesture, GestureTracker, ToolCommand, ToolKind};
