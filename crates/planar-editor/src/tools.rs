//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into `ToolCommand`s that the editor
//! applies to the store. The gesture in progress is tracked by `Gesture`
//! between pointer-down and pointer-up.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select Tool | Shape Tools |
//! |----------|-------------|-------------|
//! | **Shift** | Toggle selection, axis-constrain drag, extend marquee | Square constraint |
//! | **Alt** | n/a | Draw from center |

use crate::input::{InputEvent, Modifiers};
use planar_core::{NodeId, ResolvedBounds};

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Frame,
    Rect,
    Ellipse,
    Text,
}

impl ToolKind {
    /// Tools that draw a box by dragging.
    pub fn draws_shape(self) -> bool {
        matches!(self, Self::Frame | Self::Rect | Self::Ellipse)
    }
}

/// What the editor should do in response to a pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCommand {
    /// Select the hit node; `additive` toggles it in the selection.
    Select { id: NodeId, additive: bool },
    /// Press on empty canvas without shift.
    ClickEmpty,
    /// Drag crossed the threshold: open an undo batch.
    BeginDrag,
    /// Move the dragged nodes to their start position plus this offset.
    DragTo { dx: f32, dy: f32 },
    EndDrag,
    /// Abandon the drag and restore the start state.
    CancelDrag,
    /// Marquee rectangle changed (render feedback only).
    Marquee(ResolvedBounds),
    /// Marquee released: select what it touches.
    MarqueeSelect { rect: ResolvedBounds, additive: bool },
    /// Draw preview changed (render feedback only).
    Preview { tool: ToolKind, rect: ResolvedBounds },
    /// Create the drawn node.
    CommitShape { tool: ToolKind, rect: ResolvedBounds },
    /// Place a text node and start editing it.
    PlaceText { x: f32, y: f32 },
    /// Drop marquee or draw preview feedback.
    ClearFeedback,
}

/// The gesture being tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    /// Pressed on a node; not yet past the drag threshold.
    Pressed { start: (f32, f32) },
    /// Moving the selection.
    Dragging { start: (f32, f32) },
    /// Rubber-band selection from empty canvas.
    Marquee {
        start: (f32, f32),
        current: (f32, f32),
        additive: bool,
    },
    /// Drawing a new shape.
    Drawing {
        tool: ToolKind,
        start: (f32, f32),
        current: (f32, f32),
        modifiers: Modifiers,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Tracks one pointer gesture at a time for the active tool.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    pub gesture: Gesture,
    /// Distance the pointer must travel before a press becomes a drag.
    pub drag_threshold: f32,
}

impl GestureTracker {
    pub fn new(drag_threshold: f32) -> Self {
        Self {
            gesture: Gesture::Idle,
            drag_threshold,
        }
    }

    /// Handle a pointer event. `hit_node` is the node under a pointer-down.
    pub fn handle(
        &mut self,
        tool: ToolKind,
        event: &InputEvent,
        hit_node: Option<NodeId>,
    ) -> Vec<ToolCommand> {
        match event {
            InputEvent::PointerDown {
                x, y, modifiers, ..
            } => self.pointer_down(tool, (*x, *y), *modifiers, hit_node),
            InputEvent::PointerMove {
                x, y, modifiers, ..
            } => self.pointer_move((*x, *y), *modifiers),
            InputEvent::PointerUp { x, y, modifiers } => self.pointer_up((*x, *y), *modifiers),
            InputEvent::PointerCancel => self.cancel(),
            _ => vec![],
        }
    }

    fn pointer_down(
        &mut self,
        tool: ToolKind,
        at: (f32, f32),
        modifiers: Modifiers,
        hit_node: Option<NodeId>,
    ) -> Vec<ToolCommand> {
        // A press while a gesture is live means we missed its release.
        let mut out = self.cancel();
        match tool {
            ToolKind::Select => match hit_node {
                Some(id) => {
                    self.gesture = Gesture::Pressed { start: at };
                    out.push(ToolCommand::Select {
                        id,
                        additive: modifiers.shift,
                    });
                }
                None => {
                    self.gesture = Gesture::Marquee {
                        start: at,
                        current: at,
                        additive: modifiers.shift,
                    };
                    if !modifiers.shift {
                        out.push(ToolCommand::ClickEmpty);
                    }
                }
            },
            ToolKind::Text => out.push(ToolCommand::PlaceText { x: at.0, y: at.1 }),
            ToolKind::Frame | ToolKind::Rect | ToolKind::Ellipse => {
                self.gesture = Gesture::Drawing {
                    tool,
                    start: at,
                    current: at,
                    modifiers,
                };
            }
        }
        out
    }

    fn pointer_move(&mut self, at: (f32, f32), modifiers: Modifiers) -> Vec<ToolCommand> {
        match &mut self.gesture {
            Gesture::Idle => vec![],
            Gesture::Pressed { start } => {
                let start = *start;
                let (dx, dy) = (at.0 - start.0, at.1 - start.1);
                if dx.hypot(dy) < self.drag_threshold {
                    return vec![];
                }
                self.gesture = Gesture::Dragging { start };
                let (dx, dy) = constrain_axis(dx, dy, modifiers.shift);
                vec![ToolCommand::BeginDrag, ToolCommand::DragTo { dx, dy }]
            }
            Gesture::Dragging { start } => {
                let (dx, dy) = constrain_axis(at.0 - start.0, at.1 - start.1, modifiers.shift);
                vec![ToolCommand::DragTo { dx, dy }]
            }
            Gesture::Marquee { start, current, .. } => {
                *current = at;
                vec![ToolCommand::Marquee(normalize_rect(*start, at))]
            }
            Gesture::Drawing {
                tool,
                start,
                current,
                modifiers: held,
            } => {
                *current = at;
                *held = modifiers;
                let rect = shape_rect(*start, at, modifiers);
                vec![ToolCommand::Preview { tool: *tool, rect }]
            }
        }
    }

    fn pointer_up(&mut self, at: (f32, f32), modifiers: Modifiers) -> Vec<ToolCommand> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Pressed { .. } => vec![],
            Gesture::Dragging { .. } => vec![ToolCommand::EndDrag],
            Gesture::Marquee {
                start, additive, ..
            } => vec![
                ToolCommand::ClearFeedback,
                ToolCommand::MarqueeSelect {
                    rect: normalize_rect(start, at),
                    additive,
                },
            ],
            Gesture::Drawing { tool, start, .. } => vec![
                ToolCommand::ClearFeedback,
                ToolCommand::CommitShape {
                    tool,
                    rect: shape_rect(start, at, modifiers),
                },
            ],
        }
    }

    /// Abandon the gesture in progress (Escape, lost pointer button).
    /// Nothing it previewed is committed.
    pub fn cancel(&mut self) -> Vec<ToolCommand> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Pressed { .. } => vec![],
            Gesture::Dragging { .. } => vec![ToolCommand::CancelDrag],
            Gesture::Marquee { .. } | Gesture::Drawing { .. } => vec![ToolCommand::ClearFeedback],
        }
    }
}

/// Normalize a drag rectangle from start + current positions.
pub fn normalize_rect(a: (f32, f32), b: (f32, f32)) -> ResolvedBounds {
    ResolvedBounds::new(a.0.min(b.0), a.1.min(b.1), (b.0 - a.0).abs(), (b.1 - a.1).abs())
}

/// Shift keeps only the dominant axis.
fn constrain_axis(dx: f32, dy: f32, shift: bool) -> (f32, f32) {
    if !shift {
        (dx, dy)
    } else if dx.abs() > dy.abs() {
        (dx, 0.0)
    } else {
        (0.0, dy)
    }
}

/// Box drawn from `start` to `at`: shift squares it, alt draws from center.
fn shape_rect(start: (f32, f32), at: (f32, f32), modifiers: Modifiers) -> ResolvedBounds {
    let mut dx = at.0 - start.0;
    let mut dy = at.1 - start.1;
    if modifiers.shift {
        let side = dx.abs().max(dy.abs());
        dx = side.copysign(dx);
        dy = side.copysign(dy);
    }
    if modifiers.alt {
        normalize_rect((start.0 - dx, start.1 - dy), (start.0 + dx, start.1 + dy))
    } else {
        normalize_rect(start, (start.0 + dx, start.1 + dy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(x: f32, y: f32) -> InputEvent {
        InputEvent::pointer_down(x, y, Modifiers::NONE)
    }

    fn mv(x: f32, y: f32, modifiers: Modifiers) -> InputEvent {
        InputEvent::pointer_move(x, y, modifiers)
    }

    #[test]
    fn press_below_threshold_is_a_click() {
        let mut t = GestureTracker::new(3.0);
        let target = NodeId::intern("tool_click");
        let out = t.handle(ToolKind::Select, &down(10.0, 10.0), Some(target));
        assert_eq!(
            out,
            vec![ToolCommand::Select {
                id: target,
                additive: false
            }]
        );
        assert!(t.handle(ToolKind::Select, &mv(11.0, 11.0, Modifiers::NONE), None).is_empty());
        let up = InputEvent::pointer_up(11.0, 11.0, Modifiers::NONE);
        assert!(t.handle(ToolKind::Select, &up, None).is_empty());
        assert!(t.gesture.is_idle());
    }

    #[test]
    fn drag_reports_offset_from_start() {
        let mut t = GestureTracker::new(3.0);
        let target = NodeId::intern("tool_drag");
        t.handle(ToolKind::Select, &down(0.0, 0.0), Some(target));
        let out = t.handle(ToolKind::Select, &mv(10.0, 5.0, Modifiers::NONE), None);
        assert_eq!(
            out,
            vec![ToolCommand::BeginDrag, ToolCommand::DragTo { dx: 10.0, dy: 5.0 }]
        );
        let out = t.handle(ToolKind::Select, &mv(20.0, 4.0, Modifiers::SHIFT), None);
        assert_eq!(out, vec![ToolCommand::DragTo { dx: 20.0, dy: 0.0 }]);
        let up = InputEvent::pointer_up(20.0, 4.0, Modifiers::NONE);
        assert_eq!(t.handle(ToolKind::Select, &up, None), vec![ToolCommand::EndDrag]);
    }

    #[test]
    fn lost_button_cancels_drag() {
        let mut t = GestureTracker::new(0.0);
        t.handle(ToolKind::Select, &down(0.0, 0.0), Some(NodeId::intern("tool_lost")));
        t.handle(ToolKind::Select, &mv(5.0, 5.0, Modifiers::NONE), None);
        let out = t.handle(ToolKind::Select, &InputEvent::PointerCancel, None);
        assert_eq!(out, vec![ToolCommand::CancelDrag]);
        assert!(t.gesture.is_idle());
    }

    #[test]
    fn marquee_from_empty_canvas() {
        let mut t = GestureTracker::new(3.0);
        assert_eq!(
            t.handle(ToolKind::Select, &down(50.0, 50.0), None),
            vec![ToolCommand::ClickEmpty]
        );
        let out = t.handle(ToolKind::Select, &mv(10.0, 20.0, Modifiers::NONE), None);
        assert_eq!(
            out,
            vec![ToolCommand::Marquee(ResolvedBounds::new(10.0, 20.0, 40.0, 30.0))]
        );
        let up = InputEvent::pointer_up(10.0, 20.0, Modifiers::NONE);
        assert_eq!(
            t.handle(ToolKind::Select, &up, None),
            vec![
                ToolCommand::ClearFeedback,
                ToolCommand::MarqueeSelect {
                    rect: ResolvedBounds::new(10.0, 20.0, 40.0, 30.0),
                    additive: false
                }
            ]
        );
    }

    #[test]
    fn rect_tool_shift_draw_constrains_square() {
        let mut t = GestureTracker::new(3.0);
        t.handle(ToolKind::Rect, &down(0.0, 0.0), None);
        let out = t.handle(ToolKind::Rect, &mv(40.0, 10.0, Modifiers::SHIFT), None);
        assert_eq!(
            out,
            vec![ToolCommand::Preview {
                tool: ToolKind::Rect,
                rect: ResolvedBounds::new(0.0, 0.0, 40.0, 40.0)
            }]
        );
        let up = InputEvent::pointer_up(40.0, 10.0, Modifiers::SHIFT);
        let out = t.handle(ToolKind::Rect, &up, None);
        assert_eq!(
            out[1],
            ToolCommand::CommitShape {
                tool: ToolKind::Rect,
                rect: ResolvedBounds::new(0.0, 0.0, 40.0, 40.0)
            }
        );
    }

    #[test]
    fn alt_draws_from_center() {
        let rect = shape_rect((50.0, 50.0), (60.0, 70.0), Modifiers::ALT);
        assert_eq!(rect, ResolvedBounds::new(40.0, 30.0, 20.0, 40.0));
    }

    #[test]
    fn cancelled_draw_commits_nothing() {
        let mut t = GestureTracker::new(3.0);
        t.handle(ToolKind::Ellipse, &down(0.0, 0.0), None);
        t.handle(ToolKind::Ellipse, &mv(30.0, 30.0, Modifiers::NONE), None);
        assert_eq!(t.cancel(), vec![ToolCommand::ClearFeedback]);
        let up = InputEvent::pointer_up(30.0, 30.0, Modifiers::NONE);
        assert!(t.handle(ToolKind::Ellipse, &up, None).is_empty());
    }
}
