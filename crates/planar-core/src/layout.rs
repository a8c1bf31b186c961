//! Flexbox-like auto-layout solver.
//!
//! Pure functions over any tree of `LayoutBox`es: the stored `TreeNode` view
//! and the resolved `RenderNode` tree both implement it. Nothing here writes
//! to a node; the outputs are derived rects keyed by the box's layout id.
//!
//! Sizing is two-pass: `intrinsic_size` measures a subtree bottom-up against
//! unconstrained space, then `compute_layout` places a frame's immediate
//! children inside the size the frame was actually given.

use crate::id::NodeId;
use crate::model::{
    AlignItems, AutoLayout, FlexDirection, JustifyContent, ResolvedBounds, SceneNode, SizingMode,
    TreeNode,
};
use std::collections::HashMap;

/// A node with children that the solver can walk.
pub trait LayoutBox: Sized {
    /// Key for the output maps. Unique across the tree being laid out.
    fn layout_id(&self) -> NodeId;
    fn scene(&self) -> &SceneNode;
    fn child_boxes(&self) -> &[Self];
}

impl LayoutBox for TreeNode {
    fn layout_id(&self) -> NodeId {
        self.node.id
    }

    fn scene(&self) -> &SceneNode {
        &self.node
    }

    fn child_boxes(&self) -> &[Self] {
        &self.children
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn along(&self, dir: FlexDirection) -> f32 {
        match dir {
            FlexDirection::Row => self.width,
            FlexDirection::Column => self.height,
        }
    }

    fn across(&self, dir: FlexDirection) -> f32 {
        match dir {
            FlexDirection::Row => self.height,
            FlexDirection::Column => self.width,
        }
    }

    fn from_axes(dir: FlexDirection, primary: f32, cross: f32) -> Self {
        match dir {
            FlexDirection::Row => Self::new(primary, cross),
            FlexDirection::Column => Self::new(cross, primary),
        }
    }
}

/// Placement of one immediate child, in the frame's local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildLayout {
    pub id: NodeId,
    pub bounds: ResolvedBounds,
    /// Placed by the auto-layout flow, as opposed to keeping stored `x/y`.
    pub in_flow: bool,
}

/// Parent-local and absolute bounds of a node after layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaidOut {
    pub local: ResolvedBounds,
    pub absolute: ResolvedBounds,
}

fn modes(node: &SceneNode, dir: FlexDirection) -> (SizingMode, SizingMode) {
    match dir {
        FlexDirection::Row => (node.sizing.width_mode, node.sizing.height_mode),
        FlexDirection::Column => (node.sizing.height_mode, node.sizing.width_mode),
    }
}

fn padding_along(layout: &AutoLayout) -> (f32, f32) {
    match layout.direction {
        FlexDirection::Row => (layout.padding.left, layout.padding.top),
        FlexDirection::Column => (layout.padding.top, layout.padding.left),
    }
}

fn padding_total(layout: &AutoLayout) -> (f32, f32) {
    match layout.direction {
        FlexDirection::Row => (layout.padding.horizontal(), layout.padding.vertical()),
        FlexDirection::Column => (layout.padding.vertical(), layout.padding.horizontal()),
    }
}

/// Intrinsic sizes computed during one layout pass, keyed by layout id.
/// A subtree's intrinsic size does not depend on its parent, so each
/// subtree is measured once per pass however deeply frames nest.
#[derive(Debug, Default)]
struct SizeMemo {
    intrinsic: HashMap<NodeId, Size>,
}

/// Content size measured against unconstrained space.
///
/// - Auto-layout frame: padding + in-flow children + gaps on the primary
///   axis, padding + largest child on the cross axis.
/// - Other containers with children: bounding box of the visible children,
///   measured from the local origin.
/// - Everything else: the stored size.
pub fn intrinsic_size<T: LayoutBox>(node: &T) -> Size {
    intrinsic_in(node, &mut SizeMemo::default())
}

fn intrinsic_in<T: LayoutBox>(node: &T, memo: &mut SizeMemo) -> Size {
    let key = node.layout_id();
    if let Some(&size) = memo.intrinsic.get(&key) {
        return size;
    }
    let size = measure_content(node, memo);
    memo.intrinsic.insert(key, size);
    size
}

fn measure_content<T: LayoutBox>(node: &T, memo: &mut SizeMemo) -> Size {
    let scene = node.scene();
    let children = node.child_boxes();

    if let Some(layout) = scene.auto_layout() {
        let dir = layout.direction;
        let (pad_primary, pad_cross) = padding_total(layout);
        let mut primary = 0.0f32;
        let mut cross = 0.0f32;
        let mut count = 0usize;
        for child in children.iter().filter(|c| c.scene().in_flow()) {
            let size = natural_in(child, memo);
            primary += size.along(dir);
            cross = cross.max(size.across(dir));
            count += 1;
        }
        if count > 1 {
            primary += layout.gap * (count - 1) as f32;
        }
        return Size::from_axes(dir, primary + pad_primary, cross + pad_cross);
    }

    if scene.is_container() && !children.is_empty() {
        let mut width = 0.0f32;
        let mut height = 0.0f32;
        for child in children {
            let c = child.scene();
            if !c.visible || !c.enabled {
                continue;
            }
            let size = resolved_in(child, memo);
            width = width.max(c.x + size.width);
            height = height.max(c.y + size.height);
        }
        return Size::new(width, height);
    }

    Size::new(scene.width, scene.height)
}

/// Size a node takes with no parent constraint: fixed axes keep the stored
/// value, fit-content axes use the intrinsic size, and fill axes keep the
/// stored value since only a parent can stretch them.
pub fn resolved_size<T: LayoutBox>(node: &T) -> Size {
    resolved_in(node, &mut SizeMemo::default())
}

fn resolved_in<T: LayoutBox>(node: &T, memo: &mut SizeMemo) -> Size {
    let scene = node.scene();
    let fits = scene.sizing.width_mode == SizingMode::FitContent
        || scene.sizing.height_mode == SizingMode::FitContent;
    let intrinsic = if fits {
        intrinsic_in(node, memo)
    } else {
        Size::new(scene.width, scene.height)
    };
    Size::new(
        match scene.sizing.width_mode {
            SizingMode::FitContent => intrinsic.width,
            _ => scene.width,
        },
        match scene.sizing.height_mode {
            SizingMode::FitContent => intrinsic.height,
            _ => scene.height,
        },
    )
}

/// Size a child contributes before fill distribution. Fill axes fall back
/// to their fit size.
fn natural_in<T: LayoutBox>(node: &T, memo: &mut SizeMemo) -> Size {
    let scene = node.scene();
    let resolved = resolved_in(node, memo);
    let any_fill = scene.sizing.width_mode == SizingMode::FillContainer
        || scene.sizing.height_mode == SizingMode::FillContainer;
    if !any_fill {
        return resolved;
    }
    let intrinsic = intrinsic_in(node, memo);
    Size::new(
        match scene.sizing.width_mode {
            SizingMode::FillContainer => intrinsic.width,
            _ => resolved.width,
        },
        match scene.sizing.height_mode {
            SizingMode::FillContainer => intrinsic.height,
            _ => resolved.height,
        },
    )
}

/// Place the immediate children of `frame`, given the size the frame itself
/// occupies. Returns one entry per child, in child order.
///
/// Without an active auto-layout every child keeps its stored position.
pub fn compute_layout<T: LayoutBox>(frame: &T, frame_size: Size) -> Vec<ChildLayout> {
    layout_in(frame, frame_size, &mut SizeMemo::default())
}

fn layout_in<T: LayoutBox>(frame: &T, frame_size: Size, memo: &mut SizeMemo) -> Vec<ChildLayout> {
    let scene = frame.scene();
    let children = frame.child_boxes();

    let Some(layout) = scene.auto_layout() else {
        return children.iter().map(|c| stored_placement(c, memo)).collect();
    };

    let dir = layout.direction;
    let (frame_primary_mode, frame_cross_mode) = modes(scene, dir);
    let primary_fits = frame_primary_mode == SizingMode::FitContent;
    let cross_fits = frame_cross_mode == SizingMode::FitContent;

    let (pad_primary, pad_cross) = padding_total(layout);
    let (start_primary, start_cross) = padding_along(layout);
    let inner_primary = (frame_size.along(dir) - pad_primary).max(0.0);
    let inner_cross = (frame_size.across(dir) - pad_cross).max(0.0);

    // Measure pass: primary sizes of non-fill children, cross sizes of all.
    struct Slot {
        primary: Option<f32>,
        cross: f32,
    }
    let mut slots: Vec<Option<Slot>> = Vec::with_capacity(children.len());
    let mut fixed_total = 0.0f32;
    let mut fill_count = 0usize;
    let mut flow_count = 0usize;

    for child in children {
        let c = child.scene();
        if !c.in_flow() {
            slots.push(None);
            continue;
        }
        flow_count += 1;
        let natural = natural_in(child, memo);
        let (primary_mode, cross_mode) = modes(c, dir);

        let primary = if primary_mode == SizingMode::FillContainer && !primary_fits {
            fill_count += 1;
            None
        } else {
            let p = natural.along(dir);
            fixed_total += p;
            Some(p)
        };
        let cross = if cross_mode == SizingMode::FillContainer && !cross_fits {
            inner_cross
        } else {
            natural.across(dir)
        };
        slots.push(Some(Slot { primary, cross }));
    }

    let gaps = if flow_count > 1 {
        layout.gap * (flow_count - 1) as f32
    } else {
        0.0
    };
    let fill_each = if fill_count > 0 {
        ((inner_primary - fixed_total - gaps) / fill_count as f32).max(0.0)
    } else {
        0.0
    };
    let used = fixed_total + fill_each * fill_count as f32 + gaps;
    let free = inner_primary - used;

    let (mut cursor, spacing) = match layout.justify {
        JustifyContent::FlexStart => (0.0, layout.gap),
        JustifyContent::Center => (free / 2.0, layout.gap),
        JustifyContent::FlexEnd => (free, layout.gap),
        JustifyContent::SpaceBetween if free > 0.0 && flow_count >= 2 => {
            (0.0, layout.gap + free / (flow_count - 1) as f32)
        }
        JustifyContent::SpaceBetween => (0.0, layout.gap),
    };

    // Place pass.
    let mut out = Vec::with_capacity(children.len());
    for (child, slot) in children.iter().zip(slots) {
        let Some(slot) = slot else {
            out.push(stored_placement(child, memo));
            continue;
        };
        let primary = slot.primary.unwrap_or(fill_each);
        let cross_offset = match layout.align {
            AlignItems::FlexStart => 0.0,
            AlignItems::Center => (inner_cross - slot.cross) / 2.0,
            AlignItems::FlexEnd => inner_cross - slot.cross,
        };
        let p = start_primary + cursor;
        let q = start_cross + cross_offset;
        let bounds = match dir {
            FlexDirection::Row => ResolvedBounds::new(p, q, primary, slot.cross),
            FlexDirection::Column => ResolvedBounds::new(q, p, slot.cross, primary),
        };
        out.push(ChildLayout {
            id: child.layout_id(),
            bounds,
            in_flow: true,
        });
        cursor += primary + spacing;
    }
    out
}

fn stored_placement<T: LayoutBox>(child: &T, memo: &mut SizeMemo) -> ChildLayout {
    let c = child.scene();
    let size = resolved_in(child, memo);
    ChildLayout {
        id: child.layout_id(),
        bounds: ResolvedBounds::new(c.x, c.y, size.width, size.height),
        in_flow: false,
    }
}

/// Lay out whole trees. Roots keep their stored position; every frame lays
/// out its children against the size it was itself given. Ancestor
/// rotation is not applied to absolute bounds.
pub fn resolve_tree_layout<T: LayoutBox>(roots: &[T]) -> HashMap<NodeId, LaidOut> {
    let mut out = HashMap::new();
    let mut memo = SizeMemo::default();
    for root in roots {
        let scene = root.scene();
        let size = resolved_in(root, &mut memo);
        let bounds = ResolvedBounds::new(scene.x, scene.y, size.width, size.height);
        out.insert(
            root.layout_id(),
            LaidOut {
                local: bounds,
                absolute: bounds,
            },
        );
        layout_children(root, bounds, &mut memo, &mut out);
    }
    out
}

fn layout_children<T: LayoutBox>(
    node: &T,
    absolute: ResolvedBounds,
    memo: &mut SizeMemo,
    out: &mut HashMap<NodeId, LaidOut>,
) {
    let children = node.child_boxes();
    if children.is_empty() {
        return;
    }
    let placed = layout_in(node, Size::new(absolute.width, absolute.height), memo);
    for (child, placement) in children.iter().zip(placed) {
        let child_abs = placement.bounds.translate(absolute.x, absolute.y);
        out.insert(
            placement.id,
            LaidOut {
                local: placement.bounds,
                absolute: child_abs,
            },
        );
        layout_children(child, child_abs, memo, out);
    }
}
