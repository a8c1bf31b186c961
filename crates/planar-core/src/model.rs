//! Core node model for Planar documents.
//!
//! A `SceneNode` is a common base record (placement, paint, sizing) plus a
//! `NodeKind` carrying the variant-specific data. Containment is not stored
//! on the node: the flat store keeps parent/children maps, and `TreeNode` is
//! the nested view built from them on demand.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (channel(self.r), channel(self.g), channel(self.b), channel(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

/// A gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32, // 0.0 .. 1.0
    pub color: Color,
}

/// How an image fill maps onto the node box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    #[default]
    Fill,
    Fit,
    Crop,
    Tile,
}

/// Fill or stroke paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paint {
    Solid(Color),
    LinearGradient {
        angle: f32, // degrees
        stops: Vec<GradientStop>,
    },
    RadialGradient {
        stops: Vec<GradientStop>,
    },
    /// Image fill. `src` is an opaque handle resolved by the renderer.
    Image { src: String, fit: ImageFit },
}

impl Paint {
    /// Solid paint from a hex string, `None` if the hex is malformed.
    pub fn hex(hex: &str) -> Option<Self> {
        Color::from_hex(hex).map(Paint::Solid)
    }
}

// ─── Stroke ──────────────────────────────────────────────────────────────

/// Four per-side values (stroke widths, padding).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Sides {
    pub const fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Vertical then horizontal, CSS shorthand order.
    pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Stroke width is either one value for the whole outline or one per side,
/// never a mix of both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeWidth {
    Uniform(f32),
    PerSide(Sides),
}

impl StrokeWidth {
    /// Widest side; used for hit slop and bounds inflation.
    pub fn max(&self) -> f32 {
        match self {
            StrokeWidth::Uniform(w) => *w,
            StrokeWidth::PerSide(s) => s.top.max(s.right).max(s.bottom).max(s.left),
        }
    }
}

/// Where the stroke sits relative to the geometry outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeAlign {
    Inside,
    #[default]
    Center,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub paint: Paint,
    pub width: StrokeWidth,
    pub align: StrokeAlign,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            paint: Paint::Solid(Color::BLACK),
            width: StrokeWidth::Uniform(1.0),
            align: StrokeAlign::default(),
            cap: StrokeCap::default(),
            join: StrokeJoin::default(),
        }
    }
}

impl Stroke {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            paint: Paint::Solid(color),
            width: StrokeWidth::Uniform(width),
            ..Default::default()
        }
    }
}

// ─── Effects ─────────────────────────────────────────────────────────────

/// Drop shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub spread: f32,
    pub color: Color,
}

// ─── Auto-layout & sizing ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JustifyContent {
    #[default]
    FlexStart,
    Center,
    FlexEnd,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignItems {
    #[default]
    FlexStart,
    Center,
    FlexEnd,
}

/// Flexbox-like layout settings on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoLayout {
    pub auto_layout: bool,
    pub direction: FlexDirection,
    pub justify: JustifyContent,
    pub align: AlignItems,
    pub gap: f32,
    pub padding: Sides,
}

impl AutoLayout {
    /// An enabled layout in the given direction with a gap and no padding.
    pub fn flow(direction: FlexDirection, gap: f32) -> Self {
        Self {
            auto_layout: true,
            direction,
            gap,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    #[default]
    Fixed,
    FillContainer,
    FitContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sizing {
    pub width_mode: SizingMode,
    pub height_mode: SizingMode,
}

impl Sizing {
    pub const fn new(width_mode: SizingMode, height_mode: SizingMode) -> Self {
        Self {
            width_mode,
            height_mode,
        }
    }
}

// ─── Font / Text ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub weight: u16, // 100..900
    pub style: FontStyle,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Inter".into(),
            size: 14.0,
            weight: 400,
            style: FontStyle::Normal,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextVAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Which text box dimensions follow the measured text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextWidthMode {
    /// Width and height both follow the text.
    #[default]
    Auto,
    /// Width pinned, text wraps, height follows.
    Fixed,
    /// Both dimensions pinned.
    FixedHeight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    pub text: String,
    pub font: FontSpec,
    /// Line height as a multiple of the font size (`None` = 1.2).
    pub line_height: Option<f32>,
    pub letter_spacing: f32,
    pub align: TextAlign,
    pub align_vertical: TextVAlign,
    pub width_mode: TextWidthMode,
}

impl TextProps {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: FontSpec::default(),
            line_height: None,
            letter_spacing: 0.0,
            align: TextAlign::default(),
            align_vertical: TextVAlign::default(),
            width_mode: TextWidthMode::default(),
        }
    }
}

// ─── Components ──────────────────────────────────────────────────────────

/// Frame-only data. A frame with `reusable = true` is a component template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameProps {
    pub layout: Option<AutoLayout>,
    pub clip: bool,
    pub reusable: bool,
    pub corner_radius: f32,
    pub theme_override: Option<BTreeMap<String, String>>,
    /// Legacy explicit slot list. Kept for data fidelity; slot status is
    /// decided by the descendant being an instance.
    pub slots: Vec<NodeId>,
}

impl FrameProps {
    /// Layout settings if auto-layout is switched on.
    pub fn active_layout(&self) -> Option<&AutoLayout> {
        self.layout.as_ref().filter(|l| l.auto_layout)
    }
}

/// Shallow property patch for one descendant of an instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DescendantOverride {
    pub fill: Option<Paint>,
    pub stroke: Option<Stroke>,
    pub stroke_width: Option<f32>,
    pub enabled: Option<bool>,
    pub fill_binding: Option<String>,
    pub stroke_binding: Option<String>,
}

/// Names one resettable property of a `DescendantOverride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideField {
    Fill,
    Stroke,
    StrokeWidth,
    Enabled,
    FillBinding,
    StrokeBinding,
}

impl DescendantOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer `other` on top of `self`; only `Some` fields are taken.
    pub fn merge(&mut self, other: &DescendantOverride) {
        if other.fill.is_some() {
            self.fill = other.fill.clone();
        }
        if other.stroke.is_some() {
            self.stroke = other.stroke.clone();
        }
        if other.stroke_width.is_some() {
            self.stroke_width = other.stroke_width;
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.fill_binding.is_some() {
            self.fill_binding = other.fill_binding.clone();
        }
        if other.stroke_binding.is_some() {
            self.stroke_binding = other.stroke_binding.clone();
        }
    }

    /// Clear one field. Returns true if it was set.
    pub fn clear(&mut self, field: OverrideField) -> bool {
        match field {
            OverrideField::Fill => self.fill.take().is_some(),
            OverrideField::Stroke => self.stroke.take().is_some(),
            OverrideField::StrokeWidth => self.stroke_width.take().is_some(),
            OverrideField::Enabled => self.enabled.take().is_some(),
            OverrideField::FillBinding => self.fill_binding.take().is_some(),
            OverrideField::StrokeBinding => self.stroke_binding.take().is_some(),
        }
    }
}

/// A component instance ("ref" node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceProps {
    pub component_id: NodeId,
    /// Property overrides keyed by template descendant id.
    pub descendants: HashMap<NodeId, DescendantOverride>,
    /// Wholesale replacements for slot descendants (instance-typed template
    /// descendants), keyed by template descendant id.
    pub slot_content: HashMap<NodeId, TreeNode>,
}

impl InstanceProps {
    pub fn new(component_id: NodeId) -> Self {
        Self {
            component_id,
            descendants: HashMap::new(),
            slot_content: HashMap::new(),
        }
    }

    pub fn has_overrides(&self) -> bool {
        !self.descendants.is_empty() || !self.slot_content.is_empty()
    }
}

// ─── Path data ───────────────────────────────────────────────────────────

/// A single path command (SVG-like, absolute coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),            // control, end
    CubicTo(f32, f32, f32, f32, f32, f32), // c1, c2, end
    Close,
}

// ─── Scene Nodes ─────────────────────────────────────────────────────────

/// Variant-specific node data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Container that can clip, lay out children, and act as a component.
    Frame(FrameProps),

    /// Container without layout.
    Group,

    Rect {
        corner_radius: f32,
    },

    Ellipse,

    /// Polyline in local coordinates.
    Line {
        points: SmallVec<[(f32, f32); 2]>,
    },

    Polygon {
        sides: u32,
        corner_radius: f32,
    },

    /// SVG path data, in local coordinates.
    Path {
        geometry: String,
        clip_geometry: Option<String>,
    },

    Text(TextProps),

    /// Component instance.
    Instance(InstanceProps),

    /// Raw markup rasterized externally.
    Embed {
        html_content: String,
    },
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Frame(_) => "frame",
            NodeKind::Group => "group",
            NodeKind::Rect { .. } => "rect",
            NodeKind::Ellipse => "ellipse",
            NodeKind::Line { .. } => "line",
            NodeKind::Polygon { .. } => "polygon",
            NodeKind::Path { .. } => "path",
            NodeKind::Text(_) => "text",
            NodeKind::Instance(_) => "ref",
            NodeKind::Embed { .. } => "embed",
        }
    }

    /// Frames and groups own children in the flat store.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Frame(_) | NodeKind::Group)
    }
}

/// A single node: common placement/paint fields plus the variant data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: Option<String>,

    /// Position relative to the parent's origin. Ignored while the parent's
    /// auto-layout places this node.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,

    pub opacity: f32,
    pub visible: bool,
    /// Cleared by instance overrides to drop a descendant from the resolved tree.
    pub enabled: bool,

    pub fill: Option<Paint>,
    pub stroke: Option<Stroke>,
    pub effect: Option<Shadow>,
    /// Variable references bound to the fill / stroke paint.
    pub fill_binding: Option<String>,
    pub stroke_binding: Option<String>,

    pub sizing: Sizing,
    /// Opt out of the parent auto-layout flow.
    pub absolute_position: bool,

    pub kind: NodeKind,
}

impl SceneNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            name: None,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
            visible: true,
            enabled: true,
            fill: None,
            stroke: None,
            effect: None,
            fill_binding: None,
            stroke_binding: None,
            sizing: Sizing::default(),
            absolute_position: false,
            kind,
        }
    }

    pub fn frame(id: NodeId) -> Self {
        Self::new(id, NodeKind::Frame(FrameProps::default()))
    }

    pub fn group(id: NodeId) -> Self {
        Self::new(id, NodeKind::Group)
    }

    pub fn rect(id: NodeId) -> Self {
        Self::new(id, NodeKind::Rect { corner_radius: 0.0 })
    }

    pub fn text(id: NodeId, text: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Text(TextProps::new(text)))
    }

    pub fn instance(id: NodeId, component_id: NodeId) -> Self {
        Self::new(id, NodeKind::Instance(InstanceProps::new(component_id)))
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn filled(mut self, paint: Paint) -> Self {
        self.fill = Some(paint);
        self
    }

    pub fn with_sizing(mut self, width_mode: SizingMode, height_mode: SizingMode) -> Self {
        self.sizing = Sizing::new(width_mode, height_mode);
        self
    }

    /// Set the auto-layout of a frame node. No-op on other kinds.
    pub fn with_layout(mut self, layout: AutoLayout) -> Self {
        if let NodeKind::Frame(props) = &mut self.kind {
            props.layout = Some(layout);
        }
        self
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn frame_props(&self) -> Option<&FrameProps> {
        match &self.kind {
            NodeKind::Frame(props) => Some(props),
            _ => None,
        }
    }

    pub fn frame_props_mut(&mut self) -> Option<&mut FrameProps> {
        match &mut self.kind {
            NodeKind::Frame(props) => Some(props),
            _ => None,
        }
    }

    pub fn text_props(&self) -> Option<&TextProps> {
        match &self.kind {
            NodeKind::Text(props) => Some(props),
            _ => None,
        }
    }

    pub fn instance_props(&self) -> Option<&InstanceProps> {
        match &self.kind {
            NodeKind::Instance(props) => Some(props),
            _ => None,
        }
    }

    pub fn instance_props_mut(&mut self) -> Option<&mut InstanceProps> {
        match &mut self.kind {
            NodeKind::Instance(props) => Some(props),
            _ => None,
        }
    }

    /// True for a reusable frame (component template).
    pub fn is_component(&self) -> bool {
        self.frame_props().is_some_and(|f| f.reusable)
    }

    /// Auto-layout settings when this is a frame with auto-layout on.
    pub fn auto_layout(&self) -> Option<&AutoLayout> {
        self.frame_props().and_then(FrameProps::active_layout)
    }

    /// Participates in a parent's auto-layout flow.
    pub fn in_flow(&self) -> bool {
        !self.absolute_position && self.visible && self.enabled
    }

    pub fn bounds(&self) -> ResolvedBounds {
        ResolvedBounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

// ─── Tree view ───────────────────────────────────────────────────────────

/// Nested view of a node and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub node: SceneNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(node: SceneNode, children: Vec<TreeNode>) -> Self {
        Self { node, children }
    }

    pub fn leaf(node: SceneNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Depth-first search by node id.
    pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
        if self.node.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Every id in this subtree, pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.node.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    /// Rewrite every id in the subtree through `remap`.
    pub fn remap_ids(&mut self, remap: &mut impl FnMut(NodeId) -> NodeId) {
        self.node.id = remap(self.node.id);
        for child in &mut self.children {
            child.remap_ids(remap);
        }
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned box, either parent-local or absolute depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ResolvedBounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if this bounds intersects another box (AABB overlap).
    pub fn intersects(&self, other: &ResolvedBounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &ResolvedBounds) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        let short = Color::from_hex("f00").unwrap();
        assert_eq!(short.to_hex(), "#FF0000");
        assert!(Color::from_hex("#12345").is_none());
    }

    #[test]
    fn override_merge_and_clear() {
        let mut base = DescendantOverride {
            fill: Paint::hex("#ff0000"),
            ..Default::default()
        };
        base.merge(&DescendantOverride {
            stroke_width: Some(2.0),
            ..Default::default()
        });
        assert!(base.fill.is_some());
        assert_eq!(base.stroke_width, Some(2.0));

        assert!(base.clear(OverrideField::Fill));
        assert!(!base.clear(OverrideField::Fill));
        assert!(base.clear(OverrideField::StrokeWidth));
        assert!(base.is_empty());
    }

    #[test]
    fn only_frames_and_groups_are_containers() {
        let id = NodeId::intern("k");
        assert!(SceneNode::frame(id).is_container());
        assert!(SceneNode::group(id).is_container());
        assert!(!SceneNode::rect(id).is_container());
        assert!(!SceneNode::instance(id, NodeId::intern("c")).is_container());
        assert_eq!(SceneNode::instance(id, id).kind.type_name(), "ref");
    }

    #[test]
    fn auto_layout_requires_flag() {
        let id = NodeId::intern("f");
        let mut layout = AutoLayout::flow(FlexDirection::Row, 8.0);
        let frame = SceneNode::frame(id).with_layout(layout);
        assert!(frame.auto_layout().is_some());

        layout.auto_layout = false;
        let frame = SceneNode::frame(id).with_layout(layout);
        assert!(frame.auto_layout().is_none());
    }

    #[test]
    fn bounds_union_and_intersection() {
        let a = ResolvedBounds::new(0.0, 0.0, 10.0, 10.0);
        let b = ResolvedBounds::new(5.0, 5.0, 10.0, 10.0);
        let c = ResolvedBounds::new(20.0, 20.0, 1.0, 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c), ResolvedBounds::new(0.0, 0.0, 21.0, 21.0));
    }
}
