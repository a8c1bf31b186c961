//! Sparse node updates.
//!
//! A `NodePatch` names only the fields being changed; everything left as
//! `None` is untouched. Fields that may be cleared (`fill`, `stroke`, ...)
//! use `Option<Option<T>>`: `Some(None)` clears, `Some(Some(v))` sets.

use crate::model::{
    AutoLayout, FontStyle, NodeKind, Paint, SceneNode, Shadow, Sizing, Stroke, TextAlign,
    TextVAlign, TextWidthMode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodePatch {
    pub name: Option<Option<String>>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
    pub flip_x: Option<bool>,
    pub flip_y: Option<bool>,
    pub opacity: Option<f32>,
    pub visible: Option<bool>,

    pub fill: Option<Option<Paint>>,
    pub stroke: Option<Option<Stroke>>,
    pub effect: Option<Option<Shadow>>,
    pub fill_binding: Option<Option<String>>,
    pub stroke_binding: Option<Option<String>>,

    pub sizing: Option<Sizing>,
    pub absolute_position: Option<bool>,

    // Frame
    pub layout: Option<Option<AutoLayout>>,
    pub clip: Option<bool>,
    pub corner_radius: Option<f32>,

    // Text
    pub text: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<u16>,
    pub font_style: Option<FontStyle>,
    pub line_height: Option<Option<f32>>,
    pub letter_spacing: Option<f32>,
    pub text_align: Option<TextAlign>,
    pub text_align_vertical: Option<TextVAlign>,
    pub text_width_mode: Option<TextWidthMode>,

    // Path / embed
    pub geometry: Option<String>,
    pub html_content: Option<String>,
}

impl NodePatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn fill(paint: Paint) -> Self {
        Self {
            fill: Some(Some(paint)),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when applying the patch can change measured text geometry.
    pub fn touches_text(&self) -> bool {
        self.text.is_some()
            || self.font_family.is_some()
            || self.font_size.is_some()
            || self.font_weight.is_some()
            || self.font_style.is_some()
            || self.line_height.is_some()
            || self.letter_spacing.is_some()
            || self.text_width_mode.is_some()
            || self.width.is_some()
            || self.sizing.is_some()
    }

    /// Apply onto `node`. Variant-specific fields are ignored on nodes of
    /// other kinds. Returns true if anything changed.
    pub fn apply(&self, node: &mut SceneNode) -> bool {
        let before = node.clone();

        set(&mut node.name, &self.name);
        set(&mut node.x, &self.x);
        set(&mut node.y, &self.y);
        set(&mut node.width, &self.width.map(|w| w.max(0.0)));
        set(&mut node.height, &self.height.map(|h| h.max(0.0)));
        set(&mut node.rotation, &self.rotation);
        set(&mut node.flip_x, &self.flip_x);
        set(&mut node.flip_y, &self.flip_y);
        set(&mut node.opacity, &self.opacity.map(|o| o.clamp(0.0, 1.0)));
        set(&mut node.visible, &self.visible);
        set(&mut node.fill, &self.fill);
        set(&mut node.stroke, &self.stroke);
        set(&mut node.effect, &self.effect);
        set(&mut node.fill_binding, &self.fill_binding);
        set(&mut node.stroke_binding, &self.stroke_binding);
        set(&mut node.sizing, &self.sizing);
        set(&mut node.absolute_position, &self.absolute_position);

        match &mut node.kind {
            NodeKind::Frame(frame) => {
                set(&mut frame.layout, &self.layout);
                set(&mut frame.clip, &self.clip);
                set(&mut frame.corner_radius, &self.corner_radius);
            }
            NodeKind::Rect { corner_radius } | NodeKind::Polygon { corner_radius, .. } => {
                set(corner_radius, &self.corner_radius);
            }
            NodeKind::Text(text) => {
                set(&mut text.text, &self.text);
                set(&mut text.font.family, &self.font_family);
                set(&mut text.font.size, &self.font_size);
                set(&mut text.font.weight, &self.font_weight);
                set(&mut text.font.style, &self.font_style);
                set(&mut text.line_height, &self.line_height);
                set(&mut text.letter_spacing, &self.letter_spacing);
                set(&mut text.align, &self.text_align);
                set(&mut text.align_vertical, &self.text_align_vertical);
                set(&mut text.width_mode, &self.text_width_mode);
            }
            NodeKind::Path { geometry, .. } => set(geometry, &self.geometry),
            NodeKind::Embed { html_content } => set(html_content, &self.html_content),
            NodeKind::Group
            | NodeKind::Ellipse
            | NodeKind::Line { .. }
            | NodeKind::Instance(_) => {}
        }

        *node != before
    }
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}
