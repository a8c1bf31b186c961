//! Text measurement seam.
//!
//! The store calls a `TextMeasurer` synchronously whenever a text-affecting
//! field changes. Real hosts plug in font-backed shaping; `EstimatedMeasurer`
//! is a deterministic stand-in based on average glyph advances.

use crate::model::{FontStyle, NodeKind, SceneNode, SizingMode, TextProps, TextWidthMode};

/// Measured text box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
}

/// Default line height multiplier when a text node does not set one.
pub const DEFAULT_LINE_HEIGHT: f32 = 1.2;

pub trait TextMeasurer {
    /// Measure `text`. With `max_width`, lines wrap at word boundaries.
    /// Must be a pure function of its inputs.
    fn measure(&self, text: &TextProps, max_width: Option<f32>) -> TextMetrics;
}

/// Average-advance estimator: every glyph is `size × advance` wide, adjusted
/// for weight and italics, plus letter spacing.
#[derive(Debug, Clone, Copy)]
pub struct EstimatedMeasurer {
    /// Average glyph advance as a fraction of the font size.
    pub advance: f32,
}

impl Default for EstimatedMeasurer {
    fn default() -> Self {
        Self { advance: 0.55 }
    }
}

impl EstimatedMeasurer {
    fn glyph_width(&self, text: &TextProps) -> f32 {
        let weight = 1.0 + (f32::from(text.font.weight) - 400.0) / 4000.0;
        let slant = match text.font.style {
            FontStyle::Normal => 1.0,
            FontStyle::Italic => 1.02,
        };
        text.font.size * self.advance * weight * slant + text.letter_spacing
    }

    fn line_width(&self, line: &str, glyph: f32) -> f32 {
        line.chars().count() as f32 * glyph
    }

    /// Greedy word wrap of one hard line. Words longer than the box are kept
    /// whole on their own line.
    fn wrap_line<'a>(&self, line: &'a str, glyph: f32, max_width: f32) -> Vec<&'a str> {
        let mut lines = Vec::new();
        let mut start = 0usize;
        let mut end = 0usize;
        for (i, word) in split_words(line) {
            let candidate_end = i + word.len();
            if end > start && self.line_width(&line[start..candidate_end], glyph) > max_width {
                lines.push(line[start..end].trim_end());
                start = i;
            }
            end = candidate_end;
        }
        lines.push(line[start..].trim_end());
        lines
    }
}

impl TextMeasurer for EstimatedMeasurer {
    fn measure(&self, text: &TextProps, max_width: Option<f32>) -> TextMetrics {
        let glyph = self.glyph_width(text);
        let line_height = text.font.size * text.line_height.unwrap_or(DEFAULT_LINE_HEIGHT);

        let mut widest = 0.0f32;
        let mut count = 0usize;
        for hard in text.text.split('\n') {
            let lines = match max_width {
                Some(w) => self.wrap_line(hard, glyph, w),
                None => vec![hard],
            };
            for line in lines {
                widest = widest.max(self.line_width(line, glyph));
                count += 1;
            }
        }

        TextMetrics {
            width: match max_width {
                Some(w) => w,
                None => widest,
            },
            height: count.max(1) as f32 * line_height,
        }
    }
}

/// Words with their byte offsets; whitespace runs stay attached to the word
/// before them.
fn split_words(line: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offsets = Vec::new();
    let mut in_space = true;
    for (i, c) in line.char_indices() {
        if !c.is_whitespace() && in_space {
            offsets.push(i);
        }
        in_space = c.is_whitespace();
    }
    if offsets.is_empty() {
        offsets.push(0);
    }
    let ends: Vec<usize> = offsets.iter().skip(1).copied().chain([line.len()]).collect();
    offsets
        .into_iter()
        .zip(ends)
        .map(move |(s, e)| (s, &line[s..e]))
}

/// Bring a text node's width/height in line with its measured content.
/// Returns true when the box changed.
///
/// - `Auto` width mode: both dimensions follow the text, unless the width
///   fills its auto-layout parent, in which case the width is kept and the
///   text wraps to it.
/// - `Fixed`: width pinned, height follows the wrapped text.
/// - `FixedHeight`: nothing changes.
pub fn sync_text_size(node: &mut SceneNode, measurer: &dyn TextMeasurer) -> bool {
    let NodeKind::Text(props) = &node.kind else {
        return false;
    };

    let fills_width = node.sizing.width_mode == SizingMode::FillContainer;
    let (width, height) = match props.width_mode {
        TextWidthMode::FixedHeight => return false,
        TextWidthMode::Fixed => {
            let m = measurer.measure(props, Some(node.width));
            (node.width, m.height)
        }
        TextWidthMode::Auto if fills_width => {
            let m = measurer.measure(props, Some(node.width));
            (node.width, m.height)
        }
        TextWidthMode::Auto => {
            let m = measurer.measure(props, None);
            (m.width, m.height)
        }
    };

    let changed = node.width != width || node.height != height;
    node.width = width;
    node.height = height;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;

    #[test]
    fn auto_width_follows_text() {
        let m = EstimatedMeasurer::default();
        let short = m.measure(&TextProps::new("hi"), None);
        let long = m.measure(&TextProps::new("hello world"), None);
        assert!(long.width > short.width);
        assert_eq!(short.height, long.height);
    }

    #[test]
    fn hard_breaks_add_lines() {
        let m = EstimatedMeasurer::default();
        let one = m.measure(&TextProps::new("a"), None);
        let three = m.measure(&TextProps::new("a\nb\nc"), None);
        assert!((three.height - one.height * 3.0).abs() < 0.001);
    }

    #[test]
    fn wrapping_grows_height() {
        let m = EstimatedMeasurer::default();
        let props = TextProps::new("the quick brown fox jumps over the lazy dog");
        let free = m.measure(&props, None);
        let wrapped = m.measure(&props, Some(free.width / 3.0));
        assert!(wrapped.height > free.height);
        assert_eq!(wrapped.width, free.width / 3.0);
    }

    #[test]
    fn sync_is_idempotent() {
        let m = EstimatedMeasurer::default();
        let mut node = SceneNode::text(NodeId::intern("t_sync"), "Label");
        assert!(sync_text_size(&mut node, &m));
        let first = (node.width, node.height);
        assert!(!sync_text_size(&mut node, &m));
        assert_eq!((node.width, node.height), first);
    }

    #[test]
    fn fixed_mode_pins_width() {
        let m = EstimatedMeasurer::default();
        let mut node = SceneNode::text(NodeId::intern("t_fixed"), "a fairly long caption here");
        node.width = 40.0;
        if let NodeKind::Text(p) = &mut node.kind {
            p.width_mode = TextWidthMode::Fixed;
        }
        sync_text_size(&mut node, &m);
        assert_eq!(node.width, 40.0);
        assert!(node.height > 20.0);
    }
}
