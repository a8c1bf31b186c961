//! Bounds math and multi-node alignment.
//!
//! Everything here works on absolute `ResolvedBounds` taken from the layout
//! index, so positions derived by auto-layout are accounted for. The results
//! are per-node deltas; the store decides which nodes may actually move.

use crate::model::ResolvedBounds;
use kurbo::{Affine, Point, Rect};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    CenterHorizontal,
    Right,
    Top,
    CenterVertical,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Translation to apply to one node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Delta {
    pub dx: f32,
    pub dy: f32,
}

impl Delta {
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

pub type Deltas = SmallVec<[Delta; 8]>;

fn to_rect(b: &ResolvedBounds) -> Rect {
    Rect::new(
        b.x as f64,
        b.y as f64,
        (b.x + b.width) as f64,
        (b.y + b.height) as f64,
    )
}

fn from_rect(r: Rect) -> ResolvedBounds {
    ResolvedBounds::new(r.x0 as f32, r.y0 as f32, r.width() as f32, r.height() as f32)
}

/// Axis-aligned box around `bounds` rotated by `rotation` degrees
/// (clockwise) about its center.
pub fn rotated_aabb(bounds: ResolvedBounds, rotation: f32) -> ResolvedBounds {
    if rotation.rem_euclid(360.0) == 0.0 {
        return bounds;
    }
    let rect = to_rect(&bounds);
    let center: Point = rect.center();
    let affine = Affine::rotate_about((rotation as f64).to_radians(), center);
    from_rect(affine.transform_rect_bbox(rect))
}

/// Union of all rects, `None` for an empty slice.
pub fn selection_bounds(rects: &[ResolvedBounds]) -> Option<ResolvedBounds> {
    let (first, rest) = rects.split_first()?;
    Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
}

/// Align every rect to the edge or center of their union.
pub fn align_nodes(rects: &[ResolvedBounds], alignment: Alignment) -> Deltas {
    match selection_bounds(rects) {
        Some(target) => align_to(rects, target, alignment),
        None => Deltas::new(),
    }
}

/// Align every rect to the edge or center of `target`.
pub fn align_to(rects: &[ResolvedBounds], target: ResolvedBounds, alignment: Alignment) -> Deltas {
    rects
        .iter()
        .map(|r| match alignment {
            Alignment::Left => Delta {
                dx: target.x - r.x,
                dy: 0.0,
            },
            Alignment::CenterHorizontal => Delta {
                dx: target.center().0 - r.center().0,
                dy: 0.0,
            },
            Alignment::Right => Delta {
                dx: target.right() - r.right(),
                dy: 0.0,
            },
            Alignment::Top => Delta {
                dx: 0.0,
                dy: target.y - r.y,
            },
            Alignment::CenterVertical => Delta {
                dx: 0.0,
                dy: target.center().1 - r.center().1,
            },
            Alignment::Bottom => Delta {
                dx: 0.0,
                dy: target.bottom() - r.bottom(),
            },
        })
        .collect()
}

/// Spread rects so the gaps between neighbours are equal along `axis`.
/// The outermost two stay put. Fewer than three rects yields zero deltas.
/// Deltas come back in input order.
pub fn distribute_nodes(rects: &[ResolvedBounds], axis: Axis) -> Deltas {
    let mut deltas: Deltas = rects.iter().map(|_| Delta::default()).collect();
    if rects.len() < 3 {
        return deltas;
    }

    let start = |r: &ResolvedBounds| match axis {
        Axis::Horizontal => r.x,
        Axis::Vertical => r.y,
    };
    let extent = |r: &ResolvedBounds| match axis {
        Axis::Horizontal => r.width,
        Axis::Vertical => r.height,
    };

    let mut order: Vec<usize> = (0..rects.len()).collect();
    order.sort_by(|&a, &b| start(&rects[a]).total_cmp(&start(&rects[b])));

    let first = start(&rects[order[0]]);
    let last_end = order
        .iter()
        .map(|&i| start(&rects[i]) + extent(&rects[i]))
        .fold(f32::MIN, f32::max);
    let occupied: f32 = rects.iter().map(extent).sum();
    let gap = (last_end - first - occupied) / (rects.len() - 1) as f32;

    let mut cursor = first;
    for &i in &order {
        let shift = cursor - start(&rects[i]);
        deltas[i] = match axis {
            Axis::Horizontal => Delta { dx: shift, dy: 0.0 },
            Axis::Vertical => Delta { dx: 0.0, dy: shift },
        };
        cursor += extent(&rects[i]) + gap;
    }
    deltas
}
