//! SVG path data (`d` attribute) parsing.
//!
//! Built on `winnow` 0.7. Relative commands and the shorthand forms
//! (`H`, `V`, `S`, `T`) are normalized into absolute `PathCmd`s, so
//! consumers only ever see move/line/quad/cubic/close. Elliptical arcs are
//! flattened to a straight segment to their end point.

use crate::model::{NodeKind, PathCmd, ResolvedBounds, SceneNode};
use kurbo::{BezPath, Shape};
use winnow::ascii::multispace0;
use winnow::combinator::opt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// Parse SVG path data into absolute commands.
pub fn parse_path(input: &str) -> Result<Vec<PathCmd>, String> {
    let mut rest = input;
    let mut state = PenState::default();
    let mut out = Vec::new();

    separators(&mut rest);
    while !rest.is_empty() {
        let cmd = command_letter
            .parse_next(&mut rest)
            .map_err(|_| format!("expected path command at: {}", snippet(rest)))?;
        parse_segments(&mut rest, cmd, &mut state, &mut out)
            .map_err(|_| format!("bad arguments for '{cmd}' at: {}", snippet(rest)))?;
        separators(&mut rest);
    }
    Ok(out)
}

/// Bounding box of path data in local coordinates. `None` when the data is
/// empty or malformed.
pub fn path_bounds(input: &str) -> Option<ResolvedBounds> {
    let cmds = parse_path(input).ok()?;
    if cmds.is_empty() {
        return None;
    }
    let rect = to_bez_path(&cmds).bounding_box();
    Some(ResolvedBounds::new(
        rect.x0 as f32,
        rect.y0 as f32,
        rect.width() as f32,
        rect.height() as f32,
    ))
}

/// Size a path node to its geometry. Returns true if the size changed.
/// Unparseable geometry leaves the stored size alone.
pub fn sync_path_size(node: &mut SceneNode) -> bool {
    let NodeKind::Path { geometry, .. } = &node.kind else {
        return false;
    };
    let Some(bounds) = path_bounds(geometry) else {
        return false;
    };
    let changed = node.width != bounds.width || node.height != bounds.height;
    node.width = bounds.width;
    node.height = bounds.height;
    changed
}

pub fn to_bez_path(cmds: &[PathCmd]) -> BezPath {
    let mut bez = BezPath::new();
    for cmd in cmds {
        match *cmd {
            PathCmd::MoveTo(x, y) => bez.move_to((x as f64, y as f64)),
            PathCmd::LineTo(x, y) => bez.line_to((x as f64, y as f64)),
            PathCmd::QuadTo(cx, cy, ex, ey) => {
                bez.quad_to((cx as f64, cy as f64), (ex as f64, ey as f64))
            }
            PathCmd::CubicTo(c1x, c1y, c2x, c2y, ex, ey) => bez.curve_to(
                (c1x as f64, c1y as f64),
                (c2x as f64, c2y as f64),
                (ex as f64, ey as f64),
            ),
            PathCmd::Close => bez.close_path(),
        }
    }
    bez
}

fn snippet(rest: &str) -> &str {
    let end = rest.char_indices().nth(16).map_or(rest.len(), |(i, _)| i);
    &rest[..end]
}

/// Pen position plus the reflection points the shorthand curves need.
#[derive(Debug, Default)]
struct PenState {
    x: f32,
    y: f32,
    start_x: f32,
    start_y: f32,
    /// Second control point of the previous cubic.
    last_cubic: Option<(f32, f32)>,
    /// Control point of the previous quad.
    last_quad: Option<(f32, f32)>,
}

impl PenState {
    fn resolve(&self, relative: bool, x: f32, y: f32) -> (f32, f32) {
        if relative {
            (self.x + x, self.y + y)
        } else {
            (x, y)
        }
    }

    fn reflect(&self, point: Option<(f32, f32)>) -> (f32, f32) {
        match point {
            Some((px, py)) => (2.0 * self.x - px, 2.0 * self.y - py),
            None => (self.x, self.y),
        }
    }
}

fn separators(input: &mut &str) {
    let _: Result<&str, ErrMode<ContextError>> =
        take_while(0.., |c: char| c.is_whitespace() || c == ',').parse_next(input);
}

fn command_letter(input: &mut &str) -> ModalResult<char> {
    one_of([
        'M', 'm', 'L', 'l', 'H', 'h', 'V', 'v', 'C', 'c', 'S', 's', 'Q', 'q', 'T', 't', 'A', 'a',
        'Z', 'z',
    ])
    .parse_next(input)
}

fn parse_number(input: &mut &str) -> ModalResult<f32> {
    let _ = multispace0.parse_next(input)?;
    let start = *input;
    let _ = opt(one_of(['-', '+'])).parse_next(input)?;
    let int: &str = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let mut frac_len = 0;
    if input.starts_with('.') {
        *input = &input[1..];
        let frac: &str = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
        frac_len = frac.len();
    }
    if int.is_empty() && frac_len == 0 {
        *input = start;
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    if input.starts_with(['e', 'E']) {
        let checkpoint = *input;
        *input = &input[1..];
        let _ = opt(one_of(['-', '+'])).parse_next(input)?;
        let exp: &str = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
        if exp.is_empty() {
            *input = checkpoint;
        }
    }
    let matched = &start[..start.len() - input.len()];
    let value = matched
        .parse::<f32>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))?;
    separators(input);
    Ok(value)
}

/// Arc flags are single `0`/`1` digits and may be written without
/// separators (`a10 10 0 0110 10`).
fn parse_flag(input: &mut &str) -> ModalResult<bool> {
    let _ = multispace0.parse_next(input)?;
    let flag = one_of(['0', '1']).parse_next(input)?;
    separators(input);
    Ok(flag == '1')
}

fn numbers<const N: usize>(input: &mut &str) -> ModalResult<[f32; N]> {
    let mut out = [0.0; N];
    for slot in &mut out {
        *slot = parse_number(input)?;
    }
    Ok(out)
}

fn starts_number(input: &str) -> bool {
    input
        .trim_start()
        .starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

/// Parse the argument groups following `cmd`. Extra groups repeat the
/// command (an extra group after `M` is an implicit `L`).
fn parse_segments(
    input: &mut &str,
    cmd: char,
    pen: &mut PenState,
    out: &mut Vec<PathCmd>,
) -> ModalResult<()> {
    let relative = cmd.is_ascii_lowercase();
    let mut first = true;

    loop {
        if !first && !starts_number(input) {
            return Ok(());
        }
        let was_first = first;
        first = false;

        let mut cubic = None;
        let mut quad = None;

        match cmd.to_ascii_uppercase() {
            'Z' => {
                out.push(PathCmd::Close);
                pen.x = pen.start_x;
                pen.y = pen.start_y;
                pen.last_cubic = None;
                pen.last_quad = None;
                return Ok(());
            }
            'M' => {
                let [x, y] = numbers(input)?;
                let (x, y) = pen.resolve(relative, x, y);
                if was_first {
                    out.push(PathCmd::MoveTo(x, y));
                    pen.start_x = x;
                    pen.start_y = y;
                } else {
                    out.push(PathCmd::LineTo(x, y));
                }
                pen.x = x;
                pen.y = y;
            }
            'L' => {
                let [x, y] = numbers(input)?;
                let (x, y) = pen.resolve(relative, x, y);
                out.push(PathCmd::LineTo(x, y));
                pen.x = x;
                pen.y = y;
            }
            'H' => {
                let [x] = numbers(input)?;
                pen.x = if relative { pen.x + x } else { x };
                out.push(PathCmd::LineTo(pen.x, pen.y));
            }
            'V' => {
                let [y] = numbers(input)?;
                pen.y = if relative { pen.y + y } else { y };
                out.push(PathCmd::LineTo(pen.x, pen.y));
            }
            'C' => {
                let [x1, y1, x2, y2, x, y] = numbers(input)?;
                let (x1, y1) = pen.resolve(relative, x1, y1);
                let (x2, y2) = pen.resolve(relative, x2, y2);
                let (x, y) = pen.resolve(relative, x, y);
                out.push(PathCmd::CubicTo(x1, y1, x2, y2, x, y));
                cubic = Some((x2, y2));
                pen.x = x;
                pen.y = y;
            }
            'S' => {
                let [x2, y2, x, y] = numbers(input)?;
                let (x1, y1) = pen.reflect(pen.last_cubic);
                let (x2, y2) = pen.resolve(relative, x2, y2);
                let (x, y) = pen.resolve(relative, x, y);
                out.push(PathCmd::CubicTo(x1, y1, x2, y2, x, y));
                cubic = Some((x2, y2));
                pen.x = x;
                pen.y = y;
            }
            'Q' => {
                let [x1, y1, x, y] = numbers(input)?;
                let (x1, y1) = pen.resolve(relative, x1, y1);
                let (x, y) = pen.resolve(relative, x, y);
                out.push(PathCmd::QuadTo(x1, y1, x, y));
                quad = Some((x1, y1));
                pen.x = x;
                pen.y = y;
            }
            'T' => {
                let [x, y] = numbers(input)?;
                let (x1, y1) = pen.reflect(pen.last_quad);
                let (x, y) = pen.resolve(relative, x, y);
                out.push(PathCmd::QuadTo(x1, y1, x, y));
                quad = Some((x1, y1));
                pen.x = x;
                pen.y = y;
            }
            'A' => {
                let [_rx, _ry, _rotation] = numbers(input)?;
                let _large_arc = parse_flag(input)?;
                let _sweep = parse_flag(input)?;
                let [x, y] = numbers(input)?;
                let (x, y) = pen.resolve(relative, x, y);
                out.push(PathCmd::LineTo(x, y));
                pen.x = x;
                pen.y = y;
            }
            _ => return Err(ErrMode::Backtrack(ContextError::new())),
        }

        pen.last_cubic = cubic;
        pen.last_quad = quad;
    }
}
