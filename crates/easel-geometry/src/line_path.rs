//! Stroke outline construction for accurate thick-line rendering.
//!
//! A [`LinePath`] is a flattened planar path whose points carry a packed
//! stroke color. [`LinePath::stroked`] offsets it by half the stroke weight
//! on both sides, building caps and joins, and returns a new path whose
//! non-zero-winding fill is the stroked line.

use crate::style::{FillRule, LineCap, LineJoin};
use glam::Vec2;
use std::f32::consts::{PI, TAU};

const MERGE_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    MoveTo,
    LineTo,
    Close,
}

/// Path command yielded by [`LinePath::commands`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinePathCommand {
    MoveTo(Vec2, u32),
    LineTo(Vec2, u32),
    Close,
}

/// A flattened planar path carrying per-point stroke colors.
#[derive(Debug, Clone, Default)]
pub struct LinePath {
    verbs: Vec<Verb>,
    points: Vec<Vec2>,
    colors: Vec<u32>,
    winding: FillRule,
}

impl LinePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_winding(winding: FillRule) -> Self {
        Self {
            winding,
            ..Self::default()
        }
    }

    pub fn winding(&self) -> FillRule {
        self.winding
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Start a new subpath.
    pub fn move_to(&mut self, p: Vec2, color: u32) {
        self.verbs.push(Verb::MoveTo);
        self.points.push(p);
        self.colors.push(color);
    }

    /// Extend the current subpath with a straight segment.
    pub fn line_to(&mut self, p: Vec2, color: u32) {
        self.verbs.push(Verb::LineTo);
        self.points.push(p);
        self.colors.push(color);
    }

    /// Close the current subpath.
    pub fn close(&mut self) {
        self.verbs.push(Verb::Close);
    }

    /// Iterate the path's commands in order.
    pub fn commands(&self) -> impl Iterator<Item = LinePathCommand> + '_ {
        let mut point = 0usize;
        self.verbs.iter().map(move |verb| match verb {
            Verb::MoveTo => {
                let i = point;
                point += 1;
                LinePathCommand::MoveTo(self.points[i], self.colors[i])
            }
            Verb::LineTo => {
                let i = point;
                point += 1;
                LinePathCommand::LineTo(self.points[i], self.colors[i])
            }
            Verb::Close => LinePathCommand::Close,
        })
    }

    /// Expand the path into the fillable outline of its stroke.
    ///
    /// Zero-length segments are dropped before offsetting so degenerate
    /// input never produces NaN offsets; a subpath collapsing to a single
    /// point becomes a round or square dot (or nothing with butt caps).
    pub fn stroked(&self, weight: f32, cap: LineCap, join: LineJoin, miter_limit: f32) -> LinePath {
        let radius = weight.abs() / 2.0;
        let mut out = LinePath::with_winding(FillRule::NonZero);
        if radius <= 0.0 {
            return out;
        }

        for subpath in self.subpaths() {
            stroke_subpath(&mut out, &subpath, radius, cap, join, miter_limit.max(1.0));
        }
        out
    }

    fn subpaths(&self) -> Vec<SubPath> {
        let mut subpaths = Vec::new();
        let mut current: Option<SubPath> = None;
        let mut point = 0usize;

        for verb in &self.verbs {
            match verb {
                Verb::MoveTo => {
                    if let Some(subpath) = current.take() {
                        subpaths.push(subpath);
                    }
                    current = Some(SubPath {
                        points: vec![self.points[point]],
                        colors: vec![self.colors[point]],
                        closed: false,
                    });
                    point += 1;
                }
                Verb::LineTo => {
                    if let Some(subpath) = current.as_mut() {
                        subpath.points.push(self.points[point]);
                        subpath.colors.push(self.colors[point]);
                    }
                    point += 1;
                }
                Verb::Close => {
                    if let Some(mut subpath) = current.take() {
                        subpath.closed = true;
                        subpaths.push(subpath);
                    }
                }
            }
        }
        if let Some(subpath) = current.take() {
            subpaths.push(subpath);
        }
        subpaths
    }
}

struct SubPath {
    points: Vec<Vec2>,
    colors: Vec<u32>,
    closed: bool,
}

fn perp(d: Vec2) -> Vec2 {
    Vec2::new(-d.y, d.x)
}

/// Arc step count for a radius, matching the round-point accuracy scaling.
fn arc_steps(radius: f32, sweep: f32) -> usize {
    let per_circle = ((TAU * radius * 2.0 / 10.0).round() as i64).clamp(20, 200) as f32;
    ((sweep.abs() / (TAU / per_circle)).ceil() as usize).max(1)
}

fn stroke_subpath(
    out: &mut LinePath,
    subpath: &SubPath,
    radius: f32,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f32,
) {
    // Drop zero-length segments.
    let mut points: Vec<Vec2> = Vec::with_capacity(subpath.points.len());
    let mut colors: Vec<u32> = Vec::with_capacity(subpath.colors.len());
    for (&p, &c) in subpath.points.iter().zip(&subpath.colors) {
        if points
            .last()
            .is_none_or(|last: &Vec2| last.distance_squared(p) > MERGE_EPSILON)
        {
            points.push(p);
            colors.push(c);
        }
    }
    if subpath.closed
        && points.len() > 1
        && points[0].distance_squared(*points.last().unwrap()) <= MERGE_EPSILON
    {
        points.pop();
        colors.pop();
    }

    match points.len() {
        0 => {}
        1 => emit_dot(out, points[0], colors[0], radius, cap),
        _ if subpath.closed => {
            // One offset contour per side; the reversed walk flips the
            // second contour's orientation so non-zero winding leaves the
            // line interior unfilled.
            closed_offset_contour(out, &points, &colors, radius, join, miter_limit);
            let rev_points: Vec<Vec2> = points.iter().rev().copied().collect();
            let rev_colors: Vec<u32> = colors.iter().rev().copied().collect();
            closed_offset_contour(out, &rev_points, &rev_colors, radius, join, miter_limit);
        }
        _ => open_offset_contour(out, &points, &colors, radius, cap, join, miter_limit),
    }
}

fn emit_dot(out: &mut LinePath, p: Vec2, color: u32, radius: f32, cap: LineCap) {
    match cap {
        LineCap::Butt => {}
        LineCap::Square => {
            out.move_to(p + Vec2::new(-radius, -radius), color);
            out.line_to(p + Vec2::new(radius, -radius), color);
            out.line_to(p + Vec2::new(radius, radius), color);
            out.line_to(p + Vec2::new(-radius, radius), color);
            out.close();
        }
        LineCap::Round => {
            let steps = arc_steps(radius, TAU);
            out.move_to(p + Vec2::new(radius, 0.0), color);
            for k in 1..steps {
                let theta = TAU * k as f32 / steps as f32;
                out.line_to(p + Vec2::new(theta.cos(), theta.sin()) * radius, color);
            }
            out.close();
        }
    }
}

fn open_offset_contour(
    out: &mut LinePath,
    points: &[Vec2],
    colors: &[u32],
    radius: f32,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f32,
) {
    let n = points.len();
    let dirs: Vec<Vec2> = (0..n - 1)
        .map(|i| (points[i + 1] - points[i]).normalize())
        .collect();
    let offs: Vec<Vec2> = dirs.iter().map(|&d| perp(d) * radius).collect();

    // Forward along the left side.
    out.move_to(points[0] + offs[0], colors[0]);
    for j in 1..n - 1 {
        emit_join(
            out, points[j], colors[j], radius, offs[j - 1], offs[j], dirs[j - 1], dirs[j], join,
            miter_limit,
        );
    }
    out.line_to(points[n - 1] + offs[n - 2], colors[n - 1]);

    // End cap.
    emit_cap(
        out,
        points[n - 1],
        colors[n - 1],
        radius,
        offs[n - 2],
        dirs[n - 2],
        cap,
        true,
    );

    // Backward along the right side.
    for j in (1..n - 1).rev() {
        emit_join(
            out, points[j], colors[j], radius, -offs[j], -offs[j - 1], -dirs[j], -dirs[j - 1],
            join, miter_limit,
        );
    }
    out.line_to(points[0] - offs[0], colors[0]);

    // Start cap; the close below supplies the segment back to the first
    // outline point.
    emit_cap(out, points[0], colors[0], radius, -offs[0], -dirs[0], cap, false);
    out.close();
}

fn closed_offset_contour(
    out: &mut LinePath,
    points: &[Vec2],
    colors: &[u32],
    radius: f32,
    join: LineJoin,
    miter_limit: f32,
) {
    let n = points.len();
    let dirs: Vec<Vec2> = (0..n)
        .map(|i| (points[(i + 1) % n] - points[i]).normalize())
        .collect();
    let offs: Vec<Vec2> = dirs.iter().map(|&d| perp(d) * radius).collect();

    out.move_to(points[0] + offs[0], colors[0]);
    for j in 1..n {
        emit_join(
            out, points[j], colors[j], radius, offs[j - 1], offs[j], dirs[j - 1], dirs[j], join,
            miter_limit,
        );
    }
    // Seam join back at the first vertex.
    emit_join(
        out, points[0], colors[0], radius, offs[n - 1], offs[0], dirs[n - 1], dirs[0], join,
        miter_limit,
    );
    out.close();
}

/// Join construction at `v` between two adjacent offset segments.
///
/// `n0`/`n1` are the walk-local offset vectors and `d0`/`d1` the walk-local
/// segment directions. The join is geometric only on the outer side of the
/// turn; the inner side connects straight and the resulting self-overlap is
/// resolved by the non-zero fill.
#[allow(clippy::too_many_arguments)]
fn emit_join(
    out: &mut LinePath,
    v: Vec2,
    color: u32,
    radius: f32,
    n0: Vec2,
    n1: Vec2,
    d0: Vec2,
    d1: Vec2,
    join: LineJoin,
    miter_limit: f32,
) {
    let from = v + n0;
    let to = v + n1;
    out.line_to(from, color);

    let cross = d0.perp_dot(d1);
    let outer = cross < -1e-6;
    if outer {
        match join {
            LineJoin::Bevel => {}
            LineJoin::Miter => {
                let m = n0 + n1;
                let len = m.length();
                if len > 1e-6 {
                    let m_unit = m / len;
                    let cos_half = m_unit.dot(n0 / radius);
                    if cos_half > 1e-6 && 1.0 / cos_half <= miter_limit {
                        out.line_to(v + m_unit * (radius / cos_half), color);
                    }
                }
            }
            LineJoin::Round => {
                let theta0 = n0.y.atan2(n0.x);
                let theta1 = n1.y.atan2(n1.x);
                let mut delta = theta1 - theta0;
                while delta > PI {
                    delta -= TAU;
                }
                while delta < -PI {
                    delta += TAU;
                }
                let steps = arc_steps(radius, delta);
                for k in 1..steps {
                    let theta = theta0 + delta * k as f32 / steps as f32;
                    out.line_to(v + Vec2::new(theta.cos(), theta.sin()) * radius, color);
                }
            }
        }
    }
    out.line_to(to, color);
}

/// Cap construction at endpoint `p`, from offset `n` around outward
/// direction `d` to the opposite offset.
///
/// `land` emits the opposite offset point itself; the start cap passes
/// `false` because closing the outline supplies that point.
#[allow(clippy::too_many_arguments)]
fn emit_cap(
    out: &mut LinePath,
    p: Vec2,
    color: u32,
    radius: f32,
    n: Vec2,
    d: Vec2,
    cap: LineCap,
    land: bool,
) {
    match cap {
        LineCap::Butt => {}
        LineCap::Square => {
            out.line_to(p + n + d * radius, color);
            out.line_to(p - n + d * radius, color);
        }
        LineCap::Round => {
            let theta0 = n.y.atan2(n.x);
            let sign = if n.perp_dot(d) > 0.0 { 1.0 } else { -1.0 };
            let steps = arc_steps(radius, PI);
            for k in 1..steps {
                let theta = theta0 + sign * PI * k as f32 / steps as f32;
                out.line_to(p + Vec2::new(theta.cos(), theta.sin()) * radius, color);
            }
        }
    }
    if land {
        out.line_to(p - n, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_points(path: &LinePath) -> Vec<Vec2> {
        path.commands()
            .filter_map(|cmd| match cmd {
                LinePathCommand::MoveTo(p, _) | LinePathCommand::LineTo(p, _) => Some(p),
                LinePathCommand::Close => None,
            })
            .collect()
    }

    #[test]
    fn test_butt_stroke_of_segment_is_quad() {
        let mut path = LinePath::new();
        path.move_to(Vec2::ZERO, 0);
        path.line_to(Vec2::new(10.0, 0.0), 0);

        let outline = path.stroked(2.0, LineCap::Butt, LineJoin::Miter, 4.0);
        let points = command_points(&outline);
        assert_eq!(points.len(), 4);
        assert!(points.contains(&Vec2::new(0.0, 1.0)));
        assert!(points.contains(&Vec2::new(10.0, 1.0)));
        assert!(points.contains(&Vec2::new(10.0, -1.0)));
        assert!(points.contains(&Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn test_square_cap_extends_outline() {
        let mut path = LinePath::new();
        path.move_to(Vec2::ZERO, 0);
        path.line_to(Vec2::new(10.0, 0.0), 0);

        let outline = path.stroked(2.0, LineCap::Square, LineJoin::Miter, 4.0);
        let max_x = command_points(&outline)
            .iter()
            .map(|p| p.x)
            .fold(f32::MIN, f32::max);
        assert!((max_x - 11.0).abs() < 1e-5);
    }

    #[test]
    fn test_miter_join_produces_sharp_corner() {
        let mut path = LinePath::new();
        path.move_to(Vec2::ZERO, 0);
        path.line_to(Vec2::new(10.0, 0.0), 0);
        path.line_to(Vec2::new(10.0, 10.0), 0);

        let outline = path.stroked(2.0, LineCap::Butt, LineJoin::Miter, 4.0);
        // The outer miter tip sits at the offset-line intersection.
        assert!(
            command_points(&outline)
                .iter()
                .any(|p| (*p - Vec2::new(11.0, -1.0)).length() < 1e-4)
        );
    }

    #[test]
    fn test_miter_limit_falls_back_to_bevel() {
        let mut path = LinePath::new();
        path.move_to(Vec2::ZERO, 0);
        path.line_to(Vec2::new(10.0, 0.0), 0);
        // Nearly reversing direction makes the miter arbitrarily long.
        path.line_to(Vec2::new(0.1, 0.5), 0);

        let outline = path.stroked(2.0, LineCap::Butt, LineJoin::Miter, 4.0);
        let limit = 4.0 * 1.0 + 10.0;
        for p in command_points(&outline) {
            assert!(p.length() < limit + 10.0);
        }
    }

    #[test]
    fn test_zero_length_segments_skipped() {
        let mut path = LinePath::new();
        path.move_to(Vec2::ZERO, 0);
        path.line_to(Vec2::ZERO, 0);
        path.line_to(Vec2::new(10.0, 0.0), 0);

        let outline = path.stroked(2.0, LineCap::Butt, LineJoin::Miter, 4.0);
        for p in command_points(&outline) {
            assert!(p.x.is_finite() && p.y.is_finite());
        }
        assert_eq!(command_points(&outline).len(), 4);
    }

    #[test]
    fn test_closed_path_yields_two_contours() {
        let mut path = LinePath::new();
        path.move_to(Vec2::ZERO, 0);
        path.line_to(Vec2::new(10.0, 0.0), 0);
        path.line_to(Vec2::new(10.0, 10.0), 0);
        path.line_to(Vec2::new(0.0, 10.0), 0);
        path.close();

        let outline = path.stroked(2.0, LineCap::Butt, LineJoin::Bevel, 4.0);
        let closes = outline
            .commands()
            .filter(|cmd| matches!(cmd, LinePathCommand::Close))
            .count();
        assert_eq!(closes, 2);
    }

    #[test]
    fn test_single_point_round_dot() {
        let mut path = LinePath::new();
        path.move_to(Vec2::new(5.0, 5.0), 0);

        let outline = path.stroked(4.0, LineCap::Round, LineJoin::Miter, 4.0);
        assert!(!outline.is_empty());
        for p in command_points(&outline) {
            assert!(((p - Vec2::new(5.0, 5.0)).length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_colors_carried_per_point() {
        let mut path = LinePath::new();
        path.move_to(Vec2::ZERO, 0xAA);
        path.line_to(Vec2::new(10.0, 0.0), 0xBB);

        let outline = path.stroked(2.0, LineCap::Butt, LineJoin::Miter, 4.0);
        let colors: Vec<u32> = outline
            .commands()
            .filter_map(|cmd| match cmd {
                LinePathCommand::MoveTo(_, c) | LinePathCommand::LineTo(_, c) => Some(c),
                LinePathCommand::Close => None,
            })
            .collect();
        assert!(colors.contains(&0xAA));
        assert!(colors.contains(&0xBB));
    }
}
