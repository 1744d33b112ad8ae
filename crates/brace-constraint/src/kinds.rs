//! Closed-form solve and residual formulas for each constraint kind.
//!
//! Every solve returns `None` when the configuration is degenerate (a
//! near-zero denominator or coincident points); the caller then leaves the
//! dependent variable unchanged.

use std::f64::consts::SQRT_2;

use brace_core::{Epsilon, Point, Value, VarKind};
use glam::DVec3;

const P: VarKind = VarKind::Point;
const S: VarKind = VarKind::Scalar;

/// The geometric relation a constraint expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintKind {
    /// `(A, B, D)`: D = |A - B|
    Distance,
    /// `(X, Y, R)`: R = X / Y
    Ratio,
    /// `(Leg, Hyp)`: Hyp = Leg * sqrt(2)
    Pythagorean,
    /// `(A, B, H)`: H = sqrt(A^2 + B^2)
    Hypotenuse,
    /// `(P0, P1, P2, P3)`: the quad P0-P1-P2-P3 is a planar rectangle with
    /// its right angle checked at P0
    Plane,
    /// `(L, R, S)`: S lies on the segment from L to R
    Segment,
    /// `(E1, E2, M)`: M is the midpoint of E1 and E2
    Midpoint,
    /// `(A, B, P)`: P lies on the infinite line through A and B
    Line,
}

impl ConstraintKind {
    /// The variable kind each slot expects.
    pub fn slots(self) -> &'static [VarKind] {
        match self {
            ConstraintKind::Distance => &[P, P, S],
            ConstraintKind::Ratio => &[S, S, S],
            ConstraintKind::Pythagorean => &[S, S],
            ConstraintKind::Hypotenuse => &[S, S, S],
            ConstraintKind::Plane => &[P, P, P, P],
            ConstraintKind::Segment => &[P, P, P],
            ConstraintKind::Midpoint => &[P, P, P],
            ConstraintKind::Line => &[P, P, P],
        }
    }

    pub fn arity(self) -> usize {
        self.slots().len()
    }

    /// Compute a new value for slot `target` from the other slots.
    pub fn solve(self, target: usize, values: &[Value], eps: Epsilon) -> Option<Value> {
        debug_assert_eq!(values.len(), self.arity());
        let solved = match self {
            ConstraintKind::Distance => solve_distance(target, values, eps),
            ConstraintKind::Ratio => solve_ratio(target, values, eps),
            ConstraintKind::Pythagorean => solve_pythagorean(target, values),
            ConstraintKind::Hypotenuse => solve_hypotenuse(target, values, eps),
            ConstraintKind::Plane => solve_plane(target, values, eps),
            ConstraintKind::Segment => solve_segment(target, values, eps),
            ConstraintKind::Midpoint => solve_midpoint(target, values),
            ConstraintKind::Line => solve_line(target, values, eps),
        };
        solved.filter(Value::is_finite)
    }

    /// How far the current values are from satisfying the relation.
    pub fn residual(self, values: &[Value]) -> f64 {
        debug_assert_eq!(values.len(), self.arity());
        match self {
            ConstraintKind::Distance => {
                (pt(values, 0).distance(pt(values, 1)) - sc(values, 2)).abs()
            }
            ConstraintKind::Ratio => (sc(values, 0) - sc(values, 2) * sc(values, 1)).abs(),
            ConstraintKind::Pythagorean => (sc(values, 1) - sc(values, 0) * SQRT_2).abs(),
            ConstraintKind::Hypotenuse => {
                (sc(values, 0).hypot(sc(values, 1)) - sc(values, 2)).abs()
            }
            ConstraintKind::Plane => {
                let [p0, p1, p2, p3] = [0, 1, 2, 3].map(|slot| pt(values, slot));
                (p0 + p2 - p1 - p3).length() + skew(p1 - p0, p3 - p0)
            }
            ConstraintKind::Segment => {
                let (l, r, s) = (pt(values, 0), pt(values, 1), pt(values, 2));
                s.distance(closest_on_segment(l, r, s))
            }
            ConstraintKind::Midpoint => {
                let mid = (pt(values, 0) + pt(values, 1)) * 0.5;
                pt(values, 2).distance(mid)
            }
            ConstraintKind::Line => {
                let (a, b, p) = (pt(values, 0), pt(values, 1), pt(values, 2));
                p.distance(project_on_line(a, b - a, p).unwrap_or(a))
            }
        }
    }
}

// Slot kinds are validated when the graph is built, so the fallbacks below
// are never taken for a well-formed constraint.
fn pt(values: &[Value], slot: usize) -> Point {
    values[slot].as_point().unwrap_or(DVec3::ZERO)
}

fn sc(values: &[Value], slot: usize) -> f64 {
    values[slot].as_scalar().unwrap_or(0.0)
}

/// Place `moving` at `distance` from `anchor`, keeping its current direction.
fn along(anchor: Point, moving: Point, distance: f64, eps: Epsilon) -> Option<Value> {
    let dir = moving - anchor;
    let len = dir.length();
    if eps.is_zero(len) {
        return None;
    }
    Some(Value::Point(anchor + dir / len * distance))
}

fn solve_distance(target: usize, values: &[Value], eps: Epsilon) -> Option<Value> {
    let (a, b, d) = (pt(values, 0), pt(values, 1), sc(values, 2));
    match target {
        0 => along(b, a, d, eps),
        1 => along(a, b, d, eps),
        _ => Some(Value::Scalar(a.distance(b))),
    }
}

fn solve_ratio(target: usize, values: &[Value], eps: Epsilon) -> Option<Value> {
    let (x, y, r) = (sc(values, 0), sc(values, 1), sc(values, 2));
    match target {
        0 => Some(Value::Scalar(r * y)),
        1 if eps.is_zero(r) => None,
        1 => Some(Value::Scalar(x / r)),
        _ if eps.is_zero(y) => None,
        _ => Some(Value::Scalar(x / y)),
    }
}

fn solve_pythagorean(target: usize, values: &[Value]) -> Option<Value> {
    let (leg, hyp) = (sc(values, 0), sc(values, 1));
    match target {
        0 => Some(Value::Scalar(hyp / SQRT_2)),
        _ => Some(Value::Scalar(leg * SQRT_2)),
    }
}

fn solve_hypotenuse(target: usize, values: &[Value], eps: Epsilon) -> Option<Value> {
    let (a, b, h) = (sc(values, 0), sc(values, 1), sc(values, 2));
    let leg = |h: f64, other: f64| {
        // A leg can only be solved while the hypotenuse is the longest side.
        if h.abs() + eps.value() < other.abs() {
            return None;
        }
        Some(Value::Scalar((h * h - other * other).max(0.0).sqrt()))
    };
    match target {
        0 => leg(h, b),
        1 => leg(h, a),
        _ => Some(Value::Scalar(a.hypot(b))),
    }
}

/// How far the shorter of two edges leans along the longer one. Zero for
/// perpendicular edges.
fn skew(u: DVec3, v: DVec3) -> f64 {
    let longest = u.length().max(v.length());
    if longest == 0.0 {
        return 0.0;
    }
    u.dot(v).abs() / longest
}

/// Close the parallelogram through `target`. The right angle is not
/// restored here: it holds as long as the driving edges only move along
/// their own directions, and a skewed quad shows up in the residual.
fn solve_plane(target: usize, values: &[Value], eps: Epsilon) -> Option<Value> {
    let prev = pt(values, (target + 3) % 4);
    let next = pt(values, (target + 1) % 4);
    let opposite = pt(values, (target + 2) % 4);

    let u = prev - opposite;
    let v = next - opposite;
    let (lu, lv) = (u.length(), v.length());
    if eps.is_zero(lu) || eps.is_zero(lv) {
        return None;
    }
    // Collinear edges span no plane.
    if eps.is_zero(u.cross(v).length() / lu.max(lv)) {
        return None;
    }
    Some(Value::Point(opposite + u + v))
}

/// Closest point to `s` on the segment from `l` to `r`.
pub fn closest_on_segment(l: Point, r: Point, s: Point) -> Point {
    let axis = r - l;
    let len2 = axis.length_squared();
    if len2 == 0.0 {
        return l;
    }
    let t = ((s - l).dot(axis) / len2).clamp(0.0, 1.0);
    l + axis * t
}

/// Move the end `moving` outward from `fixed` until the slider's projection
/// falls on the segment again.
fn extend_rail(fixed: Point, moving: Point, slider: Point, eps: Epsilon) -> Option<Value> {
    let axis = moving - fixed;
    let len = axis.length();
    if eps.is_zero(len) {
        return None;
    }
    let dir = axis / len;
    let reach = (slider - fixed).dot(dir);
    if reach < -eps.value() {
        // The slider sits behind the fixed end; moving this end cannot help.
        return None;
    }
    if reach <= len {
        return Some(Value::Point(moving));
    }
    Some(Value::Point(fixed + dir * reach))
}

fn solve_segment(target: usize, values: &[Value], eps: Epsilon) -> Option<Value> {
    let (l, r, s) = (pt(values, 0), pt(values, 1), pt(values, 2));
    match target {
        0 => extend_rail(r, l, s, eps),
        1 => extend_rail(l, r, s, eps),
        _ => {
            if eps.coincident(l, r) {
                return None;
            }
            Some(Value::Point(closest_on_segment(l, r, s)))
        }
    }
}

fn solve_midpoint(target: usize, values: &[Value]) -> Option<Value> {
    let (e1, e2, m) = (pt(values, 0), pt(values, 1), pt(values, 2));
    match target {
        0 => Some(Value::Point(m * 2.0 - e2)),
        1 => Some(Value::Point(m * 2.0 - e1)),
        _ => Some(Value::Point((e1 + e2) * 0.5)),
    }
}

fn project_on_line(origin: Point, dir: DVec3, p: Point) -> Option<Point> {
    let len2 = dir.length_squared();
    if len2 == 0.0 {
        return None;
    }
    Some(origin + dir * ((p - origin).dot(dir) / len2))
}

fn solve_line(target: usize, values: &[Value], eps: Epsilon) -> Option<Value> {
    let (a, b, p) = (pt(values, 0), pt(values, 1), pt(values, 2));
    let (origin, through, moving) = match target {
        0 => (b, p, a),
        1 => (a, p, b),
        _ => (a, b, p),
    };
    if eps.coincident(origin, through) {
        return None;
    }
    project_on_line(origin, through - origin, moving).map(Value::Point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eps() -> Epsilon {
        Epsilon::default()
    }

    fn p(x: f64, y: f64, z: f64) -> Value {
        Value::Point(DVec3::new(x, y, z))
    }

    fn s(v: f64) -> Value {
        Value::Scalar(v)
    }

    fn assert_point(value: Option<Value>, expected: DVec3) {
        let got = value.and_then(|v| v.as_point()).expect("expected a point");
        assert!(
            got.distance(expected) < 1e-9,
            "expected {:?}, got {:?}",
            expected,
            got
        );
    }

    fn assert_scalar(value: Option<Value>, expected: f64) {
        let got = value.and_then(|v| v.as_scalar()).expect("expected a scalar");
        assert!((got - expected).abs() < 1e-9, "expected {}, got {}", expected, got);
    }

    #[test]
    fn test_slot_signatures() {
        assert_eq!(ConstraintKind::Distance.arity(), 3);
        assert_eq!(ConstraintKind::Pythagorean.arity(), 2);
        assert_eq!(ConstraintKind::Plane.arity(), 4);
        assert_eq!(ConstraintKind::Ratio.slots(), &[S, S, S]);
    }

    #[test]
    fn test_distance_solves_each_slot() {
        let values = [p(0.0, 0.0, 0.0), p(3.0, 4.0, 0.0), s(10.0)];
        let k = ConstraintKind::Distance;
        assert_scalar(k.solve(2, &values, eps()), 5.0);
        assert_point(k.solve(1, &values, eps()), DVec3::new(6.0, 8.0, 0.0));
        assert_point(k.solve(0, &values, eps()), DVec3::new(-3.0, -4.0, 0.0));
    }

    #[test]
    fn test_distance_coincident_points_are_degenerate() {
        let values = [p(1.0, 1.0, 1.0), p(1.0, 1.0, 1.0), s(2.0)];
        assert!(ConstraintKind::Distance.solve(0, &values, eps()).is_none());
        assert!(ConstraintKind::Distance.solve(1, &values, eps()).is_none());
        assert_scalar(ConstraintKind::Distance.solve(2, &values, eps()), 0.0);
    }

    #[test]
    fn test_ratio() {
        let k = ConstraintKind::Ratio;
        let values = [s(3.0), s(12.0), s(0.5)];
        assert_scalar(k.solve(2, &values, eps()), 0.25);
        assert_scalar(k.solve(0, &values, eps()), 6.0);
        assert_scalar(k.solve(1, &values, eps()), 6.0);
        assert!(k.residual(&[s(3.0), s(12.0), s(0.25)]) < 1e-12);
    }

    #[test]
    fn test_ratio_zero_denominator_is_degenerate() {
        let k = ConstraintKind::Ratio;
        assert!(k.solve(2, &[s(3.0), s(0.0), s(0.5)], eps()).is_none());
        assert!(k.solve(1, &[s(3.0), s(1.0), s(0.0)], eps()).is_none());
    }

    #[test]
    fn test_pythagorean() {
        let k = ConstraintKind::Pythagorean;
        assert_scalar(k.solve(1, &[s(2.0), s(0.0)], eps()), 2.0 * SQRT_2);
        assert_scalar(k.solve(0, &[s(0.0), s(SQRT_2)], eps()), 1.0);
    }

    #[test]
    fn test_hypotenuse() {
        let k = ConstraintKind::Hypotenuse;
        assert_scalar(k.solve(2, &[s(3.0), s(4.0), s(0.0)], eps()), 5.0);
        assert_scalar(k.solve(0, &[s(0.0), s(4.0), s(5.0)], eps()), 3.0);
        assert_scalar(k.solve(1, &[s(3.0), s(0.0), s(5.0)], eps()), 4.0);
        assert!(k.solve(0, &[s(0.0), s(6.0), s(5.0)], eps()).is_none());
    }

    #[test]
    fn test_plane_completes_rectangle() {
        let k = ConstraintKind::Plane;
        let values = [
            p(0.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(9.0, 9.0, 9.0),
            p(0.0, 1.0, 0.0),
        ];
        assert_point(k.solve(2, &values, eps()), DVec3::new(2.0, 1.0, 0.0));

        let rect = [
            p(0.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(2.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        assert!(k.residual(&rect) < 1e-12);
        for slot in 0..4 {
            let expected = rect[slot].as_point().unwrap();
            assert_point(k.solve(slot, &rect, eps()), expected);
        }
    }

    #[test]
    fn test_plane_residual_reports_skew() {
        let k = ConstraintKind::Plane;
        // P1 pushed off the edge, P2 closed as a parallelogram.
        let mut values = [
            p(0.0, 0.0, 0.0),
            p(2.0, 0.5, 0.0),
            p(9.0, 9.0, 9.0),
            p(0.0, 1.0, 0.0),
        ];
        values[2] = k.solve(2, &values, eps()).unwrap();
        assert_point(Some(values[2]), DVec3::new(2.0, 1.5, 0.0));

        // (P1 - P0) . (P3 - P0) = 0.5 over the longer edge of sqrt(4.25).
        let expected = 0.5 / 4.25f64.sqrt();
        assert!((k.residual(&values) - expected).abs() < 1e-12);
        assert!(k.residual(&values) > eps().value());
    }

    #[test]
    fn test_plane_collinear_is_degenerate() {
        let values = [
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 0.0, 0.0),
            p(3.0, 0.0, 0.0),
        ];
        assert!(ConstraintKind::Plane.solve(0, &values, eps()).is_none());
    }

    #[test]
    fn test_segment_projects_and_clamps() {
        let k = ConstraintKind::Segment;
        let l = p(0.0, 0.0, 0.0);
        let r = p(10.0, 0.0, 0.0);
        assert_point(k.solve(2, &[l, r, p(4.0, 3.0, 0.0)], eps()), DVec3::new(4.0, 0.0, 0.0));
        assert_point(k.solve(2, &[l, r, p(15.0, 1.0, 0.0)], eps()), DVec3::new(10.0, 0.0, 0.0));
        assert!(k.solve(2, &[l, l, p(1.0, 0.0, 0.0)], eps()).is_none());
    }

    #[test]
    fn test_segment_extends_end_to_reach_slider() {
        let k = ConstraintKind::Segment;
        let l = p(0.0, 0.0, 0.0);
        let r = p(10.0, 0.0, 0.0);
        assert_point(k.solve(1, &[l, r, p(12.0, 0.0, 0.0)], eps()), DVec3::new(12.0, 0.0, 0.0));
        assert_point(k.solve(1, &[l, r, p(5.0, 0.0, 0.0)], eps()), DVec3::new(10.0, 0.0, 0.0));
        assert!(k.solve(1, &[l, r, p(-5.0, 0.0, 0.0)], eps()).is_none());
    }

    #[test]
    fn test_midpoint() {
        let k = ConstraintKind::Midpoint;
        let values = [p(0.0, 0.0, 0.0), p(4.0, 2.0, 0.0), p(1.0, 1.0, 1.0)];
        assert_point(k.solve(2, &values, eps()), DVec3::new(2.0, 1.0, 0.0));
        assert_point(k.solve(0, &values, eps()), DVec3::new(-2.0, 0.0, 2.0));
        assert_point(k.solve(1, &values, eps()), DVec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_line() {
        let k = ConstraintKind::Line;
        let values = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(5.0, 2.0, 0.0)];
        assert_point(k.solve(2, &values, eps()), DVec3::new(5.0, 0.0, 0.0));
        assert!((k.residual(&values) - 2.0).abs() < 1e-12);

        // Re-aim the line through P, pivoting on A.
        let values = [p(0.0, 0.0, 0.0), p(2.0, 2.0, 0.0), p(4.0, 0.0, 0.0)];
        assert_point(k.solve(1, &values, eps()), DVec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_non_finite_is_degenerate() {
        let values = [s(f64::INFINITY), s(1.0)];
        assert!(ConstraintKind::Pythagorean.solve(1, &values, eps()).is_none());
    }
}
