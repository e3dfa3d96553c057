//! 2D predicates in UV space.
//!
//! Segment intersection and point-in-polygon tests with a fixed absolute
//! tolerance. Nothing here knows about meshes; points are plain
//! `Point2<f64>` and polygons are slices of them in winding order.

use nalgebra::Point2;

/// Absolute tolerance for UV comparisons.
pub const EPSILON: f64 = 1e-6;

/// Whether two scalars differ by less than [`EPSILON`].
#[inline]
pub fn almost_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Component-wise [`almost_equal`].
#[inline]
pub fn almost_equal_points(a: &Point2<f64>, b: &Point2<f64>) -> bool {
    almost_equal(a.x, b.x) && almost_equal(a.y, b.y)
}

/// Exact sign: -1, 0 or 1.
#[inline]
pub fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Sign that treats values within [`EPSILON`] of zero as zero.
#[inline]
pub fn tolerant_sign(v: f64) -> i8 {
    if almost_equal(v, 0.0) {
        0
    } else {
        sign(v)
    }
}

/// Orientation of the ordered triplet (p, q, r).
///
/// 1 is clockwise, -1 counterclockwise, 0 collinear.
#[inline]
fn orientation(p: &Point2<f64>, q: &Point2<f64>, r: &Point2<f64>) -> i8 {
    tolerant_sign((q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y))
}

/// For collinear p, q, r: whether q lies on segment pr (inclusive, tolerant).
#[inline]
fn on_segment(p: &Point2<f64>, q: &Point2<f64>, r: &Point2<f64>) -> bool {
    let le = |a: f64, b: f64| a < b || almost_equal(a, b);
    le(q.x, p.x.max(r.x)) && le(p.x.min(r.x), q.x) && le(q.y, p.y.max(r.y)) && le(p.y.min(r.y), q.y)
}

/// Whether segments p1q1 and p2q2 intersect, touching included.
pub fn segments_intersect(
    p1: &Point2<f64>,
    q1: &Point2<f64>,
    p2: &Point2<f64>,
    q2: &Point2<f64>,
) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, q2, q1))
        || (o3 == 0 && on_segment(p2, p1, q2))
        || (o4 == 0 && on_segment(p2, q1, q2))
}

/// Implicit line `a*x + b*y = c` through two points.
#[inline]
fn line_parameters(p: &Point2<f64>, q: &Point2<f64>) -> (f64, f64, f64) {
    let a = q.y - p.y;
    let b = p.x - q.x;
    (a, b, a * p.x + b * p.y)
}

/// Intersection point of the lines through p1q1 and p2q2.
///
/// Returns `None` when the lines are parallel (determinant within tolerance
/// of zero).
pub fn segments_intersection_point(
    p1: &Point2<f64>,
    q1: &Point2<f64>,
    p2: &Point2<f64>,
    q2: &Point2<f64>,
) -> Option<Point2<f64>> {
    let (a1, b1, c1) = line_parameters(p1, q1);
    let (a2, b2, c2) = line_parameters(p2, q2);
    let det = a1 * b2 - a2 * b1;
    if almost_equal(det, 0.0) {
        return None;
    }
    Some(Point2::new(
        (b2 * c1 - b1 * c2) / det,
        (a1 * c2 - a2 * c1) / det,
    ))
}

/// Signed area test: >0 if `p2` is left of the line p0→p1, <0 if right, 0 on it.
#[inline]
pub fn is_left(p0: &Point2<f64>, p1: &Point2<f64>, p2: &Point2<f64>) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

/// Winding number of `polygon` around `point`.
///
/// Non-zero means the point is strictly inside. Points on an edge (within
/// tolerance) do not contribute crossings.
pub fn winding_number(point: &Point2<f64>, polygon: &[Point2<f64>]) -> i32 {
    let n = polygon.len();
    let mut wn = 0;
    for i in 0..n {
        let cur = &polygon[i];
        let next = &polygon[(i + 1) % n];
        let side = tolerant_sign(is_left(cur, next, point));
        if cur.y < point.y || almost_equal(cur.y, point.y) {
            // Upward crossing
            if next.y > point.y && !almost_equal(next.y, point.y) && side > 0 {
                wn += 1;
            }
        } else if (next.y < point.y || almost_equal(next.y, point.y)) && side < 0 {
            // Downward crossing
            wn -= 1;
        }
    }
    wn
}

/// Whether `point` lies strictly inside `polygon`.
#[inline]
pub fn point_in_polygon(point: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    winding_number(point, polygon) != 0
}

/// Axis-aligned bounds of a point set as (min, max).
pub fn bounds(points: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(min, max), p| {
        (
            Point2::new(min.x.min(p.x), min.y.min(p.y)),
            Point2::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}
