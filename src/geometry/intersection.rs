use super::Point;

/// Signed area of the parallelogram spanned by `a -> b` and `a -> c`.
#[inline]
fn orientation(a: &Point, b: &Point, c: &Point) -> f64 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Returns true iff segment `p1-p2` properly crosses segment `q1-q2`, i.e. `q1` and `q2` lie
/// strictly on opposite sides of the line through `p1-p2` and vice versa.
///
/// Collinear, touching and end-point sharing configurations are reported as not crossing.
/// In particular, two consecutive tour edges never cross.
pub fn segments_cross(p1: &Point, p2: &Point, q1: &Point, q2: &Point) -> bool {
    orientation(p1, p2, q1) * orientation(p1, p2, q2) < 0.0
        && orientation(q1, q2, p1) * orientation(q1, q2, p2) < 0.0
}
