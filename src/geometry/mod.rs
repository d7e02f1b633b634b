pub mod intersection;
pub use intersection::segments_cross;

use serde::{Deserialize, Serialize};

/// Index of a point in the slice handed to the solvers.
pub type Node = usize;

/// Original position of a point in the input. Tours are reported in this identity.
pub type PointId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub id: PointId,
}

impl Point {
    pub fn new(x: f64, y: f64, id: PointId) -> Self {
        Self { x, y, id }
    }
}

/// Builds points from coordinates, assigning ids in input order.
pub fn points_from_coords(coords: impl IntoIterator<Item = (f64, f64)>) -> Vec<Point> {
    coords
        .into_iter()
        .enumerate()
        .map(|(id, (x, y))| Point::new(x, y, id))
        .collect()
}

#[inline]
pub fn distance(p1: &Point, p2: &Point) -> f64 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

/// Cost of the closed tour visiting `points[tour[0]], points[tour[1]], ...` and returning to
/// the first one. `tour` has to be a permutation of (a subset of) the indices of `points`;
/// the empty tour costs nothing.
pub fn tour_cost(tour: &[Node], points: &[Point]) -> f64 {
    let (Some(&first), Some(&last)) = (tour.first(), tour.last()) else {
        return 0.0;
    };

    let open_path: f64 = tour
        .windows(2)
        .map(|w| distance(&points[w[0]], &points[w[1]]))
        .sum();

    open_path + distance(&points[last], &points[first])
}
