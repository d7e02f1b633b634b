use super::geometry::*;
use itertools::Itertools as _;
use rand::Rng;

/// Uniformly random points in `[0, 100)^2` with ids in input order.
pub fn random_points(rng: &mut impl Rng, n: usize) -> Vec<Point> {
    (0..n)
        .map(|id| Point::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), id))
        .collect()
}

/// Optimal tour cost obtained by trying all tours starting at the first point.
pub fn brute_force_cost(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }

    (1..n)
        .permutations(n - 1)
        .map(|rest| {
            let tour = std::iter::once(0).chain(rest).collect_vec();
            tour_cost(&tour, points)
        })
        .fold(f64::INFINITY, f64::min)
}

/// (0,0), (1,0), (1,1), (0,1)
pub fn unit_square() -> Vec<Point> {
    points_from_coords([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
}

/// Number of pairs of tour edges that properly cross each other.
pub fn count_crossings(points: &[Point], tour: &[Node]) -> usize {
    let n = tour.len();
    let edge = |i: usize| (&points[tour[i]], &points[tour[(i + 1) % n]]);

    (0..n)
        .tuple_combinations()
        .filter(|&(i, j)| {
            let (p1, p2) = edge(i);
            let (q1, q2) = edge(j);
            segments_cross(p1, p2, q1, q2)
        })
        .count()
}
