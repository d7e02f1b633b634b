use std::{fmt, ops::AddAssign};

use log::{info, trace};

use super::best_bound::*;
use crate::{
    geometry::{Node, Point, distance},
    utils::{Solution, VisitedSet},
};

/// Whether partial tours are cut off against the incumbent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pruning {
    /// Abandon a branch as soon as its partial cost exceeds the incumbent.
    #[default]
    Bounded,
    /// Enumerate every permutation; only useful as a reference.
    Exhaustive,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SearchConfiguration {
    pub tie_policy: TiePolicy,
    pub pruning: Pruning,
}

impl SearchConfiguration {
    pub fn exhaustive() -> Self {
        Self {
            pruning: Pruning::Exhaustive,
            ..Default::default()
        }
    }

    pub fn with_tie_policy(mut self, tie_policy: TiePolicy) -> Self {
        self.tie_policy = tie_policy;
        self
    }

    pub fn with_pruning(mut self, pruning: Pruning) -> Self {
        self.pruning = pruning;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Number of recursive calls
    pub nodes: u64,
    /// Number of branches abandoned by the bound
    pub pruned: u64,
    /// Number of complete tours evaluated
    pub tours: u64,
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
        self.pruned += rhs.pruned;
        self.tours += rhs.tours;
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes={} pruned={} tours={}",
            self.nodes, self.pruned, self.tours
        )
    }
}

/// Partial tour of the branch currently explored. The depth is the length of `partial_tour`.
#[derive(Clone, Debug)]
struct SearchState {
    partial_tour: Vec<Node>,
    visited: VisitedSet,
    partial_cost: f64,
}

impl SearchState {
    /// Root state: city 0 is placed first to factor out rotations of the same cycle.
    fn new(n: usize) -> Self {
        let mut state = Self {
            partial_tour: Vec::with_capacity(n),
            visited: VisitedSet::new(n),
            partial_cost: 0.0,
        };

        if n > 0 {
            state.partial_tour.push(0);
            state.visited.visit(0);
        }

        state
    }

    fn depth(&self) -> usize {
        self.partial_tour.len()
    }
}

/// Depth-first branch-and-bound over all tours starting in city 0.
///
/// The search is generic over the [`Incumbent`] so that the same kernel runs with a private
/// bound (sequential solver, one rank of a cluster) or a bound shared by a thread pool.
pub struct ExactSearch<'a, I: Incumbent> {
    points: &'a [Point],
    incumbent: I,
    pruning: Pruning,
    state: SearchState,
    stats: SearchStats,
}

impl<'a, I: Incumbent> ExactSearch<'a, I> {
    pub fn new(points: &'a [Point], incumbent: I, config: &SearchConfiguration) -> Self {
        Self {
            points,
            incumbent,
            pruning: config.pruning,
            state: SearchState::new(points.len()),
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn incumbent(&self) -> &I {
        &self.incumbent
    }

    pub fn into_incumbent(self) -> I {
        self.incumbent
    }

    /// Explores the whole search tree.
    pub fn run(&mut self) {
        if self.points.is_empty() {
            return;
        }
        debug_assert_eq!(self.state.depth(), 1);
        self.recurse();
    }

    /// Explores the subtree of all tours whose second city is `second` (a work unit).
    pub fn run_unit(&mut self, second: Node) {
        debug_assert!(second > 0 && second < self.points.len());
        debug_assert_eq!(self.state.depth(), 1);

        let before = self.descend(second);
        self.recurse();
        self.ascend(second, before);
    }

    /// Appends `city` to the partial tour and returns the partial cost before the step.
    #[inline(always)]
    fn descend(&mut self, city: Node) -> f64 {
        let before = self.state.partial_cost;
        let last = self.state.partial_tour[self.state.depth() - 1];

        self.state.partial_cost += distance(&self.points[last], &self.points[city]);
        self.state.visited.visit(city);
        self.state.partial_tour.push(city);

        before
    }

    /// Undoes [`ExactSearch::descend`].
    #[inline(always)]
    fn ascend(&mut self, city: Node, before: f64) {
        let popped = self.state.partial_tour.pop();
        debug_assert_eq!(popped, Some(city));
        self.state.visited.unvisit(city);
        self.state.partial_cost = before;
    }

    fn recurse(&mut self) {
        self.stats.nodes += 1;

        if self.pruning == Pruning::Bounded && self.state.partial_cost > self.incumbent.cost() {
            self.stats.pruned += 1;
            return;
        }

        let n = self.points.len();
        if self.state.depth() == n {
            let first = self.state.partial_tour[0];
            let last = self.state.partial_tour[n - 1];
            let cost = self.state.partial_cost + distance(&self.points[last], &self.points[first]);

            self.stats.tours += 1;
            if self.incumbent.offer(cost, &self.state.partial_tour) {
                trace!("New incumbent {cost:.5}: {:?}", self.state.partial_tour);
            }
            return;
        }

        for city in 0..n {
            if self.state.visited.is_visited(city) {
                continue;
            }

            let before = self.descend(city);
            self.recurse();
            self.ascend(city, before);
        }
    }
}

/// Solves the instance on the calling thread. `warm_start` (indices into `points`) is used as
/// the initial incumbent if given.
pub fn solve_sequential(
    points: &[Point],
    config: &SearchConfiguration,
    warm_start: Option<BestBound>,
) -> Solution {
    let record = warm_start.unwrap_or_default();
    let mut search = ExactSearch::new(
        points,
        LocalBound::with_record(config.tie_policy, record),
        config,
    );
    search.run();

    info!("Sequential search done: {}", search.stats());
    search
        .into_incumbent()
        .into_inner()
        .into_solution(points, true)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        errors::InvariantCheck,
        geometry::{points_from_coords, tour_cost},
        testing::*,
    };
    use itertools::Itertools;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn empty_instance() {
        let solution = solve_sequential(&[], &Default::default(), None);
        assert_eq!(solution.cost, 0.0);
        assert!(solution.tour.is_empty());
        assert!(solution.exact);
    }

    #[test]
    fn single_and_two_points() {
        let points = points_from_coords([(2.0, 3.0)]);
        let solution = solve_sequential(&points, &Default::default(), None);
        assert_eq!(solution.cost, 0.0);
        assert_eq!(solution.tour.ids(), &[0]);

        let points = points_from_coords([(0.0, 0.0), (3.0, 4.0)]);
        let solution = solve_sequential(&points, &Default::default(), None);
        assert_eq!(solution.cost, 10.0);
        assert_eq!(solution.tour.ids(), &[0, 1]);
    }

    #[test]
    fn unit_square_perimeter() {
        let points = unit_square();
        let solution = solve_sequential(&points, &Default::default(), None);
        assert!((solution.cost - 4.0).abs() < 1e-9);
        assert!(
            solution.tour.ids() == [0, 1, 2, 3] || solution.tour.ids() == [0, 3, 2, 1],
            "{:?}",
            solution.tour
        );
    }

    #[test]
    fn collinear() {
        let points = points_from_coords([(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let solution = solve_sequential(&points, &Default::default(), None);
        assert!((solution.cost - 4.0).abs() < 1e-9);
        assert_eq!(solution.tour.len(), 3);
    }

    #[test]
    fn matches_brute_force() {
        let mut rng = Pcg64Mcg::seed_from_u64(0xb0b);
        for n in 1..=8 {
            for _ in 0..4 {
                let points = random_points(&mut rng, n);
                let expected = brute_force_cost(&points);
                let solution = solve_sequential(&points, &Default::default(), None);

                assert!(
                    (solution.cost - expected).abs() < 1e-9,
                    "n={n} got {} expected {expected}",
                    solution.cost
                );
                solution.tour.is_correct().unwrap();
                assert_eq!(solution.tour.ids()[0], 0);

                let nodes = solution.tour.ids().to_vec();
                assert!((tour_cost(&nodes, &points) - solution.cost).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn exhaustive_and_tie_policies_agree() {
        let mut rng = Pcg64Mcg::seed_from_u64(0x7e5);
        for n in 3..=7 {
            let points = random_points(&mut rng, n);
            let bounded = solve_sequential(&points, &Default::default(), None);

            let exhaustive = solve_sequential(&points, &SearchConfiguration::exhaustive(), None);
            assert!((bounded.cost - exhaustive.cost).abs() < 1e-9);

            let keep_last = SearchConfiguration::default().with_tie_policy(TiePolicy::KeepLast);
            let last = solve_sequential(&points, &keep_last, None);
            assert!((bounded.cost - last.cost).abs() < 1e-9);
        }
    }

    #[test]
    fn tie_policy_selects_mirror() {
        // the square has exactly two optimal tours starting in 0: one and its reflection
        let points = unit_square();

        let first = solve_sequential(&points, &Default::default(), None);
        assert_eq!(first.tour.ids(), &[0, 1, 2, 3]);

        let config = SearchConfiguration::default().with_tie_policy(TiePolicy::KeepLast);
        let last = solve_sequential(&points, &config, None);
        assert_eq!(last.tour.ids(), &[0, 3, 2, 1]);
    }

    #[test]
    fn pruning_reduces_work() {
        let mut rng = Pcg64Mcg::seed_from_u64(42);
        let points = random_points(&mut rng, 8);

        let mut bounded = ExactSearch::new(
            &points,
            LocalBound::new(TiePolicy::KeepFirst),
            &SearchConfiguration::default(),
        );
        bounded.run();

        let mut exhaustive = ExactSearch::new(
            &points,
            LocalBound::new(TiePolicy::KeepFirst),
            &SearchConfiguration::exhaustive(),
        );
        exhaustive.run();

        // (n-1)! complete tours without pruning
        assert_eq!(exhaustive.stats().tours, (1..8u64).product::<u64>());
        assert_eq!(exhaustive.stats().pruned, 0);
        assert!(bounded.stats().tours < exhaustive.stats().tours);
        assert!(bounded.stats().pruned > 0);
    }

    #[test]
    fn units_cover_the_search_tree() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let points = random_points(&mut rng, 7);
        let expected = brute_force_cost(&points);

        let mut search = ExactSearch::new(
            &points,
            LocalBound::new(TiePolicy::KeepFirst),
            &SearchConfiguration::exhaustive(),
        );
        for second in 1..points.len() {
            search.run_unit(second);
        }

        assert_eq!(search.stats().tours, (1..7u64).product::<u64>());
        assert!((search.into_incumbent().cost() - expected).abs() < 1e-9);
    }

    #[test]
    fn warm_start_never_hurts() {
        let mut rng = Pcg64Mcg::seed_from_u64(99);
        for n in 3..=7 {
            let points = random_points(&mut rng, n);
            let expected = brute_force_cost(&points);

            // a bad tour and the optimal tour as seeds
            let identity = (0..n).collect_vec();
            let optimum = solve_sequential(&points, &Default::default(), None);
            let optimal_nodes = optimum.tour.ids().to_vec();

            for seed in [identity, optimal_nodes] {
                for policy in [TiePolicy::KeepFirst, TiePolicy::KeepLast] {
                    let config = SearchConfiguration::default().with_tie_policy(policy);
                    let seeded = solve_sequential(
                        &points,
                        &config,
                        Some(BestBound::from_tour(seed.clone(), &points)),
                    );
                    assert!((seeded.cost - expected).abs() < 1e-9);
                    seeded.tour.is_correct().unwrap();
                }
            }
        }
    }
}
