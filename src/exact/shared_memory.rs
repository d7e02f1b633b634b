use std::sync::{Mutex, PoisonError};

use log::{debug, info};

use super::{best_bound::*, branch_and_bound::*};
use crate::{
    algorithm::check_workers,
    errors::{Error, Result},
    geometry::Point,
    utils::Solution,
};

/// Runs one task per choice of the second city on a fixed-size worker pool. Tasks are picked
/// up dynamically by idle workers, which balances the very uneven subtree sizes. All tasks
/// prune against and update a single [`SharedBound`].
#[derive(Clone, Debug)]
pub struct SharedMemoryDispatcher {
    threads: usize,
    config: SearchConfiguration,
    warm_start: Option<BestBound>,
}

impl SharedMemoryDispatcher {
    pub fn new(threads: usize) -> Result<Self> {
        Ok(Self {
            threads: check_workers("threads", threads)?,
            config: Default::default(),
            warm_start: None,
        })
    }

    pub fn with_configuration(mut self, config: SearchConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Uses `record` as initial incumbent, e.g. a heuristic solution.
    pub fn with_warm_start(mut self, record: BestBound) -> Self {
        self.warm_start = Some(record);
        self
    }

    pub fn solve(&self, points: &[Point]) -> Result<Solution> {
        let n = points.len();
        if n < 2 {
            return Ok(solve_sequential(points, &self.config, self.warm_start.clone()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("bnb-worker-{i}"))
            .build()
            .map_err(|e| Error::invalid_configuration(format!("cannot build thread pool: {e}")))?;

        let bound = SharedBound::with_record(
            self.config.tie_policy,
            self.warm_start.clone().unwrap_or_default(),
        );
        let total_stats = Mutex::new(SearchStats::default());

        info!(
            "Start shared-memory search: n={n} units={} threads={}",
            n - 1,
            self.threads
        );

        pool.scope(|scope| {
            for second in 1..n {
                let bound = &bound;
                let total_stats = &total_stats;
                let config = &self.config;

                scope.spawn(move |_| {
                    let mut search = ExactSearch::new(points, bound, config);
                    search.run_unit(second);

                    let stats = search.stats();
                    debug!("Unit {second:>3} done: {stats}");
                    *total_stats.lock().unwrap_or_else(PoisonError::into_inner) += stats;
                });
            }
        });

        let stats = total_stats
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let record = bound.into_inner();
        info!(
            "Shared-memory search done: cost={:.5} {stats}",
            record.cost()
        );

        Ok(record.into_solution(points, true))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{errors::InvariantCheck, geometry::points_from_coords, testing::*};
    use paste::paste;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn rejects_zero_threads() {
        assert!(SharedMemoryDispatcher::new(0).is_err());
    }

    #[test]
    fn trivial_instances() {
        let dispatcher = SharedMemoryDispatcher::new(2).unwrap();

        let solution = dispatcher.solve(&[]).unwrap();
        assert_eq!(solution.cost, 0.0);
        assert!(solution.tour.is_empty());

        let points = points_from_coords([(1.0, 1.0)]);
        let solution = dispatcher.solve(&points).unwrap();
        assert_eq!(solution.tour.ids(), &[0]);

        let points = points_from_coords([(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let solution = dispatcher.solve(&points).unwrap();
        assert!((solution.cost - 4.0).abs() < 1e-9);
    }

    #[test]
    fn unit_square_perimeter() {
        let points = unit_square();
        let solution = SharedMemoryDispatcher::new(4)
            .unwrap()
            .solve(&points)
            .unwrap();
        assert!((solution.cost - 4.0).abs() < 1e-9);
        assert!(solution.tour.ids() == [0, 1, 2, 3] || solution.tour.ids() == [0, 3, 2, 1]);
    }

    macro_rules! impl_thread_count_test {
        ($threads:tt) => {
            paste! {
                #[test]
                fn [< matches_sequential_with_ $threads _threads >]() {
                    let mut rng = Pcg64Mcg::seed_from_u64(0x1000 + $threads);
                    for n in 2..=8 {
                        let points = random_points(&mut rng, n);
                        let expected = solve_sequential(&points, &Default::default(), None);

                        for policy in [TiePolicy::KeepFirst, TiePolicy::KeepLast] {
                            let config = SearchConfiguration::default().with_tie_policy(policy);
                            let solution = SharedMemoryDispatcher::new($threads)
                                .unwrap()
                                .with_configuration(config)
                                .solve(&points)
                                .unwrap();

                            assert!(
                                (solution.cost - expected.cost).abs() < 1e-9,
                                "n={n} threads={} got {} expected {}",
                                $threads,
                                solution.cost,
                                expected.cost
                            );
                            solution.tour.is_correct().unwrap();
                        }
                    }
                }
            }
        };
    }

    impl_thread_count_test!(1);
    impl_thread_count_test!(2);
    impl_thread_count_test!(3);
    impl_thread_count_test!(4);
    impl_thread_count_test!(5);
    impl_thread_count_test!(6);
    impl_thread_count_test!(7);
    impl_thread_count_test!(8);

    #[test]
    fn exhaustive_matches_brute_force() {
        let mut rng = Pcg64Mcg::seed_from_u64(31);
        let points = random_points(&mut rng, 7);
        let solution = SharedMemoryDispatcher::new(3)
            .unwrap()
            .with_configuration(SearchConfiguration::exhaustive())
            .solve(&points)
            .unwrap();
        assert!((solution.cost - brute_force_cost(&points)).abs() < 1e-9);
    }

    #[test]
    fn warm_start() {
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        let points = random_points(&mut rng, 8);
        let expected = brute_force_cost(&points);

        let seed = BestBound::from_tour((0..8).rev().collect(), &points);
        let solution = SharedMemoryDispatcher::new(4)
            .unwrap()
            .with_warm_start(seed)
            .solve(&points)
            .unwrap();

        assert!((solution.cost - expected).abs() < 1e-9);
        solution.tour.is_correct().unwrap();
    }
}
