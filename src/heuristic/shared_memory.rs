use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use log::{info, warn};
use rayon::prelude::*;

use super::local_search::*;
use crate::{
    algorithm::check_workers,
    distributed::Candidate,
    errors::{Error, Result},
    geometry::{Node, Point},
    utils::Solution,
};

/// Best restart seen by any worker. The cost is mirrored in an atomic so that workers holding a
/// clearly worse tour never touch the lock.
struct SharedCandidate {
    best: Mutex<Option<Candidate>>,
    cost_bits: AtomicU64,
}

impl SharedCandidate {
    fn new() -> Self {
        Self {
            best: Mutex::new(None),
            cost_bits: AtomicU64::new(f64::INFINITY.to_bits()),
        }
    }

    fn offer(&self, candidate: Candidate) {
        if candidate.cost > f64::from_bits(self.cost_bits.load(Ordering::Acquire)) {
            return;
        }

        let mut best = self.best.lock().unwrap_or_else(PoisonError::into_inner);
        if best.as_ref().is_none_or(|b| candidate.beats(b)) {
            self.cost_bits
                .store(candidate.cost.to_bits(), Ordering::Release);
            *best = Some(candidate);
        }
    }

    fn into_inner(self) -> Option<Candidate> {
        self.best
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Spreads the restarts over a fixed-size pool of worker threads.
#[derive(Clone, Debug)]
pub struct ParallelLocalSearch {
    threads: usize,
    config: LocalSearchConfiguration,
}

impl ParallelLocalSearch {
    pub fn new(threads: usize, config: LocalSearchConfiguration) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            threads: check_workers("threads", threads)?,
            config,
        })
    }

    pub fn solve(&self, points: &[Point]) -> Result<Solution> {
        let best = self.run_restarts(points)?;
        into_solution(best, points, &self.config)
    }

    /// Best tour as indices into `points`, meant as an initial bound for the exact search.
    /// A failed local search is logged and yields `None`.
    pub fn warm_start(&self, points: &[Point]) -> Option<Vec<Node>> {
        if points.is_empty() {
            return None;
        }

        let best = self.run_restarts(points).and_then(|best| {
            best.ok_or(Error::NotConverged {
                trials: self.config.restarts,
            })
        });

        match best {
            Ok(best) => {
                info!("Warm start with cost {:.5}", best.cost);
                Some(best.tour)
            }
            Err(e) => {
                warn!("No warm start: {e}");
                None
            }
        }
    }

    fn run_restarts(&self, points: &[Point]) -> Result<Option<Candidate>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("ls-worker-{i}"))
            .build()
            .map_err(|e| Error::invalid_configuration(format!("cannot build thread pool: {e}")))?;

        info!(
            "Start parallel local search: n={} restarts={} threads={}",
            points.len(),
            self.config.restarts,
            self.threads
        );

        let shared = SharedCandidate::new();
        let discarded = AtomicUsize::new(0);

        pool.install(|| {
            (0..self.config.restarts).into_par_iter().for_each(|trial| {
                let optimum = run_trial(points, &self.config, trial as u64);
                if !optimum.converged {
                    warn!(
                        "Trial {trial} still had crossings after {} passes; discarded",
                        optimum.passes
                    );
                    discarded.fetch_add(1, Ordering::Relaxed);
                    return;
                }

                shared.offer(Candidate::new(optimum.cost, optimum.tour, trial as u64));
            })
        });

        let discarded = discarded.into_inner();
        if discarded > 0 {
            warn!(
                "{discarded} of {} restarts did not converge",
                self.config.restarts
            );
        }

        let best = shared.into_inner();
        if let Some(best) = &best {
            info!(
                "Parallel local search done: cost={:.5} from trial {}",
                best.cost, best.order
            );
        }

        Ok(best)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{errors::InvariantCheck, testing::*};
    use paste::paste;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn rejects_bad_configuration() {
        assert!(ParallelLocalSearch::new(0, Default::default()).is_err());
        assert!(
            ParallelLocalSearch::new(2, LocalSearchConfiguration::default().with_restarts(0))
                .is_err()
        );
    }

    #[test]
    fn tiny_instances() {
        let search = ParallelLocalSearch::new(3, Default::default()).unwrap();
        for n in 0..=3 {
            let mut rng = Pcg64Mcg::seed_from_u64(n as u64);
            let points = random_points(&mut rng, n);
            let solution = search.solve(&points).unwrap();
            assert_eq!(solution.tour.len(), n);
            assert!((solution.cost - brute_force_cost(&points)).abs() < 1e-9);
        }
    }

    #[test]
    fn warm_start_tour() {
        let mut rng = Pcg64Mcg::seed_from_u64(0x3a3);
        let points = random_points(&mut rng, 8);
        let search = ParallelLocalSearch::new(2, Default::default()).unwrap();

        let tour = search.warm_start(&points).unwrap();
        let expected = search.solve(&points).unwrap();
        assert_eq!(tour.len(), 8);
        assert_eq!(
            crate::geometry::tour_cost(&tour, &points).to_bits(),
            expected.cost.to_bits()
        );

        assert!(search.warm_start(&[]).is_none());
    }

    #[test]
    fn failed_warm_start_is_skipped() {
        let mut rng = Pcg64Mcg::seed_from_u64(0x3a4);
        let points = random_points(&mut rng, 30);
        // a single pass cannot confirm that a random 30 point tour is free of crossings
        let config = LocalSearchConfiguration::default()
            .with_restarts(3)
            .with_max_passes(1);
        let search = ParallelLocalSearch::new(2, config).unwrap();

        assert!(matches!(
            search.solve(&points),
            Err(Error::NotConverged { trials: 3 })
        ));
        assert!(search.warm_start(&points).is_none());
    }

    macro_rules! impl_thread_count_test {
        ($threads:tt) => {
            paste! {
                #[test]
                fn [< matches_sequential_with_ $threads _threads >]() {
                    let mut rng = Pcg64Mcg::seed_from_u64(0x3000 + $threads);
                    let points = random_points(&mut rng, 25);

                    for strategy in [UncrossStrategy::SwapEndpoints, UncrossStrategy::ReverseSegment] {
                        let config = LocalSearchConfiguration::default()
                            .with_restarts(40)
                            .with_seed($threads)
                            .with_strategy(strategy);

                        let expected = solve_sequential(&points, &config).unwrap();
                        let solution = ParallelLocalSearch::new($threads, config)
                            .unwrap()
                            .solve(&points)
                            .unwrap();

                        assert_eq!(solution, expected, "{strategy:?}");
                        solution.tour.is_correct().unwrap();
                        assert_eq!(count_crossings(&points, solution.tour.ids()), 0);
                    }
                }
            }
        };
    }

    impl_thread_count_test!(1);
    impl_thread_count_test!(2);
    impl_thread_count_test!(4);
    impl_thread_count_test!(7);
}
