use std::{ops::Range, str::FromStr};

use log::{trace, warn};
use rand::{SeedableRng, seq::SliceRandom};
use rand_pcg::Pcg64Mcg;

use crate::{
    algorithm::{IterativeAlgorithm, TerminatingIterativeAlgorithm},
    distributed::Candidate,
    errors::{Error, Result},
    geometry::{Node, Point, segments_cross, tour_cost},
    utils::{Solution, Tour},
};

/// How a pair of crossing edges `(t[i], t[i+1])` and `(t[j], t[j+1])` is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UncrossStrategy {
    /// Exchange the positions of `t[i+1]` and `t[j]`, leaving the path in between as is. Unless
    /// `j = i + 2`, this also replaces the edges next to the two endpoints.
    #[default]
    SwapEndpoints,
    /// Reverse `t[i+1..=j]`. Exactly the two crossing edges are replaced by `(t[i], t[j])` and
    /// `(t[i+1], t[j+1])`, which strictly shortens the tour.
    ReverseSegment,
}

impl FromStr for UncrossStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "reverse" | "reverse-segment" => Ok(Self::ReverseSegment),
            "swap" | "swap-endpoints" => Ok(Self::SwapEndpoints),
            _ => Err(Error::invalid_configuration(format!(
                "unknown uncross strategy '{s}' (expected reverse or swap)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LocalSearchConfiguration {
    /// Number of random restarts, in total over all workers
    pub restarts: usize,
    /// Upper bound on full passes over all edge pairs within a single restart
    pub max_passes: usize,
    /// Base seed; restart `t` uses a generator derived from `(seed, t)`
    pub seed: u64,
    pub strategy: UncrossStrategy,
}

impl Default for LocalSearchConfiguration {
    fn default() -> Self {
        Self {
            restarts: 200,
            max_passes: 1000,
            seed: 0x5eed_7590,
            strategy: UncrossStrategy::default(),
        }
    }
}

impl LocalSearchConfiguration {
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_strategy(mut self, strategy: UncrossStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.restarts == 0 {
            return Err(Error::invalid_configuration(
                "number of restarts must be positive",
            ));
        }
        if self.max_passes == 0 {
            return Err(Error::invalid_configuration(
                "number of passes must be positive",
            ));
        }
        Ok(())
    }
}

/// Outcome of a single restart.
#[derive(Clone, Debug)]
pub struct LocalOptimum {
    pub tour: Vec<Node>,
    pub cost: f64,
    pub passes: usize,
    /// False iff the pass limit was hit while crossings were still being removed.
    pub converged: bool,
}

/// Repeatedly scans all pairs of tour edges and uncrosses every crossing pair until a full pass
/// finds none or `max_passes` passes were made. Returns the number of passes and whether the tour
/// is free of crossings.
pub fn remove_crossings(
    points: &[Point],
    tour: &mut [Node],
    max_passes: usize,
    strategy: UncrossStrategy,
) -> (usize, bool) {
    let n = tour.len();
    if n < 4 {
        // any two edges share an end point
        return (0, true);
    }

    for pass in 1..=max_passes {
        let mut changed = false;

        for i in 0..n - 1 {
            for j in i + 1..n {
                let after_j = if j == n - 1 { 0 } else { j + 1 };

                if !segments_cross(
                    &points[tour[i]],
                    &points[tour[i + 1]],
                    &points[tour[j]],
                    &points[tour[after_j]],
                ) {
                    continue;
                }

                match strategy {
                    UncrossStrategy::ReverseSegment => tour[i + 1..=j].reverse(),
                    UncrossStrategy::SwapEndpoints => tour.swap(i + 1, j),
                }
                changed = true;
            }
        }

        if !changed {
            return (pass, true);
        }
    }

    (max_passes, false)
}

fn trial_seed(seed: u64, trial: u64) -> u64 {
    seed ^ trial.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Runs restart number `trial`: shuffles all points uniformly (no city is pinned) and removes
/// crossings from the resulting tour.
pub fn run_trial(points: &[Point], config: &LocalSearchConfiguration, trial: u64) -> LocalOptimum {
    let mut rng = Pcg64Mcg::seed_from_u64(trial_seed(config.seed, trial));

    let mut tour: Vec<Node> = (0..points.len()).collect();
    tour.shuffle(&mut rng);

    let (passes, converged) =
        remove_crossings(points, &mut tour, config.max_passes, config.strategy);
    let cost = tour_cost(&tour, points);

    trace!("Trial {trial:>5}: cost={cost:.5} passes={passes} converged={converged}");

    LocalOptimum {
        tour,
        cost,
        passes,
        converged,
    }
}

/// Runs a (sub)range of the restarts one after another, keeping the cheapest converged tour.
/// Ties are broken towards the smaller trial number, so the result does not depend on how the
/// restarts are distributed among workers.
pub struct LocalSearch<'a> {
    points: &'a [Point],
    config: LocalSearchConfiguration,
    trials: std::iter::StepBy<Range<usize>>,
    pending: Option<usize>,
    best: Option<Candidate>,
    discarded: usize,
}

impl<'a> LocalSearch<'a> {
    pub fn new(points: &'a [Point], config: LocalSearchConfiguration) -> Self {
        Self::with_partition(points, config, 0, 1)
    }

    /// Only runs the restarts `t` with `t mod size == rank`.
    pub fn with_partition(
        points: &'a [Point],
        config: LocalSearchConfiguration,
        rank: usize,
        size: usize,
    ) -> Self {
        debug_assert!(size > 0 && rank < size);
        let mut trials = (rank..config.restarts).step_by(size);
        let pending = trials.next();

        Self {
            points,
            config,
            trials,
            pending,
            best: None,
            discarded: 0,
        }
    }

    /// Number of restarts dropped because they hit the pass limit.
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl IterativeAlgorithm<Candidate> for LocalSearch<'_> {
    fn execute_step(&mut self) {
        let Some(trial) = self.pending else {
            return;
        };
        self.pending = self.trials.next();

        let optimum = run_trial(self.points, &self.config, trial as u64);
        if !optimum.converged {
            warn!(
                "Trial {trial} still had crossings after {} passes; discarded",
                optimum.passes
            );
            self.discarded += 1;
            return;
        }

        let candidate = Candidate::new(optimum.cost, optimum.tour, trial as u64);
        if self.best.as_ref().is_none_or(|b| candidate.beats(b)) {
            self.best = Some(candidate);
        }
    }

    fn is_completed(&self) -> bool {
        self.pending.is_none()
    }

    fn best_known_solution(&mut self) -> Option<Candidate> {
        self.best.clone()
    }
}

impl TerminatingIterativeAlgorithm<Candidate> for LocalSearch<'_> {}

/// Turns the best restart into a heuristic [`Solution`].
pub(crate) fn into_solution(
    best: Option<Candidate>,
    points: &[Point],
    config: &LocalSearchConfiguration,
) -> Result<Solution> {
    match best {
        Some(best) => Ok(Solution::new(
            Tour::from_nodes(&best.tour, points),
            best.cost,
            false,
        )),
        None if points.is_empty() => Ok(Solution::empty(false)),
        None => Err(Error::NotConverged {
            trials: config.restarts,
        }),
    }
}

/// Runs all restarts on the calling thread.
pub fn solve_sequential(points: &[Point], config: &LocalSearchConfiguration) -> Result<Solution> {
    config.validate()?;

    let mut search = LocalSearch::new(points, *config);
    let best = search.run_to_completion();
    if search.discarded() > 0 {
        warn!(
            "{} of {} restarts did not converge",
            search.discarded(),
            config.restarts
        );
    }

    into_solution(best, points, config)
}
