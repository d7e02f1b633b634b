//! Common driver interface for the solvers plus the knobs that select how they are executed.
//!
//! Restart-based algorithms (see [`crate::heuristic::LocalSearch`]) implement
//! [`IterativeAlgorithm`]: every call to [`IterativeAlgorithm::execute_step`] performs one bounded
//! unit of work, and a driver (sequential loop, thread pool or one rank of a cluster) decides how
//! often to call it.

use std::{num::NonZeroUsize, str::FromStr};

use crate::errors::Error;

/// [`IterativeAlgorithm`] provides a consistent interface to execute our algorithms. Observe
/// that it does not prescribe any constructor which is left to the algorithm designer as each
/// algorithm has specific parameters et cetera. The construction phase should, in general, be
/// quite fast and only involve little computation.
///
/// As an adopter of [`IterativeAlgorithm`], you have to implement the methods
///   [`IterativeAlgorithm::execute_step`],
///   [`IterativeAlgorithm::is_completed`] and [`IterativeAlgorithm::best_known_solution`].
///
/// # Example
/// ```
/// use etsp::algorithm::{IterativeAlgorithm, TerminatingIterativeAlgorithm};
///
/// struct Countdown {
///     left: u32,
///     best: Option<u32>,
/// }
///
/// impl IterativeAlgorithm<u32> for Countdown {
///     fn execute_step(&mut self) {
///         self.left -= 1;
///         self.best = Some(self.left);
///     }
///
///     fn is_completed(&self) -> bool {
///         self.left == 0
///     }
///
///     fn best_known_solution(&mut self) -> Option<u32> {
///         self.best
///     }
/// }
///
/// impl TerminatingIterativeAlgorithm<u32> for Countdown {}
///
/// let mut algo = Countdown { left: 3, best: None };
/// assert_eq!(algo.run_to_completion(), Some(0));
/// ```
pub trait IterativeAlgorithm<Result> {
    /// Advances the computation of this algorithm by one unit of work.
    fn execute_step(&mut self);

    /// Returns true iff the algorithm is completed and [`IterativeAlgorithm::execute_step`] may not
    /// be called again.
    fn is_completed(&self) -> bool;

    /// Returns the currently best known solution or None if no solution is known yet.
    fn best_known_solution(&mut self) -> Option<Result>;

    /// Keeps calling [`IterativeAlgorithm::execute_step`] until the `predicate` becomes false or
    /// [`IterativeAlgorithm::is_completed`] becomes true. The function `predicate` is evaluated
    /// after each iteration, i.e. a step is carried out even if the predicate always returns false.
    fn run_while<F: FnMut(&mut Self) -> bool>(&mut self, mut predicate: F) {
        while !self.is_completed() {
            self.execute_step();

            if !predicate(self) {
                break;
            }
        }
    }
}

/// [`TerminatingIterativeAlgorithm`] is a marker trait, i.e. to adopt it, you give an empty `impl`
/// block. Add this trait to algorithms that will eventually terminate.
pub trait TerminatingIterativeAlgorithm<Result>: IterativeAlgorithm<Result> {
    /// Execute the algorithm until it completed and return the solution if it was found.
    fn run_to_completion(&mut self) -> Option<Result> {
        self.run_while(|_| true);
        self.best_known_solution()
    }
}

/// How the work of a solver is spread out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// A single thread runs all work units one after another.
    Sequential,
    /// A fixed pool of worker threads shares one best-known solution.
    #[default]
    SharedMemory,
    /// Isolated ranks exchanging messages; each keeps its own best-known solution.
    Distributed,
}

impl FromStr for ExecutionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seq" | "sequential" => Ok(Self::Sequential),
            "shared" | "shared-memory" | "threads" => Ok(Self::SharedMemory),
            "dist" | "distributed" | "mpi" => Ok(Self::Distributed),
            _ => Err(Error::invalid_configuration(format!(
                "unknown execution mode '{s}' (expected sequential, shared or distributed)"
            ))),
        }
    }
}

/// Number of workers used if the environment does not specify one.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Rejects worker counts of zero.
pub fn check_workers(what: &str, workers: usize) -> Result<usize, Error> {
    if workers == 0 {
        Err(Error::invalid_configuration(format!(
            "number of {what} must be positive"
        )))
    } else {
        Ok(workers)
    }
}
