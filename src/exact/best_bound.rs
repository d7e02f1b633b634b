use std::{
    str::FromStr,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    distributed::Candidate,
    errors::Error,
    geometry::{Node, Point, tour_cost},
    utils::{Solution, Tour},
};

/// Which of several equal-cost optima is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TiePolicy {
    /// A complete tour replaces the incumbent only if it is strictly cheaper.
    #[default]
    KeepFirst,
    /// A complete tour also replaces an incumbent of equal cost.
    KeepLast,
}

impl TiePolicy {
    #[inline(always)]
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            TiePolicy::KeepFirst => candidate < incumbent,
            TiePolicy::KeepLast => candidate <= incumbent,
        }
    }
}

impl FromStr for TiePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "keep-first" => Ok(Self::KeepFirst),
            "last" | "keep-last" => Ok(Self::KeepLast),
            _ => Err(Error::invalid_configuration(format!(
                "unknown tie policy '{s}' (expected first or last)"
            ))),
        }
    }
}

/// Best complete tour found so far. Invariant: if `tour` is non-empty, `cost` is its cost;
/// otherwise `cost` is infinite.
#[derive(Clone, Debug, PartialEq)]
pub struct BestBound {
    cost: f64,
    tour: Vec<Node>,
}

impl Default for BestBound {
    fn default() -> Self {
        Self::new()
    }
}

impl BestBound {
    pub fn new() -> Self {
        Self {
            cost: f64::INFINITY,
            tour: Vec::new(),
        }
    }

    /// Starts from a known tour, e.g. the result of a heuristic.
    pub fn from_tour(tour: Vec<Node>, points: &[Point]) -> Self {
        if tour.is_empty() {
            return Self::new();
        }

        Self {
            cost: tour_cost(&tour, points),
            tour,
        }
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn tour(&self) -> &[Node] {
        &self.tour
    }

    fn promote(&mut self, cost: f64, tour: &[Node]) {
        self.cost = cost;
        self.tour.clear();
        self.tour.extend_from_slice(tour);
    }

    pub fn into_candidate(self) -> Option<Candidate> {
        (!self.tour.is_empty()).then(|| Candidate::new(self.cost, self.tour, 0))
    }

    /// Translates the record into a [`Solution`]; an empty record yields the empty solution.
    pub fn into_solution(self, points: &[Point], exact: bool) -> Solution {
        if self.tour.is_empty() {
            Solution::empty(exact)
        } else {
            Solution::new(Tour::from_nodes(&self.tour, points), self.cost, exact)
        }
    }
}

/// Access to the best known solution from within a search.
pub trait Incumbent {
    /// Pruning threshold: cost of the best complete tour known so far.
    fn cost(&self) -> f64;

    /// Offers a complete tour of cost `cost`; returns true iff it was promoted.
    fn offer(&mut self, cost: f64, tour: &[Node]) -> bool;
}

/// Incumbent owned by a single search (sequential or one rank of a cluster).
#[derive(Clone, Debug, Default)]
pub struct LocalBound {
    record: BestBound,
    policy: TiePolicy,
}

impl LocalBound {
    pub fn new(policy: TiePolicy) -> Self {
        Self::with_record(policy, BestBound::new())
    }

    pub fn with_record(policy: TiePolicy, record: BestBound) -> Self {
        Self { record, policy }
    }

    pub fn into_inner(self) -> BestBound {
        self.record
    }
}

impl Incumbent for LocalBound {
    #[inline(always)]
    fn cost(&self) -> f64 {
        self.record.cost
    }

    fn offer(&mut self, cost: f64, tour: &[Node]) -> bool {
        if !self.policy.improves(cost, self.record.cost) {
            return false;
        }
        self.record.promote(cost, tour);
        true
    }
}

/// Incumbent shared by all workers of a thread pool.
///
/// The record is guarded by a mutex and always updated as a whole. For pruning, workers read a
/// copy of the cost from `cost_bits`, which is only written while the lock is held and therefore
/// never increases.
#[derive(Debug)]
pub struct SharedBound {
    record: Mutex<BestBound>,
    cost_bits: AtomicU64,
    policy: TiePolicy,
}

impl SharedBound {
    pub fn new(policy: TiePolicy) -> Self {
        Self::with_record(policy, BestBound::new())
    }

    pub fn with_record(policy: TiePolicy, record: BestBound) -> Self {
        Self {
            cost_bits: AtomicU64::new(record.cost.to_bits()),
            record: Mutex::new(record),
            policy,
        }
    }

    pub fn cost(&self) -> f64 {
        f64::from_bits(self.cost_bits.load(Ordering::Acquire))
    }

    pub fn into_inner(self) -> BestBound {
        self.record
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Incumbent for &SharedBound {
    #[inline(always)]
    fn cost(&self) -> f64 {
        SharedBound::cost(self)
    }

    fn offer(&mut self, cost: f64, tour: &[Node]) -> bool {
        // cheap rejection without the lock; the comparison is repeated below
        if !self.policy.improves(cost, SharedBound::cost(self)) {
            return false;
        }

        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.policy.improves(cost, record.cost) {
            return false;
        }

        record.promote(cost, tour);
        self.cost_bits.store(cost.to_bits(), Ordering::Release);
        true
    }
}
