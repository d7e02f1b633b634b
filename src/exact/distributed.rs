use log::{debug, info};

use super::{best_bound::*, branch_and_bound::*};
use crate::{
    distributed::{
        COORDINATOR, Communicator, LocalCluster, broadcast_problem, reduce_to_coordinator,
    },
    errors::{Error, Result},
    geometry::{Node, Point},
    utils::{Solution, Tour},
};

/// Splits the search by second city across the ranks of a cluster: unit `i` is processed by rank
/// `i mod size`. Ranks do not exchange bounds while searching, so a rank cannot profit from a
/// good tour found elsewhere; the per-rank optima are only combined at the coordinator once every
/// rank is done.
///
/// The [`TiePolicy`] only applies within each rank. Between ranks, equal costs are resolved in
/// favour of the lowest rank.
#[derive(Clone, Debug, Default)]
pub struct DistributedDispatcher {
    config: SearchConfiguration,
    warm_start: Option<Vec<Node>>,
}

impl DistributedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration(mut self, config: SearchConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Initial tour (indices into the points) handed to every rank together with the instance.
    pub fn with_warm_start(mut self, tour: Vec<Node>) -> Self {
        self.warm_start = Some(tour);
        self
    }

    /// Runs this rank's share of the search. The coordinator has to pass the points, all other
    /// ranks receive them by broadcast. Only the coordinator returns a solution.
    pub fn solve<C: Communicator>(
        &self,
        comm: &C,
        points: Option<&[Point]>,
    ) -> Result<Option<Solution>> {
        let (points, warm_start) = broadcast_problem(comm, points, self.warm_start.as_deref())?;
        let (rank, size) = (comm.rank(), comm.size());
        let n = points.len();

        let record = warm_start
            .map(|tour| BestBound::from_tour(tour, &points))
            .unwrap_or_default();
        let mut search = ExactSearch::new(
            &points,
            LocalBound::with_record(self.config.tie_policy, record),
            &self.config,
        );

        if n < 2 {
            // no second city to split on; the coordinator handles it alone
            if rank == COORDINATOR {
                search.run();
            }
        } else {
            let units: Vec<Node> = (1..n).filter(|i| i % size == rank).collect();
            debug!("Rank {rank}/{size}: units {units:?}");

            for second in units {
                search.run_unit(second);
            }
        }

        info!(
            "Rank {rank} done: local cost={:.5} {}",
            search.incumbent().cost(),
            search.stats()
        );

        let local = search.into_incumbent().into_inner().into_candidate();
        let Some(best) = reduce_to_coordinator(comm, local)? else {
            return Ok((rank == COORDINATOR).then(|| Solution::empty(true)));
        };

        Ok(Some(Solution::new(
            Tour::from_nodes(&best.tour, &points),
            best.cost,
            true,
        )))
    }
}

/// Solves the instance on a [`LocalCluster`] of `processes` ranks.
pub fn solve_distributed(
    points: &[Point],
    processes: usize,
    dispatcher: &DistributedDispatcher,
) -> Result<Solution> {
    LocalCluster::run(processes, |comm| {
        let input = comm.is_coordinator().then_some(points);
        dispatcher.solve(&comm, input)
    })?
    .into_iter()
    .next()
    .flatten()
    .ok_or_else(|| Error::communication(COORDINATOR, "coordinator returned no solution"))
}
