use log::{info, warn};

use super::local_search::*;
use crate::{
    algorithm::TerminatingIterativeAlgorithm,
    distributed::{COORDINATOR, Communicator, LocalCluster, broadcast_problem, reduce_to_coordinator},
    errors::{Error, Result},
    geometry::Point,
    utils::Solution,
};

/// Restart `t` runs on rank `t mod size`; the per-rank optima are gathered at the coordinator.
#[derive(Clone, Debug, Default)]
pub struct DistributedLocalSearch {
    config: LocalSearchConfiguration,
}

impl DistributedLocalSearch {
    pub fn new(config: LocalSearchConfiguration) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs this rank's restarts. Only the coordinator passes the points and gets a solution.
    pub fn solve<C: Communicator>(
        &self,
        comm: &C,
        points: Option<&[Point]>,
    ) -> Result<Option<Solution>> {
        let (points, _) = broadcast_problem(comm, points, None)?;
        let (rank, size) = (comm.rank(), comm.size());

        let mut search = LocalSearch::with_partition(&points, self.config, rank, size);
        let local = search.run_to_completion();

        if search.discarded() > 0 {
            warn!(
                "Rank {rank}: {} restarts did not converge",
                search.discarded()
            );
        }
        info!(
            "Rank {rank} done: local cost={}",
            local
                .as_ref()
                .map_or_else(|| String::from("none"), |c| format!("{:.5}", c.cost))
        );

        let best = reduce_to_coordinator(comm, local)?;
        if rank != COORDINATOR {
            return Ok(None);
        }

        into_solution(best, &points, &self.config).map(Some)
    }
}

/// Runs the local search on a [`LocalCluster`] of `processes` ranks.
pub fn solve_distributed(
    points: &[Point],
    processes: usize,
    search: &DistributedLocalSearch,
) -> Result<Solution> {
    LocalCluster::run(processes, |comm| {
        let input = comm.is_coordinator().then_some(points);
        search.solve(&comm, input)
    })?
    .into_iter()
    .next()
    .flatten()
    .ok_or_else(|| Error::communication(COORDINATOR, "coordinator returned no solution"))
}
