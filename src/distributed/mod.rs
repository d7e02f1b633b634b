//! Message passing between ranks that share no memory.
//!
//! The only collective operations used by the solvers are a broadcast of the instance from the
//! coordinator and a gather of the per-rank optima back to it; see [`Communicator`].
//! [`LocalCluster`] provides ranks as isolated threads talking over point-to-point channels.

pub mod cluster;
pub mod message;

pub use cluster::{ChannelCommunicator, LocalCluster};
pub use message::{Candidate, Message};

use log::debug;

use crate::{
    errors::{Error, Result},
    geometry::{Node, Point},
};

/// Rank that owns the input and receives the final result.
pub const COORDINATOR: usize = 0;

pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Sends `message` to rank `dest`. Fails if `dest` is gone.
    fn send(&self, dest: usize, message: &Message) -> Result<()>;

    /// Blocks until a message from `source` arrives. Fails if `source` is gone without sending.
    fn recv(&self, source: usize) -> Result<Message>;

    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }

    /// Distributes `message` from the coordinator to all ranks. The coordinator has to pass
    /// `Some`, all other ranks pass `None`; every rank returns the coordinator's message.
    fn broadcast(&self, message: Option<Message>) -> Result<Message> {
        if !self.is_coordinator() {
            return self.recv(COORDINATOR);
        }

        let message = message.ok_or_else(|| {
            Error::communication(self.rank(), "coordinator has nothing to broadcast")
        })?;

        for dest in (0..self.size()).filter(|&r| r != COORDINATOR) {
            self.send(dest, &message)?;
        }

        Ok(message)
    }
}

/// Broadcasts the instance (and an optional initial tour) from the coordinator.
pub fn broadcast_problem<C: Communicator>(
    comm: &C,
    points: Option<&[Point]>,
    warm_start: Option<&[Node]>,
) -> Result<(Vec<Point>, Option<Vec<Node>>)> {
    let message = if comm.is_coordinator() {
        let points = points
            .ok_or_else(|| Error::invalid_input("the coordinator rank requires the points"))?;

        Some(Message::Problem {
            points: points.to_vec(),
            warm_start: warm_start.map(<[Node]>::to_vec),
        })
    } else {
        None
    };

    match comm.broadcast(message)? {
        Message::Problem { points, warm_start } => Ok((points, warm_start)),
        other => Err(Error::communication(
            comm.rank(),
            format!("expected Problem, received {}", other.kind()),
        )),
    }
}

/// Gathers the local optima of all ranks at the coordinator and keeps the best one, starting
/// from the coordinator's own. Non-coordinators always return `None`.
pub fn reduce_to_coordinator<C: Communicator>(
    comm: &C,
    local: Option<Candidate>,
) -> Result<Option<Candidate>> {
    if !comm.is_coordinator() {
        comm.send(COORDINATOR, &Message::LocalBest(local))?;
        return Ok(None);
    }

    let mut best = local;
    for source in (0..comm.size()).filter(|&r| r != COORDINATOR) {
        let candidate = match comm.recv(source)? {
            Message::LocalBest(candidate) => candidate,
            other => {
                return Err(Error::communication(
                    comm.rank(),
                    format!("expected LocalBest from rank {source}, received {}", other.kind()),
                ));
            }
        };

        debug!(
            "Rank {source} reported {}",
            candidate
                .as_ref()
                .map_or_else(|| String::from("nothing"), |c| format!("{:.5}", c.cost))
        );

        if let Some(candidate) = candidate {
            if best.as_ref().is_none_or(|b| candidate.beats(b)) {
                best = Some(candidate);
            }
        }
    }

    Ok(best)
}
