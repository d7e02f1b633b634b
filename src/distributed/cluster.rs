use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error};

use super::{Communicator, Message};
use crate::{
    algorithm::check_workers,
    errors::{Error, Result},
};

/// One rank of a [`LocalCluster`]. Messages are serialized before they are sent, so ranks never
/// share any data. There is a dedicated channel for every ordered pair of ranks; when a rank
/// terminates its senders are dropped and peers waiting on it observe a disconnect instead of
/// blocking forever.
pub struct ChannelCommunicator {
    rank: usize,
    outboxes: Vec<Sender<Vec<u8>>>,
    inboxes: Vec<Receiver<Vec<u8>>>,
}

impl ChannelCommunicator {
    /// Creates the fully connected set of communicators for `size` ranks.
    pub fn create(size: usize) -> Vec<Self> {
        // senders[src][dst] and receivers[dst][src] are the two ends of the same channel
        let mut senders: Vec<Vec<Sender<Vec<u8>>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut receivers: Vec<Vec<Receiver<Vec<u8>>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();

        for outboxes in senders.iter_mut() {
            for inboxes in receivers.iter_mut() {
                let (tx, rx) = unbounded();
                outboxes.push(tx);
                inboxes.push(rx);
            }
        }

        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| Self {
                rank,
                outboxes,
                inboxes,
            })
            .collect()
    }
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, dest: usize, message: &Message) -> Result<()> {
        let outbox = self.outboxes.get(dest).ok_or_else(|| {
            Error::communication(self.rank, format!("no rank {dest} in cluster"))
        })?;

        let bytes = serde_json::to_vec(message)?;
        outbox.send(bytes).map_err(|_| {
            Error::communication(self.rank, format!("rank {dest} is no longer reachable"))
        })
    }

    fn recv(&self, source: usize) -> Result<Message> {
        let inbox = self.inboxes.get(source).ok_or_else(|| {
            Error::communication(self.rank, format!("no rank {source} in cluster"))
        })?;

        let bytes = inbox.recv().map_err(|_| {
            Error::communication(
                self.rank,
                format!("rank {source} terminated without sending"),
            )
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            Error::communication(
                self.rank,
                format!("malformed message from rank {source}: {e}"),
            )
        })
    }
}

/// Runs SPMD jobs on `size` ranks, each on its own thread.
pub struct LocalCluster;

impl LocalCluster {
    /// Runs `job` on every rank and returns the results in rank order. If any rank fails, the
    /// error of the lowest failing rank is returned; a panicking rank is reported as a
    /// communication failure.
    pub fn run<R, F>(size: usize, job: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(ChannelCommunicator) -> Result<R> + Sync,
    {
        check_workers("processes", size)?;
        debug!("Starting local cluster with {size} ranks");

        let job = &job;
        thread::scope(|scope| {
            let handles = ChannelCommunicator::create(size)
                .into_iter()
                .map(|comm| {
                    thread::Builder::new()
                        .name(format!("rank-{}", comm.rank()))
                        .spawn_scoped(scope, move || job(comm))
                })
                .collect::<std::io::Result<Vec<_>>>()?;

            // join every rank before looking at the results
            let results: Vec<Result<R>> = handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        error!("Rank {rank} panicked");
                        Err(Error::communication(rank, "rank panicked"))
                    })
                })
                .collect();

            results.into_iter().collect()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::distributed::{COORDINATOR, Candidate};

    #[test]
    fn rejects_empty_cluster() {
        assert!(LocalCluster::run(0, |_| Ok(())).is_err());
    }

    #[test]
    fn ranks_and_size() {
        let ranks = LocalCluster::run(6, |comm| Ok((comm.rank(), comm.size()))).unwrap();
        assert_eq!(ranks, (0..6).map(|r| (r, 6)).collect::<Vec<_>>());
    }

    #[test]
    fn point_to_point_preserves_order() {
        let received = LocalCluster::run(2, |comm| {
            if comm.rank() == 1 {
                for k in 0..10 {
                    comm.send(0, &Message::LocalBest(Some(Candidate::new(k as f64, vec![], k))))?;
                }
                Ok(Vec::new())
            } else {
                (0..10)
                    .map(|_| match comm.recv(1)? {
                        Message::LocalBest(Some(c)) => Ok(c.order),
                        _ => Err(Error::communication(0, "unexpected")),
                    })
                    .collect()
            }
        })
        .unwrap();

        assert_eq!(received[0], (0..10).collect::<Vec<u64>>());
    }

    #[test]
    fn dead_peer_is_reported() {
        let result = LocalCluster::run(3, |comm| {
            if comm.rank() == 2 {
                // leaves without reporting
                return Ok(None);
            }

            if comm.rank() == COORDINATOR {
                comm.recv(1)?;
                comm.recv(2)?;
            } else {
                comm.send(COORDINATOR, &Message::LocalBest(None))?;
            }
            Ok(Some(()))
        });

        match result {
            Err(Error::CommunicationFailure { rank, .. }) => assert_eq!(rank, COORDINATOR),
            other => panic!("expected communication failure, got {other:?}"),
        }
    }

    #[test]
    fn panicking_peer_is_reported() {
        let result = LocalCluster::run(2, |comm| {
            if comm.rank() == 1 {
                panic!("boom");
            }
            comm.recv(1).map(|_| ())
        });

        assert!(matches!(result, Err(Error::CommunicationFailure { .. })));
    }
}
