use serde::{Deserialize, Serialize};

use crate::geometry::{Node, Point};

/// A complete tour offered during the final reduction. `order` breaks ties between equal costs
/// (the smaller one wins), which keeps the reduction independent of arrival order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub cost: f64,
    pub tour: Vec<Node>,
    pub order: u64,
}

impl Candidate {
    pub fn new(cost: f64, tour: Vec<Node>, order: u64) -> Self {
        Self { cost, tour, order }
    }

    /// Returns true iff `self` should replace `other` in the reduction.
    pub fn beats(&self, other: &Candidate) -> bool {
        self.cost < other.cost || (self.cost == other.cost && self.order < other.order)
    }
}

/// Everything that travels between ranks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// The instance, sent from the coordinator to every other rank before any work starts.
    Problem {
        points: Vec<Point>,
        warm_start: Option<Vec<Node>>,
    },
    /// Best solution of one rank (if it found any), sent to the coordinator at the end.
    LocalBest(Option<Candidate>),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Problem { .. } => "Problem",
            Message::LocalBest(_) => "LocalBest",
        }
    }
}
