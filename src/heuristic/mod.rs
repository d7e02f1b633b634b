//! Randomized restarts of crossing removal.
//!
//! Every restart shuffles the points into a random tour and then uncrosses edge pairs until no
//! two edges of the tour cross. The result is usually good but carries no optimality guarantee,
//! so all solutions produced here are marked as not exact.

pub mod distributed;
pub mod local_search;
pub mod shared_memory;

pub use distributed::DistributedLocalSearch;
pub use local_search::*;
pub use shared_memory::ParallelLocalSearch;
