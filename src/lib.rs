pub mod algorithm;
pub mod distributed;
pub mod errors;
pub mod exact;
pub mod geometry;
pub mod heuristic;
pub mod io;
pub mod log;
pub mod utils;

pub mod prelude {
    pub use super::algorithm::*;
    pub use super::errors::*;
    pub use super::exact::{
        BestBound, DistributedDispatcher, Pruning, SearchConfiguration, SharedMemoryDispatcher,
        TiePolicy,
    };
    pub use super::geometry::*;
    pub use super::heuristic::{
        DistributedLocalSearch, LocalSearchConfiguration, ParallelLocalSearch, UncrossStrategy,
    };
    pub use super::io::*;
    pub use super::utils::*;
}

#[cfg(test)]
mod testing;
