pub mod best_bound;
pub mod branch_and_bound;
pub mod distributed;
pub mod shared_memory;

pub use best_bound::*;
pub use branch_and_bound::*;
pub use distributed::{DistributedDispatcher, solve_distributed};
pub use shared_memory::SharedMemoryDispatcher;
