pub mod tour;
pub mod visited;

pub use tour::*;
pub use visited::VisitedSet;
