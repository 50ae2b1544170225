mod normalize;
pub use normalize::normalize_adjacency;

mod adjacency;
pub use adjacency::{AdjacencyList, PADDING};
