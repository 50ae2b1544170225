use thiserror::Error;

/// Errors raised by the preprocessing and batching pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Adjacency matrix is not square.
    #[error("adjacency matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    /// Tensors that must agree in shape do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// A node index points outside the graph.
    #[error("node index {index} out of range for {num_nodes} nodes")]
    NodeOutOfRange { index: usize, num_nodes: usize },
    /// Adjacency entries must be non-negative.
    #[error("negative adjacency entry at ({row}, {col})")]
    NegativeEntry { row: usize, col: usize },
    /// A model was configured with hyperparameters it cannot use.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Rejection sampling ran out of attempts on a near-complete row.
    #[error("no negative sample found for node {node} after {attempts} attempts")]
    NegativeSamplingExhausted { node: u32, attempts: usize },
    /// Tensor backend error.
    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
