use candle_core::Tensor;

use crate::error::{Error, Result};

/// Symmetric degree normalization with self-loops:
/// `D^(-1/2) (A + I) D^(-1/2)` where `D` holds the row sums of `A + I`.
///
/// Every node picks up degree >= 1 from the self-loop, so the result is
/// finite even for isolated nodes, and it stays symmetric whenever the
/// input is symmetric.
pub fn normalize_adjacency(adj: &Tensor) -> Result<Tensor> {
    let (rows, cols) = adj.dims2()?;
    if rows != cols {
        return Err(Error::NotSquare { rows, cols });
    }
    let looped = adj.add(&Tensor::eye(rows, adj.dtype(), adj.device())?)?;
    let inv_sqrt_degree = looped.sum(1)?.powf(-0.5)?;
    let normalized = looped
        .broadcast_mul(&inv_sqrt_degree.reshape((rows, 1))?)?
        .broadcast_mul(&inv_sqrt_degree.reshape((1, cols))?)?;
    Ok(normalized)
}
