use candle_core::Tensor;
use rand::Rng;

use crate::error::{Error, Result};
use crate::graph::AdjacencyList;
use crate::sampling::{batch_range, PairPool};

/// Attempt budget per negative draw, scaled with the source degree.
const REJECTION_FACTOR: usize = 8;

/// One batch of skip-gram training data: pair endpoints with interleaved
/// 1/0 labels, plus the aligned slice of the supervised training set.
#[derive(Debug, Clone)]
pub struct SkipGramBatch {
    /// Source endpoint per pair (each positive followed by its negative).
    pub src: Vec<u32>,
    /// Context endpoint per pair.
    pub dst: Vec<u32>,
    /// 1.0 for sampled walk pairs, 0.0 for negatives.
    pub pair_labels: Vec<f32>,
    /// Supervised node indices for this batch.
    pub nodes: Tensor,
    /// One-hot labels aligned with `nodes`.
    pub labels: Tensor,
}

/// Builds the skip-gram batch starting at `batch_index`.
///
/// The pair window and the supervised window follow the same right-aligned
/// rule but run over different index spaces (pool position vs training-set
/// position), so they are clipped independently.
///
/// Each positive `(i, j)` is followed by one negative `(i, k)` where `k` is
/// neither `i` itself nor a neighbor of `i`, found by rejection sampling
/// with an attempt budget of `8 * (degree + 1)`. A row too dense to leave
/// any non-neighbor fails with [`Error::NegativeSamplingExhausted`].
pub fn skip_gram_batch<R: Rng>(
    batch_index: usize,
    batch_size: usize,
    pool: &PairPool,
    adj: &AdjacencyList,
    train_nodes: &Tensor,
    train_labels: &Tensor,
    rng: &mut R,
) -> Result<SkipGramBatch> {
    let num_nodes = adj.num_nodes();
    let window = batch_range(batch_index, batch_size, pool.len());
    let selected = &pool[window];
    let mut src = Vec::with_capacity(selected.len() * 2);
    let mut dst = Vec::with_capacity(selected.len() * 2);
    let mut pair_labels = Vec::with_capacity(selected.len() * 2);
    for &(i, j) in selected {
        src.push(i);
        dst.push(j);
        pair_labels.push(1.0);

        let negative = draw_negative(i, adj, num_nodes, rng)?;
        src.push(i);
        dst.push(negative);
        pair_labels.push(0.0);
    }

    let train_size = train_nodes.dim(0)?;
    let window = batch_range(batch_index, batch_size, train_size);
    let nodes = train_nodes.narrow(0, window.start, window.len())?;
    let labels = train_labels.narrow(0, window.start, window.len())?;

    Ok(SkipGramBatch {
        src,
        dst,
        pair_labels,
        nodes,
        labels,
    })
}

fn draw_negative<R: Rng>(
    node: u32,
    adj: &AdjacencyList,
    num_nodes: usize,
    rng: &mut R,
) -> Result<u32> {
    let attempts = REJECTION_FACTOR * (adj.degree(node as usize) + 1);
    for _ in 0..attempts {
        let candidate = rng.gen_range(0..num_nodes) as u32;
        if candidate != node && !adj.contains(node as usize, candidate) {
            return Ok(candidate);
        }
    }
    Err(Error::NegativeSamplingExhausted { node, attempts })
}
