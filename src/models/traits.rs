use candle_core::Tensor;

use crate::error::Result;

/// Positive/negative context pairs for a skip-gram style auxiliary loss.
#[derive(Debug, Clone)]
pub struct PairBatch {
    /// Source endpoint per pair, u32.
    pub src: Tensor,
    /// Context endpoint per pair, u32.
    pub dst: Tensor,
    /// 1.0 for sampled walk pairs, 0.0 for negatives.
    pub labels: Tensor,
}

/// The supervised slice handed to one training step.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Node indices, `[batch]`, u32.
    pub nodes: Tensor,
    /// One-hot labels aligned with `nodes`, `[batch, classes]`, f32.
    pub labels: Tensor,
    /// Context pairs, for models with a walk-based loss term.
    pub pairs: Option<PairBatch>,
}

/// Arguments for one optimization step.
pub struct StepInputs<'a> {
    pub features: &'a Tensor,
    pub adjacency: &'a [Tensor],
    pub batch: Batch,
    pub learning_rate: f64,
    pub momentum: f64,
}

/// Arguments for an evaluation pass over held-out nodes.
pub struct EvalInputs<'a> {
    pub features: &'a Tensor,
    pub adjacency: &'a [Tensor],
    pub nodes: &'a Tensor,
    pub labels: &'a Tensor,
}

/// What a training step reports back.
#[derive(Debug, Clone)]
pub struct TrainMetrics {
    pub loss: f32,
    pub accuracy: f32,
    pub predictions: Tensor,
    pub probabilities: Tensor,
}

/// What an evaluation pass reports back.
#[derive(Debug, Clone)]
pub struct TestReport {
    pub accuracy: f32,
    pub predictions: Tensor,
    pub probabilities: Tensor,
    pub labels: Tensor,
}

/// Uniform capability surface shared by every model variant.
pub trait FraudModel {
    fn train_step(&mut self, inputs: &StepInputs) -> Result<TrainMetrics>;
    fn test_step(&self, inputs: &EvalInputs) -> Result<TestReport>;
}
