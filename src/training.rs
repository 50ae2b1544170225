use candle_core::{Device, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::datasets::GraphData;
use crate::error::{Error, Result};
use crate::graph::{normalize_adjacency, AdjacencyList};
use crate::models::{
    build_model, Batch, EvalInputs, Hyperparameters, ModelKind, PairBatch, StepInputs, TestReport,
};
use crate::sampling::{batch_range, pairs_to_matrix, random_walk_pairs, skip_gram_batch, PairPool};

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    /// Steps per random walk when a model trains on walk pairs.
    pub walk_length: usize,
    /// Walks started from every node.
    pub walks_per_node: usize,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            batch_size: 2,
            learning_rate: 0.01,
            momentum: 0.9,
            walk_length: 2,
            walks_per_node: 3,
            seed: 123,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EpochMetrics {
    pub loss: f32,
    pub accuracy: f32,
}

#[derive(Debug)]
pub struct TrainingSummary {
    pub epochs: Vec<EpochMetrics>,
    pub report: TestReport,
}

/// Model-specific preprocessing of the relation matrices, computed once
/// before the epoch loop.
enum AdjacencyInput {
    /// Symmetrically normalized matrices fed unchanged every batch.
    Normalized(Vec<Tensor>),
    /// Gather indices and masks around the normalized review graph.
    NeighborLists(Vec<Tensor>),
    /// Walk-derived pair pools; count matrices and skip-gram batches are
    /// drawn from them on every step.
    WalkPairs {
        lists: Vec<AdjacencyList>,
        pools: Vec<PairPool>,
    },
}

/// Runs the epoch/batch loop for any model kind and evaluates on the
/// held-out split once training ends.
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        kind: ModelKind,
        hyper: &Hyperparameters,
        data: &GraphData,
        device: &Device,
    ) -> Result<TrainingSummary> {
        data.validate()?;
        let info = data.info()?;
        if self.config.batch_size == 0 {
            return Err(Error::InvalidConfig(
                "batch size must be positive".to_string(),
            ));
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let adjacency = self.prepare(kind, hyper, data, &mut rng, device)?;
        let mut model = build_model(kind, hyper, &info, device)?;

        let train_size = data.train_nodes.dim(0)?;
        let mut epochs = Vec::with_capacity(self.config.epochs);
        for epoch in 1..=self.config.epochs {
            let mut total_loss = 0.0;
            let mut total_accuracy = 0.0;
            let mut batches = 0usize;
            for start in (0..train_size).step_by(self.config.batch_size) {
                let (tensors, batch) = batch_inputs(
                    start,
                    self.config.batch_size,
                    data,
                    &adjacency,
                    info.num_nodes,
                    &mut rng,
                    device,
                )?;
                let inputs = StepInputs {
                    features: &data.features,
                    adjacency: &tensors,
                    batch,
                    learning_rate: self.config.learning_rate,
                    momentum: self.config.momentum,
                };
                let metrics = match model.train_step(&inputs) {
                    Ok(metrics) => metrics,
                    Err(err) => {
                        eprintln!("aborting training at epoch {epoch}, batch offset {start}");
                        return Err(err);
                    }
                };
                total_loss += metrics.loss;
                total_accuracy += metrics.accuracy;
                batches += 1;
            }
            let loss = total_loss / batches as f32;
            let accuracy = total_accuracy / batches as f32;
            println!(
                "Epoch: {epoch:3} Train loss: {loss:8.5} Train accuracy: {:5.2}%",
                100.0 * accuracy
            );
            epochs.push(EpochMetrics { loss, accuracy });
        }

        let tensors = eval_adjacency(&adjacency, info.num_nodes, device)?;
        let eval = EvalInputs {
            features: &data.features,
            adjacency: &tensors,
            nodes: &data.test_nodes,
            labels: &data.test_labels,
        };
        let report = match model.test_step(&eval) {
            Ok(report) => report,
            Err(err) => {
                eprintln!("evaluation failed after training");
                return Err(err);
            }
        };
        println!("Test accuracy: {:5.2}%", 100.0 * report.accuracy);
        Ok(TrainingSummary { epochs, report })
    }

    fn prepare<R: Rng>(
        &self,
        kind: ModelKind,
        hyper: &Hyperparameters,
        data: &GraphData,
        rng: &mut R,
        device: &Device,
    ) -> Result<AdjacencyInput> {
        match kind {
            ModelKind::Player2vec | ModelKind::FdGars => {
                let mut normalized = Vec::with_capacity(data.relations.len());
                for adj in &data.relations {
                    normalized.push(normalize_adjacency(adj)?);
                }
                Ok(AdjacencyInput::Normalized(normalized))
            }
            ModelKind::SpamGcn => {
                if data.relations.len() != 3 {
                    return Err(Error::ShapeMismatch(
                        "spam-gcn expects user-review, review-review and item-review relations"
                            .to_string(),
                    ));
                }
                let users = AdjacencyList::from_dense(&data.relations[0], true)?;
                let items = AdjacencyList::from_dense(&data.relations[2], true)?;
                let (user_idx, user_mask) =
                    users.neighbor_tensors(hyper.review_num_sample, device)?;
                let (item_idx, item_mask) =
                    items.neighbor_tensors(hyper.review_num_sample, device)?;
                let comment = normalize_adjacency(&data.relations[1])?;
                Ok(AdjacencyInput::NeighborLists(vec![
                    user_idx, user_mask, comment, item_idx, item_mask,
                ]))
            }
            ModelKind::SemiGnn => {
                let mut lists = Vec::with_capacity(data.relations.len());
                let mut pools = Vec::with_capacity(data.relations.len());
                for adj in &data.relations {
                    let list = AdjacencyList::from_dense(adj, false)?;
                    pools.push(random_walk_pairs(
                        &list,
                        self.config.walk_length,
                        self.config.walks_per_node,
                        rng,
                    ));
                    lists.push(list);
                }
                Ok(AdjacencyInput::WalkPairs { lists, pools })
            }
        }
    }
}

/// Assembles one training step: the adjacency tensors the model consumes
/// plus the supervised (and, for walk-trained models, skip-gram) batch
/// starting at `start`.
fn batch_inputs<R: Rng>(
    start: usize,
    batch_size: usize,
    data: &GraphData,
    adjacency: &AdjacencyInput,
    num_nodes: usize,
    rng: &mut R,
    device: &Device,
) -> Result<(Vec<Tensor>, Batch)> {
    match adjacency {
        AdjacencyInput::Normalized(tensors) | AdjacencyInput::NeighborLists(tensors) => {
            let train_size = data.train_nodes.dim(0)?;
            let window = batch_range(start, batch_size, train_size);
            let nodes = data.train_nodes.narrow(0, window.start, window.len())?;
            let labels = data.train_labels.narrow(0, window.start, window.len())?;
            Ok((
                tensors.clone(),
                Batch {
                    nodes,
                    labels,
                    pairs: None,
                },
            ))
        }
        AdjacencyInput::WalkPairs { lists, pools } => {
            let mut tensors = Vec::with_capacity(pools.len());
            for pool in pools {
                tensors.push(pairs_to_matrix(pool, num_nodes, device)?);
            }
            let mut src = Vec::new();
            let mut dst = Vec::new();
            let mut pair_labels = Vec::new();
            let mut supervised = None;
            for (list, pool) in lists.iter().zip(pools) {
                let batch = skip_gram_batch(
                    start,
                    batch_size,
                    pool,
                    list,
                    &data.train_nodes,
                    &data.train_labels,
                    rng,
                )?;
                src.extend(batch.src);
                dst.extend(batch.dst);
                pair_labels.extend(batch.pair_labels);
                supervised = Some((batch.nodes, batch.labels));
            }
            let Some((nodes, labels)) = supervised else {
                return Err(Error::InvalidConfig(
                    "walk sampling needs at least one relation".to_string(),
                ));
            };
            let pairs = if src.is_empty() {
                None
            } else {
                let len = src.len();
                Some(PairBatch {
                    src: Tensor::from_vec(src, len, device)?,
                    dst: Tensor::from_vec(dst, len, device)?,
                    labels: Tensor::from_vec(pair_labels, len, device)?,
                })
            };
            Ok((tensors, Batch { nodes, labels, pairs }))
        }
    }
}

fn eval_adjacency(
    adjacency: &AdjacencyInput,
    num_nodes: usize,
    device: &Device,
) -> Result<Vec<Tensor>> {
    match adjacency {
        AdjacencyInput::Normalized(tensors) | AdjacencyInput::NeighborLists(tensors) => {
            Ok(tensors.clone())
        }
        AdjacencyInput::WalkPairs { pools, .. } => {
            let mut tensors = Vec::with_capacity(pools.len());
            for pool in pools {
                tensors.push(pairs_to_matrix(pool, num_nodes, device)?);
            }
            Ok(tensors)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::datasets::synthetic_example;

    use super::*;

    #[test]
    fn test_rejects_zero_batch_size() {
        let device = Device::Cpu;
        let data = synthetic_example(1, &device).unwrap();
        let config = TrainConfig {
            batch_size: 0,
            ..TrainConfig::default()
        };
        let trainer = Trainer::new(config);
        assert!(matches!(
            trainer.run(ModelKind::FdGars, &Hyperparameters::default(), &data, &device),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_spam_gcn_needs_three_relations() {
        let device = Device::Cpu;
        let mut data = synthetic_example(1, &device).unwrap();
        data.relations.pop();
        let trainer = Trainer::new(TrainConfig::default());
        assert!(matches!(
            trainer.run(
                ModelKind::SpamGcn,
                &Hyperparameters::default(),
                &data,
                &device
            ),
            Err(Error::ShapeMismatch(_))
        ));
    }
}
