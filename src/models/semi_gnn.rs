use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{loss, ops, Init, Linear, Module, Optimizer, VarBuilder, VarMap};

use super::utils::{one_hot_accuracy, one_hot_to_classes, xavier_linear};
use super::{
    DenseGcnConv, EvalInputs, FraudModel, MomentumSgd, ParamsMomentumSgd, StepInputs, TestReport,
    TrainMetrics,
};
use crate::datasets::GraphInfo;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct SemiGnnConfig {
    /// Width of the learned node embeddings.
    pub init_emb_size: usize,
    /// Units after the per-relation propagation.
    pub encoding1: usize,
    /// Units in the perceptron layer.
    pub encoding2: usize,
    /// Width of the final node representation.
    pub encoding3: usize,
    /// Weight of the supervised loss term; the skip-gram term gets the rest.
    pub alpha: f64,
}

/// Semi-supervised model over walk-derived pair matrices. Learns its own
/// node embeddings instead of consuming features, propagates them through
/// each relation's row-normalized pair matrix, and trains with a joint
/// supervised/skip-gram objective.
pub struct SemiGnn {
    embeddings: Tensor,
    convs: Vec<DenseGcnConv>,
    attention: Tensor,
    encode2: Linear,
    encode3: Linear,
    classify: Linear,
    alpha: f64,
    varmap: VarMap,
    optimizer: MomentumSgd,
}

impl SemiGnn {
    pub fn new(config: &SemiGnnConfig, info: &GraphInfo, device: &Device) -> Result<Self> {
        if config.init_emb_size == 0
            || config.encoding1 == 0
            || config.encoding2 == 0
            || config.encoding3 == 0
        {
            return Err(Error::InvalidConfig(
                "semi-gnn layer widths must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.alpha) {
            return Err(Error::InvalidConfig(format!(
                "semi-gnn alpha must lie in [0, 1], got {}",
                config.alpha
            )));
        }
        if info.num_relations == 0 {
            return Err(Error::InvalidConfig(
                "semi-gnn needs at least one relation".to_string(),
            ));
        }
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let embeddings = vs.get_with_hints(
            (info.num_nodes, config.init_emb_size),
            "embedding",
            Init::Randn {
                mean: 0.0,
                stdev: 1.0,
            },
        )?;
        let mut convs = Vec::with_capacity(info.num_relations);
        for relation in 0..info.num_relations {
            convs.push(DenseGcnConv::new(
                config.init_emb_size,
                config.encoding1,
                vs.pp(format!("relation_{relation}")),
            )?);
        }
        let attention = vs.get_with_hints(info.num_relations, "attention", Init::Const(1.0))?;
        let encode2 = xavier_linear(config.encoding1, config.encoding2, vs.pp("encode2"))?;
        let encode3 = xavier_linear(config.encoding2, config.encoding3, vs.pp("encode3"))?;
        let classify = xavier_linear(config.encoding3, info.num_classes, vs.pp("classify"))?;
        let optimizer = MomentumSgd::new(varmap.all_vars(), ParamsMomentumSgd::default())?;
        Ok(Self {
            embeddings,
            convs,
            attention,
            encode2,
            encode3,
            classify,
            alpha: config.alpha,
            varmap,
            optimizer,
        })
    }

    pub fn parameters(&self) -> Vec<candle_core::Var> {
        self.varmap.all_vars()
    }

    /// Final node representations, `[n, encoding3]`.
    fn encode(&self, adjacency: &[Tensor]) -> Result<Tensor> {
        if adjacency.len() != self.convs.len() {
            return Err(Error::ShapeMismatch(format!(
                "expected {} pair matrices, got {}",
                self.convs.len(),
                adjacency.len()
            )));
        }
        let mut per_relation = Vec::with_capacity(self.convs.len());
        for (conv, adj) in self.convs.iter().zip(adjacency) {
            let propagation = row_normalize(adj)?;
            per_relation.push(conv.forward(&self.embeddings, &propagation)?.relu()?);
        }
        let stacked = Tensor::stack(&per_relation, 0)?;
        let weights = ops::softmax(&self.attention, 0)?.reshape((self.convs.len(), 1, 1))?;
        let fused = stacked.broadcast_mul(&weights)?.sum(0)?;
        let h = self.encode2.forward(&fused)?.relu()?;
        Ok(self.encode3.forward(&h)?)
    }
}

/// Scales every row to sum to one; rows without mass are left at zero.
fn row_normalize(adj: &Tensor) -> Result<Tensor> {
    let row_sum = adj.sum_keepdim(1)?.maximum(1e-12)?;
    Ok(adj.broadcast_div(&row_sum)?)
}

impl FraudModel for SemiGnn {
    fn train_step(&mut self, inputs: &StepInputs) -> Result<TrainMetrics> {
        self.optimizer.set_learning_rate(inputs.learning_rate);
        self.optimizer.set_momentum(inputs.momentum);

        let z = self.encode(inputs.adjacency)?;
        let logits = self.classify.forward(&z)?;
        let batch_logits = logits.i(&inputs.batch.nodes)?;
        let targets = one_hot_to_classes(&inputs.batch.labels)?;
        let supervised = loss::cross_entropy(&batch_logits, &targets)?;

        let loss = match inputs.batch.pairs.as_ref() {
            Some(pairs) => {
                let zi = z.index_select(&pairs.src, 0)?;
                let zj = z.index_select(&pairs.dst, 0)?;
                let pair_logits = (zi * zj)?.sum(D::Minus1)?;
                let unsupervised =
                    loss::binary_cross_entropy_with_logit(&pair_logits, &pairs.labels)?;
                ((supervised * self.alpha)? + (unsupervised * (1.0 - self.alpha))?)?
            }
            None => supervised,
        };
        self.optimizer.backward_step(&loss)?;

        let probabilities = ops::softmax(&batch_logits.detach(), D::Minus1)?;
        Ok(TrainMetrics {
            loss: loss.to_scalar::<f32>()?,
            accuracy: one_hot_accuracy(&batch_logits, &inputs.batch.labels)?,
            predictions: probabilities.argmax(D::Minus1)?,
            probabilities,
        })
    }

    fn test_step(&self, inputs: &EvalInputs) -> Result<TestReport> {
        let z = self.encode(inputs.adjacency)?;
        let logits = self.classify.forward(&z)?;
        let batch_logits = logits.i(inputs.nodes)?;
        let probabilities = ops::softmax(&batch_logits, D::Minus1)?;
        Ok(TestReport {
            accuracy: one_hot_accuracy(&batch_logits, inputs.labels)?,
            predictions: probabilities.argmax(D::Minus1)?,
            probabilities,
            labels: one_hot_to_classes(inputs.labels)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use candle_core::Device;

    use super::*;

    fn info() -> GraphInfo {
        GraphInfo {
            num_nodes: 6,
            feature_dim: 4,
            num_classes: 2,
            num_relations: 2,
        }
    }

    #[test]
    fn test_rejects_alpha_outside_unit_interval() {
        let config = SemiGnnConfig {
            init_emb_size: 8,
            encoding1: 8,
            encoding2: 4,
            encoding3: 4,
            alpha: 1.5,
        };
        assert!(matches!(
            SemiGnn::new(&config, &info(), &Device::Cpu),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_row_normalize_handles_empty_rows() -> Result<()> {
        let device = Device::Cpu;
        let adj = Tensor::from_vec(vec![2.0f32, 2.0, 0.0, 0.0], (2, 2), &device)?;
        let normalized = row_normalize(&adj)?;
        let entries = normalized.to_vec2::<f32>()?;
        assert!((entries[0][0] - 0.5).abs() < 1e-6);
        assert!((entries[0][1] - 0.5).abs() < 1e-6);
        assert_eq!(entries[1], vec![0.0, 0.0]);
        Ok(())
    }
}
