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
pub struct Player2vecConfig {
    /// Units in the per-relation convolution.
    pub hidden1: usize,
    /// Width of the attended representation fed to the classifier.
    pub encoding: usize,
}

/// One graph convolution per relation, combined by a learned softmax
/// attention over relations, with a linear head on top. Consumes
/// symmetric-normalized propagation matrices.
pub struct Player2vec {
    convs: Vec<DenseGcnConv>,
    attention: Tensor,
    project: Linear,
    classify: Linear,
    varmap: VarMap,
    optimizer: MomentumSgd,
}

impl Player2vec {
    pub fn new(config: &Player2vecConfig, info: &GraphInfo, device: &Device) -> Result<Self> {
        if config.hidden1 == 0 || config.encoding == 0 {
            return Err(Error::InvalidConfig(
                "player2vec layer widths must be positive".to_string(),
            ));
        }
        if info.num_relations == 0 {
            return Err(Error::InvalidConfig(
                "player2vec needs at least one relation".to_string(),
            ));
        }
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let mut convs = Vec::with_capacity(info.num_relations);
        for relation in 0..info.num_relations {
            convs.push(DenseGcnConv::new(
                info.feature_dim,
                config.hidden1,
                vs.pp(format!("relation_{relation}")),
            )?);
        }
        let attention = vs.get_with_hints(info.num_relations, "attention", Init::Const(1.0))?;
        let project = xavier_linear(config.hidden1, config.encoding, vs.pp("project"))?;
        let classify = xavier_linear(config.encoding, info.num_classes, vs.pp("classify"))?;
        let optimizer = MomentumSgd::new(varmap.all_vars(), ParamsMomentumSgd::default())?;
        Ok(Self {
            convs,
            attention,
            project,
            classify,
            varmap,
            optimizer,
        })
    }

    pub fn parameters(&self) -> Vec<candle_core::Var> {
        self.varmap.all_vars()
    }

    fn logits(&self, features: &Tensor, adjacency: &[Tensor]) -> Result<Tensor> {
        if adjacency.len() != self.convs.len() {
            return Err(Error::ShapeMismatch(format!(
                "expected {} propagation matrices, got {}",
                self.convs.len(),
                adjacency.len()
            )));
        }
        let mut per_relation = Vec::with_capacity(self.convs.len());
        for (conv, adj) in self.convs.iter().zip(adjacency) {
            per_relation.push(conv.forward(features, adj)?.relu()?);
        }
        let stacked = Tensor::stack(&per_relation, 0)?;
        let weights = ops::softmax(&self.attention, 0)?.reshape((self.convs.len(), 1, 1))?;
        let fused = stacked.broadcast_mul(&weights)?.sum(0)?;
        let h = self.project.forward(&fused)?.relu()?;
        Ok(self.classify.forward(&h)?)
    }
}

impl FraudModel for Player2vec {
    fn train_step(&mut self, inputs: &StepInputs) -> Result<TrainMetrics> {
        self.optimizer.set_learning_rate(inputs.learning_rate);
        self.optimizer.set_momentum(inputs.momentum);

        let logits = self.logits(inputs.features, inputs.adjacency)?;
        let batch_logits = logits.i(&inputs.batch.nodes)?;
        let targets = one_hot_to_classes(&inputs.batch.labels)?;
        let loss = loss::cross_entropy(&batch_logits, &targets)?;
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
        let logits = self.logits(inputs.features, inputs.adjacency)?;
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

    #[test]
    fn test_rejects_missing_relations() {
        let info = GraphInfo {
            num_nodes: 4,
            feature_dim: 3,
            num_classes: 2,
            num_relations: 0,
        };
        let config = Player2vecConfig {
            hidden1: 16,
            encoding: 4,
        };
        assert!(matches!(
            Player2vec::new(&config, &info, &Device::Cpu),
            Err(Error::InvalidConfig(_))
        ));
    }
}
