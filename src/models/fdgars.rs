use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{loss, ops, Linear, Module, Optimizer, VarBuilder, VarMap};

use super::utils::{one_hot_accuracy, one_hot_to_classes, xavier_linear};
use super::{
    DenseGcnConv, EvalInputs, FraudModel, MomentumSgd, ParamsMomentumSgd, StepInputs, TestReport,
    TrainMetrics,
};
use crate::datasets::GraphInfo;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct FdGarsConfig {
    /// Units in the first convolution layer.
    pub hidden1: usize,
    /// Units in the second convolution layer.
    pub hidden2: usize,
    /// Width of the fused representation fed to the classifier.
    pub encoding: usize,
}

/// Two stacked graph convolutions per relation, fused by averaging, with a
/// linear head on top. Consumes symmetric-normalized propagation matrices.
pub struct FdGars {
    convs: Vec<(DenseGcnConv, DenseGcnConv)>,
    project: Linear,
    classify: Linear,
    varmap: VarMap,
    optimizer: MomentumSgd,
}

impl FdGars {
    pub fn new(config: &FdGarsConfig, info: &GraphInfo, device: &Device) -> Result<Self> {
        if config.hidden1 == 0 || config.hidden2 == 0 || config.encoding == 0 {
            return Err(Error::InvalidConfig(
                "fd-gars layer widths must be positive".to_string(),
            ));
        }
        if info.num_relations == 0 {
            return Err(Error::InvalidConfig(
                "fd-gars needs at least one relation".to_string(),
            ));
        }
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let mut convs = Vec::with_capacity(info.num_relations);
        for relation in 0..info.num_relations {
            let vs = vs.pp(format!("relation_{relation}"));
            convs.push((
                DenseGcnConv::new(info.feature_dim, config.hidden1, vs.pp("conv1"))?,
                DenseGcnConv::new(config.hidden1, config.hidden2, vs.pp("conv2"))?,
            ));
        }
        let project = xavier_linear(config.hidden2, config.encoding, vs.pp("project"))?;
        let classify = xavier_linear(config.encoding, info.num_classes, vs.pp("classify"))?;
        let optimizer = MomentumSgd::new(varmap.all_vars(), ParamsMomentumSgd::default())?;
        Ok(Self {
            convs,
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
        for ((conv1, conv2), adj) in self.convs.iter().zip(adjacency) {
            let h = conv1.forward(features, adj)?.relu()?;
            per_relation.push(conv2.forward(&h, adj)?.relu()?);
        }
        let fused = Tensor::stack(&per_relation, 0)?.mean(0)?;
        let h = self.project.forward(&fused)?.relu()?;
        Ok(self.classify.forward(&h)?)
    }
}

impl FraudModel for FdGars {
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
    fn test_rejects_zero_width_layers() {
        let info = GraphInfo {
            num_nodes: 4,
            feature_dim: 3,
            num_classes: 2,
            num_relations: 1,
        };
        let config = FdGarsConfig {
            hidden1: 0,
            hidden2: 16,
            encoding: 4,
        };
        assert!(matches!(
            FdGars::new(&config, &info, &Device::Cpu),
            Err(Error::InvalidConfig(_))
        ));
    }
}
