use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{loss, ops, Linear, Module, Optimizer, VarBuilder, VarMap};

use super::utils::{masked_gather, one_hot_accuracy, one_hot_to_classes, xavier_linear};
use super::{
    DenseGcnConv, EvalInputs, FraudModel, MomentumSgd, ParamsMomentumSgd, StepInputs, TestReport,
    TrainMetrics,
};
use crate::datasets::GraphInfo;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct SpamGcnConfig {
    /// Neighbor slots gathered per review on the user and item sides.
    pub review_num_sample: usize,
    /// Output width of the review-review propagation.
    pub gcn_dim: usize,
    /// First dense layer on the user branch.
    pub encoding1: usize,
    /// Second dense layer on the user branch.
    pub encoding2: usize,
    /// First dense layer on the item branch.
    pub encoding3: usize,
    /// Second dense layer on the item branch.
    pub encoding4: usize,
}

/// Review-spam model. Gathers a fixed number of neighbor features along
/// the user-review and item-review relations, runs the review-review
/// relation through a graph convolution, and classifies the concatenated
/// branch outputs.
///
/// Expects `adjacency` to hold five tensors in order: user neighbor
/// indices, user neighbor mask, normalized review-review adjacency, item
/// neighbor indices, item neighbor mask.
pub struct SpamGcn {
    user_encode1: Linear,
    user_encode2: Linear,
    item_encode1: Linear,
    item_encode2: Linear,
    review_conv: DenseGcnConv,
    classify: Linear,
    feature_dim: usize,
    width: usize,
    varmap: VarMap,
    optimizer: MomentumSgd,
}

impl SpamGcn {
    pub fn new(config: &SpamGcnConfig, info: &GraphInfo, device: &Device) -> Result<Self> {
        if config.review_num_sample == 0 {
            return Err(Error::InvalidConfig(
                "spam-gcn needs at least one neighbor slot per review".to_string(),
            ));
        }
        if config.gcn_dim == 0
            || config.encoding1 == 0
            || config.encoding2 == 0
            || config.encoding3 == 0
            || config.encoding4 == 0
        {
            return Err(Error::InvalidConfig(
                "spam-gcn layer widths must be positive".to_string(),
            ));
        }
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let gathered = config.review_num_sample * info.feature_dim;
        let user_encode1 = xavier_linear(gathered, config.encoding1, vs.pp("user_encode1"))?;
        let user_encode2 = xavier_linear(config.encoding1, config.encoding2, vs.pp("user_encode2"))?;
        let item_encode1 = xavier_linear(gathered, config.encoding3, vs.pp("item_encode1"))?;
        let item_encode2 = xavier_linear(config.encoding3, config.encoding4, vs.pp("item_encode2"))?;
        let review_conv = DenseGcnConv::new(info.feature_dim, config.gcn_dim, vs.pp("review_conv"))?;
        let classify = xavier_linear(
            config.encoding2 + config.gcn_dim + config.encoding4,
            info.num_classes,
            vs.pp("classify"),
        )?;
        let optimizer = MomentumSgd::new(varmap.all_vars(), ParamsMomentumSgd::default())?;
        Ok(Self {
            user_encode1,
            user_encode2,
            item_encode1,
            item_encode2,
            review_conv,
            classify,
            feature_dim: info.feature_dim,
            width: config.review_num_sample,
            varmap,
            optimizer,
        })
    }

    pub fn parameters(&self) -> Vec<candle_core::Var> {
        self.varmap.all_vars()
    }

    fn logits(&self, features: &Tensor, adjacency: &[Tensor]) -> Result<Tensor> {
        let [user_idx, user_mask, review_adj, item_idx, item_mask] = adjacency else {
            return Err(Error::ShapeMismatch(format!(
                "expected 5 adjacency tensors, got {}",
                adjacency.len()
            )));
        };
        let user = self.branch(features, user_idx, user_mask, &self.user_encode1, &self.user_encode2)?;
        let item = self.branch(features, item_idx, item_mask, &self.item_encode1, &self.item_encode2)?;
        let review = self.review_conv.forward(features, review_adj)?.relu()?;
        let fused = Tensor::cat(&[&user, &review, &item], 1)?;
        Ok(self.classify.forward(&fused)?)
    }

    /// Gathers neighbor features for one relation and encodes the
    /// flattened window. Padded slots contribute zeros through the mask.
    fn branch(
        &self,
        features: &Tensor,
        indices: &Tensor,
        mask: &Tensor,
        encode1: &Linear,
        encode2: &Linear,
    ) -> Result<Tensor> {
        let gathered = masked_gather(features, indices, mask)?;
        let num_nodes = gathered.dim(0)?;
        let window = gathered.reshape((num_nodes, self.width * self.feature_dim))?;
        let h = encode1.forward(&window)?.relu()?;
        Ok(encode2.forward(&h)?.relu()?)
    }
}

impl FraudModel for SpamGcn {
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
