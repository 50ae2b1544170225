use std::fmt;

use candle_core::Device;
use clap::ValueEnum;

use super::{
    FdGars, FdGarsConfig, FraudModel, Player2vec, Player2vecConfig, SemiGnn, SemiGnnConfig,
    SpamGcn, SpamGcnConfig,
};
use crate::datasets::GraphInfo;
use crate::error::Result;

/// The model variants the trainer knows how to drive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModelKind {
    #[value(name = "player2vec")]
    Player2vec,
    #[value(name = "fd-gars")]
    FdGars,
    #[value(name = "spam-gcn")]
    SpamGcn,
    #[value(name = "semi-gnn")]
    SemiGnn,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Player2vec => "player2vec",
            Self::FdGars => "fd-gars",
            Self::SpamGcn => "spam-gcn",
            Self::SemiGnn => "semi-gnn",
        };
        write!(f, "{name}")
    }
}

/// Layer widths shared across the variants. Each model reads the subset
/// it cares about.
#[derive(Debug, Clone)]
pub struct Hyperparameters {
    pub hidden1: usize,
    pub hidden2: usize,
    pub gcn_output: usize,
    pub review_num_sample: usize,
    pub gcn_dim: usize,
    pub encoding1: usize,
    pub encoding2: usize,
    pub encoding3: usize,
    pub encoding4: usize,
    pub init_emb_size: usize,
    pub semi_encoding1: usize,
    pub semi_encoding2: usize,
    pub semi_encoding3: usize,
    pub semi_alpha: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            hidden1: 16,
            hidden2: 16,
            gcn_output: 4,
            review_num_sample: 7,
            gcn_dim: 5,
            encoding1: 64,
            encoding2: 64,
            encoding3: 64,
            encoding4: 64,
            init_emb_size: 128,
            semi_encoding1: 64,
            semi_encoding2: 32,
            semi_encoding3: 32,
            semi_alpha: 0.5,
        }
    }
}

pub fn build_model(
    kind: ModelKind,
    hyper: &Hyperparameters,
    info: &GraphInfo,
    device: &Device,
) -> Result<Box<dyn FraudModel>> {
    let model: Box<dyn FraudModel> = match kind {
        ModelKind::Player2vec => {
            let config = Player2vecConfig {
                hidden1: hyper.hidden1,
                encoding: hyper.gcn_output,
            };
            Box::new(Player2vec::new(&config, info, device)?)
        }
        ModelKind::FdGars => {
            let config = FdGarsConfig {
                hidden1: hyper.hidden1,
                hidden2: hyper.hidden2,
                encoding: hyper.gcn_output,
            };
            Box::new(FdGars::new(&config, info, device)?)
        }
        ModelKind::SpamGcn => {
            let config = SpamGcnConfig {
                review_num_sample: hyper.review_num_sample,
                gcn_dim: hyper.gcn_dim,
                encoding1: hyper.encoding1,
                encoding2: hyper.encoding2,
                encoding3: hyper.encoding3,
                encoding4: hyper.encoding4,
            };
            Box::new(SpamGcn::new(&config, info, device)?)
        }
        ModelKind::SemiGnn => {
            let config = SemiGnnConfig {
                init_emb_size: hyper.init_emb_size,
                encoding1: hyper.semi_encoding1,
                encoding2: hyper.semi_encoding2,
                encoding3: hyper.semi_encoding3,
                alpha: hyper.semi_alpha,
            };
            Box::new(SemiGnn::new(&config, info, device)?)
        }
    };
    Ok(model)
}
