mod traits;
pub use traits::{Batch, EvalInputs, FraudModel, PairBatch, StepInputs, TestReport, TrainMetrics};
mod utils;

mod optim;
pub use optim::{MomentumSgd, ParamsMomentumSgd};

mod gcn;
pub use gcn::DenseGcnConv;

mod fdgars;
pub use fdgars::{FdGars, FdGarsConfig};
mod player2vec;
pub use player2vec::{Player2vec, Player2vecConfig};
mod semi_gnn;
pub use semi_gnn::{SemiGnn, SemiGnnConfig};
mod spam_gcn;
pub use spam_gcn::{SpamGcn, SpamGcnConfig};

mod factory;
pub use factory::{build_model, Hyperparameters, ModelKind};
