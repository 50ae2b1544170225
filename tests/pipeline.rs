use anyhow::Result;
use candle_core::Device;

use fraudgraph::datasets::synthetic_example;
use fraudgraph::models::{Hyperparameters, ModelKind};
use fraudgraph::training::{TrainConfig, Trainer};

fn quick_config() -> TrainConfig {
    TrainConfig {
        epochs: 2,
        batch_size: 4,
        ..TrainConfig::default()
    }
}

fn train_and_check(kind: ModelKind) -> Result<()> {
    let device = Device::Cpu;
    let data = synthetic_example(123, &device)?;
    let summary =
        Trainer::new(quick_config()).run(kind, &Hyperparameters::default(), &data, &device)?;

    assert_eq!(summary.epochs.len(), 2);
    for epoch in &summary.epochs {
        assert!(epoch.loss.is_finite());
        assert!((0.0..=1.0).contains(&epoch.accuracy));
    }

    let test_len = data.test_nodes.dim(0)?;
    assert_eq!(summary.report.predictions.dims(), &[test_len]);
    assert_eq!(summary.report.probabilities.dims(), &[test_len, 2]);
    assert_eq!(summary.report.labels.dims(), &[test_len]);
    assert!((0.0..=1.0).contains(&summary.report.accuracy));
    Ok(())
}

#[test]
fn test_player2vec_end_to_end() -> Result<()> {
    train_and_check(ModelKind::Player2vec)
}

#[test]
fn test_fd_gars_end_to_end() -> Result<()> {
    train_and_check(ModelKind::FdGars)
}

#[test]
fn test_spam_gcn_end_to_end() -> Result<()> {
    train_and_check(ModelKind::SpamGcn)
}

#[test]
fn test_semi_gnn_end_to_end() -> Result<()> {
    train_and_check(ModelKind::SemiGnn)
}

#[test]
fn test_semi_gnn_trains_without_walk_pairs() -> Result<()> {
    let device = Device::Cpu;
    let data = synthetic_example(123, &device)?;
    let config = TrainConfig {
        epochs: 1,
        batch_size: 4,
        walk_length: 0,
        ..TrainConfig::default()
    };
    let summary = Trainer::new(config).run(
        ModelKind::SemiGnn,
        &Hyperparameters::default(),
        &data,
        &device,
    )?;
    assert_eq!(summary.epochs.len(), 1);
    assert!(summary.epochs[0].loss.is_finite());
    Ok(())
}
