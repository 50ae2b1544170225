use std::path::PathBuf;

use anyhow::Result;
use candle_core::Device;
use clap::{Parser, ValueEnum};

use fraudgraph::datasets::{load_dblp, load_yelp, synthetic_example, GraphData};
use fraudgraph::models::{Hyperparameters, ModelKind};
use fraudgraph::training::{TrainConfig, Trainer};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DatasetName {
    /// DBLP author graph exported to dblp.npz
    Dblp,
    /// YelpChi review graph exported to CSV tables
    Yelp,
    /// Small built-in review graph
    Example,
}

#[derive(Parser)]
#[command(name = "fraudgraph")]
#[command(about = "Graph neural network toolbox for fraud detection", long_about = None)]
struct Cli {
    /// Model variant to train
    #[arg(long, value_enum, default_value_t = ModelKind::SemiGnn)]
    model: ModelKind,

    /// Dataset to train on
    #[arg(long, value_enum, default_value = "example")]
    dataset: DatasetName,

    /// Directory holding the dataset files
    #[arg(long, default_value = "datasets")]
    data_dir: PathBuf,

    /// Seed for walks, negative sampling and splits
    #[arg(long, default_value = "123")]
    seed: u64,

    /// Number of training epochs
    #[arg(long, default_value = "5")]
    epoch_num: usize,

    /// Supervised examples per batch
    #[arg(long, default_value = "2")]
    batch_size: usize,

    #[arg(long, default_value = "0.01")]
    learning_rate: f64,

    #[arg(long, default_value = "0.9")]
    momentum: f64,

    /// Steps per random walk
    #[arg(long, default_value = "2")]
    walk_length: usize,

    /// Walks started from every node
    #[arg(long, default_value = "3")]
    walks_per_node: usize,

    /// Labelled fraction used for training when the loader splits itself
    #[arg(long, default_value = "0.6")]
    train_fraction: f64,

    /// First graph convolution width
    #[arg(long, default_value = "16")]
    hidden1: usize,

    /// Second graph convolution width
    #[arg(long, default_value = "16")]
    hidden2: usize,

    /// Node embedding width after the convolutions
    #[arg(long, default_value = "4")]
    gcn_output: usize,

    /// Neighbor slots gathered per review
    #[arg(long, default_value = "7")]
    review_num_sample: usize,

    /// Review-review convolution width
    #[arg(long, default_value = "5")]
    gcn_dim: usize,

    #[arg(long, default_value = "64")]
    encoding1: usize,

    #[arg(long, default_value = "64")]
    encoding2: usize,

    #[arg(long, default_value = "64")]
    encoding3: usize,

    #[arg(long, default_value = "64")]
    encoding4: usize,

    /// Learned embedding width for walk-trained models
    #[arg(long, default_value = "128")]
    init_emb_size: usize,

    #[arg(long, default_value = "64")]
    semi_encoding1: usize,

    #[arg(long, default_value = "32")]
    semi_encoding2: usize,

    #[arg(long, default_value = "32")]
    semi_encoding3: usize,

    /// Weight of the supervised loss term against the skip-gram term
    #[arg(long, default_value = "0.5")]
    semi_alpha: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let device = Device::Cpu;

    let data: GraphData = match cli.dataset {
        DatasetName::Dblp => load_dblp(cli.data_dir.join("dblp.npz"), &device)?,
        DatasetName::Yelp => load_yelp(&cli.data_dir, cli.train_fraction, cli.seed, &device)?,
        DatasetName::Example => synthetic_example(cli.seed, &device)?,
    };

    let hyper = Hyperparameters {
        hidden1: cli.hidden1,
        hidden2: cli.hidden2,
        gcn_output: cli.gcn_output,
        review_num_sample: cli.review_num_sample,
        gcn_dim: cli.gcn_dim,
        encoding1: cli.encoding1,
        encoding2: cli.encoding2,
        encoding3: cli.encoding3,
        encoding4: cli.encoding4,
        init_emb_size: cli.init_emb_size,
        semi_encoding1: cli.semi_encoding1,
        semi_encoding2: cli.semi_encoding2,
        semi_encoding3: cli.semi_encoding3,
        semi_alpha: cli.semi_alpha,
    };
    let config = TrainConfig {
        epochs: cli.epoch_num,
        batch_size: cli.batch_size,
        learning_rate: cli.learning_rate,
        momentum: cli.momentum,
        walk_length: cli.walk_length,
        walks_per_node: cli.walks_per_node,
        seed: cli.seed,
    };

    let summary = Trainer::new(config).run(cli.model, &hyper, &data, &device)?;
    println!(
        "Finished {} with test accuracy {:5.2}%",
        cli.model,
        100.0 * summary.report.accuracy
    );
    Ok(())
}
