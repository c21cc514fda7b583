use std::path::PathBuf;

use crate::config::RunConfig;
use crate::data::{self, Dataset};
use crate::error::{Error, Result};
use crate::network::{Architecture, Network};
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// What a finished training run produced.
#[derive(Debug)]
pub struct TrainReport {
    pub network: Network,
    pub history: Vec<EpochStats>,
    pub model_path: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub log_dir: PathBuf,
}

/// Loads the architecture's dataset, reshaped for its input layer.
pub fn load_splits(arch: Architecture, run: &RunConfig) -> Result<(Dataset, Dataset)> {
    let (train, test) = data::load(arch.dataset(), run.data_dir_for(arch), run.normalize)?;
    let (train, test) = if arch.spec().input_shape.is_flat() {
        (train.flattened(), test.flattened())
    } else {
        (train, test)
    };
    let input = arch.spec().input_shape;
    for (split, ds) in [("training", &train), ("test", &test)] {
        if ds.shape.len() != input.len() {
            return Err(Error::Dataset(format!(
                "{} images are {} but {} takes {}",
                split,
                ds.shape,
                arch.name(),
                input
            )));
        }
    }
    let train = match run.train_limit {
        Some(n) => train.truncated(n),
        None => train,
    };
    Ok((train, test))
}

pub fn model_path(arch: Architecture, run: &RunConfig) -> PathBuf {
    run.output_dir.join(&run.model_dir).join(format!("{}.json", arch.name()))
}

/// The whole training pipeline for one architecture: load the dataset,
/// build the network, bind the optimizer, fit with per-epoch checkpoints
/// and event logs, then save the final model.
pub fn train_network(arch: Architecture, run: &RunConfig) -> Result<TrainReport> {
    run.validate()?;
    let (train, test) = load_splits(arch, run)?;
    train_on(arch, run, &train, &test)
}

/// `train_network` with the splits already in memory.
pub fn train_on(arch: Architecture, run: &RunConfig, train: &Dataset, test: &Dataset) -> Result<TrainReport> {
    run.validate()?;
    let mut network = arch.spec().build(run.seed);
    network.metadata.dataset = Some(arch.dataset().name().to_string());
    network.metadata.output_labels = Some(arch.dataset().class_labels());

    let optimizer_config = run.optimizer_for(arch);
    log::info!("optimizer: {:?}", optimizer_config);
    let mut optimizer = optimizer_config.build();

    let checkpoint_dir = run.output_dir.join(arch.checkpoint_dir());
    let log_dir = run.output_dir.join(arch.log_dir());
    let mut config = TrainConfig::new(run.epochs, run.batch_size);
    config.seed = run.seed;
    config.shuffle = run.shuffle;
    config.checkpoint_dir = Some(checkpoint_dir.clone());
    config.log_dir = Some(log_dir.clone());

    let validation = arch.validates_on_test().then_some(test);
    let history = train_loop(&mut network, optimizer.as_mut(), train, validation, &config)?;

    let model_path = model_path(arch, run);
    network.save_json(&model_path)?;

    Ok(TrainReport { network, history, model_path, checkpoint_dir, log_dir })
}
