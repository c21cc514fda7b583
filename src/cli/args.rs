//! Command-line argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;
use crate::lsmap::Decoder;
use crate::network::Architecture;

/// Keras-style training on MNIST / CIFAR-10 and calibration extraction from
/// camera raw files.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "ferrite-lab")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train one of the fixed architectures
    Train(TrainArgs),

    /// Evaluate a saved model (and a checkpoint) on the test split
    Evaluate(EvaluateArgs),

    /// Print the layer table of an architecture
    Summary(SummaryArgs),

    /// Extract the lens-shading map of DNG files into .mat files
    ExtractLsmap(LsmapArgs),

    /// Extract white balance and color matrix of raw files into .txt files
    ExtractMetadata(MetadataArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    #[arg(value_enum)]
    pub arch: Architecture,

    /// JSON run configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Learning rate (keeps the optimizer kind)
    #[arg(long)]
    pub lr: Option<f32>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Root for checkpoint, log and model directories
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Train on the first N samples only
    #[arg(long)]
    pub train_limit: Option<usize>,

    /// Scale pixels to [0, 1] instead of feeding raw 0-255 values
    #[arg(long)]
    pub normalize: bool,
}

impl TrainArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.lr,
            seed: self.seed,
            data_dir: self.data_dir.clone(),
            output_dir: self.output_dir.clone(),
            train_limit: self.train_limit,
            normalize: self.normalize,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EvaluateArgs {
    #[arg(value_enum)]
    pub arch: Architecture,

    /// Saved model; defaults to models/<name>.json
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Checkpoint epoch to evaluate after the final model (tf1, mlp)
    #[arg(long, default_value_t = 10)]
    pub checkpoint_epoch: usize,

    /// Checkpoint directory; defaults to the architecture's
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Where the tf2 diagram is written
    #[arg(long, default_value = "tf2.png")]
    pub diagram: PathBuf,

    /// Scale pixels to [0, 1]; use when the model was trained that way
    #[arg(long)]
    pub normalize: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SummaryArgs {
    #[arg(value_enum)]
    pub arch: Architecture,

    /// Also render the diagram to this PNG
    #[arg(long)]
    pub diagram: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct LsmapArgs {
    /// DNG files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory; defaults to each input's directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Decoder::Od)]
    pub decoder: Decoder,

    /// Reorder channels into canonical Bayer phase order
    #[arg(long)]
    pub rectify: bool,

    /// Also write a PNG preview per file
    #[arg(long)]
    pub preview: bool,

    /// ExifTool executable
    #[arg(long, default_value = "exiftool")]
    pub exiftool: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct MetadataArgs {
    /// Raw files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory; defaults to each input's directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}
