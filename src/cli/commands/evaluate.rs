use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::cli::args::EvaluateArgs;
use crate::config::RunConfig;
use crate::data::Dataset;
use crate::error::{IoContext, Result};
use crate::eval::{evaluate, predict_classes, ConfusionMatrix};
use crate::network::{diagram, summary, Architecture, Network};
use crate::train::checkpoint::checkpoint_path;
use crate::train::trainer::{load_splits, model_path};

/// Prints the final model's accuracy, then the accuracy after restoring the
/// checkpoint weights into it.
pub fn evaluate_checkpoint<W: Write>(
    network: &mut Network,
    test: &Dataset,
    checkpoint: &Path,
    epoch: usize,
    out: &mut W,
) -> Result<()> {
    let acc = evaluate(network, test).accuracy;
    writeln!(out, "Acc = {}", acc).at_path("<stdout>")?;

    network.load_weights(checkpoint)?;
    let acc = evaluate(network, test).accuracy;
    writeln!(out, "Epoch {} Acc = {}", epoch, acc).at_path("<stdout>")?;
    Ok(())
}

/// Prints accuracy and the confusion matrix over the test split.
pub fn evaluate_confusion<W: Write>(network: &mut Network, test: &Dataset, out: &mut W) -> Result<ConfusionMatrix> {
    let predicted = predict_classes(network, test);
    let truth: Vec<usize> = (0..test.len()).map(|i| test.label(i)).collect();
    let matrix = ConfusionMatrix::from_predictions(&truth, &predicted, test.n_classes);
    writeln!(out, "Acc = {}", matrix.accuracy()).at_path("<stdout>")?;
    writeln!(out, "{}", matrix).at_path("<stdout>")?;
    Ok(matrix)
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let arch = args.arch;
    let run = RunConfig {
        data_dir: args.data_dir.clone(),
        normalize: args.normalize,
        ..RunConfig::default()
    };
    let path = args.model.clone().unwrap_or_else(|| model_path(arch, &run));
    let mut network = Network::load_json(&path)?;
    let (_, test) = load_splits(arch, &run)?;
    let mut stdout = io::stdout().lock();

    match arch {
        Architecture::Tf1 | Architecture::Mlp => {
            let dir: PathBuf = args.checkpoint_dir.clone().unwrap_or_else(|| arch.checkpoint_dir());
            let checkpoint = checkpoint_path(&dir, arch.name(), args.checkpoint_epoch);
            evaluate_checkpoint(&mut network, &test, &checkpoint, args.checkpoint_epoch, &mut stdout)
        }
        Architecture::Tf2 => {
            writeln!(stdout, "{}", summary::summary(&network)).at_path("<stdout>")?;
            diagram::render_diagram(&network, &args.diagram)?;
            evaluate_confusion(&mut network, &test, &mut stdout).map(|_| ())
        }
    }
}
