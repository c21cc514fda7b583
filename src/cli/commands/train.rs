use crate::cli::args::TrainArgs;
use crate::config::RunConfig;
use crate::error::Result;
use crate::train::train_network;

pub fn run_train(args: TrainArgs) -> Result<()> {
    let mut run = match &args.config {
        Some(path) => RunConfig::load_json(path)?,
        None => RunConfig::default(),
    };
    run.apply_overrides(args.arch, &args.overrides());
    run.validate()?;
    log::debug!("run configuration: {:?}", run);

    let report = train_network(args.arch, &run)?;
    if let Some(last) = report.history.last() {
        println!(
            "{}: trained {} epochs, loss {:.4}, accuracy {:.4}",
            args.arch.name(),
            last.epoch,
            last.loss,
            last.accuracy
        );
    }
    println!("Model saved to {}", report.model_path.display());
    Ok(())
}
