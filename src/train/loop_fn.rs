use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::Dataset;
use crate::error::Result;
use crate::eval::evaluate;
use crate::loss::CrossEntropyLoss;
use crate::network::{argmax, Network};
use crate::optim::{self, Optimizer};
use crate::train::checkpoint::checkpoint_path;
use crate::train::epoch_stats::EpochStats;
use crate::train::event_log::EventLog;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs and returns the stats of every
/// completed epoch.
///
/// After each epoch a weights-only checkpoint is written to
/// `<checkpoint_dir>/<name>.<epoch:02>.ckpt` and the epoch's stats are
/// appended to the event log, when those directories are configured.
///
/// # Early termination
/// The loop breaks early if the `progress_tx` receiver has been dropped or
/// `config.stop_flag` is set.
///
/// # Panics
/// Panics if `train` is empty or `batch_size == 0`.
pub fn train_loop(
    network: &mut Network,
    optimizer: &mut dyn Optimizer,
    train: &Dataset,
    validation: Option<&Dataset>,
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    assert!(!train.is_empty(), "training set must not be empty");
    assert!(config.batch_size > 0, "batch_size must be at least 1");
    assert_eq!(
        train.shape.len(),
        network.input_shape.len(),
        "dataset samples do not fit the network input"
    );

    let event_log = config.log_dir.as_ref().map(EventLog::create).transpose()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut history = Vec::with_capacity(config.epochs);

    log::info!(
        "training {} ({} params) on {} samples for {} epochs, batch size {}",
        network.name,
        network.param_count(),
        train.len(),
        config.epochs,
        config.batch_size
    );

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            break;
        }

        let t_start = Instant::now();

        // ── One full pass over the training data ───────────────────────────
        let (loss, accuracy) = run_one_epoch(network, optimizer, train, config, &mut rng);

        // ── Validation ────────────────────────────────────────────────────
        let (val_loss, val_accuracy) = match validation {
            Some(ds) => {
                let ev = evaluate(network, ds);
                (Some(ev.loss), Some(ev.accuracy))
            }
            None => (None, None),
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            loss,
            accuracy,
            val_loss,
            val_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        log_epoch(&stats);

        if let Some(dir) = &config.checkpoint_dir {
            network.save_weights(checkpoint_path(dir, &network.name, epoch))?;
        }
        if let Some(log) = &event_log {
            log.record(&stats)?;
        }
        network.metadata.epochs_trained = Some(epoch);
        history.push(stats.clone());

        // ── Emit progress ─────────────────────────────────────────────────
        if let Some(ref tx) = config.progress_tx {
            if tx.send(stats).is_err() {
                log::warn!("progress receiver dropped, stopping after epoch {}", epoch);
                break;
            }
        }
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
}

fn log_epoch(stats: &EpochStats) {
    let validation = match (stats.val_loss, stats.val_accuracy) {
        (Some(l), Some(a)) => format!(" - val_loss: {:.4} - val_categorical_accuracy: {:.4}", l, a),
        _ => String::new(),
    };
    log::info!(
        "epoch {}/{} - {}ms - loss: {:.4} - categorical_accuracy: {:.4}{}",
        stats.epoch,
        stats.total_epochs,
        stats.elapsed_ms,
        stats.loss,
        stats.accuracy,
        validation
    );
}

/// Runs one full epoch of mini-batch training. The stop flag is only
/// consulted between epochs, so the returned mean loss and accuracy always
/// cover every sample.
fn run_one_epoch(
    network: &mut Network,
    optimizer: &mut dyn Optimizer,
    train: &Dataset,
    config: &TrainConfig,
    rng: &mut StdRng,
) -> (f32, f32) {
    let n = train.len();
    let mut total_loss = 0.0f64;
    let mut correct = 0usize;

    let mut indices: Vec<usize> = (0..n).collect();
    if config.shuffle {
        indices.shuffle(rng);
    }

    for batch in indices.chunks(config.batch_size) {
        network.zero_grads();

        // Accumulate gradients over the mini-batch.
        for &idx in batch {
            let expected = train.one_hot(idx);
            let output = network.forward(train.image(idx));

            total_loss += CrossEntropyLoss::loss(&output, &expected) as f64;
            if argmax(&output) == train.label(idx) {
                correct += 1;
            }

            network.backward(CrossEntropyLoss::derivative(&output, &expected));
        }

        // Average and apply.
        optim::apply(optimizer, network, 1.0 / batch.len() as f32);
    }

    ((total_loss / n as f64) as f32, correct as f32 / n as f32)
}
