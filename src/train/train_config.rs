use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// - `progress_tx`: optional channel; one `EpochStats` per completed epoch.
///   If the receiver is dropped the loop terminates early.
/// - `stop_flag`: when set to `true` from another thread the loop stops
///   after the current epoch.
/// - `checkpoint_dir` / `log_dir`: when `None`, no checkpoints or event logs
///   are written.
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub seed: u64,
    pub shuffle: bool,
    pub checkpoint_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal config: shuffling on, nothing written to disk.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            seed: 0,
            shuffle: true,
            checkpoint_dir: None,
            log_dir: None,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
