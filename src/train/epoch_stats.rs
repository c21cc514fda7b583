use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by `train_loop`.
///
/// Sent over `TrainConfig::progress_tx` when configured, and appended to the
/// run's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean training loss over all samples in this epoch.
    pub loss: f32,
    /// Categorical accuracy on the training samples, as seen during the epoch.
    pub accuracy: f32,
    pub val_loss: Option<f32>,
    pub val_accuracy: Option<f32>,
    /// Wall-clock duration of this epoch in milliseconds.
    pub elapsed_ms: u64,
}
