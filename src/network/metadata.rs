use serde::{Deserialize, Serialize};

/// Optional annotations stored alongside a saved Network.
/// All fields default so a bare model file still deserializes.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelMetadata {
    /// Dataset the network was trained on (`"mnist"`, `"cifar10"`).
    pub dataset: Option<String>,
    /// Human-readable class labels for the output layer.
    pub output_labels: Option<Vec<String>>,
    /// Number of epochs actually completed before the model was saved.
    pub epochs_trained: Option<usize>,
}
