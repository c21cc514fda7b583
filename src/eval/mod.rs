//! Accuracy, loss and confusion matrices over a whole dataset.

pub mod confusion;

pub use confusion::ConfusionMatrix;

use crate::data::Dataset;
use crate::loss::CrossEntropyLoss;
use crate::network::{argmax, Network};

/// Mean loss and categorical accuracy over a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
}

/// Evaluates `network` on every sample of `dataset` (no gradient work).
pub fn evaluate(network: &mut Network, dataset: &Dataset) -> Evaluation {
    let n = dataset.len();
    if n == 0 {
        return Evaluation { loss: 0.0, accuracy: 0.0 };
    }
    let mut total_loss = 0.0f64;
    let mut correct = 0usize;
    for i in 0..n {
        let output = network.forward(dataset.image(i));
        total_loss += CrossEntropyLoss::loss(&output, &dataset.one_hot(i)) as f64;
        if argmax(&output) == dataset.label(i) {
            correct += 1;
        }
    }
    Evaluation {
        loss: (total_loss / n as f64) as f32,
        accuracy: correct as f32 / n as f32,
    }
}

/// Predicted class for every sample, in dataset order.
pub fn predict_classes(network: &mut Network, dataset: &Dataset) -> Vec<usize> {
    (0..dataset.len()).map(|i| network.predict(dataset.image(i))).collect()
}
