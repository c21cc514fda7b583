use serde::{Serialize, Deserialize};

use crate::math::Shape;

/// A labelled image partition held entirely in memory.
///
/// Images are stored back to back, each `shape.len()` values in channel-major
/// order. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub shape: Shape,
    pub images: Vec<f32>,
    pub labels: Vec<u8>,
    pub n_classes: usize,
}

impl Dataset {
    pub fn new(shape: Shape, images: Vec<f32>, labels: Vec<u8>, n_classes: usize) -> Dataset {
        assert_eq!(
            images.len(),
            labels.len() * shape.len(),
            "image buffer does not hold {} samples of {:?}",
            labels.len(),
            shape
        );
        Dataset { shape, images, labels, n_classes }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn image(&self, index: usize) -> &[f32] {
        let n = self.shape.len();
        &self.images[index * n..(index + 1) * n]
    }

    pub fn label(&self, index: usize) -> usize {
        self.labels[index] as usize
    }

    pub fn one_hot(&self, index: usize) -> Vec<f32> {
        let mut v = vec![0.0; self.n_classes];
        v[self.label(index)] = 1.0;
        v
    }

    /// Same samples viewed as flat vectors, e.g. 28×28 → 784.
    pub fn flattened(self) -> Dataset {
        Dataset { shape: Shape::flat(self.shape.len()), ..self }
    }

    /// Keeps only the first `n` samples.
    pub fn truncated(mut self, n: usize) -> Dataset {
        let n = n.min(self.len());
        self.images.truncate(n * self.shape.len());
        self.labels.truncate(n);
        self
    }
}

/// The two standard datasets the lab knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Mnist,
    Cifar10,
}

const CIFAR10_LABELS: [&str; 10] = [
    "airplane", "automobile", "bird", "cat", "deer",
    "dog", "frog", "horse", "ship", "truck",
];

impl DatasetKind {
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Mnist => "mnist",
            DatasetKind::Cifar10 => "cifar10",
        }
    }

    /// Directory searched when none is configured.
    pub fn default_dir(self) -> &'static str {
        match self {
            DatasetKind::Mnist => "data/mnist",
            DatasetKind::Cifar10 => "data/cifar-10-batches-bin",
        }
    }

    pub fn class_labels(self) -> Vec<String> {
        match self {
            DatasetKind::Mnist => (0..10).map(|d| d.to_string()).collect(),
            DatasetKind::Cifar10 => CIFAR10_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Maps raw bytes to `f32`, optionally scaling `[0, 255]` to `[0, 1]`.
pub fn pixels_to_f32(bytes: &[u8], normalize: bool) -> Vec<f32> {
    let scale = if normalize { 1.0 / 255.0 } else { 1.0 };
    bytes.iter().map(|&p| p as f32 * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Dataset {
        Dataset::new(Shape::new(1, 2, 2), (0..8).map(|v| v as f32).collect(), vec![3, 1], 4)
    }

    #[test]
    fn indexes_images_and_labels() {
        let ds = tiny();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.image(1), &[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(ds.one_hot(0), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn flattening_keeps_the_data() {
        let ds = tiny().flattened();
        assert_eq!(ds.shape, Shape::flat(4));
        assert_eq!(ds.image(0), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn pixels_scale_only_when_normalizing() {
        assert_eq!(pixels_to_f32(&[0, 255], true), vec![0.0, 1.0]);
        assert_eq!(pixels_to_f32(&[0, 255], false), vec![0.0, 255.0]);
    }
}
