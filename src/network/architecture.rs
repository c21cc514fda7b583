use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction::{ReLU, Softmax};
use crate::data::DatasetKind;
use crate::math::Shape;
use crate::network::spec::{LayerSpec, NetworkSpec};
use crate::optim::OptimizerConfig;

/// The three fixed topologies the lab trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// MNIST: Conv2D(32) → MaxPool → Reshape → Dense(10).
    Tf1,
    /// CIFAR-10: three Conv-Conv-Pool blocks (32, 64, 128) → Dense(1000) → Dense(10).
    Tf2,
    /// MNIST flattened: Dense(1000) → Dense(10).
    Mlp,
}

fn conv(filters: usize) -> LayerSpec {
    LayerSpec::Conv2d { filters, kernel: 3, activation: ReLU }
}

const POOL: LayerSpec = LayerSpec::MaxPool2d { pool: 2 };

impl Architecture {
    pub fn name(self) -> &'static str {
        match self {
            Architecture::Tf1 => "tf1",
            Architecture::Tf2 => "tf2",
            Architecture::Mlp => "tf_mlp",
        }
    }

    pub fn dataset(self) -> DatasetKind {
        match self {
            Architecture::Tf1 | Architecture::Mlp => DatasetKind::Mnist,
            Architecture::Tf2 => DatasetKind::Cifar10,
        }
    }

    pub fn spec(self) -> NetworkSpec {
        let (input_shape, layers) = match self {
            Architecture::Tf1 => (
                Shape::new(1, 28, 28),
                vec![
                    conv(32),
                    POOL,
                    LayerSpec::Flatten,
                    LayerSpec::Dense { units: 10, activation: Softmax },
                ],
            ),
            Architecture::Tf2 => (
                Shape::new(3, 32, 32),
                vec![
                    conv(32), conv(32), POOL,
                    conv(64), conv(64), POOL,
                    conv(128), conv(128), POOL,
                    LayerSpec::Flatten,
                    LayerSpec::Dense { units: 1000, activation: ReLU },
                    LayerSpec::Dense { units: 10, activation: Softmax },
                ],
            ),
            Architecture::Mlp => (
                Shape::flat(28 * 28),
                vec![
                    LayerSpec::Dense { units: 1000, activation: ReLU },
                    LayerSpec::Dense { units: 10, activation: Softmax },
                ],
            ),
        };
        NetworkSpec { name: self.name().to_string(), input_shape, layers }
    }

    pub fn default_optimizer(self) -> OptimizerConfig {
        match self {
            Architecture::Tf1 | Architecture::Mlp => OptimizerConfig::sgd(),
            Architecture::Tf2 => OptimizerConfig::adam(),
        }
    }

    /// Whether the test split is used as validation data during training.
    pub fn validates_on_test(self) -> bool {
        matches!(self, Architecture::Tf2)
    }

    pub fn checkpoint_dir(self) -> PathBuf {
        match self {
            Architecture::Tf1 => PathBuf::from("checkpoints"),
            Architecture::Tf2 => PathBuf::from("checkpoints_tf2"),
            Architecture::Mlp => PathBuf::from("checkpoints_mlp"),
        }
    }

    pub fn log_dir(self) -> PathBuf {
        PathBuf::from(format!("log_{}", self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_counts_match_layer_shapes() {
        // 32·(3·3·1)+32 + (14·14·32)·10+10
        assert_eq!(Architecture::Tf1.spec().build(0).param_count(), 63_050);
        // 784·1000+1000 + 1000·10+10
        assert_eq!(Architecture::Mlp.spec().build(0).param_count(), 795_010);
        assert_eq!(Architecture::Tf2.spec().build(0).param_count(), 2_346_018);
    }

    #[test]
    fn tf1_reshapes_to_fourteen_by_fourteen_by_thirty_two() {
        let net = Architecture::Tf1.spec().build(0);
        let shapes = net.layer_shapes();
        assert_eq!(shapes[2], Shape::new(32, 14, 14));
        assert_eq!(shapes[3], Shape::flat(14 * 14 * 32));
        assert_eq!(net.output_shape(), Shape::flat(10));
    }

    #[test]
    fn same_seed_builds_same_weights() {
        let a = Architecture::Tf1.spec().build(42);
        let b = Architecture::Tf1.spec().build(42);
        assert_eq!(a.tensors(), b.tensors());
    }

    #[test]
    fn file_layout_follows_the_naming_convention() {
        assert_eq!(Architecture::Mlp.checkpoint_dir(), PathBuf::from("checkpoints_mlp"));
        assert_eq!(Architecture::Mlp.log_dir(), PathBuf::from("log_tf_mlp"));
        assert_eq!(Architecture::Tf2.log_dir(), PathBuf::from("log_tf2"));
    }
}
