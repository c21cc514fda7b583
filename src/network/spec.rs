use rand::{rngs::StdRng, SeedableRng};
use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::layers::{Conv2d, Dense, Flatten, Layer, MaxPool2d};
use crate::math::Shape;
use crate::network::network::Network;

/// Describes one layer of a network independently of its weights.
///
/// Input sizes are not stored: they follow from the previous layer's output
/// shape when the spec is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Conv2d { filters: usize, kernel: usize, activation: ActivationFunction },
    MaxPool2d { pool: usize },
    Flatten,
    Dense { units: usize, activation: ActivationFunction },
}

/// A fully serializable description of a network architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Used as the model file stem and checkpoint prefix.
    pub name: String,
    pub input_shape: Shape,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// Instantiates the layers with weights drawn from a seeded RNG.
    ///
    /// # Panics
    /// Panics if a layer cannot accept the previous layer's output shape
    /// (e.g. a dense layer fed a spatial map without a flatten).
    pub fn build(&self, seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut shape = self.input_shape;
        let mut layers = Vec::with_capacity(self.layers.len());

        for spec in &self.layers {
            let layer = match *spec {
                LayerSpec::Conv2d { filters, kernel, activation } => {
                    Layer::Conv2d(Conv2d::new(shape.channels, filters, kernel, activation, &mut rng))
                }
                LayerSpec::MaxPool2d { pool } => Layer::MaxPool2d(MaxPool2d::new(pool)),
                LayerSpec::Flatten => Layer::Flatten(Flatten),
                LayerSpec::Dense { units, activation } => {
                    assert!(
                        shape.is_flat(),
                        "Dense layer needs a flat input, got {}; add a Flatten first",
                        shape
                    );
                    Layer::Dense(Dense::new(shape.len(), units, activation, &mut rng))
                }
            };
            shape = layer.output_shape(shape);
            layers.push(layer);
        }

        Network::new(self.name.clone(), self.input_shape, layers)
    }
}
