use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{Error, IoContext, Result};
use crate::layers::Layer;
use crate::math::{Shape, Tensor3};
use crate::network::metadata::ModelMetadata;
use crate::train::checkpoint;

/// An ordered stack of layers plus the sample shape it was built for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub input_shape: Shape,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

impl Network {
    pub fn new(name: impl Into<String>, input_shape: Shape, layers: Vec<Layer>) -> Network {
        let network = Network {
            name: name.into(),
            input_shape,
            layers,
            metadata: ModelMetadata::default(),
        };
        // Panics early on an inconsistent stack instead of mid-training.
        let _ = network.layer_shapes();
        network
    }

    /// Input shape of every layer followed by the network's output shape.
    pub fn layer_shapes(&self) -> Vec<Shape> {
        let mut shapes = Vec::with_capacity(self.layers.len() + 1);
        let mut current = self.input_shape;
        shapes.push(current);
        for layer in &self.layers {
            current = layer.output_shape(current);
            shapes.push(current);
        }
        shapes
    }

    /// `layer_shapes` without panicking: reports the first layer whose
    /// input or tensors do not fit.
    pub fn check_shapes(&self) -> Result<()> {
        let mut current = self.input_shape;
        for (i, layer) in self.layers.iter().enumerate() {
            current = layer
                .try_output_shape(current)
                .map_err(|e| Error::Model(format!("{} layer {}: {}", self.name, i, e)))?;
        }
        Ok(())
    }

    pub fn output_shape(&self) -> Shape {
        *self.layer_shapes().last().unwrap_or(&self.input_shape)
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(Layer::param_count).sum()
    }

    /// Forward pass; every layer caches what its backward pass needs.
    pub fn forward(&mut self, input: &[f32]) -> Vec<f32> {
        let mut current = Tensor3::from_vec(self.input_shape, input.to_vec());
        for layer in &mut self.layers {
            current = layer.forward(current);
        }
        current.data
    }

    /// Backward pass from ∂L/∂output, accumulating parameter gradients.
    /// Must follow a `forward` on the same sample.
    pub fn backward(&mut self, output_grad: Vec<f32>) {
        let shapes = self.layer_shapes();
        let mut grad = Tensor3::from_vec(self.output_shape(), output_grad);
        for (i, layer) in self.layers.iter_mut().enumerate().rev() {
            grad = layer.backward(grad, shapes[i]);
        }
    }

    pub fn zero_grads(&mut self) {
        self.layers.iter_mut().for_each(Layer::zero_grads);
    }

    /// Index of the highest-scoring class.
    pub fn predict(&mut self, input: &[f32]) -> usize {
        argmax(&self.forward(input))
    }

    /// All trainable tensors in layer order, as stored in a checkpoint.
    pub fn tensors(&self) -> Vec<&[f32]> {
        self.layers.iter().flat_map(Layer::tensors).collect()
    }

    pub fn tensors_mut(&mut self) -> Vec<&mut [f32]> {
        self.layers.iter_mut().flat_map(Layer::tensors_mut).collect()
    }

    /// Serializes the whole network (architecture + weights) to pretty JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).at_path(dir)?;
        }
        let mut writer = BufWriter::new(File::create(path).at_path(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().at_path(path)?;
        log::info!("saved model {} to {}", self.name, path.display());
        Ok(())
    }

    /// Deserializes a network previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network> {
        let path = path.as_ref();
        let file = File::open(path).at_path(path)?;
        let mut network: Network = serde_json::from_reader(BufReader::new(file))?;
        network.check_shapes()?;
        network.zero_grads();
        Ok(network)
    }

    /// Writes a weights-only checkpoint.
    pub fn save_weights(&self, path: impl AsRef<Path>) -> Result<()> {
        checkpoint::save(path.as_ref(), &self.tensors())
    }

    /// Restores weights from a checkpoint written for the same architecture.
    pub fn load_weights(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let tensors = checkpoint::load(path.as_ref())?;
        checkpoint::restore(&mut self.tensors_mut(), tensors)
    }
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f32]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Architecture;

    #[test]
    fn json_round_trip_keeps_shapes_and_weight_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("tf1.json");
        let net = Architecture::Tf1.spec().build(3);
        net.save_json(&path).unwrap();

        let loaded = Network::load_json(&path).unwrap();
        assert_eq!(loaded.layer_shapes(), net.layer_shapes());
        assert_eq!(loaded.param_count(), 63_050);
    }

    #[test]
    fn model_with_mismatched_layers_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        let mut net = Architecture::Mlp.spec().build(0);
        net.input_shape = Shape::flat(4);
        // serialize by hand: `Network::new` would panic on this stack
        std::fs::write(&path, serde_json::to_string(&net).unwrap()).unwrap();

        let err = Network::load_json(&path).unwrap_err();
        assert!(matches!(err, Error::Model(_)), "{}", err);
    }

    #[test]
    fn check_shapes_accepts_every_architecture() {
        for arch in [Architecture::Tf1, Architecture::Tf2, Architecture::Mlp] {
            assert!(arch.spec().build(0).check_shapes().is_ok());
        }
    }
}
