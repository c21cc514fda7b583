use serde::{Serialize, Deserialize};

use crate::layers::{conv::Conv2d, dense::Dense, flatten::Flatten, pool::MaxPool2d};
use crate::math::{Shape, Tensor3};

/// One stage of a network. Serialized with a `"type"` tag so a saved model
/// is readable on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Layer {
    Conv2d(Conv2d),
    MaxPool2d(MaxPool2d),
    Flatten(Flatten),
    Dense(Dense),
}

impl Layer {
    /// Name used in the model summary and diagram.
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Conv2d(_) => "Conv2D",
            Layer::MaxPool2d(_) => "MaxPooling2D",
            Layer::Flatten(_) => "Flatten",
            Layer::Dense(_) => "Dense",
        }
    }

    pub fn output_shape(&self, input: Shape) -> Shape {
        match self {
            Layer::Conv2d(l) => l.output_shape(input),
            Layer::MaxPool2d(l) => l.output_shape(input),
            Layer::Flatten(l) => l.output_shape(input),
            Layer::Dense(l) => l.output_shape(input),
        }
    }

    /// Output shape for `input`, or why this layer cannot take it. Unlike
    /// `output_shape` this also checks the stored tensors, so it is safe on
    /// a deserialized model.
    pub fn try_output_shape(&self, input: Shape) -> std::result::Result<Shape, String> {
        match self {
            Layer::Conv2d(l) => {
                let fan_in = l.in_channels * l.kernel * l.kernel;
                if input.channels != l.in_channels {
                    return Err(format!("Conv2d expects {} channels, got {}", l.in_channels, input));
                }
                if l.kernel == 0 || (l.weights.rows, l.weights.cols) != (l.filters, fan_in) {
                    return Err(format!(
                        "Conv2d weights are {}×{}, expected {}×{}",
                        l.weights.rows, l.weights.cols, l.filters, fan_in
                    ));
                }
                if l.weights.data.len() != l.filters * fan_in || l.biases.len() != l.filters {
                    return Err("Conv2d tensor sizes do not match its filter count".into());
                }
            }
            Layer::Dense(l) => {
                if input.len() != l.weights.rows {
                    return Err(format!("Dense expects {} inputs, got {}", l.weights.rows, input));
                }
                if l.weights.cols != l.units
                    || l.weights.data.len() != l.weights.rows * l.units
                    || l.biases.len() != l.units
                {
                    return Err(format!("Dense tensor sizes do not match {} units", l.units));
                }
            }
            Layer::MaxPool2d(l) => {
                if l.pool == 0 {
                    return Err("MaxPool2d with a zero window".into());
                }
            }
            Layer::Flatten(_) => {}
        }
        Ok(self.output_shape(input))
    }

    pub fn param_count(&self) -> usize {
        match self {
            Layer::Conv2d(l) => l.param_count(),
            Layer::Dense(l) => l.param_count(),
            Layer::MaxPool2d(_) | Layer::Flatten(_) => 0,
        }
    }

    pub fn forward(&mut self, input: Tensor3) -> Tensor3 {
        match self {
            Layer::Conv2d(l) => l.forward(input),
            Layer::MaxPool2d(l) => l.forward(input),
            Layer::Flatten(l) => l.forward(input),
            Layer::Dense(l) => l.forward(input),
        }
    }

    pub fn backward(&mut self, grad: Tensor3, input_shape: Shape) -> Tensor3 {
        match self {
            Layer::Conv2d(l) => l.backward(grad),
            Layer::MaxPool2d(l) => l.backward(grad, input_shape),
            Layer::Flatten(l) => l.backward(grad, input_shape),
            Layer::Dense(l) => l.backward(grad, input_shape),
        }
    }

    pub fn zero_grads(&mut self) {
        match self {
            Layer::Conv2d(l) => l.zero_grads(),
            Layer::Dense(l) => l.zero_grads(),
            Layer::MaxPool2d(_) | Layer::Flatten(_) => {}
        }
    }

    /// Trainable tensors paired with their accumulated gradients.
    pub fn params_and_grads(&mut self) -> Vec<(&mut [f32], &[f32])> {
        match self {
            Layer::Conv2d(l) => l.params_and_grads(),
            Layer::Dense(l) => l.params_and_grads(),
            Layer::MaxPool2d(_) | Layer::Flatten(_) => Vec::new(),
        }
    }

    pub fn tensors(&self) -> Vec<&[f32]> {
        match self {
            Layer::Conv2d(l) => l.tensors(),
            Layer::Dense(l) => l.tensors(),
            Layer::MaxPool2d(_) | Layer::Flatten(_) => Vec::new(),
        }
    }

    pub fn tensors_mut(&mut self) -> Vec<&mut [f32]> {
        match self {
            Layer::Conv2d(l) => l.tensors_mut(),
            Layer::Dense(l) => l.tensors_mut(),
            Layer::MaxPool2d(_) | Layer::Flatten(_) => Vec::new(),
        }
    }
}
