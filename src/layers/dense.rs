use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::ActivationFunction, math::{Matrix, Shape, Tensor3}};

/// Fully-connected layer: `a = σ(x · W + b)`.
///
/// `weights` is `(input_size, units)`, matching the kernel layout the
/// checkpoint format stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub units: usize,
    pub weights: Matrix,
    pub biases: Vec<f32>,
    pub activation: ActivationFunction,
    #[serde(skip)]
    input: Vec<f32>,
    #[serde(skip)]
    pre_activation: Vec<f32>, // z = xW + b, needed for the activation derivative
    #[serde(skip)]
    weights_grad: Matrix,
    #[serde(skip)]
    biases_grad: Vec<f32>,
}

impl Dense {
    /// He init for ReLU layers, Xavier for everything else. Biases start at zero.
    pub fn new<R: Rng>(input_size: usize, units: usize, activation: ActivationFunction, rng: &mut R) -> Dense {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, units, input_size, rng),
            _ => Matrix::xavier(input_size, units, input_size, rng),
        };
        Dense {
            units,
            weights,
            biases: vec![0.0; units],
            activation,
            input: Vec::new(),
            pre_activation: Vec::new(),
            weights_grad: Matrix::zeros(input_size, units),
            biases_grad: vec![0.0; units],
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn output_shape(&self, input: Shape) -> Shape {
        assert_eq!(
            input.len(),
            self.input_size(),
            "Dense layer expects {} inputs, got {}",
            self.input_size(),
            input
        );
        Shape::flat(self.units)
    }

    pub fn param_count(&self) -> usize {
        self.weights.data.len() + self.biases.len()
    }

    pub fn forward(&mut self, input: Tensor3) -> Tensor3 {
        let mut z = self.weights.vec_mul(&input.data);
        for (v, b) in z.iter_mut().zip(&self.biases) {
            *v += b;
        }
        let mut a = z.clone();
        self.activation.apply(&mut a);
        self.input = input.data;
        self.pre_activation = z;
        Tensor3::from_vec(Shape::flat(self.units), a)
    }

    /// `grad` is ∂L/∂a for this layer; returns ∂L/∂x for the previous one.
    /// Parameter gradients are accumulated, not overwritten.
    pub fn backward(&mut self, grad: Tensor3, input_shape: Shape) -> Tensor3 {
        let mut delta = grad.data;
        self.activation.backprop(&self.pre_activation, &mut delta);
        self.weights_grad.add_outer(&self.input, &delta);
        for (g, d) in self.biases_grad.iter_mut().zip(&delta) {
            *g += d;
        }
        Tensor3::from_vec(input_shape, self.weights.mul_vec(&delta))
    }

    pub fn zero_grads(&mut self) {
        if self.weights_grad.rows != self.weights.rows || self.weights_grad.cols != self.weights.cols {
            self.weights_grad = Matrix::zeros(self.weights.rows, self.weights.cols);
        } else {
            self.weights_grad.fill(0.0);
        }
        self.biases_grad.clear();
        self.biases_grad.resize(self.units, 0.0);
    }

    pub fn params_and_grads(&mut self) -> Vec<(&mut [f32], &[f32])> {
        vec![
            (&mut self.weights.data[..], &self.weights_grad.data[..]),
            (&mut self.biases[..], &self.biases_grad[..]),
        ]
    }

    pub fn tensors(&self) -> Vec<&[f32]> {
        vec![&self.weights.data, &self.biases]
    }

    pub fn tensors_mut(&mut self) -> Vec<&mut [f32]> {
        vec![&mut self.weights.data, &mut self.biases]
    }
}
