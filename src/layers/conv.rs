use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::ActivationFunction, math::{Matrix, Shape, Tensor3}};

/// 2-D convolution, stride 1, "same" zero padding.
///
/// `weights` has one row per filter; each row holds the kernel as
/// `(in_channel, ky, kx)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2d {
    pub filters: usize,
    pub in_channels: usize,
    pub kernel: usize,
    pub weights: Matrix,
    pub biases: Vec<f32>,
    pub activation: ActivationFunction,
    #[serde(skip)]
    input: Option<Tensor3>,
    #[serde(skip)]
    pre_activation: Vec<f32>,
    #[serde(skip)]
    weights_grad: Matrix,
    #[serde(skip)]
    biases_grad: Vec<f32>,
}

impl Conv2d {
    pub fn new<R: Rng>(
        in_channels: usize,
        filters: usize,
        kernel: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Conv2d {
        let fan_in = in_channels * kernel * kernel;
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(filters, fan_in, fan_in, rng),
            _ => Matrix::xavier(filters, fan_in, fan_in, rng),
        };
        Conv2d {
            filters,
            in_channels,
            kernel,
            weights,
            biases: vec![0.0; filters],
            activation,
            input: None,
            pre_activation: Vec::new(),
            weights_grad: Matrix::zeros(filters, fan_in),
            biases_grad: vec![0.0; filters],
        }
    }

    fn pad(&self) -> isize {
        ((self.kernel - 1) / 2) as isize
    }

    pub fn output_shape(&self, input: Shape) -> Shape {
        assert_eq!(
            input.channels, self.in_channels,
            "Conv2d expects {} input channels, got {}",
            self.in_channels, input.channels
        );
        Shape::new(self.filters, input.height, input.width)
    }

    pub fn param_count(&self) -> usize {
        self.weights.data.len() + self.biases.len()
    }

    pub fn forward(&mut self, input: Tensor3) -> Tensor3 {
        let out_shape = self.output_shape(input.shape);
        let (h, w, k, pad) = (input.shape.height, input.shape.width, self.kernel, self.pad());
        let mut z = Tensor3::zeros(out_shape);

        for f in 0..self.filters {
            let kernel = &self.weights.data[f * self.weights.cols..(f + 1) * self.weights.cols];
            let bias = self.biases[f];
            for y in 0..h {
                for x in 0..w {
                    let mut sum = bias;
                    for c in 0..self.in_channels {
                        for ky in 0..k {
                            let iy = y as isize + ky as isize - pad;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..k {
                                let ix = x as isize + kx as isize - pad;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                sum += kernel[(c * k + ky) * k + kx]
                                    * input.at(c, iy as usize, ix as usize);
                            }
                        }
                    }
                    *z.at_mut(f, y, x) = sum;
                }
            }
        }

        let mut a = z.data.clone();
        self.activation.apply(&mut a);
        self.pre_activation = z.data;
        self.input = Some(input);
        Tensor3::from_vec(out_shape, a)
    }

    pub fn backward(&mut self, grad: Tensor3) -> Tensor3 {
        let input = self
            .input
            .take()
            .expect("Conv2d::backward called before forward");
        let (h, w, k, pad) = (input.shape.height, input.shape.width, self.kernel, self.pad());
        let cols = self.weights.cols;

        let mut delta = grad;
        self.activation.backprop(&self.pre_activation, &mut delta.data);

        let mut grad_in = Tensor3::zeros(input.shape);
        for f in 0..self.filters {
            let row = f * cols..(f + 1) * cols;
            for y in 0..h {
                for x in 0..w {
                    let d = delta.at(f, y, x);
                    if d == 0.0 {
                        continue;
                    }
                    self.biases_grad[f] += d;
                    for c in 0..self.in_channels {
                        for ky in 0..k {
                            let iy = y as isize + ky as isize - pad;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..k {
                                let ix = x as isize + kx as isize - pad;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                let wi = row.start + (c * k + ky) * k + kx;
                                let (iy, ix) = (iy as usize, ix as usize);
                                self.weights_grad.data[wi] += d * input.at(c, iy, ix);
                                *grad_in.at_mut(c, iy, ix) += d * self.weights.data[wi];
                            }
                        }
                    }
                }
            }
        }
        self.input = Some(input);
        grad_in
    }

    pub fn zero_grads(&mut self) {
        if self.weights_grad.rows != self.weights.rows || self.weights_grad.cols != self.weights.cols {
            self.weights_grad = Matrix::zeros(self.weights.rows, self.weights.cols);
        } else {
            self.weights_grad.fill(0.0);
        }
        self.biases_grad.clear();
        self.biases_grad.resize(self.filters, 0.0);
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
