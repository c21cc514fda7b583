use serde::{Serialize, Deserialize};

use crate::math::{Shape, Tensor3};

/// Max pooling with a square window and stride equal to the window.
/// Trailing rows/columns that do not fill a window are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPool2d {
    pub pool: usize,
    #[serde(skip)]
    argmax: Vec<usize>, // flat input index chosen for each output element
}

impl MaxPool2d {
    pub fn new(pool: usize) -> MaxPool2d {
        assert!(pool > 0, "pool size must be at least 1");
        MaxPool2d { pool, argmax: Vec::new() }
    }

    pub fn output_shape(&self, input: Shape) -> Shape {
        Shape::new(input.channels, input.height / self.pool, input.width / self.pool)
    }

    pub fn forward(&mut self, input: Tensor3) -> Tensor3 {
        let out_shape = self.output_shape(input.shape);
        let mut out = Tensor3::zeros(out_shape);
        self.argmax.clear();
        self.argmax.reserve(out_shape.len());

        for c in 0..out_shape.channels {
            for y in 0..out_shape.height {
                for x in 0..out_shape.width {
                    let mut best = f32::NEG_INFINITY;
                    let mut best_idx = input.index(c, y * self.pool, x * self.pool);
                    for py in 0..self.pool {
                        for px in 0..self.pool {
                            let idx = input.index(c, y * self.pool + py, x * self.pool + px);
                            if input.data[idx] > best {
                                best = input.data[idx];
                                best_idx = idx;
                            }
                        }
                    }
                    *out.at_mut(c, y, x) = best;
                    self.argmax.push(best_idx);
                }
            }
        }
        out
    }

    /// Routes each output gradient back to the input element that won the max.
    pub fn backward(&mut self, grad: Tensor3, input_shape: Shape) -> Tensor3 {
        let mut grad_in = Tensor3::zeros(input_shape);
        for (g, &idx) in grad.data.iter().zip(&self.argmax) {
            grad_in.data[idx] += g;
        }
        grad_in
    }
}
