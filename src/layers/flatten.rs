use serde::{Serialize, Deserialize};

use crate::math::{Shape, Tensor3};

/// Flattens a feature map into a vector in channels-last `(y, x, c)` order,
/// so a following dense kernel is laid out the same way a channels-last
/// framework would lay it out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Flatten;

impl Flatten {
    pub fn output_shape(&self, input: Shape) -> Shape {
        Shape::flat(input.len())
    }

    pub fn forward(&self, input: Tensor3) -> Tensor3 {
        let Shape { channels, height, width } = input.shape;
        let mut out = vec![0.0; input.len()];
        for c in 0..channels {
            for y in 0..height {
                for x in 0..width {
                    out[(y * width + x) * channels + c] = input.at(c, y, x);
                }
            }
        }
        Tensor3::from_vec(Shape::flat(out.len()), out)
    }

    pub fn backward(&self, grad: Tensor3, input_shape: Shape) -> Tensor3 {
        let Shape { channels, height, width } = input_shape;
        let mut grad_in = Tensor3::zeros(input_shape);
        for c in 0..channels {
            for y in 0..height {
                for x in 0..width {
                    *grad_in.at_mut(c, y, x) = grad.data[(y * width + x) * channels + c];
                }
            }
        }
        grad_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_channels_last() {
        // two channels of a 1x2 map: c0 = [1, 2], c1 = [3, 4]
        let input = Tensor3::from_vec(Shape::new(2, 1, 2), vec![1.0, 2.0, 3.0, 4.0]);
        let out = Flatten.forward(input.clone());
        assert_eq!(out.data, vec![1.0, 3.0, 2.0, 4.0]);
        assert_eq!(Flatten.backward(out, input.shape), input);
    }
}
