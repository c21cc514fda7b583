use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    Identity,
    /// Softmax is a vector-valued activation; it is applied at the layer level
    /// (see `apply`), never element-wise.
    Softmax,
}

impl ActivationFunction {
    /// Element-wise activation.
    pub fn function(&self, x: f32) -> f32 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Softmax => {
                panic!("ActivationFunction::Softmax::function() must not be called directly; \
                        use ActivationFunction::apply() which applies the full-vector softmax.")
            }
        }
    }

    /// Element-wise derivative of the activation at pre-activation `x`.
    ///
    /// For `Softmax`, the layer pairs it with cross-entropy and the combined
    /// gradient is `predicted - expected` (already computed by
    /// `CrossEntropyLoss::derivative()`). Returning `1.0` passes that delta
    /// through unchanged.
    pub fn derivative(&self, x: f32) -> f32 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Softmax => 1.0,
        }
    }

    /// Applies the activation to a whole pre-activation vector in place.
    pub fn apply(&self, z: &mut [f32]) {
        match self {
            ActivationFunction::Softmax => softmax(z),
            _ => z.iter_mut().for_each(|v| *v = self.function(*v)),
        }
    }

    /// Multiplies `delta` in place by the derivative evaluated at `z`.
    pub fn backprop(&self, z: &[f32], delta: &mut [f32]) {
        if *self == ActivationFunction::ReLU {
            for (d, &v) in delta.iter_mut().zip(z) {
                *d *= self.derivative(v);
            }
        }
    }
}

/// Numerically stable softmax (max subtracted before exponentiation).
fn softmax(z: &mut [f32]) {
    let max = z.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in z.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    z.iter_mut().for_each(|v| *v /= sum);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn softmax_sums_to_one_and_is_shift_invariant() {
        let mut a = vec![1.0, 2.0, 3.0];
        let mut b = vec![1001.0, 1002.0, 1003.0];
        ActivationFunction::Softmax.apply(&mut a);
        ActivationFunction::Softmax.apply(&mut b);
        assert_relative_eq!(a.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(x, y, epsilon = 1e-6);
        }
    }

    #[test]
    fn relu_backprop_masks_negative_inputs() {
        let z = [-1.0, 0.5];
        let mut delta = [3.0, 3.0];
        ActivationFunction::ReLU.backprop(&z, &mut delta);
        assert_eq!(delta, [0.0, 3.0]);
    }
}
