/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f32 = 1e-7;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    ///
    /// `predicted`: softmax probabilities, shape [n_classes]
    /// `expected` : one-hot (or soft) target distribution, shape [n_classes]
    pub fn loss(predicted: &[f32], expected: &[f32]) -> f32 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits:
    ///   ∂L/∂z_i = predicted[i] - expected[i]
    ///
    /// The Softmax activation's own derivative is the identity, so this delta
    /// is not double-applied.
    pub fn derivative(predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn loss_is_negative_log_of_true_class() {
        let loss = CrossEntropyLoss::loss(&[0.25, 0.75], &[0.0, 1.0]);
        assert_relative_eq!(loss, -(0.75f32 + EPS).ln(), epsilon = 1e-6);
    }

    #[test]
    fn derivative_is_prediction_minus_target() {
        assert_eq!(CrossEntropyLoss::derivative(&[0.25, 0.75], &[0.0, 1.0]), vec![0.25, -0.25]);
    }
}
