use crate::optim::Optimizer;

/// Plain stochastic gradient descent: `w -= lr * g`.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn step(&mut self, _slot: usize, params: &mut [f32], grads: &[f32], grad_scale: f32) {
        let lr = self.learning_rate * grad_scale;
        for (w, g) in params.iter_mut().zip(grads) {
            *w -= lr * g;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_against_the_gradient() {
        let mut sgd = Sgd::new(0.5);
        let mut w = [1.0, 1.0];
        sgd.step(0, &mut w, &[2.0, -4.0], 0.5);
        assert_eq!(w, [0.5, 2.0]);
    }
}
