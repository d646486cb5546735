//! Named scalar activation functions shared by every node in a network.
//!
//! Names are stable strings so genomes (and eventually checkpoints) can
//! reference an activation without depending on enum discriminant order.

use serde::{Deserialize, Serialize};

const CLAMP: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    Linear,
    Gaussian,
    Sin,
    Cos,
}

impl Activation {
    /// All variants, in a stable order. Used by `change_random_activation`
    /// and by name<->variant lookups.
    pub const ALL: [Activation; 8] = [
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Relu,
        Activation::LeakyRelu,
        Activation::Linear,
        Activation::Gaussian,
        Activation::Sin,
        Activation::Cos,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Linear => "linear",
            Activation::Gaussian => "gaussian",
            Activation::Sin => "sin",
            Activation::Cos => "cos",
        }
    }

    pub fn from_name(name: &str) -> Option<Activation> {
        Activation::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Applies the activation to `x`. Sigmoid and gaussian clamp their
    /// argument to `[-20, 20]` first to avoid overflow/underflow in `exp`.
    pub fn activate(&self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let clamped = x.clamp(-CLAMP, CLAMP);
                1.0 / (1.0 + (-clamped).exp())
            }
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => (0.01 * x).max(x),
            Activation::Linear => x,
            Activation::Gaussian => {
                let clamped = x.clamp(-CLAMP, CLAMP);
                (-(clamped * clamped)).exp()
            }
            Activation::Sin => x.sin(),
            Activation::Cos => x.cos(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_clamps_large_inputs() {
        let big = Activation::Sigmoid.activate(1000.0);
        assert!(big.is_finite());
        assert!((big - 1.0).abs() < 1e-8);
    }

    #[test]
    fn gaussian_clamps_large_inputs() {
        let big = Activation::Gaussian.activate(-1000.0);
        assert!(big.is_finite());
        assert!(big >= 0.0);
    }

    #[test]
    fn name_round_trips() {
        for a in Activation::ALL {
            assert_eq!(Activation::from_name(a.name()), Some(a));
        }
        assert_eq!(Activation::from_name("nope"), None);
    }

    #[test]
    fn leaky_relu_matches_slope() {
        assert!((Activation::LeakyRelu.activate(-2.0) - (-0.02)).abs() < 1e-12);
        assert_eq!(Activation::LeakyRelu.activate(2.0), 2.0);
    }
}
