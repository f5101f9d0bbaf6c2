use std::str::FromStr;

use ndarray::Array2;

use crate::error::Error;

fn sigmoid(x: &f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Elementwise nonlinearity applied after a layer's affine transform.
///
/// The variant set is closed; unknown names are rejected when parsing
/// instead of falling through to an undefined state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Identity,
    Sigmoid,
    Tanh,
    Relu,
}

impl Activation {
    pub fn compute(&self, x: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::Identity => x.clone(),
            Self::Sigmoid => x.map(sigmoid),
            Self::Tanh => x.map(|v| v.tanh()),
            Self::Relu => x.map(|&v| if v > 0.0 { v } else { 0.0 }),
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    ///
    /// Always written into a fresh array; `x` is the caller's cached
    /// forward context and must stay intact.
    pub fn derivative(&self, x: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::Identity => Array2::ones(x.raw_dim()),
            Self::Sigmoid => x.map(|v| {
                let phi = sigmoid(v);
                phi * (1.0 - phi)
            }),
            Self::Tanh => x.map(|v| 1.0 - v.tanh().powi(2)),
            Self::Relu => x.map(|&v| if v > 0.0 { 1.0 } else { 0.0 }),
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" | "linear" => Ok(Self::Identity),
            "sigmoid" => Ok(Self::Sigmoid),
            "tanh" => Ok(Self::Tanh),
            "relu" => Ok(Self::Relu),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown activation `{other}`"
            ))),
        }
    }
}
