use std::str::FromStr;

use ndarray::{Array, Array2};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;

use crate::error::Error;

/// Scheme scaling the initial standard-normal draws by a layer's fan-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initializer {
    Glorot,
    He,
}

impl Initializer {
    fn divisor(&self) -> f64 {
        match self {
            Self::Glorot => 1.0,
            Self::He => 2.0,
        }
    }

    /// Draw one weight matrix and one bias row per layer.
    ///
    /// Layer `i` weights have shape `(fan_in_i, neurons[i])` scaled by
    /// `1/sqrt(fan_in_i / divisor)`; biases have shape `(1, neurons[i])`
    /// scaled by `1/sqrt(1 / divisor)`. Every call returns freshly
    /// allocated arrays.
    pub fn initialize(
        &self,
        n_attributes: usize,
        neurons: &[usize],
    ) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let div = self.divisor();
        let mut weights = Vec::with_capacity(neurons.len());
        let mut biases = Vec::with_capacity(neurons.len());

        let mut fan_in = n_attributes;
        for &width in neurons {
            let w: Array2<f64> = Array::random((fan_in, width), StandardNormal);
            let b: Array2<f64> = Array::random((1, width), StandardNormal);
            weights.push(w / (fan_in as f64 / div).sqrt());
            biases.push(b / (1.0 / div).sqrt());
            fan_in = width;
        }

        (weights, biases)
    }
}

impl FromStr for Initializer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glorot" => Ok(Self::Glorot),
            "he" => Ok(Self::He),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown initializer `{other}`"
            ))),
        }
    }
}
