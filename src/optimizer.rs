use std::str::FromStr;

use ndarray::{Array2, Zip};

use crate::error::Error;

/// Damping term for the adaptive denominators.
const EPSILON: f64 = 1e-7;

/// Closed set of supported update rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    Sgd,
    Momentum,
    Adagrad,
    Rmsprop,
    Adam,
}

impl FromStr for OptimizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sgd" => Ok(Self::Sgd),
            "sgd_momentum" => Ok(Self::Momentum),
            "adagrad" => Ok(Self::Adagrad),
            "rmsprop" => Ok(Self::Rmsprop),
            "adam" => Ok(Self::Adam),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown optimizer `{other}`"
            ))),
        }
    }
}

/// Hyperparameters shared by every update call of one batch.
#[derive(Debug, Clone, Copy)]
pub struct Hyperparams {
    pub learning_rate: f64,
    /// Momentum coefficient, also the decay rate of RMSProp and Adam's
    /// first moment.
    pub rho1: f64,
    /// Decay rate of Adam's second moment.
    pub rho2: f64,
    /// 1-indexed step driving Adam's bias correction. The training loop
    /// advances it once per epoch.
    pub step: usize,
}

/// Per-layer accumulators, shaped after that layer's weights and bias.
enum LayerState {
    Stateless,
    Velocity {
        w: Array2<f64>,
        b: Array2<f64>,
    },
    SquareSum {
        w: Array2<f64>,
        b: Array2<f64>,
    },
    SquareAverage {
        w: Array2<f64>,
        b: Array2<f64>,
    },
    Moments {
        first_w: Array2<f64>,
        second_w: Array2<f64>,
        first_b: Array2<f64>,
        second_b: Array2<f64>,
    },
}

/// Stateful parameter update rule. Accumulators are allocated once at
/// construction and live for the whole training run; a new run gets a new
/// `Optimizer`.
pub struct Optimizer {
    kind: OptimizerKind,
    layers: Vec<LayerState>,
}

impl Optimizer {
    /// Allocate the accumulators `kind` needs, one set per layer, shaped
    /// after the initial weight matrices.
    pub fn new<'a, I>(kind: OptimizerKind, weights: I) -> Self
    where
        I: IntoIterator<Item = &'a Array2<f64>>,
    {
        let layers = weights
            .into_iter()
            .map(|w| {
                let w_shape = w.raw_dim();
                let b_shape = (1, w.ncols());
                match kind {
                    OptimizerKind::Sgd => LayerState::Stateless,
                    OptimizerKind::Momentum => LayerState::Velocity {
                        w: Array2::zeros(w_shape),
                        b: Array2::zeros(b_shape),
                    },
                    OptimizerKind::Adagrad => LayerState::SquareSum {
                        w: Array2::zeros(w_shape),
                        b: Array2::zeros(b_shape),
                    },
                    OptimizerKind::Rmsprop => LayerState::SquareAverage {
                        w: Array2::zeros(w_shape),
                        b: Array2::zeros(b_shape),
                    },
                    OptimizerKind::Adam => LayerState::Moments {
                        first_w: Array2::zeros(w_shape.clone()),
                        second_w: Array2::zeros(w_shape),
                        first_b: Array2::zeros(b_shape),
                        second_b: Array2::zeros(b_shape),
                    },
                }
            })
            .collect();

        Self { kind, layers }
    }

    pub fn kind(&self) -> OptimizerKind {
        self.kind
    }

    /// Apply one update to `layer`'s weights and bias, in place.
    pub fn update(
        &mut self,
        layer: usize,
        weights: &mut Array2<f64>,
        grad_w: &Array2<f64>,
        bias: &mut Array2<f64>,
        grad_b: &Array2<f64>,
        hp: &Hyperparams,
    ) {
        let lr = hp.learning_rate;
        match &mut self.layers[layer] {
            LayerState::Stateless => {
                weights.scaled_add(-lr, grad_w);
                bias.scaled_add(-lr, grad_b);
            }
            LayerState::Velocity { w, b } => {
                w.zip_mut_with(grad_w, |v, &g| *v = hp.rho1 * *v + g);
                b.zip_mut_with(grad_b, |v, &g| *v = hp.rho1 * *v + g);
                weights.scaled_add(-lr, w);
                bias.scaled_add(-lr, b);
            }
            LayerState::SquareSum { w, b } => {
                w.zip_mut_with(grad_w, |s, &g| *s += g * g);
                b.zip_mut_with(grad_b, |s, &g| *s += g * g);
                adaptive_step(weights, grad_w, w, lr);
                adaptive_step(bias, grad_b, b, lr);
            }
            LayerState::SquareAverage { w, b } => {
                w.zip_mut_with(grad_w, |s, &g| *s = hp.rho1 * *s + (1.0 - hp.rho1) * g * g);
                b.zip_mut_with(grad_b, |s, &g| *s = hp.rho1 * *s + (1.0 - hp.rho1) * g * g);
                adaptive_step(weights, grad_w, w, lr);
                adaptive_step(bias, grad_b, b, lr);
            }
            LayerState::Moments {
                first_w,
                second_w,
                first_b,
                second_b,
            } => {
                first_w.zip_mut_with(grad_w, |m, &g| *m = hp.rho1 * *m + (1.0 - hp.rho1) * g);
                second_w.zip_mut_with(grad_w, |v, &g| *v = hp.rho2 * *v + (1.0 - hp.rho2) * g * g);
                first_b.zip_mut_with(grad_b, |m, &g| *m = hp.rho1 * *m + (1.0 - hp.rho1) * g);
                second_b.zip_mut_with(grad_b, |v, &g| *v = hp.rho2 * *v + (1.0 - hp.rho2) * g * g);

                let first_correction = 1.0 - hp.rho1.powi(hp.step as i32);
                let second_correction = 1.0 - hp.rho2.powi(hp.step as i32);
                corrected_step(weights, first_w, second_w, lr, first_correction, second_correction);
                corrected_step(bias, first_b, second_b, lr, first_correction, second_correction);
            }
        }
    }
}

/// `param -= lr * grad / (sqrt(accumulated) + ε)`.
fn adaptive_step(param: &mut Array2<f64>, grad: &Array2<f64>, accumulated: &Array2<f64>, lr: f64) {
    Zip::from(param)
        .and(grad)
        .and(accumulated)
        .for_each(|p, &g, &s| *p -= lr * g / (s.sqrt() + EPSILON));
}

/// `param -= lr * m̂ / (sqrt(v̂) + ε)` with the bias-corrected moments
/// `m̂ = m / first_correction`, `v̂ = v / second_correction`.
fn corrected_step(
    param: &mut Array2<f64>,
    first: &Array2<f64>,
    second: &Array2<f64>,
    lr: f64,
    first_correction: f64,
    second_correction: f64,
) {
    Zip::from(param)
        .and(first)
        .and(second)
        .for_each(|p, &m, &v| {
            let m_hat = m / first_correction;
            let v_hat = v / second_correction;
            *p -= lr * m_hat / (v_hat.sqrt() + EPSILON);
        });
}
