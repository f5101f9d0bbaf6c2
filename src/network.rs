use ndarray::{s, Array2, ArrayView2, Axis};
use ndarray_rand::rand::thread_rng;

use crate::activation::Activation;
use crate::affine::{self, AffineContext};
use crate::data::{batch_ranges, shuffle_rows};
use crate::error::{Error, Result};
use crate::init::Initializer;
use crate::loss::{LossCriterion, MeanSquaredError};
use crate::optimizer::{Hyperparams, Optimizer, OptimizerKind};

/// One affine/activation pair. Weights have shape `(fan_in, fan_out)` and
/// the bias is a `(1, fan_out)` row.
#[derive(Debug, Clone)]
pub struct Layer {
    pub weights: Array2<f64>,
    pub bias: Array2<f64>,
    pub activation: Activation,
}

/// Everything `train` needs besides the data. `batch_size == 0` means
/// full-batch gradient descent.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub rho1: f64,
    pub rho2: f64,
    pub shuffle: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 0,
            learning_rate: 1e-3,
            optimizer: OptimizerKind::Adam,
            rho1: 0.9,
            rho2: 0.999,
            shuffle: true,
        }
    }
}

impl TrainConfig {
    fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfiguration(
                "epochs must be positive".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, rho) in [("rho1", self.rho1), ("rho2", self.rho2)] {
            if !(rho > 0.0 && rho < 1.0) {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} must lie in (0, 1), got {rho}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-layer forward context of one batch, consumed by exactly one
/// backward pass.
struct LayerTrace {
    context: AffineContext,
    pre_activation: Array2<f64>,
}

/// Ordered sequence of layers with the batching, shuffling and epoch
/// orchestration on top. Single-threaded: one forward, one loss, one
/// backward per batch, strictly in that order.
pub struct Network {
    n_samples: usize,
    n_attributes: usize,
    layers: Vec<Layer>,
}

impl Network {
    /// Build a network with freshly initialized parameters.
    ///
    /// `input_shape` is `(n_samples, n_attributes)`; `neurons` and
    /// `activations` describe the layers in order and must have equal
    /// length.
    pub fn new(
        input_shape: (usize, usize),
        neurons: &[usize],
        activations: &[Activation],
        initializer: Initializer,
    ) -> Result<Self> {
        if neurons.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least one layer is required".to_string(),
            ));
        }
        if neurons.len() != activations.len() {
            return Err(Error::InvalidConfiguration(format!(
                "{} layers but {} activations",
                neurons.len(),
                activations.len()
            )));
        }
        if neurons.contains(&0) {
            return Err(Error::InvalidConfiguration(
                "layer widths must be positive".to_string(),
            ));
        }
        if input_shape.1 == 0 {
            return Err(Error::InvalidConfiguration(
                "input must have at least one attribute".to_string(),
            ));
        }

        let (weights, biases) = initializer.initialize(input_shape.1, neurons);
        let layers = weights
            .into_iter()
            .zip(biases)
            .zip(activations)
            .map(|((weights, bias), &activation)| Layer {
                weights,
                bias,
                activation,
            })
            .collect();

        Ok(Self {
            n_samples: input_shape.0,
            n_attributes: input_shape.1,
            layers,
        })
    }

    /// Build a network from explicit layers, checking that each layer's
    /// fan-in chains from the previous fan-out and the declared attribute
    /// count.
    pub fn with_layers(input_shape: (usize, usize), layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least one layer is required".to_string(),
            ));
        }
        let mut fan_in = input_shape.1;
        for (index, layer) in layers.iter().enumerate() {
            if layer.weights.nrows() != fan_in {
                return Err(Error::InvalidConfiguration(format!(
                    "layer {index} has fan-in {}, expected {fan_in}",
                    layer.weights.nrows()
                )));
            }
            if layer.bias.dim() != (1, layer.weights.ncols()) {
                return Err(Error::InvalidConfiguration(format!(
                    "layer {index} bias shape {:?} does not match fan-out {}",
                    layer.bias.dim(),
                    layer.weights.ncols()
                )));
            }
            fan_in = layer.weights.ncols();
        }

        Ok(Self {
            n_samples: input_shape.0,
            n_attributes: input_shape.1,
            layers,
        })
    }

    pub fn input_shape(&self) -> (usize, usize) {
        (self.n_samples, self.n_attributes)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn output_width(&self) -> usize {
        self.layers[self.layers.len() - 1].weights.ncols()
    }

    fn check_features(&self, x: ArrayView2<f64>) -> Result<()> {
        if x.ncols() != self.n_attributes {
            return Err(Error::ShapeMismatch {
                what: "feature columns",
                expected: self.n_attributes,
                found: x.ncols(),
            });
        }
        Ok(())
    }

    /// Run the forward half only. `x` has shape `(rows, n_attributes)`;
    /// the result has shape `(rows, output_width)`.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_features(x)?;
        let (prediction, _) = self.forward(x);
        Ok(prediction)
    }

    /// Affine then activation per layer, feeding each output into the next
    /// layer. Returns the final output plus the per-layer context the
    /// backward pass consumes.
    fn forward(&self, x: ArrayView2<f64>) -> (Array2<f64>, Vec<LayerTrace>) {
        let mut traces = Vec::with_capacity(self.layers.len());
        let mut signal = x.to_owned();
        for layer in &self.layers {
            let (score, context) = affine::forward(signal.view(), &layer.weights, &layer.bias);
            signal = layer.activation.compute(&score);
            traces.push(LayerTrace {
                context,
                pre_activation: score,
            });
        }
        (signal, traces)
    }

    /// Chain-rule sweep from the last layer to the first, applying the
    /// optimizer update per layer as the gradients are produced.
    fn backward(
        &mut self,
        traces: &[LayerTrace],
        loss: &MeanSquaredError,
        optimizer: &mut Optimizer,
        hp: &Hyperparams,
    ) {
        let last = self.layers.len() - 1;
        let mut upstream =
            self.layers[last].activation.derivative(&traces[last].pre_activation) * loss.grad();

        for index in (0..self.layers.len()).rev() {
            let (input_factor, weight_factor) = traces[index].context.factors();
            // (W · upstreamᵀ)ᵀ lands on the previous layer's output.
            let grad_prev = input_factor.dot(&upstream.t()).reversed_axes();
            let grad_w = weight_factor.dot(&upstream);
            let grad_b = upstream.sum_axis(Axis(0)).insert_axis(Axis(0));

            let layer = &mut self.layers[index];
            optimizer.update(index, &mut layer.weights, &grad_w, &mut layer.bias, &grad_b, hp);

            if index > 0 {
                upstream = self.layers[index - 1]
                    .activation
                    .derivative(&traces[index - 1].pre_activation)
                    * grad_prev;
            }
        }
    }

    /// Run the epoch loop and return the per-epoch mean loss history.
    ///
    /// Each epoch optionally shuffles `x` and `y` with one shared row
    /// permutation, then sweeps contiguous batches covering every row
    /// exactly once; the final batch may be short. A non-finite loss
    /// aborts the run with [`Error::NumericInstability`].
    pub fn train(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView2<f64>,
        config: &TrainConfig,
    ) -> Result<Vec<f64>> {
        config.validate()?;
        self.check_features(x)?;
        if x.nrows() == 0 {
            return Err(Error::InvalidConfiguration(
                "training set must contain at least one sample".to_string(),
            ));
        }
        if x.nrows() != y.nrows() {
            return Err(Error::ShapeMismatch {
                what: "target rows",
                expected: x.nrows(),
                found: y.nrows(),
            });
        }
        if y.ncols() != self.output_width() {
            return Err(Error::ShapeMismatch {
                what: "target columns",
                expected: self.output_width(),
                found: y.ncols(),
            });
        }

        let n_samples = x.nrows();
        let batch_size = if config.batch_size == 0 {
            n_samples
        } else {
            config.batch_size
        };
        let mut optimizer =
            Optimizer::new(config.optimizer, self.layers.iter().map(|l| &l.weights));
        log::debug!(
            "training {} layers with {:?} for {} epochs, batch size {batch_size}",
            self.layers.len(),
            optimizer.kind(),
            config.epochs,
        );

        let mut rng = thread_rng();
        let mut x_epoch = x.to_owned();
        let mut y_epoch = y.to_owned();
        let mut history = Vec::with_capacity(config.epochs);

        for epoch in 1..=config.epochs {
            if config.shuffle {
                let (xs, ys) = shuffle_rows(x_epoch.view(), y_epoch.view(), &mut rng);
                x_epoch = xs;
                y_epoch = ys;
            }

            // Adam's bias correction advances with the epoch counter.
            let hp = Hyperparams {
                learning_rate: config.learning_rate,
                rho1: config.rho1,
                rho2: config.rho2,
                step: epoch,
            };

            let mut total_loss = 0.0;
            for (start, end) in batch_ranges(n_samples, batch_size) {
                let x_batch = x_epoch.slice(s![start..end, ..]);
                let y_batch = y_epoch.slice(s![start..end, ..]);

                let (prediction, traces) = self.forward(x_batch);
                let loss = MeanSquaredError::compute(prediction.view(), y_batch);
                if !loss.value().is_finite() {
                    return Err(Error::NumericInstability {
                        epoch,
                        value: loss.value(),
                    });
                }
                total_loss += loss.value();

                self.backward(&traces, &loss, &mut optimizer, &hp);
            }

            let epoch_loss = total_loss / n_samples as f64;
            log::debug!("epoch {epoch}: train loss {epoch_loss:.6}");
            history.push(epoch_loss);
        }

        Ok(history)
    }
}
