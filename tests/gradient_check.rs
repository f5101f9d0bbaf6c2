//! Central finite-difference check of the backpropagated gradients.
//!
//! One full-batch sgd step moves each parameter by exactly
//! `lr * gradient`, so the analytic gradient can be read back from the
//! weight delta and compared against `(f(p + h) - f(p - h)) / 2h`.

use ndarray::{arr2, Array2, ArrayView2};
use nervo::activation::Activation;
use nervo::loss::{LossCriterion, MeanSquaredError};
use nervo::network::{Layer, Network, TrainConfig};
use nervo::optimizer::OptimizerKind;

const LR: f64 = 1e-3;
const H: f64 = 1e-5;
const TOLERANCE: f64 = 1e-4;

fn layers(activation: Activation) -> Vec<Layer> {
    // Depth 2, away from the ReLU kink for the chosen inputs.
    vec![
        Layer {
            weights: arr2(&[
                [0.31, -0.42, 0.25, 0.11],
                [-0.17, 0.38, -0.29, 0.23],
                [0.41, 0.13, -0.35, -0.27],
            ]),
            bias: arr2(&[[0.12, -0.08, 0.21, 0.05]]),
            activation,
        },
        Layer {
            weights: arr2(&[
                [0.24, -0.31],
                [-0.45, 0.18],
                [0.33, 0.27],
                [-0.12, -0.22],
            ]),
            bias: arr2(&[[0.09, -0.14]]),
            activation,
        },
    ]
}

fn dataset() -> (Array2<f64>, Array2<f64>) {
    let x = arr2(&[
        [0.61, -0.83, 0.45],
        [-0.52, 0.74, -0.36],
        [0.92, 0.28, -0.67],
        [-0.15, -0.58, 0.81],
    ]);
    let y = arr2(&[[0.9, 0.1], [0.2, 0.7], [0.4, 0.3], [0.6, 0.5]]);
    (x, y)
}

fn batch_loss(layers: Vec<Layer>, x: ArrayView2<f64>, y: ArrayView2<f64>) -> f64 {
    let network = Network::with_layers((x.nrows(), x.ncols()), layers).unwrap();
    let prediction = network.predict(x).unwrap();
    MeanSquaredError::compute(prediction.view(), y).value()
}

fn analytic_gradients(
    activation: Activation,
    x: ArrayView2<f64>,
    y: ArrayView2<f64>,
) -> Vec<(Array2<f64>, Array2<f64>)> {
    let mut network = Network::with_layers((x.nrows(), x.ncols()), layers(activation)).unwrap();
    let before = network
        .layers()
        .iter()
        .map(|layer| (layer.weights.clone(), layer.bias.clone()))
        .collect::<Vec<_>>();

    let config = TrainConfig {
        epochs: 1,
        batch_size: 0,
        learning_rate: LR,
        optimizer: OptimizerKind::Sgd,
        shuffle: false,
        ..TrainConfig::default()
    };
    network.train(x, y, &config).unwrap();

    before
        .into_iter()
        .zip(network.layers())
        .map(|((w_before, b_before), layer)| {
            (
                (w_before - &layer.weights) / LR,
                (b_before - &layer.bias) / LR,
            )
        })
        .collect()
}

fn assert_close(analytic: f64, numeric: f64, label: &str) {
    let scale = analytic.abs().max(numeric.abs()).max(1.0);
    assert!(
        (analytic - numeric).abs() / scale < TOLERANCE,
        "{label}: analytic {analytic} vs numeric {numeric}"
    );
}

fn check_gradients(activation: Activation) {
    let (x, y) = dataset();
    let gradients = analytic_gradients(activation, x.view(), y.view());

    for (layer_index, (grad_w, grad_b)) in gradients.iter().enumerate() {
        for ((row, col), &analytic) in grad_w.indexed_iter() {
            let mut plus = layers(activation);
            plus[layer_index].weights[[row, col]] += H;
            let mut minus = layers(activation);
            minus[layer_index].weights[[row, col]] -= H;

            let numeric =
                (batch_loss(plus, x.view(), y.view()) - batch_loss(minus, x.view(), y.view()))
                    / (2.0 * H);
            assert_close(
                analytic,
                numeric,
                &format!("weight [{layer_index}][{row},{col}]"),
            );
        }

        for ((row, col), &analytic) in grad_b.indexed_iter() {
            let mut plus = layers(activation);
            plus[layer_index].bias[[row, col]] += H;
            let mut minus = layers(activation);
            minus[layer_index].bias[[row, col]] -= H;

            let numeric =
                (batch_loss(plus, x.view(), y.view()) - batch_loss(minus, x.view(), y.view()))
                    / (2.0 * H);
            assert_close(
                analytic,
                numeric,
                &format!("bias [{layer_index}][{row},{col}]"),
            );
        }
    }
}

#[test]
fn gradients_match_finite_differences_identity() {
    check_gradients(Activation::Identity);
}

#[test]
fn gradients_match_finite_differences_sigmoid() {
    check_gradients(Activation::Sigmoid);
}

#[test]
fn gradients_match_finite_differences_tanh() {
    check_gradients(Activation::Tanh);
}

#[test]
fn gradients_match_finite_differences_relu() {
    check_gradients(Activation::Relu);
}
