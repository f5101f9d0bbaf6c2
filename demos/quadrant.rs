//! Train a small network on a synthetic two-class problem: points in the
//! first or third quadrant belong to class 1, the others to class 0.
//!
//! Run with `cargo run --example quadrant`.

use ndarray::Array2;
use ndarray_rand::rand::{thread_rng, Rng};
use ndarray_rand::rand_distr::{Distribution, Uniform};
use nervo::activation::Activation;
use nervo::init::Initializer;
use nervo::network::{Network, TrainConfig};
use nervo::optimizer::OptimizerKind;

fn generate_points(n: usize, rng: &mut impl Rng) -> (Array2<f64>, Array2<f64>) {
    let uniform = Uniform::new(-1.0, 1.0);
    let mut x = Array2::zeros((n, 2));
    let mut y = Array2::zeros((n, 1));
    for row in 0..n {
        let a = uniform.sample(rng);
        let b = uniform.sample(rng);
        x[[row, 0]] = a;
        x[[row, 1]] = b;
        y[[row, 0]] = if a * b > 0.0 { 1.0 } else { 0.0 };
    }
    (x, y)
}

fn main() -> nervo::Result<()> {
    env_logger::init();

    let mut rng = thread_rng();
    let (x_train, y_train) = generate_points(400, &mut rng);
    let (x_test, y_test) = generate_points(100, &mut rng);

    let mut network = Network::new(
        (x_train.nrows(), 2),
        &[8, 1],
        &[Activation::Tanh, Activation::Sigmoid],
        Initializer::Glorot,
    )?;

    let config = TrainConfig {
        epochs: 500,
        batch_size: 32,
        learning_rate: 0.01,
        optimizer: OptimizerKind::Adam,
        ..TrainConfig::default()
    };
    let history = network.train(x_train.view(), y_train.view(), &config)?;
    println!(
        "loss: {:.6} -> {:.6} over {} epochs",
        history[0],
        history[history.len() - 1],
        history.len()
    );

    let prediction = network.predict(x_test.view())?;
    let n_correct = prediction
        .column(0)
        .iter()
        .zip(y_test.column(0).iter())
        .filter(|(&p, &t)| (p > 0.5) == (t > 0.5))
        .count();
    println!("test accuracy: {}/{}", n_correct, x_test.nrows());

    Ok(())
}
