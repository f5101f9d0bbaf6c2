//! Train on a tabular CSV dataset: a feature table and a single-column
//! target table, min-max scaled, split 90/10.
//!
//! Run with `cargo run --example tabular -- features.csv targets.csv`.

use std::env;

use nervo::activation::Activation;
use nervo::data::{load_data, Preprocessing};
use nervo::init::Initializer;
use nervo::loss::{LossCriterion, MeanSquaredError};
use nervo::network::{Network, TrainConfig};
use nervo::optimizer::OptimizerKind;

fn main() -> nervo::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let x_path = args.next().expect("usage: tabular <features.csv> <targets.csv>");
    let y_path = args.next().expect("usage: tabular <features.csv> <targets.csv>");

    let (x_train, y_train, x_test, y_test, _scaler) =
        load_data(x_path, y_path, Preprocessing::MinMax, 0.9)?;

    let mut network = Network::new(
        (x_train.nrows(), x_train.ncols()),
        &[30, 30, y_train.ncols()],
        &[Activation::Relu, Activation::Relu, Activation::Sigmoid],
        Initializer::He,
    )?;

    let config = TrainConfig {
        epochs: 300,
        batch_size: 32,
        learning_rate: 1e-3,
        optimizer: OptimizerKind::Adam,
        ..TrainConfig::default()
    };
    let history = network.train(x_train.view(), y_train.view(), &config)?;
    for (epoch, loss) in history.iter().enumerate().step_by(50) {
        println!("epoch {:3}: train loss {loss:.6}", epoch + 1);
    }

    let prediction = network.predict(x_test.view())?;
    let test_loss = MeanSquaredError::compute(prediction.view(), y_test.view());
    println!("test loss: {:.6}", test_loss.value());

    Ok(())
}
