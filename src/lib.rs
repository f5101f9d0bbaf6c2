//! From-scratch multilayer perceptron training engine.
//!
//! Everything the math needs is written out by hand: forward propagation
//! through affine/activation layer pairs, backpropagation via the chain
//! rule, and a family of stateful gradient-based optimizers that mutate
//! the weights in place. All data lives in dense [`ndarray`] matrices held
//! in memory.
//!
//! The entry point is [`network::Network`]: build one from an input shape,
//! layer widths, activations and an initializer, then call
//! [`network::Network::train`] and [`network::Network::predict`].

pub mod activation;
pub mod affine;
pub mod data;
pub mod error;
pub mod init;
pub mod loss;
pub mod network;
pub mod optimizer;

pub use error::{Error, Result};
pub use network::{Network, TrainConfig};

#[macro_export]
macro_rules! assert_rel_eq_arr2 {
    ($actual:expr, $expected:expr) => {
        assert_eq!($actual.shape(), $expected.shape());
        ndarray::Zip::from(&$actual)
            .and(&$expected)
            .for_each(|v, w| {
                assert_relative_eq!(v, w);
            });
    };
}
