use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An unknown variant name, or hyperparameters/layer shapes that cannot
    /// form a valid network. Raised at construction, before any training.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Incompatible array dimensions between the data and the network.
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The training loss left the finite range. The run is aborted instead
    /// of carrying NaN/Inf through subsequent epochs.
    #[error("non-finite loss ({value}) at epoch {epoch}")]
    NumericInstability { epoch: usize, value: f64 },

    /// A dataset file could not be parsed into a numeric matrix.
    #[error("failed to read dataset: {0}")]
    Dataset(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
