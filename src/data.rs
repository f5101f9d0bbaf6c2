use std::path::Path;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand::{seq::index::sample, thread_rng, Rng};

use crate::error::{Error, Result};

/// Feature scaling applied by [`load_data`] before splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocessing {
    None,
    MinMax,
    Standard,
}

impl Preprocessing {
    /// Fit a scaler to the columns of `x`. `Preprocessing::None` fits
    /// nothing. Every call builds fresh state.
    pub fn fit(&self, x: ArrayView2<f64>) -> Option<Scaler> {
        match self {
            Self::None => None,
            Self::MinMax => {
                let min = x.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
                let max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
                // Constant columns map to 0 instead of dividing by zero.
                let range = (&max - &min).map(|&r| if r == 0.0 { 1.0 } else { r });
                Some(Scaler::MinMax { min, range })
            }
            Self::Standard => {
                let n = x.nrows().max(1) as f64;
                let mean = x.sum_axis(Axis(0)) / n;
                let std = x
                    .std_axis(Axis(0), 0.0)
                    .map(|&s| if s == 0.0 { 1.0 } else { s });
                Some(Scaler::Standard { mean, std })
            }
        }
    }
}

impl FromStr for Preprocessing {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "mms" => Ok(Self::MinMax),
            "std" => Ok(Self::Standard),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown preprocessing `{other}`"
            ))),
        }
    }
}

/// Per-column scaling parameters fit on one matrix.
#[derive(Debug, Clone)]
pub enum Scaler {
    MinMax { min: Array1<f64>, range: Array1<f64> },
    Standard { mean: Array1<f64>, std: Array1<f64> },
}

impl Scaler {
    /// Scale `x` column by column into a fresh matrix.
    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        match self {
            Self::MinMax { min, range } => {
                for mut row in out.rows_mut() {
                    row -= min;
                    row /= range;
                }
            }
            Self::Standard { mean, std } => {
                for mut row in out.rows_mut() {
                    row -= mean;
                    row /= std;
                }
            }
        }
        out
    }
}

/// Read a headered CSV of floats into a `(rows, columns)` matrix.
pub fn load_matrix(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;

    let mut values = Vec::new();
    let mut width = 0;
    for record in reader.records() {
        let record = record?;
        width = record.len();
        for field in record.iter() {
            let value = field.trim().parse::<f64>().map_err(|_| {
                Error::Dataset(format!(
                    "non-numeric field `{field}` in {}",
                    path.display()
                ))
            })?;
            values.push(value);
        }
    }

    let height = if width == 0 { 0 } else { values.len() / width };
    Array2::from_shape_vec((height, width), values)
        .map_err(|_| Error::Dataset(format!("ragged rows in {}", path.display())))
}

/// Apply one shared random row permutation to `x` and `y`, keeping their
/// rows paired. Shapes are preserved, including `(n, 1)` targets.
pub fn shuffle_rows(
    x: ArrayView2<f64>,
    y: ArrayView2<f64>,
    rng: &mut impl Rng,
) -> (Array2<f64>, Array2<f64>) {
    let n = x.nrows();
    let indices = sample(rng, n, n).into_vec();
    (x.select(Axis(0), &indices), y.select(Axis(0), &indices))
}

/// Contiguous `[start, end)` batch bounds covering `0..n_samples` exactly
/// once, in order; the final batch is `n_samples mod batch_size` rows when
/// that is nonzero.
pub fn batch_ranges(n_samples: usize, batch_size: usize) -> impl Iterator<Item = (usize, usize)> {
    let step = batch_size.max(1);
    (0..n_samples)
        .step_by(step)
        .map(move |start| (start, (start + step).min(n_samples)))
}

/// Shuffle `x`/`y` together and split them into train and test partitions.
/// `train_ratio` is the fraction of rows kept for training.
pub fn train_test_split(
    x: Array2<f64>,
    y: Array2<f64>,
    train_ratio: f64,
) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>)> {
    if x.nrows() != y.nrows() {
        return Err(Error::ShapeMismatch {
            what: "target rows",
            expected: x.nrows(),
            found: y.nrows(),
        });
    }
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(Error::InvalidConfiguration(format!(
            "train ratio must lie in (0, 1), got {train_ratio}"
        )));
    }

    let mut rng = thread_rng();
    let (x, y) = shuffle_rows(x.view(), y.view(), &mut rng);

    let n_train = (x.nrows() as f64 * train_ratio) as usize;
    if n_train == 0 || n_train == x.nrows() {
        return Err(Error::InvalidConfiguration(format!(
            "train ratio {train_ratio} leaves an empty partition for {} rows",
            x.nrows()
        )));
    }
    let (x_train, x_test) = x.view().split_at(Axis(0), n_train);
    let (y_train, y_test) = y.view().split_at(Axis(0), n_train);
    Ok((
        x_train.to_owned(),
        y_train.to_owned(),
        x_test.to_owned(),
        y_test.to_owned(),
    ))
}

/// Dataset collaborator surface: load the feature and target tables, scale
/// both with `preprocessing`, and split into train and test partitions.
/// The returned scaler is the one fit on the features, for scaling future
/// inputs the same way.
pub fn load_data(
    x_path: impl AsRef<Path>,
    y_path: impl AsRef<Path>,
    preprocessing: Preprocessing,
    train_ratio: f64,
) -> Result<(
    Array2<f64>,
    Array2<f64>,
    Array2<f64>,
    Array2<f64>,
    Option<Scaler>,
)> {
    let x = load_matrix(x_path)?;
    let y = load_matrix(y_path)?;

    let scaler = preprocessing.fit(x.view());
    let x = match &scaler {
        Some(scaler) => scaler.transform(x.view()),
        None => x,
    };
    let y = match preprocessing.fit(y.view()) {
        Some(scaler) => scaler.transform(y.view()),
        None => y,
    };

    let (x_train, y_train, x_test, y_test) = train_test_split(x, y, train_ratio)?;
    Ok((x_train, y_train, x_test, y_test, scaler))
}
