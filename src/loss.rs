use ndarray::{Array2, ArrayView2, Zip};

/// Scalar training objective with its gradient w.r.t. the prediction.
pub trait LossCriterion {
    fn compute(prediction: ArrayView2<f64>, target: ArrayView2<f64>) -> Self;

    fn value(&self) -> f64;

    fn grad(&self) -> Array2<f64>;
}

/// Squared error summed over rows and output columns, normalized by the
/// batch row count. Matches the training loop's per-sample accounting, so
/// the per-epoch history entry is `Σ batch losses / n_samples`.
pub struct MeanSquaredError {
    prediction: Array2<f64>,
    target: Array2<f64>,
    value: f64,
}

impl LossCriterion for MeanSquaredError {
    fn compute(prediction: ArrayView2<f64>, target: ArrayView2<f64>) -> Self {
        assert_eq!(prediction.shape(), target.shape());

        let n = prediction.nrows() as f64;
        let value = Zip::from(&prediction)
            .and(&target)
            .fold(0.0, |acc, &p, &t| acc + (t - p).powi(2))
            / n;

        Self {
            prediction: prediction.to_owned(),
            target: target.to_owned(),
            value,
        }
    }

    fn value(&self) -> f64 {
        self.value
    }

    /// `(2/N) · (prediction - target)`, from the prediction cached at the
    /// most recent `compute`.
    fn grad(&self) -> Array2<f64> {
        let n = self.prediction.nrows() as f64;
        (&self.prediction - &self.target) * (2.0 / n)
    }
}

#[cfg(test)]
mod tests {
    use crate::assert_rel_eq_arr2;

    use super::*;

    use approx::assert_relative_eq;
    use ndarray::arr2;

    fn prepare() -> MeanSquaredError {
        let prediction = arr2(&[[1.0, 0.5, -0.1], [0.5, 0.2, 1.0]]);
        let target = arr2(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        MeanSquaredError::compute(prediction.view(), target.view())
    }

    #[test]
    fn value_is_row_normalized() {
        // Squared errors sum to 2.15 over 2 rows.
        let loss = prepare();
        assert_relative_eq!(1.075, loss.value());
    }

    #[test]
    fn grad_points_from_target_to_prediction() {
        let loss = prepare();
        assert_rel_eq_arr2!(
            loss.grad(),
            arr2(&[[0.0, 0.5, -0.1], [0.5, -0.8, 1.0]])
        );
    }

    #[test]
    fn perfect_prediction_has_zero_loss() {
        let target = arr2(&[[0.3, -0.7], [1.2, 0.0]]);
        let loss = MeanSquaredError::compute(target.view(), target.view());
        assert_relative_eq!(0.0, loss.value());
    }
}
