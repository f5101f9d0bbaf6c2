use ndarray::{Array2, ArrayView2};

/// Forward context of one affine transform, produced by [`forward`] and
/// consumed by the matching backward step of the same batch.
pub struct AffineContext {
    input: Array2<f64>,
    weights: Array2<f64>,
}

impl AffineContext {
    /// Local Jacobian factors of the transform: `W` for the gradient
    /// flowing to the previous layer and `xᵀ` for the weight gradient.
    ///
    /// These are not final gradients; the caller combines each factor with
    /// the gradient arriving from the layer above, per the chain rule.
    pub fn factors(&self) -> (ArrayView2<f64>, ArrayView2<f64>) {
        (self.weights.view(), self.input.t())
    }
}

/// Compute `x · W + b`, broadcasting the bias row over the batch.
///
/// `x` has shape `(batch, fan_in)`, `weights` `(fan_in, fan_out)` and
/// `bias` `(1, fan_out)`. Returns the score together with the context the
/// backward step needs.
pub fn forward(
    x: ArrayView2<f64>,
    weights: &Array2<f64>,
    bias: &Array2<f64>,
) -> (Array2<f64>, AffineContext) {
    let score = x.dot(weights) + bias;
    let context = AffineContext {
        input: x.to_owned(),
        weights: weights.clone(),
    };
    (score, context)
}

#[cfg(test)]
mod tests {
    use crate::assert_rel_eq_arr2;

    use super::*;

    use approx::assert_relative_eq;
    use ndarray::arr2;

    #[test]
    fn forward_broadcasts_bias() {
        let x = arr2(&[[1.0, 0.5, -0.5], [0.0, 1.0, 0.5]]);
        let weights = arr2(&[[1.0, 2.0], [-1.0, -1.0], [0.5, 2.0]]);
        let bias = arr2(&[[0.1, -0.2]]);

        let (score, _) = forward(x.view(), &weights, &bias);
        assert_rel_eq_arr2!(score, arr2(&[[0.35, 0.3], [-0.65, -0.2]]));
    }

    #[test]
    fn factors_are_weights_and_transposed_input() {
        let x = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let weights = arr2(&[[0.5], [-0.5]]);
        let bias = arr2(&[[0.0]]);

        let (_, context) = forward(x.view(), &weights, &bias);
        let (input_factor, weight_factor) = context.factors();
        assert_rel_eq_arr2!(input_factor, weights);
        assert_rel_eq_arr2!(weight_factor, arr2(&[[1.0, 3.0], [2.0, 4.0]]));
    }
}
