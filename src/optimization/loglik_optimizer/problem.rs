//! The argmin-facing problem: a [`LogLikelihood`] seen as a cost to minimize.
//!
//! Cost is `-ℓ(θ)` and its gradient is `-∇ℓ(θ)`. Objectives without an
//! analytic gradient are differentiated numerically on the cost itself:
//! central differences first, forward differences when a central step hits
//! an evaluation error or yields a non-finite entry.
use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::traits::{Cost, Grad, LogLikelihood, Theta},
};

/// Negated log-likelihood over borrowed objective and data.
#[derive(Debug)]
pub struct NegLogLik<'a, F: LogLikelihood> {
    objective: &'a F,
    data: &'a F::Data,
}

impl<'a, F: LogLikelihood> NegLogLik<'a, F> {
    pub fn new(objective: &'a F, data: &'a F::Data) -> Self {
        Self { objective, data }
    }

    fn neg_value(&self, theta: &Theta) -> OptResult<Cost> {
        let value = self.objective.value(theta, self.data)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value });
        }
        Ok(-value)
    }

    /// Numerical gradient of the cost.
    fn numerical_gradient(&self, theta: &Theta) -> OptResult<Grad> {
        let failure: RefCell<Option<OptError>> = RefCell::new(None);
        let cost = |t: &Theta| match self.neg_value(t) {
            Ok(c) => c,
            Err(err) => {
                failure.borrow_mut().get_or_insert(err);
                f64::NAN
            }
        };

        let central = theta.central_diff(&cost);
        if failure.borrow().is_none() && check_gradient(&central, theta.len()).is_ok() {
            return Ok(central);
        }

        failure.replace(None);
        let forward = theta.forward_diff(&cost);
        if let Some(err) = failure.take() {
            return Err(err);
        }
        check_gradient(&forward, theta.len())?;
        Ok(forward)
    }
}

impl<F: LogLikelihood> CostFunction for NegLogLik<'_, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Theta) -> Result<Cost, Error> {
        Ok(self.neg_value(theta)?)
    }
}

impl<F: LogLikelihood> Gradient for NegLogLik<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Theta) -> Result<Grad, Error> {
        match self.objective.grad(theta, self.data) {
            Ok(g) => {
                check_gradient(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => Ok(self.numerical_gradient(theta)?),
            Err(err) => Err(err.into()),
        }
    }
}

/// Length and finiteness check for any gradient entering the solver.
pub fn check_gradient(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().enumerate().find(|(_, g)| !g.is_finite()) {
        Some((index, &value)) => Err(OptError::InvalidGradient { index, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign flips between ℓ and the cost for values and analytic gradients.
    // - The numerical-gradient fallback and its forward-difference retry.
    // - Rejection of malformed analytic gradients.
    // -------------------------------------------------------------------------

    /// ℓ(θ) = -(θ₀² + 2θ₁²); θ₀ > `limit` is an evaluation error.
    struct Bowl {
        analytic: bool,
        limit: f64,
        bad_grad: bool,
    }

    impl LogLikelihood for Bowl {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            if theta[0] > self.limit {
                return Err(OptError::InvalidLogLikInput { value: theta[0] });
            }
            Ok(-(theta[0] * theta[0] + 2.0 * theta[1] * theta[1]))
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            if self.bad_grad {
                return Ok(array![f64::NAN, 0.0]);
            }
            if !self.analytic {
                return Err(OptError::GradientNotImplemented);
            }
            Ok(array![-2.0 * theta[0], -4.0 * theta[1]])
        }
    }

    #[test]
    // Purpose
    // -------
    // Cost and analytic gradient are the negated log-likelihood quantities.
    //
    // Given
    // -----
    // - θ = [1, 1] with an analytic gradient.
    //
    // Expect
    // ------
    // - cost = 3, gradient = [2, 4].
    fn cost_and_gradient_flip_sign() {
        let f = Bowl { analytic: true, limit: f64::INFINITY, bad_grad: false };
        let problem = NegLogLik::new(&f, &());

        assert_abs_diff_eq!(problem.cost(&array![1.0, 1.0]).expect("finite"), 3.0);
        let g = problem.gradient(&array![1.0, 1.0]).expect("finite");
        assert_abs_diff_eq!(g[0], 2.0);
        assert_abs_diff_eq!(g[1], 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic gradient, central differences approximate the
    // cost gradient; an evaluation error that survives the forward retry is
    // reported as is.
    //
    // Given
    // -----
    // - θ = [1, -1]; once with no domain limit, once with θ₀ > 1 invalid.
    //
    // Expect
    // ------
    // - Gradient ≈ [2, -4]; then `InvalidLogLikInput`.
    fn numerical_gradient_approximates_or_reports_domain_errors() {
        let open = Bowl { analytic: false, limit: f64::INFINITY, bad_grad: false };
        let g = NegLogLik::new(&open, &()).gradient(&array![1.0, -1.0]).expect("central");
        assert_abs_diff_eq!(g[0], 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(g[1], -4.0, epsilon = 1e-5);

        let edge = Bowl { analytic: false, limit: 1.0, bad_grad: false };
        let g = NegLogLik::new(&edge, &()).gradient(&array![1.0, -1.0]);
        assert!(matches!(g.map_err(OptError::from), Err(OptError::InvalidLogLikInput { .. })));
    }

    #[test]
    // Purpose
    // -------
    // A non-finite analytic gradient is rejected rather than handed to the
    // line search.
    //
    // Given
    // -----
    // - An objective whose gradient has a NaN in position 0.
    //
    // Expect
    // ------
    // - `InvalidGradient { index: 0, .. }`.
    fn non_finite_analytic_gradient_is_rejected() {
        let f = Bowl { analytic: true, limit: f64::INFINITY, bad_grad: true };

        let err = NegLogLik::new(&f, &()).gradient(&array![0.0, 0.0]).map_err(OptError::from);

        assert!(matches!(err, Err(OptError::InvalidGradient { index: 0, .. })));
    }
}
