//! L-BFGS driver for [`LogLikelihood`] objectives.
//!
//! [`maximize`] validates the start point, builds an L-BFGS solver around the
//! configured line search, runs it through an argmin `Executor` on the
//! negated objective ([`NegLogLik`]), and reports back in terms of `ℓ`.
use argmin::{
    core::{Executor, IterState, Solver, State},
    solver::{
        linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
        quasinewton::LBFGS,
    },
};
use tracing::debug;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        problem::NegLogLik,
        traits::{Cost, DEFAULT_LBFGS_MEM, Grad, LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Theta},
    },
};

type SolverState = IterState<Theta, Grad, (), (), (), Cost>;

/// Maximize `ℓ(θ)` from `theta0` with L-BFGS.
///
/// # Errors
/// Whatever `f.check` rejects, invalid solver tolerances, errors raised by
/// the objective during the run (returned as the objective raised them),
/// argmin failures as [`OptError::Backend`](crate::optimization::errors::OptError::Backend),
/// and a non-finite final estimate.
///
/// # Example
/// ```
/// use ndarray::array;
/// use rust_forecasting::optimization::prelude::*;
///
/// struct Quadratic;
/// impl LogLikelihood for Quadratic {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-(theta - 1.0).mapv(|v| v * v).sum())
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Quadratic, array![0.0, 3.0], &(), &MLEOptions::default())?;
/// assert!((out.theta_hat[0] - 1.0).abs() < 1e-4);
/// # Ok::<(), OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = NegLogLik::new(f, data);
    let outcome = match opts.line_searcher {
        LineSearcher::MoreThuente => execute(problem, lbfgs(MoreThuenteLineSearch::new(), opts)?, theta0, opts),
        LineSearcher::HagerZhang => execute(problem, lbfgs(HagerZhangLineSearch::new(), opts)?, theta0, opts),
    }?;
    debug!(
        value = outcome.value,
        iterations = outcome.iterations,
        status = %outcome.status,
        "log-likelihood maximization finished"
    );
    Ok(outcome)
}

fn lbfgs<L>(line_search: L, opts: &MLEOptions) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    let mut solver = LBFGS::new(line_search, opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM));
    if let Some(tol) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol)?;
    }
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol)?;
    }
    Ok(solver)
}

fn execute<'a, F, S>(
    problem: NegLogLik<'a, F>, solver: S, theta0: Theta, opts: &MLEOptions,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<NegLogLik<'a, F>, SolverState> + Send + 'static,
{
    let mut executor = Executor::new(problem, solver).configure(|state| state.param(theta0));
    if let Some(max_iter) = opts.tols.max_iter {
        executor = executor.configure(|state| state.max_iters(max_iter as u64));
    }
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        executor = executor.add_observer(
            argmin_observer_slog::SlogLogger::term_noblock(),
            argmin::core::observers::ObserverMode::Always,
        );
    }

    let mut state = executor.run()?.state().clone();
    let grad = state.take_gradient();
    OptimOutcome::new(
        state.take_best_param(),
        -state.get_best_cost(),
        state.get_termination_status().clone(),
        state.get_iter(),
        state.get_func_counts().clone(),
        grad,
    )
}
