//! algorithms::lbfgs::run — executes an argmin solver on a
//! [`FunctionAdapter`] and converts the final state into an
//! [`LbfgsOutcome`].
#[cfg(feature = "obs_slog")]
use argmin::core::observers::ObserverMode;
use argmin::core::{Executor, IterState, State};

use crate::{
    algorithms::lbfgs::{
        adapter::FunctionAdapter,
        traits::{LbfgsOptions, LbfgsOutcome},
        types::{Grad, Theta},
    },
    functions::traits::Function,
    optimisation::errors::OptResult,
};

/// Run `solver` from `theta0` for at most `opts.max_iter` iterations.
///
/// With feature `obs_slog` and `opts.verbose`, argmin's non-blocking
/// terminal logger observes every iteration.
///
/// # Errors
/// - Any argmin runtime error, including errors raised by the function
///   inside cost or gradient evaluations (recovered as the original
///   `OptError`).
/// - Outcome validation errors (see [`LbfgsOutcome::new`]).
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &LbfgsOptions, problem: FunctionAdapter<'a, F>, solver: S,
) -> OptResult<LbfgsOutcome>
where
    F: Function + ?Sized,
    S: argmin::core::Solver<FunctionAdapter<'a, F>, IterState<Theta, Grad, (), (), (), f64>>
        + Send
        + 'static,
{
    let space = problem.space().clone();
    #[cfg_attr(not(feature = "obs_slog"), allow(unused_mut))]
    let mut optimizer = Executor::new(problem, solver)
        .configure(|state| state.param(theta0).max_iters(opts.max_iter as u64));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, ObserverMode::Always);
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    LbfgsOutcome::new(
        result.take_best_param(),
        &space,
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}
