//! algorithms::lbfgs::api — `minimize_lbfgs`, the high-level entry point.
use crate::{
    algorithms::lbfgs::{
        adapter::FunctionAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LbfgsOptions, LbfgsOutcome, LineSearcher},
    },
    data::container::Container,
    functions::traits::{Function, require},
    optimisation::{capabilities::Capability, errors::OptResult},
};

/// Minimise `f` from `x0` with L-BFGS.
///
/// The container is flattened (block parts concatenated), argmin runs on
/// the flat vector, and the best iterate comes back in the space of `x0`.
/// The analytic gradient is used when `f` offers one; otherwise it is
/// approximated by finite differences.
///
/// # Errors
/// - `UnsupportedOperation` if `f` has no value.
/// - `NonFiniteObjective` if `f(x0)` (or any trial point) is not finite.
/// - Builder and argmin runtime errors.
///
/// # Example
/// ```ignore
/// let f = L2NormSquared::centered_at(b.clone());
/// let out = minimize_lbfgs(&f, &b.zeros_like(), &LbfgsOptions::default())?;
/// assert!(out.converged);
/// ```
pub fn minimize_lbfgs<F: Function + ?Sized>(
    f: &F, x0: &Container, opts: &LbfgsOptions,
) -> OptResult<LbfgsOutcome> {
    require(f, Capability::Value)?;
    let problem = FunctionAdapter::new(f, x0.space());
    let theta0 = x0.to_flat();
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}
