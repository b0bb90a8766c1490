//! algorithms::traits — the `Solver` interface driven by `Algorithm`.
use crate::{data::container::Container, optimisation::errors::OptResult};

/// Solver — one iterative method, advanced one update at a time.
///
/// Required methods
/// ----------------
/// - `name`: identifier used in errors and logs.
/// - `solution`: current primal iterate.
/// - `update`: perform one full iteration. Implementations compute every
///   new quantity first and commit only when all of them succeeded, so an
///   error leaves the iterate unchanged.
/// - `objective`: objective value at the current iterate. May be `+∞`.
/// - `restore`: put back the primal iterate held before a rejected update.
///   The engine never calls `update` again afterwards, so auxiliary state
///   (duals, momentum) need not be rewound.
///
/// Provided methods
/// ----------------
/// - `last_change`: relative iterate change `‖xₖ − xₖ₋₁‖ / ‖xₖ‖` of the
///   last update, used by `StoppingCriterion::RelativeIterateChange`.
///   `None` before the first update or when the solver does not track it.
pub trait Solver: Send {
    fn name(&self) -> &str;

    fn solution(&self) -> &Container;

    fn update(&mut self) -> OptResult<()>;

    fn objective(&self) -> OptResult<f64>;

    fn restore(&mut self, iterate: Container);

    fn last_change(&self) -> Option<f64> {
        None
    }
}

/// `‖new − old‖ / ‖new‖`, falling back to the absolute change when `new`
/// is zero.
pub(crate) fn relative_change(new: &Container, old: &Container) -> OptResult<f64> {
    let diff = new.subtract(old)?.norm();
    let scale = new.norm();
    Ok(if scale > 0.0 { diff / scale } else { diff })
}
