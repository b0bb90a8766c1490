//! algorithms::lbfgs::builders — L-BFGS solver construction.
//!
//! The builders pick the line search and history size from
//! [`LbfgsOptions`] and apply the optional tolerances. The starting point
//! and the iteration cap are left to the runner.
use argmin::solver::quasinewton::LBFGS;

use crate::{
    algorithms::lbfgs::{
        traits::LbfgsOptions,
        types::{Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta},
    },
    optimisation::errors::OptResult,
};

/// L-BFGS with the Hager–Zhang line search.
///
/// # Errors
/// - Tolerances argmin rejects, converted through `From<argmin::core::Error>`.
pub fn build_optimizer_hager_zhang(opts: &LbfgsOptions) -> OptResult<LbfgsHagerZhang> {
    let lbfgs = LbfgsHagerZhang::new(HagerZhangLS::new(), opts.lbfgs_mem);
    configure_lbfgs(lbfgs, opts)
}

/// L-BFGS with the More–Thuente line search.
///
/// # Errors
/// - Tolerances argmin rejects.
pub fn build_optimizer_more_thuente(opts: &LbfgsOptions) -> OptResult<LbfgsMoreThuente> {
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), opts.lbfgs_mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply `tol_grad` / `tol_cost` when present; argmin's defaults stay in
/// effect otherwise.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &LbfgsOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
