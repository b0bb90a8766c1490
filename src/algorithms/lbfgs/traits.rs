//! algorithms::lbfgs::traits — options and outcome of the L-BFGS bridge.
//!
//! - [`LineSearcher`]: line search used by L-BFGS, parseable from a
//!   case-insensitive name.
//! - [`LbfgsOptions`]: validated run controls.
//! - [`LbfgsOutcome`]: best iterate (back in container form) and the solver
//!   diagnostics argmin reports.
use std::str::FromStr;

use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;

use crate::{
    algorithms::lbfgs::types::{
        DEFAULT_LBFGS_MAX_ITER, DEFAULT_LBFGS_MEM, DEFAULT_LBFGS_TOL_GRAD, FnEvalMap, Grad, Theta,
    },
    data::{container::Container, geometry::Space},
    optimisation::{
        errors::{OptError, OptResult},
        validation::{validate_objective, verify_max_iter, verify_tolerance},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSearcher {
    #[default]
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    /// Accepts `"MoreThuente"` or `"HagerZhang"` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// LbfgsOptions — controls for `minimize_lbfgs`.
///
/// Fields
/// ------
/// - `max_iter`: iteration cap (`>= 1`).
/// - `tol_grad`: stop once `‖∇f‖ ≤ tol_grad` (argmin default when `None`).
/// - `tol_cost`: stop once the cost change falls below `tol_cost`.
/// - `line_searcher`: More–Thuente (default) or Hager–Zhang.
/// - `lbfgs_mem`: history size (`>= 1`).
/// - `verbose`: attach argmin's slog observer (feature `obs_slog`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbfgsOptions {
    pub max_iter: usize,
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: usize,
    pub verbose: bool,
}

impl LbfgsOptions {
    /// # Errors
    /// - `InvalidMaxIter` if `max_iter == 0`.
    /// - `InvalidTolerance` for a negative or non-finite tolerance.
    /// - `InvalidLBFGSMem` if `lbfgs_mem == 0`.
    pub fn new(
        max_iter: usize, tol_grad: Option<f64>, tol_cost: Option<f64>,
        line_searcher: LineSearcher, lbfgs_mem: usize,
    ) -> OptResult<Self> {
        verify_max_iter(max_iter)?;
        if let Some(tol) = tol_grad {
            verify_tolerance(tol)?;
        }
        if let Some(tol) = tol_cost {
            verify_tolerance(tol)?;
        }
        if lbfgs_mem == 0 {
            return Err(OptError::InvalidLBFGSMem {
                mem: lbfgs_mem,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { max_iter, tol_grad, tol_cost, line_searcher, lbfgs_mem, verbose: false })
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for LbfgsOptions {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_LBFGS_MAX_ITER,
            tol_grad: Some(DEFAULT_LBFGS_TOL_GRAD),
            tol_cost: None,
            line_searcher: LineSearcher::default(),
            lbfgs_mem: DEFAULT_LBFGS_MEM,
            verbose: false,
        }
    }
}

/// LbfgsOutcome — result of `minimize_lbfgs`.
///
/// - `solution`: best iterate, in the space of `x0`.
/// - `value`: objective at `solution`.
/// - `converged`: argmin reported `SolverConverged` or `TargetCostReached`.
/// - `status`: argmin's termination status as text.
/// - `iterations`: L-BFGS iterations performed.
/// - `fn_evals`: argmin's evaluation counters.
/// - `grad_norm`: norm of the last gradient, if argmin kept one.
#[derive(Debug, Clone, PartialEq)]
pub struct LbfgsOutcome {
    pub solution: Container,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl LbfgsOutcome {
    /// Build an outcome from argmin's final state.
    ///
    /// # Errors
    /// - `NotInitialized` if argmin kept no best parameter.
    /// - `NonFiniteObjective` for a NaN or `−∞` best cost.
    /// - `Data(FlatLengthMismatch)` if the parameter does not fit `space`.
    pub fn new(
        best: Option<Theta>, space: &Space, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta = best.ok_or_else(|| OptError::NotInitialized {
            text: "L-BFGS finished without a best parameter".to_string(),
        })?;
        let value = validate_objective(value)?;
        let solution = space.unflatten(&theta)?;
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            )
        );
        let status = match &termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            TerminationStatus::Terminated(reason) => format!("{reason:?}"),
        };
        Ok(Self {
            solution,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.l2_norm()),
        })
    }
}
