//! algorithms — iterative solvers and the state machine that drives them.
//!
//! Purpose
//! -------
//! Separate "what one iteration does" ([`traits::Solver`]) from "how a run
//! proceeds" ([`engine::Algorithm`]): stopping rules, objective history,
//! observers, and failure handling live in the engine, so every solver gets
//! them for free.
//!
//! Key behaviors
//! -------------
//! - Solvers: gradient descent, ISTA, FISTA, PDHG, CGLS, and the FGP
//!   denoiser used as the TV proximal solver.
//! - [`tgv`]: the PDHG-based inner solver behind total generalised
//!   variation.
//! - [`lbfgs`]: argmin-backed L-BFGS for smooth objectives.
//! - [`observers`]: read-only callbacks (history, slog logging, early stop).
//!
//! Invariants & assumptions
//! ------------------------
//! - Solvers own their iterates and are `Send`; independent runs can be
//!   moved to separate threads.
//! - Capability requirements are checked when a solver is built, not on
//!   the first update.
pub mod cgls;
pub mod config;
pub mod engine;
pub mod fgp;
pub mod gradient_descent;
pub mod lbfgs;
pub mod observers;
pub mod pdhg;
pub mod proximal_gradient;
pub mod step_size;
pub mod tgv;
pub mod traits;

pub mod prelude {
    pub use super::cgls::Cgls;
    pub use super::config::{AlgorithmConfig, StoppingCriterion};
    pub use super::engine::{Algorithm, AlgorithmState, ObjectiveRecord, RunOutcome};
    pub use super::fgp::{FgpDenoiser, FgpSolver};
    pub use super::gradient_descent::GradientDescent;
    pub use super::lbfgs::{LbfgsOptions, LbfgsOutcome, LineSearcher, minimize_lbfgs};
    #[cfg(feature = "obs_slog")]
    pub use super::observers::SlogObserver;
    pub use super::observers::{HistoryObserver, Observer, ObserverAction, Snapshot};
    pub use super::pdhg::Pdhg;
    pub use super::proximal_gradient::{Fista, Ista};
    pub use super::step_size::StepSize;
    pub use super::tgv::PdhgTgvSolver;
    pub use super::traits::Solver;
}
