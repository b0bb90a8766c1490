//! algorithms::lbfgs — bridge from `Function` objectives to argmin's L-BFGS.
//!
//! Purpose
//! -------
//! Smooth objectives without a convenient Lipschitz constant are often
//! better served by a quasi-Newton method than by gradient descent. This
//! module runs argmin's L-BFGS on the flattened container and hands the
//! result back in the original space.
//!
//! Key behaviors
//! -------------
//! - [`minimize_lbfgs`] is the entry point; [`LbfgsOptions`] selects the
//!   line search (More–Thuente or Hager–Zhang), history size, tolerances
//!   and iteration cap.
//! - Gradients come from `Function::gradient` when offered, otherwise from
//!   `finitediff` central (then forward) differences.
//! - Errors raised by the function inside argmin come back as the original
//!   `OptError`.
//!
//! Conventions
//! -----------
//! - This bridge does not go through `Algorithm`; argmin owns the loop, and
//!   progress logging uses argmin's own slog observer.
pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;

pub use self::api::minimize_lbfgs;
pub use self::traits::{LbfgsOptions, LbfgsOutcome, LineSearcher};
pub use self::types::{DEFAULT_LBFGS_MEM, FnEvalMap};
