//! optimisation — shared error surface, capability sets, and validation.
//!
//! Purpose
//! -------
//! Hold the pieces every other layer above `data` depends on: the unified
//! [`OptError`](errors::OptError) / [`OptResult`](errors::OptResult) pair,
//! the [`Capability`](capabilities::Capability) vocabulary operators and
//! functions use to advertise what they implement, and the validation
//! helpers behind every option struct.
//!
//! Invariants & assumptions
//! ------------------------
//! - Container errors convert into `OptError` via `From`, so operator and
//!   function code propagates them with `?`.
//! - Errors raised inside argmin callbacks are recovered as the original
//!   `OptError` when the run returns.
//!
//! Conventions
//! -----------
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw argmin errors.
//! - This module performs no logging.

pub mod capabilities;
pub mod errors;
pub mod validation;

pub mod prelude {
    pub use super::capabilities::{Capabilities, Capability};
    pub use super::errors::{OptError, OptResult};
}
