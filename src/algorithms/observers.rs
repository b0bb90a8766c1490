//! algorithms::observers — read-only progress callbacks.
//!
//! Purpose
//! -------
//! Let callers watch a running `Algorithm` without touching its state:
//! collect histories, log progress, or request an early stop.
//!
//! Key behaviors
//! -------------
//! - [`Observer`]: called after every update with a [`Snapshot`]; returns
//!   [`ObserverAction::Stop`] to end the run with state `Stopped`.
//! - Any `FnMut(&Snapshot) -> ObserverAction` is an observer.
//! - [`HistoryObserver`]: collects `(iteration, objective)` pairs into a
//!   shared buffer the caller keeps a handle to.
//! - `SlogObserver` (feature `obs_slog`): structured progress lines through
//!   `slog`, to the terminal by default.
//!
//! Invariants & assumptions
//! ------------------------
//! - Snapshots borrow the iterate immutably; observers cannot change the
//!   algorithm's state except through the returned action.
use std::sync::{Arc, Mutex};

use crate::{algorithms::engine::AlgorithmState, data::container::Container};

/// Snapshot — view of an algorithm after one update.
///
/// Fields
/// ------
/// - `algorithm`: solver name.
/// - `iteration`: completed iterations.
/// - `objective`: most recently recorded objective value.
/// - `iterate`: current primal iterate.
/// - `state`: state after the update.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub algorithm: &'a str,
    pub iteration: usize,
    pub objective: f64,
    pub iterate: &'a Container,
    pub state: AlgorithmState,
}

/// Decision returned by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObserverAction {
    #[default]
    Continue,
    Stop,
}

/// Observer — progress callback.
pub trait Observer {
    fn observe(&mut self, snapshot: &Snapshot<'_>) -> ObserverAction;
}

impl<F> Observer for F
where
    F: FnMut(&Snapshot<'_>) -> ObserverAction,
{
    fn observe(&mut self, snapshot: &Snapshot<'_>) -> ObserverAction {
        self(snapshot)
    }
}

/// HistoryObserver — records `(iteration, objective)` after every update.
///
/// Clone the observer (or call [`HistoryObserver::records`] on a clone)
/// before handing it to an algorithm; all clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct HistoryObserver {
    records: Arc<Mutex<Vec<(usize, f64)>>>,
}

impl HistoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the records collected so far.
    pub fn records(&self) -> Vec<(usize, f64)> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Observer for HistoryObserver {
    fn observe(&mut self, snapshot: &Snapshot<'_>) -> ObserverAction {
        let entry = (snapshot.iteration, snapshot.objective);
        match self.records.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        ObserverAction::Continue
    }
}

#[cfg(feature = "obs_slog")]
pub use self::slog_observer::SlogObserver;

#[cfg(feature = "obs_slog")]
mod slog_observer {
    use slog::{Drain, Logger, info, o};

    use super::{Observer, ObserverAction, Snapshot};

    /// SlogObserver — logs one line per update (or every `every` updates).
    #[derive(Debug, Clone)]
    pub struct SlogObserver {
        logger: Logger,
        every: usize,
    }

    impl SlogObserver {
        pub fn new(logger: Logger) -> Self {
            Self { logger, every: 1 }
        }

        /// Asynchronous terminal logger.
        pub fn term() -> Self {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            let drain = slog_async::Async::new(drain).build().fuse();
            Self::new(Logger::root(drain, o!()))
        }

        /// Log only every `every`-th iteration; terminal states are always
        /// logged. `0` is treated as `1`.
        pub fn every(mut self, every: usize) -> Self {
            self.every = every.max(1);
            self
        }
    }

    impl Observer for SlogObserver {
        fn observe(&mut self, snapshot: &Snapshot<'_>) -> ObserverAction {
            if snapshot.iteration % self.every == 0 || snapshot.state.is_terminal() {
                info!(self.logger, "iteration";
                    "algorithm" => snapshot.algorithm,
                    "iter" => snapshot.iteration,
                    "objective" => snapshot.objective,
                    "state" => format!("{:?}", snapshot.state),
                );
            }
            ObserverAction::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::{Geometry, Space};

    #[test]
    // Purpose
    // -------
    // Verify that history clones share one buffer and closures act as
    // observers.
    //
    // Given
    // -----
    // - Two snapshots fed to a `HistoryObserver` and to a closure that stops
    //   after iteration 2.
    //
    // Expect
    // ------
    // - The retained clone sees both records; the closure returns `Continue`
    //   then `Stop`.
    fn history_and_closure_observers() {
        // Arrange
        let x = Space::dense(Geometry::new(&[2]).unwrap()).allocate(0.0);
        let history = HistoryObserver::new();
        let mut attached = history.clone();
        let mut stop_after_two = |s: &Snapshot<'_>| {
            if s.iteration >= 2 { ObserverAction::Stop } else { ObserverAction::Continue }
        };
        let snap = |iteration, objective| Snapshot {
            algorithm: "test",
            iteration,
            objective,
            iterate: &x,
            state: AlgorithmState::Running,
        };

        // Act
        attached.observe(&snap(1, 4.0));
        attached.observe(&snap(2, 1.0));
        let first = stop_after_two.observe(&snap(1, 4.0));
        let second = stop_after_two.observe(&snap(2, 1.0));

        // Assert
        assert_eq!(history.records(), vec![(1, 4.0), (2, 1.0)]);
        assert_eq!(first, ObserverAction::Continue);
        assert_eq!(second, ObserverAction::Stop);
    }
}
