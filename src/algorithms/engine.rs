//! algorithms::engine — the iteration state machine shared by all solvers.
//!
//! Purpose
//! -------
//! Drive any [`Solver`] through a uniform lifecycle: iteration counting,
//! objective bookkeeping, stopping criteria, observer notification, and
//! failure handling. Solvers only implement one update; everything around
//! it lives here.
//!
//! Key behaviors
//! -------------
//! - States: `Initialized → Running → {Converged, MaxIterationsReached,
//!   Stopped, Failed}`. Terminal states are sticky.
//! - [`Algorithm::new`] evaluates and records the objective at iteration 0.
//! - [`Algorithm::step`] runs one update, records the objective every
//!   `update_objective_interval` iterations and at the final one, applies
//!   the stopping criterion, then notifies observers.
//! - Convergence takes precedence over the iteration cap when both happen
//!   at the same iteration.
//! - An observer returning `Stop` moves a running algorithm to `Stopped`.
//! - Errors from the solver move the algorithm to `Failed` and are returned
//!   wrapped in `OptError::AlgorithmFailure`; the last valid iterate and the
//!   history stay readable.
//! - An update whose objective is rejected (NaN, `−∞`, or an evaluation
//!   error) is rolled back: the solver gets its previous iterate back and
//!   the iteration is not counted.
//!
//! Invariants & assumptions
//! ------------------------
//! - History iterations are strictly increasing.
//! - `iteration()` counts accepted updates only, so after a failure it
//!   equals the iteration of the last history entry whenever the objective
//!   is recorded every iteration.
//! - The solver's `update` is atomic: a failed update leaves the iterate
//!   unchanged.
//!
//! Downstream usage
//! ----------------
//! - Build a solver, wrap it with `Algorithm::new(solver, config)?`, attach
//!   observers, then call `run(None)` or drive `step()` by hand.
//! - Independent algorithms are `Send` and can run on separate threads.
use crate::{
    algorithms::{
        config::{AlgorithmConfig, StoppingCriterion},
        observers::{Observer, ObserverAction, Snapshot},
        traits::Solver,
    },
    data::container::Container,
    optimisation::{
        errors::{OptError, OptResult},
        validation::validate_objective,
    },
};

/// AlgorithmState — lifecycle of an [`Algorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmState {
    Initialized,
    Running,
    Converged,
    MaxIterationsReached,
    Stopped,
    Failed,
}

impl AlgorithmState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AlgorithmState::Converged
                | AlgorithmState::MaxIterationsReached
                | AlgorithmState::Stopped
                | AlgorithmState::Failed
        )
    }
}

/// ObjectiveRecord — one entry of the objective history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveRecord {
    pub iteration: usize,
    pub value: f64,
}

/// RunOutcome — result of [`Algorithm::run`].
///
/// Fields
/// ------
/// - `algorithm`: solver name.
/// - `solution`: final iterate.
/// - `objective`: last recorded objective.
/// - `state`: state at return (`Running` if `max_steps` ran out first).
/// - `iterations`: completed iterations.
/// - `history`: full objective history.
/// - `converged`: `state == Converged`.
/// - `tolerance`: tolerance the run was configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub algorithm: String,
    pub solution: Container,
    pub objective: f64,
    pub state: AlgorithmState,
    pub iterations: usize,
    pub history: Vec<ObjectiveRecord>,
    pub converged: bool,
    pub tolerance: f64,
}

impl RunOutcome {
    /// # Errors
    /// - `NonConvergence` unless the run ended in `Converged`.
    pub fn require_converged(self) -> OptResult<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(OptError::NonConvergence {
                solver: self.algorithm,
                iterations: self.iterations,
                tolerance: self.tolerance,
            })
        }
    }
}

/// Algorithm — a solver plus its run state.
pub struct Algorithm<S: Solver> {
    solver: S,
    config: AlgorithmConfig,
    state: AlgorithmState,
    iteration: usize,
    history: Vec<ObjectiveRecord>,
    observers: Vec<Box<dyn Observer + Send>>,
    failure: Option<OptError>,
}

impl<S: Solver> std::fmt::Debug for Algorithm<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Algorithm")
            .field("solver", &self.solver.name())
            .field("config", &self.config)
            .field("state", &self.state)
            .field("iteration", &self.iteration)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<S: Solver> Algorithm<S> {
    /// Wrap `solver` and record its initial objective.
    ///
    /// # Errors
    /// - `NonFiniteObjective` if the initial objective is NaN or `−∞`.
    /// - Any error from the solver's `objective`.
    pub fn new(solver: S, config: AlgorithmConfig) -> OptResult<Self> {
        let initial = validate_objective(solver.objective()?)?;
        #[allow(unused_mut)]
        let mut observers: Vec<Box<dyn Observer + Send>> = Vec::new();
        #[cfg(feature = "obs_slog")]
        if config.verbose {
            observers.push(Box::new(crate::algorithms::observers::SlogObserver::term()));
        }
        Ok(Self {
            solver,
            config,
            state: AlgorithmState::Initialized,
            iteration: 0,
            history: vec![ObjectiveRecord { iteration: 0, value: initial }],
            observers,
            failure: None,
        })
    }

    /// Attach an observer (builder form).
    pub fn with_observer<O: Observer + Send + 'static>(mut self, observer: O) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn add_observer<O: Observer + Send + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> AlgorithmState {
        self.state
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn history(&self) -> &[ObjectiveRecord] {
        &self.history
    }

    /// Most recently recorded objective.
    pub fn objective(&self) -> f64 {
        self.history.last().map_or(f64::NAN, |r| r.value)
    }

    pub fn solution(&self) -> &Container {
        self.solver.solution()
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn config(&self) -> &AlgorithmConfig {
        &self.config
    }

    pub fn into_solver(self) -> S {
        self.solver
    }

    /// Perform one iteration.
    ///
    /// Returns the state after the iteration. On a terminal state other
    /// than `Failed` this is a no-op.
    ///
    /// # Errors
    /// - `AlgorithmFailure` wrapping the solver's error; the state becomes
    ///   `Failed`.
    /// - `AlgorithmFailure` again on every later call once `Failed`.
    pub fn step(&mut self) -> OptResult<AlgorithmState> {
        if self.state == AlgorithmState::Failed {
            let err = match &self.failure {
                Some(err) => err.clone(),
                None => self.wrap_failure(OptError::UnknownError),
            };
            return Err(err);
        }
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        self.state = AlgorithmState::Running;

        let previous = self.solver.solution().clone();
        if let Err(err) = self.solver.update() {
            return Err(self.fail(err));
        }
        let iteration = self.iteration + 1;

        let at_cap = iteration >= self.config.max_iter;
        let iterate_converged = self.config.criterion == StoppingCriterion::RelativeIterateChange
            && self.solver.last_change().is_some_and(|c| c <= self.config.tolerance);
        let scheduled = iteration % self.config.update_objective_interval == 0;

        let mut converged = iterate_converged;
        if scheduled || at_cap || iterate_converged {
            let previous_value = self.objective();
            let value = match self.evaluate_objective() {
                Ok(v) => v,
                Err(err) => return Err(self.reject(previous, err)),
            };
            self.history.push(ObjectiveRecord { iteration, value });
            if self.config.criterion == StoppingCriterion::RelativeObjectiveChange {
                converged = objective_converged(previous_value, value, self.config.tolerance);
            }
        }
        self.iteration = iteration;

        self.state = if converged {
            AlgorithmState::Converged
        } else if at_cap {
            AlgorithmState::MaxIterationsReached
        } else {
            AlgorithmState::Running
        };

        if self.notify() == ObserverAction::Stop && self.state == AlgorithmState::Running {
            self.state = AlgorithmState::Stopped;
            if self.history.last().is_some_and(|r| r.iteration != iteration) {
                match self.evaluate_objective() {
                    Ok(value) => self.history.push(ObjectiveRecord { iteration, value }),
                    Err(err) => {
                        self.iteration = iteration - 1;
                        return Err(self.reject(previous, err));
                    }
                }
            }
        }
        Ok(self.state)
    }

    /// Iterate until a terminal state, or at most `max_steps` more steps.
    ///
    /// # Errors
    /// - `AlgorithmFailure` from [`Algorithm::step`].
    pub fn run(&mut self, max_steps: Option<usize>) -> OptResult<RunOutcome> {
        let mut steps = 0;
        while !self.state.is_terminal() && max_steps.is_none_or(|n| steps < n) {
            self.step()?;
            steps += 1;
        }
        if self.state == AlgorithmState::Failed {
            self.step()?;
        }
        Ok(self.outcome())
    }

    /// Snapshot of the current result.
    pub fn outcome(&self) -> RunOutcome {
        RunOutcome {
            algorithm: self.solver.name().to_string(),
            solution: self.solver.solution().clone(),
            objective: self.objective(),
            state: self.state,
            iterations: self.iteration,
            history: self.history.clone(),
            converged: self.state == AlgorithmState::Converged,
            tolerance: self.config.tolerance,
        }
    }

    // ---- Helpers ----

    fn evaluate_objective(&self) -> OptResult<f64> {
        validate_objective(self.solver.objective()?)
    }

    fn notify(&mut self) -> ObserverAction {
        let snapshot = Snapshot {
            algorithm: self.solver.name(),
            iteration: self.iteration,
            objective: self.history.last().map_or(f64::NAN, |r| r.value),
            iterate: self.solver.solution(),
            state: self.state,
        };
        let mut action = ObserverAction::Continue;
        for observer in self.observers.iter_mut() {
            if observer.observe(&snapshot) == ObserverAction::Stop {
                action = ObserverAction::Stop;
            }
        }
        action
    }

    fn wrap_failure(&self, source: OptError) -> OptError {
        OptError::AlgorithmFailure {
            algorithm: self.solver.name().to_string(),
            iteration: self.iteration,
            source: Box::new(source),
        }
    }

    fn fail(&mut self, source: OptError) -> OptError {
        let err = self.wrap_failure(source);
        self.state = AlgorithmState::Failed;
        self.failure = Some(err.clone());
        err
    }

    /// Roll the solver back to `previous` and fail.
    fn reject(&mut self, previous: Container, source: OptError) -> OptError {
        self.solver.restore(previous);
        self.fail(source)
    }
}

fn objective_converged(previous: f64, current: f64, tolerance: f64) -> bool {
    if !previous.is_finite() || !current.is_finite() {
        return false;
    }
    (current - previous).abs() <= tolerance * previous.abs().max(f64::MIN_POSITIVE)
}
