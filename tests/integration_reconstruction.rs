//! Integration tests for the reconstruction pipeline.
//!
//! Purpose
//! -------
//! - Validate end-to-end reconstructions: geometry-tagged data, operators
//!   and functions assembled into an objective, and an `Algorithm` driving
//!   a solver to a terminal state.
//! - Cross-check solvers against each other on the same problem rather than
//!   against hard-coded answers only.
//!
//! Coverage
//! --------
//! - `data`: geometry checks across containers and operator boundaries.
//! - `operators`: `[A; I]` block operators and their adjoints.
//! - `functions`: Moreau decomposition for closed-form conjugates, box
//!   projections, least squares, total variation.
//! - `algorithms`: gradient descent (identity denoising, monotone decrease,
//!   iteration cap), PDHG vs FISTA with a TV proximal map, and independent
//!   runs on separate threads.
//!
//! Exclusions
//! ----------
//! - Per-operation edge cases of each building block; those live in the
//!   unit tests next to each module.
//! - Python bindings.
use std::sync::Arc;

use approx::assert_relative_eq;
use ndarray::{Array1, array};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::Normal;
use rust_cil::{
    algorithms::{
        config::{AlgorithmConfig, StoppingCriterion},
        engine::{Algorithm, AlgorithmState},
        gradient_descent::GradientDescent,
        pdhg::Pdhg,
        proximal_gradient::Fista,
        step_size::StepSize,
    },
    data::{
        block::BlockContainer,
        container::Container,
        errors::DataError,
        geometry::{Geometry, Space},
    },
    functions::{
        composition::ScaledFunction,
        indicator::IndicatorBox,
        least_squares::LeastSquares,
        norms::{L1Norm, L2NormSquared, MixedL21Norm},
        total_variation::{TotalVariation, TvOptions},
        traits::Function,
    },
    operators::{
        basic::{IdentityOperator, MatrixOperator},
        block::BlockOperator,
        finite_difference::{Boundary, GradientOperator},
        traits::Operator,
    },
    optimisation::errors::OptError,
};

/// Purpose
/// -------
/// Dense space of the given shape with default labels and unit spacing.
fn space(shape: &[usize]) -> Space {
    Space::dense(Geometry::new(shape).unwrap())
}

/// Purpose
/// -------
/// Wrap `values` as a container of `space`.
fn container(space: &Space, values: &[f64]) -> Container {
    space.unflatten(&Array1::from(values.to_vec())).unwrap()
}

/// Purpose
/// -------
/// Small overdetermined system used by several scenarios.
///
/// Returns
/// -------
/// - `A = [[1, 2], [0, 1], [1, −1]]` as an operator from `[2]` to `[3]`.
fn tall_matrix() -> Arc<dyn Operator> {
    Arc::new(MatrixOperator::new(array![[1.0, 2.0], [0.0, 1.0], [1.0, -1.0]]).unwrap())
}

/// Purpose
/// -------
/// `AlgorithmConfig` with the given cap, tolerance and criterion,
/// recording the objective every iteration.
fn config(max_iter: usize, tolerance: f64, criterion: StoppingCriterion) -> AlgorithmConfig {
    AlgorithmConfig::new(max_iter, tolerance, criterion, 1).unwrap()
}

/// Purpose
/// -------
/// Noisy 4×4 piecewise-constant image used by the TV scenarios.
///
/// Returns
/// -------
/// - A bright 2×2 square on a dark background with a dim corner, plus a
///   deterministic perturbation of amplitude `≤ 0.075`.
fn noisy_square() -> Container {
    let clean = [
        [0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 1.0, 0.0],
        [0.0, 1.0, 1.0, 0.2],
        [0.0, 0.0, 0.2, 0.2],
    ];
    let mut values = Vec::with_capacity(16);
    for (i, row) in clean.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            values.push(v + 0.05 * (((i * 3 + j * 5) % 4) as f64 - 1.5));
        }
    }
    container(&space(&[4, 4]), &values)
}

#[test]
// Purpose
// -------
// Verify identity denoising by gradient descent: with `A = I` the
// least-squares minimiser is the data itself.
//
// Given
// -----
// - `b = x_true + noise` on 64 samples, `σ = 0.01`, seeded RNG.
// - `F(x) = ½‖x − b‖²`, `α = 1/L`, zero start, at most 100 iterations.
//
// Expect
// ------
// - The run converges within the cap, lands on `b`, and stays within
//   `0.06` of `x_true` everywhere.
fn identity_denoising_by_gradient_descent_converges() {
    // Arrange
    let signal_space = space(&[64]);
    let mut rng = StdRng::seed_from_u64(42);
    let x_true = signal_space.random(&mut rng);
    let noise_dist = Normal::new(0.0, 0.01).unwrap();
    let noise: Array1<f64> = (0..64).map(|_| rng.sample(noise_dist)).collect();
    let b = x_true.add(&signal_space.unflatten(&noise).unwrap()).unwrap();

    let identity: Arc<dyn Operator> = Arc::new(IdentityOperator::new(signal_space.clone()));
    let f: Arc<dyn Function> = Arc::new(LeastSquares::new(identity, b.clone()).unwrap());
    let solver =
        GradientDescent::new(f, signal_space.allocate(0.0), StepSize::Lipschitz).unwrap();

    // Act
    let cfg = config(100, 1e-8, StoppingCriterion::RelativeObjectiveChange);
    let outcome = Algorithm::new(solver, cfg).unwrap().run(None).unwrap();

    // Assert
    assert!(outcome.converged);
    assert!(outcome.iterations <= 100);
    assert_relative_eq!(outcome.objective, 0.0, epsilon = 1e-12);
    let x = outcome.solution.to_flat();
    for (got, want) in x.iter().zip(b.to_flat().iter()) {
        assert_relative_eq!(*got, *want, epsilon = 1e-10);
    }
    assert!(outcome.solution.subtract(&x_true).unwrap().max_abs() < 0.06);
}

#[test]
// Purpose
// -------
// Verify the stacked operator `[A; I]`: direct stacks `[Ax; x]`, adjoint
// sums `Aᵗy₁ + y₂`.
//
// Given
// -----
// - `A = [[1, 2], [0, 1], [1, −1]]`, `x = [1, 2]`,
//   `y₁ = [1, 0, 2]`, `y₂ = [0.5, −1]`.
//
// Expect
// ------
// - `[A; I] x = [[5, 2, −1], [1, 2]]`.
// - `[A; I]ᵗ [y₁; y₂] = [3.5, −1]`.
fn stacked_operator_direct_and_adjoint() {
    // Arrange
    let domain = space(&[2]);
    let identity: Arc<dyn Operator> = Arc::new(IdentityOperator::new(domain.clone()));
    let stacked = BlockOperator::column(vec![tall_matrix(), identity]).unwrap();
    let x = container(&domain, &[1.0, 2.0]);
    let y = Container::from(
        BlockContainer::new(vec![
            container(&space(&[3]), &[1.0, 0.0, 2.0]),
            container(&domain, &[0.5, -1.0]),
        ])
        .unwrap(),
    );

    // Act
    let ax = stacked.direct(&x).unwrap();
    let aty = stacked.adjoint(&y).unwrap();

    // Assert
    let parts = ax.as_block().unwrap().parts();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].to_flat(), array![5.0, 2.0, -1.0]);
    assert_eq!(parts[1].to_flat(), array![1.0, 2.0]);
    assert!(!aty.is_block());
    assert_eq!(aty.to_flat(), array![3.5, -1.0]);
    // ⟨[A; I]x, y⟩ = ⟨x, [A; I]ᵗy⟩
    assert_relative_eq!(ax.dot(&y).unwrap(), x.dot(&aty).unwrap(), epsilon = 1e-12);
}

#[test]
// Purpose
// -------
// Verify the iteration-cap boundary: a run without a stopping criterion
// ends in `MaxIterationsReached` with its last iterate available.
//
// Given
// -----
// - Least squares with `A = [[1, 2], [0, 1], [1, −1]]`, a small fixed
//   step, criterion `None`, `max_iter = 5`.
//
// Expect
// ------
// - Exactly 5 iterations, state `MaxIterationsReached`, a finite iterate
//   that differs from the start, and the final iteration in the history.
// - A further `step` is a no-op.
fn iteration_cap_yields_max_iterations_reached() {
    // Arrange
    let b = container(&space(&[3]), &[5.0, 2.0, -1.0]);
    let f: Arc<dyn Function> = Arc::new(LeastSquares::new(tall_matrix(), b).unwrap());
    let x0 = space(&[2]).allocate(0.0);
    let solver = GradientDescent::new(f, x0.clone(), StepSize::Fixed(0.01)).unwrap();
    let mut algorithm = Algorithm::new(solver, config(5, 0.0, StoppingCriterion::None)).unwrap();

    // Act
    let outcome = algorithm.run(None).unwrap();
    let again = algorithm.step().unwrap();

    // Assert
    assert_eq!(outcome.state, AlgorithmState::MaxIterationsReached);
    assert_eq!(outcome.iterations, 5);
    assert!(!outcome.converged);
    assert!(outcome.solution.is_finite());
    assert!(outcome.solution.subtract(&x0).unwrap().norm() > 0.0);
    assert_eq!(outcome.history.last().map(|r| r.iteration), Some(5));
    assert_eq!(again, AlgorithmState::MaxIterationsReached);
    assert_eq!(algorithm.iteration(), 5);
    assert_eq!(algorithm.solution(), &outcome.solution);
    assert!(matches!(outcome.require_converged(), Err(OptError::NonConvergence { .. })));
}

#[test]
// Purpose
// -------
// Verify the Moreau decomposition
// `x = prox_{τF}(x) + τ·prox_{F*/τ}(x/τ)` for the closed-form conjugates.
//
// Given
// -----
// - Random `x` (seeded), `τ = 0.7`.
// - `F ∈ {‖·‖₁, ‖· − c‖₁, ‖· − c‖², 3‖·‖₂,₁}`, the last on a two-part block.
//
// Expect
// ------
// - The identity holds to `1e-12` for every function.
fn moreau_decomposition_holds_for_closed_forms() {
    // Arrange
    let tau = 0.7;
    let dense = space(&[3, 4]);
    let mut rng = StdRng::seed_from_u64(11);
    let x = dense.random(&mut rng).add_scalar(-0.5).scaled(4.0);
    let c = dense.random(&mut rng);
    let block_space = Space::block(vec![dense.clone(), dense.clone()]).unwrap();
    let xb = block_space.random(&mut rng).add_scalar(-0.5).scaled(4.0);

    let l1: Arc<dyn Function> = Arc::new(L1Norm::new());
    let shifted_l1: Arc<dyn Function> = Arc::new(L1Norm::centered_at(c.clone()));
    let shifted_l2: Arc<dyn Function> = Arc::new(L2NormSquared::centered_at(c));
    let l21: Arc<dyn Function> =
        Arc::new(ScaledFunction::new(3.0, Arc::new(MixedL21Norm::new())).unwrap());
    let cases = vec![(l1, x.clone()), (shifted_l1, x.clone()), (shifted_l2, x), (l21, xb)];

    for (f, x) in cases {
        // Act
        let primal = f.proximal(&x, tau).unwrap();
        let dual = f.proximal_conjugate(&x.scaled(1.0 / tau), 1.0 / tau).unwrap();
        let rebuilt = primal.axpby(1.0, tau, &dual).unwrap();

        // Assert
        assert!(
            rebuilt.subtract(&x).unwrap().max_abs() < 1e-12,
            "Moreau decomposition failed for {}",
            f.name()
        );
    }
}

#[test]
// Purpose
// -------
// Verify monotone decrease of gradient descent with `α ≤ 1/L`.
//
// Given
// -----
// - Least squares with `A = [[1, 2], [0, 1], [1, −1]]`, `b = [1, −3, 2]`.
// - Fixed steps `α ∈ {1/L, 0.5/L}`, 50 iterations, objective recorded
//   every iteration.
//
// Expect
// ------
// - The recorded objectives never increase.
fn gradient_descent_decreases_monotonically_below_inverse_lipschitz() {
    // Arrange
    let b = container(&space(&[3]), &[1.0, -3.0, 2.0]);
    let f: Arc<dyn Function> = Arc::new(LeastSquares::new(tall_matrix(), b).unwrap());
    let lipschitz = f.lipschitz().unwrap();

    for factor in [1.0, 0.5] {
        let step = StepSize::Fixed(factor / lipschitz);
        let solver = GradientDescent::new(f.clone(), space(&[2]).allocate(0.0), step).unwrap();

        // Act
        let outcome = Algorithm::new(solver, config(50, 0.0, StoppingCriterion::None))
            .unwrap()
            .run(None)
            .unwrap();

        // Assert
        assert_eq!(outcome.history.len(), 51);
        for pair in outcome.history.windows(2) {
            assert!(
                pair[1].value <= pair[0].value + 1e-12,
                "objective rose from {} to {} at iteration {}",
                pair[0].value,
                pair[1].value,
                pair[1].iteration
            );
        }
    }
}

#[test]
// Purpose
// -------
// Verify that box projections are idempotent and land in the box.
//
// Given
// -----
// - Random `x` scaled to `[−2, 2)`, boxes `[−0.5, 0.5]` and `[0, ∞)`.
//
// Expect
// ------
// - `P(P(x)) = P(x)` and `ι(P(x)) = 0` for both boxes.
fn box_projection_is_idempotent() {
    // Arrange
    let mut rng = StdRng::seed_from_u64(3);
    let x = space(&[5, 5]).random(&mut rng).add_scalar(-0.5).scaled(4.0);
    let boxes = [IndicatorBox::new(-0.5, 0.5).unwrap(), IndicatorBox::non_negative()];

    for indicator in boxes {
        // Act
        let once = indicator.proximal(&x, 1.0).unwrap();
        let twice = indicator.proximal(&once, 2.5).unwrap();

        // Assert
        assert_eq!(once, twice);
        assert_eq!(indicator.value(&once).unwrap(), 0.0);
    }
    assert_eq!(IndicatorBox::non_negative().value(&x).unwrap(), f64::INFINITY);
}

#[test]
// Purpose
// -------
// Verify that PDHG on `α‖∇x‖₂,₁ + ½‖x − b‖²` and FISTA with the TV
// proximal map reach the same denoised image.
//
// Given
// -----
// - The noisy 4×4 square, `α = 0.2`, Neumann gradient.
// - PDHG with `σ = τ = 0.99/√8` for 500 iterations.
// - FISTA on `½‖x − b‖²` (`L = 1`) with `0.2·TV`, inner tolerance `1e-10`.
//
// Expect
// ------
// - Images agree to `1e-5` and objectives to `1e-6`.
// - The result is flatter than the data (smaller TV).
fn tv_denoising_pdhg_matches_fista_with_tv_prox() {
    // Arrange
    let alpha = 0.2;
    let b = noisy_square();
    let image_space = b.space();
    let gradient: Arc<dyn Operator> =
        Arc::new(GradientOperator::new(image_space.clone(), Boundary::Neumann).unwrap());
    let half_l2 = ScaledFunction::new(0.5, Arc::new(L2NormSquared::centered_at(b.clone())));
    let fidelity: Arc<dyn Function> = Arc::new(half_l2.unwrap());

    let l21: Arc<dyn Function> =
        Arc::new(ScaledFunction::new(alpha, Arc::new(MixedL21Norm::new())).unwrap());
    let step = 0.99 / 8.0_f64.sqrt();
    let pdhg = Pdhg::new(
        l21,
        fidelity.clone(),
        gradient,
        image_space.allocate(0.0),
        Some(step),
        Some(step),
    )
    .unwrap();

    let tv = TotalVariation::new(image_space.clone(), alpha)
        .unwrap()
        .with_options(TvOptions::new(2000, 1e-10).unwrap());
    let tv_value = tv.clone();
    let fista = Fista::new(fidelity, Arc::new(tv), image_space.allocate(0.0), None).unwrap();

    // Act
    let by_pdhg = Algorithm::new(pdhg, config(500, 0.0, StoppingCriterion::None))
        .unwrap()
        .run(None)
        .unwrap();
    let by_fista =
        Algorithm::new(fista, config(50, 1e-8, StoppingCriterion::RelativeIterateChange))
            .unwrap()
            .run(None)
            .unwrap();

    // Assert
    assert_eq!(by_pdhg.state, AlgorithmState::MaxIterationsReached);
    let gap = by_pdhg.solution.subtract(&by_fista.solution).unwrap().max_abs();
    assert!(gap < 1e-5, "PDHG and FISTA differ by {gap}");
    assert_relative_eq!(by_pdhg.objective, by_fista.objective, epsilon = 1e-6);
    assert!(
        tv_value.total_variation(&by_fista.solution).unwrap()
            < tv_value.total_variation(&b).unwrap()
    );
}

#[test]
// Purpose
// -------
// Verify that independent algorithm instances sharing one objective run
// concurrently without interfering.
//
// Given
// -----
// - One `Arc`'d least-squares objective with a consistent system.
// - Four threads, each starting gradient descent from a different point.
//
// Expect
// ------
// - Every thread converges to the same minimiser `[1, 2]`.
fn independent_runs_on_separate_threads() {
    // Arrange
    let b = container(&space(&[3]), &[5.0, 2.0, -1.0]);
    let f: Arc<dyn Function> = Arc::new(LeastSquares::new(tall_matrix(), b).unwrap());
    let starts: Vec<Container> =
        (0..4).map(|k| space(&[2]).allocate(k as f64 - 1.5)).collect();

    // Act
    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = starts
            .iter()
            .map(|x0| {
                let f = Arc::clone(&f);
                let x0 = x0.clone();
                scope.spawn(move || {
                    let solver = GradientDescent::new(f, x0, StepSize::Lipschitz)?;
                    let cfg = config(5000, 1e-14, StoppingCriterion::RelativeIterateChange);
                    Algorithm::new(solver, cfg)?.run(None)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Assert
    for outcome in outcomes {
        let outcome = outcome.unwrap();
        let x = outcome.solution.to_flat();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-6);
    }
}

#[test]
// Purpose
// -------
// Verify that geometry mismatches fail fast at every boundary.
//
// Given
// -----
// - Containers of shapes `[3]` and `[4]`.
// - Data in `[4]` for an operator with range `[3]`.
// - A start point in `[3]` for an objective on `[2]`.
// - A block operator whose column has two different domains.
//
// Expect
// ------
// - `DataError::GeometryMismatch` for container arithmetic.
// - `OptError::GeometryMismatch` for the others, raised before any
//   iteration.
fn geometry_mismatches_fail_fast() {
    // Arrange
    let three = space(&[3]).allocate(1.0);
    let four = space(&[4]).allocate(1.0);
    let b = container(&space(&[3]), &[5.0, 2.0, -1.0]);
    let f: Arc<dyn Function> = Arc::new(LeastSquares::new(tall_matrix(), b).unwrap());
    let wrong_start =
        GradientDescent::new(f, space(&[3]).allocate(0.0), StepSize::Lipschitz).unwrap();
    let other: Arc<dyn Operator> = Arc::new(IdentityOperator::new(space(&[3])));

    // Act
    let arithmetic = three.add(&four);
    let data = LeastSquares::new(tall_matrix(), four.clone());
    let algorithm = Algorithm::new(wrong_start, AlgorithmConfig::default());
    let block = BlockOperator::column(vec![tall_matrix(), other]);

    // Assert
    assert!(matches!(arithmetic, Err(DataError::GeometryMismatch { .. })));
    assert!(matches!(data, Err(OptError::GeometryMismatch { .. })));
    assert!(matches!(algorithm, Err(OptError::GeometryMismatch { .. })));
    assert!(matches!(block, Err(OptError::GeometryMismatch { .. })));
}

#[test]
// Purpose
// -------
// Verify that a divergent run which ends in a NaN objective keeps the last
// valid iterate and a history in step with the iteration counter.
//
// Given
// -----
// - `f(x) = ‖x‖²` on `[1]`, `x₀ = 1`, fixed step `1000` (far above
//   `1/L`), criterion `None`, cap `1000`.
// - The iterate overflows to `+∞` (objective `+∞`, still valid) and the
//   next update produces `∞ − ∞ = NaN`.
//
// Expect
// ------
// - `Failed` with a `NonFiniteObjective` source.
// - `iteration()` equals the last history iteration, every recorded value
//   is valid, and `solution()` equals the iterate of a second run stopped
//   after that many steps.
fn divergent_run_keeps_last_valid_iterate() {
    // Arrange
    let line = space(&[1]);
    let build = || {
        let f: Arc<dyn Function> = Arc::new(L2NormSquared::new());
        let solver =
            GradientDescent::new(f, container(&line, &[1.0]), StepSize::Fixed(1000.0)).unwrap();
        Algorithm::new(solver, config(1000, 0.0, StoppingCriterion::None)).unwrap()
    };
    let mut diverging = build();

    // Act
    let err = diverging.run(None).unwrap_err();
    let accepted = diverging.iteration();
    let mut reference = build();
    let replay = reference.run(Some(accepted)).unwrap();

    // Assert
    assert_eq!(diverging.state(), AlgorithmState::Failed);
    match &err {
        OptError::AlgorithmFailure { iteration, source, .. } => {
            assert_eq!(*iteration, accepted);
            assert!(matches!(**source, OptError::NonFiniteObjective { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let last = diverging.history().last().unwrap();
    assert_eq!(last.iteration, accepted);
    assert!(diverging.history().iter().all(|r| !r.value.is_nan()));
    assert_eq!(replay.iterations, accepted);
    assert_eq!(diverging.solution(), &replay.solution);
    assert!(!diverging.solution().to_flat().iter().any(|v| v.is_nan()));
}
