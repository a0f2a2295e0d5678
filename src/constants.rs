//! Numerical constants shared across the integration engine.

/// Central-difference step for numerical metric derivatives.
pub const DERIVATIVE_H: f64 = 1e-5;

/// Smallest affine-parameter step the integrator may take. Keeps lambda
/// strictly increasing even for degenerate velocities.
pub const H_MIN: f64 = 1e-12;

/// Additive guard against division by zero in the step-size selection.
pub const DELTA_NODIV0: f64 = 1e-20;

/// Default base step size epsilon for the adaptive RK4 integrator.
pub const DEFAULT_BASE_STEP: f64 = 0.03;
