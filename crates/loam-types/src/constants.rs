//! Physical constants and simulation defaults.
//!
//! The global reference frame has Z up; gravity acts along -Z.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Default co-simulation round step (seconds).
pub const DEFAULT_DT: f64 = 1.0e-3;

/// Default number of solver sweeps per terrain step.
pub const DEFAULT_SWEEP_ITERATIONS: u32 = 50;

/// Default solver convergence tolerance (max multiplier change).
pub const DEFAULT_SWEEP_TOLERANCE: f64 = 1.0e-10;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1.0e-12;

/// Area threshold below which a triangle is considered degenerate (m²).
pub const DEGENERATE_AREA_THRESHOLD: f64 = 1.0e-12;
