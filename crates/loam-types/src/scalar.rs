//! Scalar type alias for the simulation.
//!
//! The co-simulation runs double precision on the CPU: impulse/force
//! round-trips between the two domains accumulate over thousands of
//! rounds and f32 drift shows up in the conservation checks.

/// The floating-point type used throughout the simulation.
pub type Scalar = f64;
