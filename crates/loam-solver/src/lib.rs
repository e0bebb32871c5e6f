//! # loam-solver
//!
//! The constraint-resolution core: independently-owned state blocks,
//! the polymorphic coupling-constraint contract, and the iterative
//! complementarity sweep solver.
//!
//! ## Key Types
//!
//! - [`StateBlock`] / [`BlockArena`] — generalized velocity/impulse
//!   unknowns, referenced by index rather than pointer
//! - [`CouplingConstraint`] — the solver-facing binding contract
//!   (Jacobian / auxiliary / residual / multiplier)
//! - [`TwoBlockConstraint`] / [`ThreeBlockConstraint`] — concrete
//!   binding variants, selected at construction
//! - [`SweepSolver`] — bounded-iteration projected Gauss-Seidel

pub mod arena;
pub mod binding;
pub mod sweep;

pub use arena::{BlockArena, StateBlock};
pub use binding::{CouplingConstraint, ThreeBlockConstraint, TwoBlockConstraint};
pub use sweep::{SolveReport, SweepConfig, SweepSolver};
