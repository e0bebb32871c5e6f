//! Bounded-iteration projected Gauss-Seidel sweep solver.
//!
//! Each sweep visits every binding in insertion order, computes the
//! local multiplier update from the binding's Jacobian / auxiliary /
//! residual and the current block velocities, projects unilateral
//! multipliers to λ ≥ 0, and applies the velocity correction to the
//! bound blocks. Sequential sweep order means exactly one binding
//! update touches a block at a time, so no per-block serialization is
//! needed; it also makes results deterministic for a fixed iteration
//! budget.

use loam_types::constants::{DEFAULT_SWEEP_ITERATIONS, DEFAULT_SWEEP_TOLERANCE};
use loam_types::LoamResult;
use serde::{Deserialize, Serialize};

use crate::arena::BlockArena;
use crate::binding::CouplingConstraint;

/// Configuration for the sweep solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Maximum sweeps per solve.
    pub max_iterations: u32,

    /// Convergence tolerance: the solve stops early once the largest
    /// multiplier change in a sweep falls below this.
    pub tolerance: f64,

    /// Successive over-relaxation factor (1.0 = plain Gauss-Seidel).
    pub omega: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_SWEEP_ITERATIONS,
            tolerance: DEFAULT_SWEEP_TOLERANCE,
            omega: 1.0,
        }
    }
}

impl SweepConfig {
    /// Fewer sweeps, looser tolerance — for debugging.
    pub fn debug() -> Self {
        Self {
            max_iterations: 5,
            tolerance: 1e-4,
            ..Default::default()
        }
    }

    /// More sweeps, tighter tolerance.
    pub fn high_accuracy() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-12,
            ..Default::default()
        }
    }
}

/// Outcome of one solve.
///
/// Non-convergence is not an error: the solver always leaves its best
/// multiplier estimate in the bindings and velocities in the blocks.
/// Accuracy degradation is an observable quantity, not a failure.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Sweeps actually performed.
    pub iterations: u32,
    /// Largest multiplier change in the final sweep.
    pub max_delta: f64,
    /// Whether the tolerance was reached within the budget.
    pub converged: bool,
}

/// The iterative complementarity solver.
pub struct SweepSolver {
    config: SweepConfig,
}

impl SweepSolver {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Resolves all bindings against the blocks in `arena`.
    ///
    /// Refreshes every binding's auxiliary matrices first (this is
    /// where stale block references surface as `DimensionMismatch`),
    /// then sweeps until convergence or the iteration budget runs out.
    /// Velocity corrections land in the blocks' velocities; the
    /// generalized impulse JᵀΔλ accumulates in each block's impulse.
    pub fn solve(
        &self,
        arena: &mut BlockArena,
        bindings: &mut [Box<dyn CouplingConstraint>],
    ) -> LoamResult<SolveReport> {
        for binding in bindings.iter_mut() {
            binding.refresh_auxiliary(arena)?;
        }

        let mut iterations = 0;
        let mut max_delta = 0.0;

        for sweep in 0..self.config.max_iterations {
            max_delta = 0.0_f64;

            for binding in bindings.iter_mut() {
                let binding = &mut **binding;
                for row in 0..binding.rows() {
                    let d = binding.denominator(row);
                    if d <= f64::EPSILON {
                        // Row couples only fixed components; nothing to solve.
                        continue;
                    }

                    let g = binding.residual(arena, row);
                    let lambda = binding.multiplier(row);
                    let mut updated = lambda - self.config.omega * g / d;
                    if binding.is_unilateral() {
                        updated = updated.max(0.0);
                    }
                    let delta = updated - lambda;
                    if delta == 0.0 {
                        continue;
                    }

                    binding.set_multiplier(row, updated);
                    for (which, &id) in binding.blocks().iter().enumerate() {
                        if let Some(block) = arena.get_mut(id) {
                            binding.auxiliary(which).accumulate_row(
                                row,
                                delta,
                                &mut block.velocity,
                            );
                            binding
                                .jacobian(which)
                                .accumulate_row(row, delta, &mut block.impulse);
                        }
                    }
                    max_delta = max_delta.max(delta.abs());
                }
            }

            iterations = sweep + 1;
            if max_delta < self.config.tolerance {
                break;
            }
        }

        let converged = max_delta < self.config.tolerance;
        tracing::debug!(
            iterations,
            max_delta,
            converged,
            binding_count = bindings.len(),
            "sweep solve finished"
        );

        Ok(SolveReport {
            iterations,
            max_delta,
            converged,
        })
    }
}
