//! The coupling-constraint contract and its concrete variants.
//!
//! A binding couples two or three state blocks through one or more
//! scalar rows. Each row carries one Jacobian per block (columns match
//! the block's dimension) and an auxiliary matrix (the block-diagonal
//! preconditioner term M⁻¹Jᵀ) consumed by the sweep solver.
//!
//! The solver only ever touches Jacobian / auxiliary / residual /
//! multiplier — never a concrete subtype. Variants (two-block,
//! three-block) are selected at construction; there is no downcasting.

use loam_math::RowMatrix;
use loam_types::{LoamError, LoamResult};
use serde::{Deserialize, Serialize};

use crate::arena::BlockArena;
use loam_types::BlockId;

/// The solver-facing binding contract.
///
/// Object-safe so the sweep solver can hold a heterogeneous set of
/// bindings. Every new interaction type (joint, frictional contact,
/// N-body weld) is added purely by implementing this trait.
pub trait CouplingConstraint: Send {
    /// Ids of the coupled state blocks, in binding order.
    fn blocks(&self) -> &[BlockId];

    /// Number of constrained scalar equations bound together.
    fn rows(&self) -> usize;

    /// Jacobian of block `which` (rows × block dimension).
    fn jacobian(&self, which: usize) -> &RowMatrix;

    /// Mutable Jacobian access for the owning constraint type.
    fn jacobian_mut(&mut self, which: usize) -> &mut RowMatrix;

    /// Auxiliary matrix of block `which` (M⁻¹Jᵀ, same shape as the
    /// Jacobian). Valid after [`refresh_auxiliary`](Self::refresh_auxiliary).
    fn auxiliary(&self, which: usize) -> &RowMatrix;

    /// Right-hand-side/bias term of row `row`.
    fn rhs(&self, row: usize) -> f64;

    /// Sets the right-hand-side term of row `row`.
    fn set_rhs(&mut self, row: usize, value: f64);

    /// Current constraint violation of row `row`: (J·v)ᵣ + rhsᵣ over
    /// the bound blocks' current velocities. This is the value the
    /// solver drives toward the row's complementarity target.
    fn residual(&self, arena: &BlockArena, row: usize) -> f64;

    /// The unknown multiplier of row `row`.
    fn multiplier(&self, row: usize) -> f64;

    fn set_multiplier(&mut self, row: usize, value: f64);

    /// True if multipliers are projected to λ ≥ 0 (contact normal
    /// rows); false for bilateral rows.
    fn is_unilateral(&self) -> bool;

    /// Denominator Σᵢ (Jᵢ)ᵣ·(M⁻¹Jᵢᵀ)ᵣ of the local multiplier update.
    fn denominator(&self, row: usize) -> f64;

    /// Recomputes auxiliary matrices from the bound blocks' current
    /// inverse-mass terms. Fails if a referenced block was removed or
    /// changed dimension since binding.
    fn refresh_auxiliary(&mut self, arena: &BlockArena) -> LoamResult<()>;
}

/// Shared algebra for the concrete binding variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BindingCore {
    blocks: Vec<BlockId>,
    expected_dims: Vec<usize>,
    jacobians: Vec<RowMatrix>,
    auxiliaries: Vec<RowMatrix>,
    rhs: Vec<f64>,
    multiplier: Vec<f64>,
    unilateral: bool,
    rows: usize,
}

impl BindingCore {
    fn new(rows: usize, expected_dims: &[usize], unilateral: bool) -> Self {
        let n = expected_dims.len();
        Self {
            blocks: Vec::new(),
            expected_dims: expected_dims.to_vec(),
            jacobians: vec![RowMatrix::zeros(rows, 0); n],
            auxiliaries: vec![RowMatrix::zeros(rows, 0); n],
            rhs: vec![0.0; rows],
            multiplier: vec![0.0; rows],
            unilateral,
            rows,
        }
    }

    /// Associates the binding with its blocks, (re)sizing each
    /// Jacobian/auxiliary matrix to the bound block's dimension.
    fn bind(&mut self, arena: &BlockArena, ids: &[BlockId]) -> LoamResult<()> {
        debug_assert_eq!(ids.len(), self.expected_dims.len());
        for (which, &id) in ids.iter().enumerate() {
            let expected = self.expected_dims[which];
            let actual = arena.get(id).map(|b| b.dim()).unwrap_or(0);
            if actual == 0 || actual != expected {
                return Err(LoamError::DimensionMismatch {
                    context: format!("binding slot {which} (block {})", id.0),
                    expected,
                    actual,
                });
            }
            self.jacobians[which].resize(self.rows, actual);
            self.auxiliaries[which].resize(self.rows, actual);
        }
        self.blocks = ids.to_vec();
        Ok(())
    }

    fn residual(&self, arena: &BlockArena, row: usize) -> f64 {
        let mut g = self.rhs[row];
        for (which, &id) in self.blocks.iter().enumerate() {
            if let Some(block) = arena.get(id) {
                g += self.jacobians[which].row_dot(row, &block.velocity);
            }
        }
        g
    }

    fn denominator(&self, row: usize) -> f64 {
        let mut d = 0.0;
        for (jac, aux) in self.jacobians.iter().zip(&self.auxiliaries) {
            d += jac.row(row).iter().zip(aux.row(row)).map(|(a, b)| a * b).sum::<f64>();
        }
        d
    }

    fn refresh_auxiliary(&mut self, arena: &BlockArena) -> LoamResult<()> {
        for (which, &id) in self.blocks.iter().enumerate() {
            let block = arena.get(id).ok_or_else(|| LoamError::DimensionMismatch {
                context: format!("binding slot {which}: block {} removed", id.0),
                expected: self.expected_dims[which],
                actual: 0,
            })?;
            if block.dim() != self.expected_dims[which] {
                return Err(LoamError::DimensionMismatch {
                    context: format!("binding slot {which} (block {})", id.0),
                    expected: self.expected_dims[which],
                    actual: block.dim(),
                });
            }
            let inv_mass = block.inv_mass();
            for r in 0..self.rows {
                // aux[r][k] = inv_mass[k] * jac[r][k]
                let jac_row: Vec<f64> = self.jacobians[which].row(r).to_vec();
                let aux_row = self.auxiliaries[which].row_mut(r);
                for (k, a) in aux_row.iter_mut().enumerate() {
                    *a = inv_mass[k] * jac_row[k];
                }
            }
        }
        Ok(())
    }

    /// Re-validates block references after deserialization.
    ///
    /// Restored bindings re-link by id, never by pointer identity;
    /// a stale id fails fast here.
    fn rebind(&mut self, arena: &BlockArena) -> LoamResult<()> {
        let ids = self.blocks.clone();
        self.bind(arena, &ids)
    }
}

macro_rules! delegate_coupling_constraint {
    () => {
        fn blocks(&self) -> &[BlockId] {
            &self.core.blocks
        }
        fn rows(&self) -> usize {
            self.core.rows
        }
        fn jacobian(&self, which: usize) -> &RowMatrix {
            &self.core.jacobians[which]
        }
        fn jacobian_mut(&mut self, which: usize) -> &mut RowMatrix {
            &mut self.core.jacobians[which]
        }
        fn auxiliary(&self, which: usize) -> &RowMatrix {
            &self.core.auxiliaries[which]
        }
        fn rhs(&self, row: usize) -> f64 {
            self.core.rhs[row]
        }
        fn set_rhs(&mut self, row: usize, value: f64) {
            self.core.rhs[row] = value;
        }
        fn residual(&self, arena: &BlockArena, row: usize) -> f64 {
            self.core.residual(arena, row)
        }
        fn multiplier(&self, row: usize) -> f64 {
            self.core.multiplier[row]
        }
        fn set_multiplier(&mut self, row: usize, value: f64) {
            self.core.multiplier[row] = value;
        }
        fn is_unilateral(&self) -> bool {
            self.core.unilateral
        }
        fn denominator(&self, row: usize) -> f64 {
            self.core.denominator(row)
        }
        fn refresh_auxiliary(&mut self, arena: &BlockArena) -> LoamResult<()> {
            self.core.refresh_auxiliary(arena)
        }
    };
}

/// A binding coupling exactly two state blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoBlockConstraint {
    core: BindingCore,
}

impl TwoBlockConstraint {
    /// Creates an unbound two-block binding.
    ///
    /// `expected_dims` are the block dimensions the constraint's rows
    /// are written against; `bind` rejects blocks that disagree.
    pub fn new(rows: usize, expected_dims: [usize; 2], unilateral: bool) -> Self {
        Self {
            core: BindingCore::new(rows, &expected_dims, unilateral),
        }
    }

    /// Associates the binding with two state blocks, (re)sizing each
    /// Jacobian/auxiliary matrix. Fails with `DimensionMismatch` if a
    /// block is absent, zero-dimensional, or inconsistent with the
    /// dimensions the rows were written against.
    pub fn bind(&mut self, arena: &BlockArena, a: BlockId, b: BlockId) -> LoamResult<()> {
        self.core.bind(arena, &[a, b])
    }

    /// Re-links a deserialized binding against the arena by id.
    pub fn rebind(&mut self, arena: &BlockArena) -> LoamResult<()> {
        self.core.rebind(arena)
    }
}

impl CouplingConstraint for TwoBlockConstraint {
    delegate_coupling_constraint!();
}

/// A binding coupling exactly three state blocks.
///
/// The three Jacobians share the binding's row count; column counts
/// match each bound block's dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreeBlockConstraint {
    core: BindingCore,
}

impl ThreeBlockConstraint {
    pub fn new(rows: usize, expected_dims: [usize; 3], unilateral: bool) -> Self {
        Self {
            core: BindingCore::new(rows, &expected_dims, unilateral),
        }
    }

    /// Associates the binding with three state blocks. See
    /// [`TwoBlockConstraint::bind`] for the failure contract.
    pub fn bind(
        &mut self,
        arena: &BlockArena,
        a: BlockId,
        b: BlockId,
        c: BlockId,
    ) -> LoamResult<()> {
        self.core.bind(arena, &[a, b, c])
    }

    pub fn rebind(&mut self, arena: &BlockArena) -> LoamResult<()> {
        self.core.rebind(arena)
    }
}

impl CouplingConstraint for ThreeBlockConstraint {
    delegate_coupling_constraint!();
}
