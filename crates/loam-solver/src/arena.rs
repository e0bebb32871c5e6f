//! State blocks and the arena that owns them.
//!
//! A state block is one object's chunk of generalized velocity and
//! accumulated-impulse unknowns. Bindings reference blocks by
//! [`BlockId`] into the owning domain's arena, so removing a block is
//! an O(1) invalidation check on the binding side instead of a
//! dangling-pointer hazard.

use loam_types::BlockId;
use serde::{Deserialize, Serialize};

/// Generalized velocity/impulse unknowns for one physical object.
///
/// The dimension is fixed at creation. The owning domain has exclusive
/// write access to the velocity; other domains only read it through the
/// binding contract during a solver sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateBlock {
    /// Diagonal inverse-mass term per velocity component.
    /// Zero entries make the component immovable (fixed bodies).
    inv_mass: Vec<f64>,
    /// Current generalized velocity.
    pub velocity: Vec<f64>,
    /// Constraint impulse accumulated over the current solve.
    pub impulse: Vec<f64>,
}

impl StateBlock {
    /// Creates a block from its diagonal inverse-mass terms.
    ///
    /// The block dimension is `inv_mass.len()`; velocity and impulse
    /// start at zero.
    pub fn new(inv_mass: Vec<f64>) -> Self {
        let dim = inv_mass.len();
        Self {
            inv_mass,
            velocity: vec![0.0; dim],
            impulse: vec![0.0; dim],
        }
    }

    /// A fixed block: all inverse-mass terms zero.
    pub fn fixed(dim: usize) -> Self {
        Self::new(vec![0.0; dim])
    }

    /// Count of generalized velocity components.
    #[inline]
    pub fn dim(&self) -> usize {
        self.inv_mass.len()
    }

    /// Diagonal inverse-mass terms.
    #[inline]
    pub fn inv_mass(&self) -> &[f64] {
        &self.inv_mass
    }

    /// True if every component is immovable.
    pub fn is_fixed(&self) -> bool {
        self.inv_mass.iter().all(|&m| m == 0.0)
    }

    /// Zeroes the accumulated impulse (start of a new solve).
    pub fn clear_impulse(&mut self) {
        self.impulse.iter_mut().for_each(|x| *x = 0.0);
    }
}

/// Owns all state blocks of one simulation domain.
///
/// Slots are never reused within a simulation: `remove` leaves a vacant
/// slot behind so stale [`BlockId`]s held by bindings stay detectable.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BlockArena {
    slots: Vec<Option<StateBlock>>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a block, returning its stable id.
    pub fn insert(&mut self, block: StateBlock) -> BlockId {
        let id = BlockId(self.slots.len() as u32);
        self.slots.push(Some(block));
        id
    }

    /// Returns the block, or `None` if the id is stale or out of range.
    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&StateBlock> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut StateBlock> {
        self.slots.get_mut(id.index()).and_then(|s| s.as_mut())
    }

    /// O(1) liveness check used to invalidate bindings.
    #[inline]
    pub fn is_live(&self, id: BlockId) -> bool {
        self.get(id).is_some()
    }

    /// Removes a block, leaving a permanently vacant slot.
    pub fn remove(&mut self, id: BlockId) -> Option<StateBlock> {
        self.slots.get_mut(id.index()).and_then(|s| s.take())
    }

    /// Number of slots ever allocated (including vacant ones).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over live blocks with their ids.
    pub fn iter_live(&self) -> impl Iterator<Item = (BlockId, &StateBlock)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|b| (BlockId(i as u32), b)))
    }

    /// Zeroes the accumulated impulse on every live block.
    pub fn clear_impulses(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.clear_impulse();
        }
    }
}
