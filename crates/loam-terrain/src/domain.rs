//! The terrain domain: bodies, stepping, settling.

use loam_math::{Quat, Vec3};
use loam_solver::{BlockArena, CouplingConstraint, SolveReport, StateBlock, SweepConfig, SweepSolver};
use loam_types::constants::{DEFAULT_DT, GRAVITY};
use loam_types::{BodyId, LoamError, LoamResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::body::{BodyGroup, Pose, Shape, TerrainBody};
use crate::contact::{contact_binding, generate_contacts};

/// What the terrain is made of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TerrainModel {
    /// A flat rigid plane at the given height.
    Rigid { plane_height: f64 },
    /// A bed of spherical granular particles above a rigid plane.
    Granular(GranularParams),
}

/// Granular bed generation parameters.
///
/// Particles are seeded on a cubic lattice above the plane and must be
/// settled under gravity before the co-simulation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GranularParams {
    pub plane_height: f64,
    pub particle_radius: f64,
    pub particle_mass: f64,
    /// Lattice extent: particles along X, Y, Z.
    pub lattice: (usize, usize, usize),
    /// Lattice spacing (center to center).
    pub spacing: f64,
    /// Height of the lowest lattice layer above the plane.
    pub drop_height: f64,
}

/// Terrain domain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Gravitational acceleration along -Z (m/s²).
    pub gravity: f64,
    /// Sweep solver settings for the per-step contact solve.
    pub sweep: SweepConfig,
    /// Baumgarte stabilization factor applied to penetration depth.
    pub stabilization: f64,
    /// Penetration allowed before stabilization kicks in (meters).
    pub contact_slop: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            sweep: SweepConfig::default(),
            stabilization: 0.2,
            contact_slop: 1.0e-5,
        }
    }
}

/// Settling phase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleConfig {
    /// Internal step size during settling (seconds).
    pub dt: f64,
    /// Iteration budget; exceeding it is a reported failure.
    pub max_steps: u32,
    /// Speed below which a particle counts as quiescent (m/s).
    pub quiescence_speed: f64,
    /// Consecutive quiescent steps required.
    pub quiescent_steps: u32,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            max_steps: 20_000,
            quiescence_speed: 0.05,
            quiescent_steps: 10,
        }
    }
}

/// The terrain simulation domain.
///
/// Owns the block arena, all bodies (terrain content and proxies), and
/// the contact sweep. `step` is a single blocking call; its internal
/// integration sweep is data-parallel but invisible at this boundary.
pub struct TerrainDomain {
    config: TerrainConfig,
    model: TerrainModel,
    arena: BlockArena,
    bodies: Vec<TerrainBody>,
    /// Deepest contact recorded per body during the last step.
    contact_points: Vec<Option<(f64, Vec3)>>,
    solver: SweepSolver,
}

impl TerrainDomain {
    pub fn new(model: TerrainModel, config: TerrainConfig) -> Self {
        let solver = SweepSolver::new(config.sweep.clone());
        let mut domain = Self {
            config,
            model: model.clone(),
            arena: BlockArena::new(),
            bodies: Vec::new(),
            contact_points: Vec::new(),
            solver,
        };

        match model {
            TerrainModel::Rigid { plane_height } => {
                domain.add_plane(plane_height);
            }
            TerrainModel::Granular(params) => {
                domain.add_plane(params.plane_height);
                domain.seed_granular(&params);
            }
        }

        domain
    }

    fn add_plane(&mut self, height: f64) {
        self.add_body(
            Shape::Plane {
                normal: Vec3::Z,
                offset: height,
            },
            Pose::at(Vec3::new(0.0, 0.0, height)),
            0.0,
            Vec3::ZERO,
            BodyGroup::Terrain,
            true,
        );
    }

    fn seed_granular(&mut self, params: &GranularParams) {
        let (nx, ny, nz) = params.lattice;
        let half_x = (nx as f64 - 1.0) * params.spacing / 2.0;
        let half_y = (ny as f64 - 1.0) * params.spacing / 2.0;
        let base = params.plane_height + params.drop_height + params.particle_radius;

        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let pos = Vec3::new(
                        i as f64 * params.spacing - half_x,
                        j as f64 * params.spacing - half_y,
                        base + k as f64 * params.spacing,
                    );
                    self.add_body(
                        Shape::Sphere {
                            radius: params.particle_radius,
                        },
                        Pose::at(pos),
                        params.particle_mass,
                        TerrainBody::sphere_inertia(params.particle_mass, params.particle_radius),
                        BodyGroup::Terrain,
                        false,
                    );
                }
            }
        }
    }

    /// Registers a body with an explicit world-aligned inertia diagonal.
    ///
    /// Returns the id used for all later state access.
    pub fn add_body(
        &mut self,
        shape: Shape,
        pose: Pose,
        mass: f64,
        inertia: Vec3,
        group: BodyGroup,
        fixed: bool,
    ) -> BodyId {
        let inv_mass = TerrainBody::block_inv_mass(mass, inertia, fixed);
        let block = self.arena.insert(StateBlock::new(inv_mass));
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(TerrainBody {
            shape,
            pose,
            mass,
            group,
            fixed,
            block,
        });
        self.contact_points.push(None);
        id
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn body(&self, id: BodyId) -> &TerrainBody {
        &self.bodies[id.index()]
    }

    /// Overwrites a body's kinematic state (pose and velocity).
    ///
    /// This is the proxy layer's write path; it is idempotent by
    /// construction — no accumulation, plain assignment.
    pub fn set_body_state(
        &mut self,
        id: BodyId,
        pos: Vec3,
        rot: Quat,
        linear_vel: Vec3,
        angular_vel: Vec3,
    ) {
        let body = &mut self.bodies[id.index()];
        body.pose = Pose { pos, rot };
        if let Some(block) = self.arena.get_mut(body.block) {
            block.velocity[0] = linear_vel.x;
            block.velocity[1] = linear_vel.y;
            block.velocity[2] = linear_vel.z;
            block.velocity[3] = angular_vel.x;
            block.velocity[4] = angular_vel.y;
            block.velocity[5] = angular_vel.z;
        }
    }

    /// Linear velocity of a body.
    pub fn linear_velocity(&self, id: BodyId) -> Vec3 {
        let body = &self.bodies[id.index()];
        match self.arena.get(body.block) {
            Some(block) => Vec3::new(block.velocity[0], block.velocity[1], block.velocity[2]),
            None => Vec3::ZERO,
        }
    }

    /// Linear contact impulse accumulated on a body during the last step.
    pub fn linear_impulse(&self, id: BodyId) -> Vec3 {
        let body = &self.bodies[id.index()];
        match self.arena.get(body.block) {
            Some(block) => Vec3::new(block.impulse[0], block.impulse[1], block.impulse[2]),
            None => Vec3::ZERO,
        }
    }

    /// World position of the deepest contact on a body during the last
    /// step, if any.
    pub fn contact_point(&self, id: BodyId) -> Option<Vec3> {
        self.contact_points[id.index()].map(|(_, p)| p)
    }

    /// Advances the domain by `dt`: gravity, contact generation,
    /// constraint sweep, then a data-parallel integration sweep.
    pub fn step(&mut self, dt: f64) -> LoamResult<SolveReport> {
        self.arena.clear_impulses();
        self.contact_points.iter_mut().for_each(|c| *c = None);

        // Gravity on every dynamic body.
        let g_dv = self.config.gravity * dt;
        for body in &self.bodies {
            if body.fixed {
                continue;
            }
            if let Some(block) = self.arena.get_mut(body.block) {
                block.velocity[2] -= g_dv;
            }
        }

        // Contact pass and binding construction.
        let contacts = generate_contacts(&self.bodies);
        for contact in &contacts {
            for idx in [contact.body_a, contact.body_b] {
                let slot = &mut self.contact_points[idx];
                if slot.map(|(d, _)| contact.depth > d).unwrap_or(true) {
                    *slot = Some((contact.depth, contact.point));
                }
            }
        }

        let mut bindings: Vec<Box<dyn CouplingConstraint>> = Vec::with_capacity(contacts.len());
        for contact in &contacts {
            let binding = contact_binding(
                contact,
                &self.bodies,
                &self.arena,
                self.config.stabilization,
                self.config.contact_slop,
                dt,
            )?;
            bindings.push(Box::new(binding));
        }

        let report = self.solver.solve(&mut self.arena, &mut bindings)?;

        // Integrate poses. Parallel over bodies; the arena is read-only
        // here so the sweep is race-free.
        let arena = &self.arena;
        self.bodies.par_iter_mut().for_each(|body| {
            if body.fixed {
                return;
            }
            let Some(block) = arena.get(body.block) else {
                return;
            };
            let v = Vec3::new(block.velocity[0], block.velocity[1], block.velocity[2]);
            let w = Vec3::new(block.velocity[3], block.velocity[4], block.velocity[5]);
            body.pose.pos += v * dt;
            if w.length_squared() > 0.0 {
                body.pose.rot = (Quat::from_scaled_axis(w * dt) * body.pose.rot).normalize();
            }
        });

        Ok(report)
    }

    /// Pre-rolls the terrain alone until it reaches a quiescent
    /// configuration, returning the settled surface height.
    ///
    /// Fails with `NotSettled` if the quiescence criterion is not met
    /// within the iteration budget — reported, never silently accepted.
    pub fn settle(&mut self, settle: &SettleConfig) -> LoamResult<f64> {
        let mut quiet_streak = 0u32;
        let mut max_speed = 0.0;

        for step_idx in 0..settle.max_steps {
            self.step(settle.dt)?;

            max_speed = self
                .bodies
                .iter()
                .filter(|b| !b.fixed && b.group == BodyGroup::Terrain)
                .map(|b| match self.arena.get(b.block) {
                    Some(block) => {
                        Vec3::new(block.velocity[0], block.velocity[1], block.velocity[2]).length()
                    }
                    None => 0.0,
                })
                .fold(0.0, f64::max);

            if max_speed < settle.quiescence_speed {
                quiet_streak += 1;
                if quiet_streak >= settle.quiescent_steps {
                    let height = self.surface_height();
                    tracing::info!(steps = step_idx + 1, height, "terrain settled");
                    return Ok(height);
                }
            } else {
                quiet_streak = 0;
            }
        }

        Err(LoamError::NotSettled(format!(
            "terrain still moving after {} steps (max speed {:.3} m/s)",
            settle.max_steps, max_speed
        )))
    }

    /// Current top height of the terrain content.
    pub fn surface_height(&self) -> f64 {
        let mut height = match &self.model {
            TerrainModel::Rigid { plane_height } => *plane_height,
            TerrainModel::Granular(params) => params.plane_height,
        };
        for body in &self.bodies {
            if body.group != BodyGroup::Terrain {
                continue;
            }
            match body.shape {
                Shape::Sphere { radius } => {
                    height = height.max(body.pose.pos.z + radius);
                }
                Shape::Box { half_extents } => {
                    height = height.max(body.pose.pos.z + half_extents.z);
                }
                Shape::Plane { .. } => {}
            }
        }
        height
    }
}
