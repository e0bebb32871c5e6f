//! Contact generation and contact constraint construction.
//!
//! A deliberately simple pair pass: every dynamic sphere is tested
//! against every plane, box, and other sphere. Proxy-proxy pairs are
//! filtered out (one shared mesh surface must not self-collide through
//! its proxies). Contact counts in this domain are small enough that a
//! broad phase would not pay for itself.

use loam_math::{RowMatrix, Vec3};
use loam_solver::{BlockArena, CouplingConstraint, TwoBlockConstraint};
use loam_types::LoamResult;

use crate::body::{BodyGroup, Shape, TerrainBody};

/// A detected contact between two bodies.
///
/// The normal points from body `b` toward body `a`; `depth` is the
/// penetration (positive when overlapping).
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub body_a: usize,
    pub body_b: usize,
    pub point: Vec3,
    pub normal: Vec3,
    pub depth: f64,
}

/// Generates all active contacts for the current body poses.
pub fn generate_contacts(bodies: &[TerrainBody]) -> Vec<Contact> {
    let mut contacts = Vec::new();

    for (i, a) in bodies.iter().enumerate() {
        let Shape::Sphere { radius } = a.shape else {
            continue;
        };
        if a.fixed {
            continue;
        }

        for (j, b) in bodies.iter().enumerate() {
            if i == j {
                continue;
            }
            if a.group == BodyGroup::Proxy && b.group == BodyGroup::Proxy {
                continue;
            }
            match b.shape {
                Shape::Box { half_extents } => {
                    let local = a.pose.pos - b.pose.pos;
                    let closest = b.pose.pos + local.clamp(-half_extents, half_extents);
                    let delta = a.pose.pos - closest;
                    let dist = delta.length();
                    let depth = radius - dist;
                    if depth > 0.0 && dist > 1.0e-12 {
                        contacts.push(Contact {
                            body_a: i,
                            body_b: j,
                            point: closest,
                            normal: delta / dist,
                            depth,
                        });
                    }
                }
                Shape::Plane { normal, offset } => {
                    let depth = offset + radius - a.pose.pos.dot(normal);
                    if depth > 0.0 {
                        contacts.push(Contact {
                            body_a: i,
                            body_b: j,
                            point: a.pose.pos - normal * radius,
                            normal,
                            depth,
                        });
                    }
                }
                Shape::Sphere { radius: radius_b } => {
                    // Count each dynamic sphere pair once, from the lower
                    // index. Fixed spheres never take the `a` role, so
                    // their pairs must be kept on the higher-index pass.
                    if j < i && !b.fixed {
                        continue;
                    }
                    let delta = a.pose.pos - b.pose.pos;
                    let dist = delta.length();
                    let depth = radius + radius_b - dist;
                    if depth > 0.0 && dist > 1.0e-12 {
                        let normal = delta / dist;
                        contacts.push(Contact {
                            body_a: i,
                            body_b: j,
                            point: b.pose.pos + normal * radius_b,
                            normal,
                            depth,
                        });
                    }
                }
            }
        }
    }

    contacts
}

/// Builds the unilateral normal-row binding for one contact.
///
/// The row's complementarity condition is `J·v + rhs ≥ 0 ⊥ λ ≥ 0` with
/// `rhs = -β·max(0, depth - slop)/dt`, so resolving the row leaves the
/// contact separating at the stabilization velocity.
pub fn contact_binding(
    contact: &Contact,
    bodies: &[TerrainBody],
    arena: &BlockArena,
    beta: f64,
    slop: f64,
    dt: f64,
) -> LoamResult<TwoBlockConstraint> {
    let a = &bodies[contact.body_a];
    let b = &bodies[contact.body_b];

    let mut binding = TwoBlockConstraint::new(1, [6, 6], true);
    binding.bind(arena, a.block, b.block)?;

    let n = contact.normal;
    let arm_a = contact.point - a.pose.pos;
    let arm_b = contact.point - b.pose.pos;

    fill_contact_row(binding.jacobian_mut(0), n, arm_a.cross(n));
    fill_contact_row(binding.jacobian_mut(1), -n, -(arm_b.cross(n)));
    binding.set_rhs(0, -beta * (contact.depth - slop).max(0.0) / dt);

    Ok(binding)
}

fn fill_contact_row(jacobian: &mut RowMatrix, linear: Vec3, angular: Vec3) {
    let row = jacobian.row_mut(0);
    row[0] = linear.x;
    row[1] = linear.y;
    row[2] = linear.z;
    row[3] = angular.x;
    row[4] = angular.y;
    row[5] = angular.z;
}
