//! # loam-math
//!
//! Linear algebra primitives for the Loam co-simulation engine.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types as the canonical
//!   `Vec3`/`Quat`/`Mat3` used across the workspace
//! - A small row-major dense matrix for constraint Jacobians
//! - Barycentric coordinate helpers for triangle force redistribution

pub mod barycentric;
pub mod row_matrix;

pub use barycentric::barycentric_coords;
pub use row_matrix::RowMatrix;

// Re-export glam f64 types as the canonical math types for Loam.
pub use glam::{DMat3 as Mat3, DQuat as Quat, DVec3 as Vec3};
