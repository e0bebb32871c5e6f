//! # loam-terrain
//!
//! The terrain simulation domain: rigid or granular terrain content,
//! contact generation against solver-visible bodies, and the stepping
//! loop that advances the domain by one co-simulation round.
//!
//! The domain owns every body's state block; the mesh side of the
//! co-simulation never touches them directly, only through the proxy
//! synchronization layer.
//!
//! ## Key Types
//!
//! - [`TerrainBody`] / [`Shape`] — a rigid body backed by one 6-dof
//!   state block
//! - [`TerrainModel`] — rigid plane or granular particle bed
//! - [`TerrainDomain`] — stepping, contact solve, gravity settling

pub mod body;
pub mod contact;
pub mod domain;

pub use body::{BodyGroup, Pose, Shape, TerrainBody};
pub use contact::Contact;
pub use domain::{GranularParams, SettleConfig, TerrainConfig, TerrainDomain, TerrainModel};
