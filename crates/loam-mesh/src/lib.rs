//! # loam-mesh
//!
//! Surface mesh data for the mesh side of the co-simulation.
//!
//! ## Key Types
//!
//! - [`MeshConnectivity`] — vertex positions + triangle index list,
//!   transmitted once at co-simulation initialization
//! - [`VertexState`] — per-vertex position and velocity, retransmitted
//!   every synchronization round
//! - [`generators`] — deterministic procedural meshes for tests

pub mod connectivity;
pub mod generators;
pub mod vertex_state;

pub use connectivity::MeshConnectivity;
pub use vertex_state::VertexState;
