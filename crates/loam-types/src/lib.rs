//! # loam-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the Loam co-simulation engine.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other Loam crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{LoamError, LoamResult};
pub use ids::{BlockId, BodyId, TriangleId, VertexId};
pub use scalar::Scalar;
