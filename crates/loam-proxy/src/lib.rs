//! # loam-proxy
//!
//! The proxy synchronization layer: maps mesh degrees of freedom onto
//! a population of solver-visible rigid bodies in the terrain domain,
//! keeps each proxy kinematically consistent with the mesh side of the
//! co-simulation, and aggregates contact impulses accumulated on the
//! proxies back onto mesh vertices.
//!
//! ## Key Types
//!
//! - [`ProxyLayer`] — creation / per-round update / force extraction
//! - [`ProxyMode`] — one proxy per vertex or per triangle
//! - [`ProxyVisitor`] — injected strategy invoked after each proxy is
//!   created
//! - [`OrderingPolicy`] — pluggable proxy processing order

pub mod layer;
pub mod proxy;

pub use layer::ProxyLayer;
pub use proxy::{OrderingPolicy, Proxy, ProxyConfig, ProxyMode, ProxyVisitor};
