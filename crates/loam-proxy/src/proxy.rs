//! Proxy data types, configuration, and hooks.

use loam_terrain::TerrainBody;
use loam_types::BodyId;
use serde::{Deserialize, Serialize};

/// Which mesh feature each proxy stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyMode {
    /// One proxy per mesh vertex (spheres sized from edge length).
    NodeProxies,
    /// One proxy per mesh triangle (thin bodies sized from area).
    FaceProxies,
}

/// Association between a terrain-domain body and a mesh index.
///
/// `mesh_index` is a vertex index in node mode and a triangle index in
/// face mode. The layer owns the full collection; the terrain domain
/// owns the underlying state blocks through the body registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Proxy {
    pub body: BodyId,
    pub mesh_index: u32,
}

/// Proxy creation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub mode: ProxyMode,
    /// Mass of one node (vertex) proxy sphere (kg).
    pub node_mass: f64,
    /// Mass of one face (triangle) proxy body (kg).
    pub face_mass: f64,
    /// Thickness used for the thin-plate inertia approximation (m).
    pub face_thickness: f64,
    /// Fix proxies in place (they still accumulate contact impulses,
    /// but the terrain cannot displace them).
    pub fixed_proxies: bool,
    /// Proxy processing order for update and extraction.
    pub ordering: OrderingPolicy,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            mode: ProxyMode::NodeProxies,
            node_mass: 0.05,
            face_mass: 0.05,
            face_thickness: 0.01,
            fixed_proxies: false,
            ordering: OrderingPolicy::InsertionOrder,
        }
    }
}

/// Proxy processing order.
///
/// `ByHeight` processes proxies lower in the terrain first, which can
/// matter for stacking-sensitive operations. It re-sorts every round
/// from live poses; combined with any parallel proxy processing it is
/// a nondeterminism risk, so insertion order is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingPolicy {
    InsertionOrder,
    ByHeight,
}

/// Injected strategy invoked synchronously after each proxy is created.
///
/// Replaces open-ended post-creation callbacks with a typed payload:
/// the created proxy and its backing terrain body.
pub trait ProxyVisitor {
    fn created(&mut self, proxy: &Proxy, body: &TerrainBody);
}
