//! Proxy creation, per-round update, and force extraction.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use loam_math::{barycentric_coords, Quat, Vec3};
use loam_mesh::{MeshConnectivity, VertexState};
use loam_terrain::{BodyGroup, Pose, Shape, TerrainBody, TerrainDomain};
use loam_types::{LoamError, LoamResult, VertexId};

use crate::proxy::{OrderingPolicy, Proxy, ProxyConfig, ProxyMode, ProxyVisitor};

/// The proxy synchronization layer.
///
/// Created once from mesh connectivity; the proxy count equals the
/// vertex count (node mode) or triangle count (face mode) and never
/// changes mid-simulation.
#[derive(Debug)]
pub struct ProxyLayer {
    config: ProxyConfig,
    proxies: Vec<Proxy>,
    triangles: Vec<[u32; 3]>,
    /// Latest vertex positions, refreshed every update. Needed in face
    /// mode to evaluate barycentric weights at extraction time.
    vertex_positions: Vec<Vec3>,
}

impl ProxyLayer {
    /// Builds exactly one proxy per vertex or per triangle.
    ///
    /// Fails with `InvalidMesh` if the connectivity does not validate
    /// (out-of-range indices, degenerate triangles). The optional
    /// visitor is invoked synchronously after each proxy is registered.
    pub fn create(
        domain: &mut TerrainDomain,
        mesh: &MeshConnectivity,
        config: ProxyConfig,
        mut visitor: Option<&mut dyn ProxyVisitor>,
    ) -> LoamResult<Self> {
        mesh.validate()?;
        if mesh.triangle_count() == 0 {
            return Err(LoamError::InvalidMesh(
                "mesh has no triangles; proxies cannot be sized".into(),
            ));
        }

        let mut layer = Self {
            proxies: Vec::new(),
            triangles: mesh.triangles.clone(),
            vertex_positions: mesh.positions.clone(),
            config,
        };

        match layer.config.mode {
            ProxyMode::NodeProxies => layer.create_node_proxies(domain, mesh, &mut visitor),
            ProxyMode::FaceProxies => layer.create_face_proxies(domain, mesh, &mut visitor),
        }

        tracing::info!(
            mode = ?layer.config.mode,
            count = layer.proxies.len(),
            "proxies created"
        );
        Ok(layer)
    }

    /// One sphere per vertex, radius half the typical mesh edge length
    /// so neighboring proxies tile the surface without gaps.
    fn create_node_proxies(
        &mut self,
        domain: &mut TerrainDomain,
        mesh: &MeshConnectivity,
        visitor: &mut Option<&mut dyn ProxyVisitor>,
    ) {
        let radius = 0.5 * mesh.typical_edge_length();
        let mass = self.config.node_mass;

        for (i, &pos) in mesh.positions.iter().enumerate() {
            let body = domain.add_body(
                Shape::Sphere { radius },
                Pose::at(pos),
                mass,
                TerrainBody::sphere_inertia(mass, radius),
                BodyGroup::Proxy,
                self.config.fixed_proxies,
            );
            self.register(body, i as u32, domain, visitor);
        }
    }

    /// One thin body per triangle: contact sphere with the triangle's
    /// equivalent-area disc radius, thin-plate inertia from area and
    /// the configured thickness (side s = √A: in-plane axes
    /// m(s² + t²)/12, normal axis m·s²/6).
    fn create_face_proxies(
        &mut self,
        domain: &mut TerrainDomain,
        mesh: &MeshConnectivity,
        visitor: &mut Option<&mut dyn ProxyVisitor>,
    ) {
        let mass = self.config.face_mass;
        let thickness = self.config.face_thickness;

        for t in 0..mesh.triangle_count() {
            let area = mesh.triangle_area(t);
            let radius = (area / PI).sqrt();

            let side_sq = area;
            let in_plane = mass * (side_sq + thickness * thickness) / 12.0;
            let normal_axis = mass * side_sq / 6.0;
            let inertia = Vec3::new(in_plane, in_plane, normal_axis);

            let pose = Pose {
                pos: mesh.triangle_centroid(t),
                rot: Quat::from_rotation_arc(Vec3::Z, mesh.triangle_normal(t)),
            };
            let body = domain.add_body(
                Shape::Sphere { radius },
                pose,
                mass,
                inertia,
                BodyGroup::Proxy,
                self.config.fixed_proxies,
            );
            self.register(body, t as u32, domain, visitor);
        }
    }

    fn register(
        &mut self,
        body: loam_types::BodyId,
        mesh_index: u32,
        domain: &TerrainDomain,
        visitor: &mut Option<&mut dyn ProxyVisitor>,
    ) {
        let proxy = Proxy { body, mesh_index };
        if let Some(v) = visitor.as_deref_mut() {
            v.created(&proxy, domain.body(body));
        }
        self.proxies.push(proxy);
    }

    /// Number of proxies (fixed for the node's lifetime).
    pub fn count(&self) -> usize {
        self.proxies.len()
    }

    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    /// Number of vertex states expected by `update`.
    pub fn vertex_count(&self) -> usize {
        self.vertex_positions.len()
    }

    /// Repositions and re-velocities every proxy from the latest
    /// externally-supplied vertex states.
    ///
    /// Idempotent: the proxy state is assigned, never accumulated, so
    /// applying the same input twice produces the same result.
    pub fn update(
        &mut self,
        domain: &mut TerrainDomain,
        states: &[VertexState],
    ) -> LoamResult<()> {
        if states.len() != self.vertex_positions.len() {
            return Err(LoamError::InvalidMesh(format!(
                "vertex state count ({}) does not match initialized mesh ({})",
                states.len(),
                self.vertex_positions.len()
            )));
        }
        for (slot, state) in self.vertex_positions.iter_mut().zip(states) {
            *slot = state.pos;
        }

        for idx in self.processing_order(domain) {
            let proxy = self.proxies[idx];
            match self.config.mode {
                ProxyMode::NodeProxies => {
                    let state = &states[proxy.mesh_index as usize];
                    domain.set_body_state(
                        proxy.body,
                        state.pos,
                        Quat::IDENTITY,
                        state.vel,
                        Vec3::ZERO,
                    );
                }
                ProxyMode::FaceProxies => {
                    let [ia, ib, ic] = self.triangles[proxy.mesh_index as usize];
                    let (a, b, c) = (
                        &states[ia as usize],
                        &states[ib as usize],
                        &states[ic as usize],
                    );
                    let centroid = (a.pos + b.pos + c.pos) / 3.0;
                    let normal = (b.pos - a.pos).cross(c.pos - a.pos).normalize_or_zero();
                    let rot = if normal.length_squared() > 0.0 {
                        Quat::from_rotation_arc(Vec3::Z, normal)
                    } else {
                        Quat::IDENTITY
                    };
                    let vel = (a.vel + b.vel + c.vel) / 3.0;
                    // Face angular velocity left at zero: the mesh side
                    // supplies no rotational state per triangle.
                    domain.set_body_state(proxy.body, centroid, rot, vel, Vec3::ZERO);
                }
            }
        }

        Ok(())
    }

    /// Converts each proxy's accumulated contact impulse into a nodal
    /// force and returns the sparse non-zero entries, ordered by
    /// vertex index.
    ///
    /// `dt` is the round's step size. In face mode each triangle's
    /// force is redistributed onto its three vertices with barycentric
    /// weights at the contact point recorded during the solve (the
    /// centroid when no point was recorded); the distributed sum per
    /// triangle equals the pre-distribution force up to rounding.
    pub fn extract_forces(
        &self,
        domain: &TerrainDomain,
        dt: f64,
    ) -> Vec<(VertexId, Vec3)> {
        let inv_dt = 1.0 / dt;
        let mut accumulated: BTreeMap<VertexId, Vec3> = BTreeMap::new();

        for idx in self.processing_order(domain) {
            let proxy = self.proxies[idx];
            let force = domain.linear_impulse(proxy.body) * inv_dt;
            if force.length_squared() == 0.0 {
                continue;
            }

            match self.config.mode {
                ProxyMode::NodeProxies => {
                    *accumulated
                        .entry(VertexId(proxy.mesh_index))
                        .or_insert(Vec3::ZERO) += force;
                }
                ProxyMode::FaceProxies => {
                    let [ia, ib, ic] = self.triangles[proxy.mesh_index as usize];
                    let a = self.vertex_positions[ia as usize];
                    let b = self.vertex_positions[ib as usize];
                    let c = self.vertex_positions[ic as usize];
                    let point = domain
                        .contact_point(proxy.body)
                        .unwrap_or((a + b + c) / 3.0);
                    let w = barycentric_coords(a, b, c, point);

                    *accumulated.entry(VertexId(ia)).or_insert(Vec3::ZERO) += force * w.x;
                    *accumulated.entry(VertexId(ib)).or_insert(Vec3::ZERO) += force * w.y;
                    *accumulated.entry(VertexId(ic)).or_insert(Vec3::ZERO) += force * w.z;
                }
            }
        }

        accumulated
            .into_iter()
            .filter(|(_, f)| f.length_squared() > 0.0)
            .collect()
    }

    /// Proxy visit order under the configured policy, as indices into
    /// [`proxies`](Self::proxies).
    ///
    /// `InsertionOrder` is the identity; `ByHeight` re-sorts every call
    /// from the proxies' live poses, lowest Z first.
    pub fn processing_order(&self, domain: &TerrainDomain) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.proxies.len()).collect();
        if self.config.ordering == OrderingPolicy::ByHeight {
            order.sort_by(|&i, &j| {
                let zi = domain.body(self.proxies[i].body).pose.pos.z;
                let zj = domain.body(self.proxies[j].body).pose.pos.z;
                zi.total_cmp(&zj)
            });
        }
        order
    }
}
