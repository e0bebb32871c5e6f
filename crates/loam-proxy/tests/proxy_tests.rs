//! Integration tests for loam-proxy.

use approx::assert_relative_eq;
use loam_math::Vec3;
use loam_mesh::{generators::flat_grid, MeshConnectivity, VertexState};
use loam_proxy::{OrderingPolicy, Proxy, ProxyConfig, ProxyLayer, ProxyMode, ProxyVisitor};
use loam_terrain::{Shape, TerrainBody, TerrainConfig, TerrainDomain, TerrainModel};
use loam_types::LoamError;

fn rigid_domain() -> TerrainDomain {
    TerrainDomain::new(
        TerrainModel::Rigid { plane_height: 0.0 },
        TerrainConfig::default(),
    )
}

fn at_rest(mesh: &MeshConnectivity) -> Vec<VertexState> {
    mesh.positions.iter().map(|&p| VertexState::at_rest(p)).collect()
}

#[test]
fn node_mode_creates_one_proxy_per_vertex() {
    let mut domain = rigid_domain();
    let mesh = flat_grid(3, 2, 1.0, 1.0, 0.5);

    let layer =
        ProxyLayer::create(&mut domain, &mesh, ProxyConfig::default(), None).unwrap();

    assert_eq!(layer.count(), mesh.vertex_count());
    for proxy in layer.proxies() {
        assert!((proxy.mesh_index as usize) < mesh.vertex_count());
    }
}

#[test]
fn face_mode_creates_one_proxy_per_triangle() {
    let mut domain = rigid_domain();
    let mesh = flat_grid(3, 2, 1.0, 1.0, 0.5);

    let config = ProxyConfig {
        mode: ProxyMode::FaceProxies,
        ..Default::default()
    };
    let layer = ProxyLayer::create(&mut domain, &mesh, config, None).unwrap();

    assert_eq!(layer.count(), mesh.triangle_count());
    for proxy in layer.proxies() {
        assert!((proxy.mesh_index as usize) < mesh.triangle_count());
    }
}

#[test]
fn node_proxy_radius_is_half_typical_edge() {
    let mut domain = rigid_domain();
    let mesh = flat_grid(2, 2, 1.0, 1.0, 0.5);
    let expected = 0.5 * mesh.typical_edge_length();

    let layer =
        ProxyLayer::create(&mut domain, &mesh, ProxyConfig::default(), None).unwrap();

    for proxy in layer.proxies() {
        match domain.body(proxy.body).shape {
            Shape::Sphere { radius } => assert_relative_eq!(radius, expected),
            _ => panic!("node proxy must be a sphere"),
        }
    }
}

#[test]
fn degenerate_mesh_is_rejected() {
    let mut domain = rigid_domain();
    // Three collinear vertices: zero-area triangle.
    let mesh = MeshConnectivity {
        positions: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ],
        triangles: vec![[0, 1, 2]],
    };

    let err = ProxyLayer::create(&mut domain, &mesh, ProxyConfig::default(), None)
        .unwrap_err();
    assert!(matches!(err, LoamError::InvalidMesh(_)));
}

#[test]
fn visitor_sees_every_created_proxy() {
    struct Counter {
        seen: Vec<u32>,
    }
    impl ProxyVisitor for Counter {
        fn created(&mut self, proxy: &Proxy, body: &TerrainBody) {
            assert!(!body.fixed);
            self.seen.push(proxy.mesh_index);
        }
    }

    let mut domain = rigid_domain();
    let mesh = flat_grid(2, 1, 1.0, 0.5, 0.5);
    let mut counter = Counter { seen: Vec::new() };

    let layer = ProxyLayer::create(
        &mut domain,
        &mesh,
        ProxyConfig::default(),
        Some(&mut counter),
    )
    .unwrap();

    assert_eq!(counter.seen.len(), layer.count());
    assert_eq!(counter.seen, (0..mesh.vertex_count() as u32).collect::<Vec<_>>());
}

#[test]
fn by_height_processes_lowest_proxies_first() {
    let mut domain = rigid_domain();
    // Tilted quad: every vertex at a distinct height.
    let mesh = MeshConnectivity {
        positions: vec![
            Vec3::new(0.0, 0.0, 0.3),
            Vec3::new(1.0, 0.0, 0.1),
            Vec3::new(0.0, 1.0, 0.4),
            Vec3::new(1.0, 1.0, 0.2),
        ],
        triangles: vec![[0, 1, 2], [1, 3, 2]],
    };

    let config = ProxyConfig {
        ordering: OrderingPolicy::ByHeight,
        ..Default::default()
    };
    let layer = ProxyLayer::create(&mut domain, &mesh, config, None).unwrap();

    // Ascending proxy Z: v1 (0.1), v3 (0.2), v0 (0.3), v2 (0.4).
    assert_eq!(layer.processing_order(&domain), vec![1, 3, 0, 2]);

    let mut domain = rigid_domain();
    let layer =
        ProxyLayer::create(&mut domain, &mesh, ProxyConfig::default(), None).unwrap();
    assert_eq!(layer.processing_order(&domain), vec![0, 1, 2, 3]);
}

#[test]
fn update_is_idempotent() {
    let mut domain = rigid_domain();
    let mesh = flat_grid(2, 2, 1.0, 1.0, 0.5);
    let mut layer =
        ProxyLayer::create(&mut domain, &mesh, ProxyConfig::default(), None).unwrap();

    let mut states = at_rest(&mesh);
    for (i, s) in states.iter_mut().enumerate() {
        s.pos += Vec3::new(0.01 * i as f64, 0.0, -0.02);
        s.vel = Vec3::new(0.1, 0.0, -0.5);
    }

    layer.update(&mut domain, &states).unwrap();
    let first: Vec<(Vec3, Vec3)> = layer
        .proxies()
        .iter()
        .map(|p| (domain.body(p.body).pose.pos, domain.linear_velocity(p.body)))
        .collect();

    layer.update(&mut domain, &states).unwrap();
    let second: Vec<(Vec3, Vec3)> = layer
        .proxies()
        .iter()
        .map(|p| (domain.body(p.body).pose.pos, domain.linear_velocity(p.body)))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn update_rejects_wrong_vertex_count() {
    let mut domain = rigid_domain();
    let mesh = flat_grid(1, 1, 1.0, 1.0, 0.5);
    let mut layer =
        ProxyLayer::create(&mut domain, &mesh, ProxyConfig::default(), None).unwrap();

    let short = vec![VertexState::at_rest(Vec3::ZERO); 2];
    let err = layer.update(&mut domain, &short).unwrap_err();
    assert!(matches!(err, LoamError::InvalidMesh(_)));
}

#[test]
fn extracted_forces_are_sparse_and_sorted() {
    let mut domain = rigid_domain();
    // Grid high above the plane: no contact, no forces.
    let mesh = flat_grid(2, 2, 1.0, 1.0, 1.0);
    let mut layer =
        ProxyLayer::create(&mut domain, &mesh, ProxyConfig::default(), None).unwrap();

    let states = at_rest(&mesh);
    layer.update(&mut domain, &states).unwrap();
    let dt = 1.0e-3;
    domain.step(dt).unwrap();

    let forces = layer.extract_forces(&domain, dt);
    assert!(forces.is_empty());

    // Drop the grid into contact; forces appear, sorted by vertex id.
    let touching: Vec<VertexState> = states
        .iter()
        .map(|s| VertexState::at_rest(s.pos - Vec3::new(0.0, 0.0, 0.95)))
        .collect();
    layer.update(&mut domain, &touching).unwrap();
    domain.step(dt).unwrap();

    let forces = layer.extract_forces(&domain, dt);
    assert!(!forces.is_empty());
    for pair in forces.windows(2) {
        assert!(pair[0].0 < pair[1].0);
    }
    for (_, f) in &forces {
        assert!(f.length_squared() > 0.0);
    }
}

#[test]
fn face_redistribution_conserves_force() {
    let mut domain = rigid_domain();
    // Two triangles whose contact spheres penetrate the plane.
    let mesh = flat_grid(1, 1, 1.0, 1.0, 0.3);
    let config = ProxyConfig {
        mode: ProxyMode::FaceProxies,
        ..Default::default()
    };
    let mut layer = ProxyLayer::create(&mut domain, &mesh, config, None).unwrap();

    layer.update(&mut domain, &at_rest(&mesh)).unwrap();
    let dt = 1.0e-3;
    domain.step(dt).unwrap();

    let total_proxy_force: Vec3 = layer
        .proxies()
        .iter()
        .map(|p| domain.linear_impulse(p.body) / dt)
        .sum();
    assert!(total_proxy_force.z > 0.0, "expected contact impulses");

    let distributed: Vec3 = layer
        .extract_forces(&domain, dt)
        .iter()
        .map(|(_, f)| *f)
        .sum();

    assert_relative_eq!(distributed.x, total_proxy_force.x, max_relative = 1.0e-9);
    assert_relative_eq!(distributed.y, total_proxy_force.y, max_relative = 1.0e-9);
    assert_relative_eq!(distributed.z, total_proxy_force.z, max_relative = 1.0e-9);
}

#[test]
fn node_forces_map_back_to_their_vertices() {
    let mut domain = rigid_domain();
    let mesh = flat_grid(1, 1, 1.0, 1.0, 0.1);
    let mut layer =
        ProxyLayer::create(&mut domain, &mesh, ProxyConfig::default(), None).unwrap();

    layer.update(&mut domain, &at_rest(&mesh)).unwrap();
    let dt = 1.0e-3;
    domain.step(dt).unwrap();

    let forces = layer.extract_forces(&domain, dt);
    for (vid, force) in &forces {
        let proxy = layer.proxies()[vid.index()];
        assert_eq!(proxy.mesh_index as usize, vid.index());
        let expected = domain.linear_impulse(proxy.body) / dt;
        assert_relative_eq!(force.z, expected.z, max_relative = 1.0e-12);
    }
}
