//! Integration tests for loam-cosim: protocol ordering, diagnostics,
//! and the end-to-end mesh/terrain force exchange.

use approx::assert_relative_eq;
use loam_cosim::{CosimConfig, CosimNode, CosimState, JsonLinesSink, ProxyRecord, VecSink};
use loam_math::Vec3;
use loam_mesh::{generators::flat_grid, MeshConnectivity, VertexState};
use loam_terrain::{TerrainConfig, TerrainModel};
use loam_types::{LoamError, VertexId};

fn rigid_node(config: CosimConfig) -> CosimNode {
    CosimNode::new(
        TerrainModel::Rigid { plane_height: 0.0 },
        TerrainConfig::default(),
        config,
    )
}

fn at_rest(mesh: &MeshConnectivity) -> Vec<VertexState> {
    mesh.positions.iter().map(|&p| VertexState::at_rest(p)).collect()
}

// ─── Protocol ordering ──────────────────────────────────────────────

#[test]
fn advance_before_initialize_is_a_protocol_violation() {
    let mut node = rigid_node(CosimConfig::default());
    let err = node.advance(1.0e-3).unwrap_err();
    assert!(matches!(err, LoamError::ProtocolViolation { op: "advance", .. }));
}

#[test]
fn synchronize_before_initialize_is_a_protocol_violation() {
    let mut node = rigid_node(CosimConfig::default());
    let err = node.synchronize(0, 0.0, &[]).unwrap_err();
    assert!(matches!(err, LoamError::ProtocolViolation { op: "synchronize", .. }));
}

#[test]
fn extract_before_advance_is_a_protocol_violation() {
    let mut node = rigid_node(CosimConfig::default());
    let mesh = flat_grid(1, 1, 1.0, 1.0, 1.0);
    node.initialize(&mesh, None).unwrap();

    let err = node.extract_forces().unwrap_err();
    assert!(matches!(err, LoamError::ProtocolViolation { op: "extract_forces", .. }));

    node.synchronize(0, 0.0, &at_rest(&mesh)).unwrap();
    let err = node.extract_forces().unwrap_err();
    assert!(matches!(err, LoamError::ProtocolViolation { op: "extract_forces", .. }));
}

#[test]
fn advance_twice_without_synchronize_is_rejected() {
    let mut node = rigid_node(CosimConfig::default());
    let mesh = flat_grid(1, 1, 1.0, 1.0, 1.0);
    node.initialize(&mesh, None).unwrap();
    node.synchronize(0, 0.0, &at_rest(&mesh)).unwrap();
    node.advance(1.0e-3).unwrap();

    let err = node.advance(1.0e-3).unwrap_err();
    assert!(matches!(err, LoamError::ProtocolViolation { op: "advance", .. }));
}

#[test]
fn initialize_requires_settle_when_configured() {
    let mut node = rigid_node(CosimConfig {
        require_settle: true,
        ..Default::default()
    });
    let mesh = flat_grid(1, 1, 1.0, 1.0, 1.0);

    let err = node.initialize(&mesh, None).unwrap_err();
    assert!(matches!(err, LoamError::NotSettled(_)));

    node.settle().unwrap();
    assert_eq!(node.state(), CosimState::Settled);
    node.initialize(&mesh, None).unwrap();
    assert_eq!(node.state(), CosimState::Ready);
}

#[test]
fn settle_records_init_height() {
    let mut node = rigid_node(CosimConfig::default());
    let height = node.settle().unwrap();
    assert_relative_eq!(height, 0.0);
    assert_eq!(node.init_height(), Some(height));
}

#[test]
fn terminated_node_rejects_all_calls() {
    let mut node = rigid_node(CosimConfig::default());
    let mesh = flat_grid(1, 1, 1.0, 1.0, 1.0);
    node.initialize(&mesh, None).unwrap();
    node.terminate(None).unwrap();

    assert_eq!(node.state(), CosimState::Terminated);
    assert!(node.synchronize(0, 0.0, &at_rest(&mesh)).is_err());
    assert!(node.advance(1.0e-3).is_err());
    assert!(node.extract_forces().is_err());
    assert!(node.terminate(None).is_err());
}

#[test]
fn synchronize_rejects_mismatched_vertex_count() {
    let mut node = rigid_node(CosimConfig::default());
    let mesh = flat_grid(1, 1, 1.0, 1.0, 1.0);
    node.initialize(&mesh, None).unwrap();

    let short = vec![VertexState::at_rest(Vec3::ZERO); 2];
    let err = node.synchronize(0, 0.0, &short).unwrap_err();
    assert!(matches!(err, LoamError::InvalidMesh(_)));
    // Failed intake leaves the node where it was.
    assert_eq!(node.state(), CosimState::Ready);
}

#[test]
fn repeated_extract_returns_the_cached_result() {
    let mut node = rigid_node(CosimConfig::default());
    // Low grid: proxies start in contact.
    let mesh = flat_grid(1, 1, 1.0, 1.0, 0.3);
    node.initialize(&mesh, None).unwrap();
    node.synchronize(0, 0.0, &at_rest(&mesh)).unwrap();
    node.advance(1.0e-3).unwrap();

    let first = node.extract_forces().unwrap();
    let second = node.extract_forces().unwrap();
    assert!(!first.is_empty());
    assert_eq!(first.len(), second.len());
    for ((ia, fa), (ib, fb)) in first.iter().zip(&second) {
        assert_eq!(ia, ib);
        assert_eq!(fa, fb);
    }

    // The next synchronize invalidates the cache.
    node.synchronize(1, 1.0e-3, &at_rest(&mesh)).unwrap();
    assert!(node.extract_forces().is_err());
}

#[test]
fn advance_accumulates_timing() {
    let mut node = rigid_node(CosimConfig::default());
    let mesh = flat_grid(1, 1, 1.0, 1.0, 0.3);
    node.initialize(&mesh, None).unwrap();

    let states = at_rest(&mesh);
    let mut total = std::time::Duration::ZERO;
    for n in 0..3 {
        node.synchronize(n, n as f64 * 1.0e-3, &states).unwrap();
        node.advance(1.0e-3).unwrap();
        total += node.round_time();
    }
    assert_eq!(node.total_time(), total);
    assert_eq!(node.step_number(), 2);
}

// ─── Diagnostics ────────────────────────────────────────────────────

#[test]
fn output_data_emits_one_record_per_proxy() {
    let mut node = rigid_node(CosimConfig::default());
    let mesh = flat_grid(2, 1, 1.0, 0.5, 0.3);
    node.initialize(&mesh, None).unwrap();
    node.synchronize(0, 0.0, &at_rest(&mesh)).unwrap();
    node.advance(1.0e-3).unwrap();

    let mut sink = VecSink::new();
    node.output_data(7, &mut sink).unwrap();

    assert_eq!(sink.records().len(), node.proxy_count().unwrap());
    for record in sink.records() {
        assert_eq!(record.frame, 7);
        assert!((record.mesh_index as usize) < mesh.vertex_count());
    }

    node.terminate(Some(&mut sink)).unwrap();
    assert!(sink.is_finalized());
}

#[test]
fn jsonl_sink_round_trips_records() {
    let path = std::env::temp_dir().join(format!(
        "loam-diag-{}-{:?}.jsonl",
        std::process::id(),
        std::thread::current().id()
    ));
    let _ = std::fs::remove_file(&path);

    let mut node = rigid_node(CosimConfig::default());
    let mesh = flat_grid(1, 1, 1.0, 1.0, 0.3);
    node.initialize(&mesh, None).unwrap();
    node.synchronize(0, 0.0, &at_rest(&mesh)).unwrap();
    node.advance(1.0e-3).unwrap();

    let mut sink = JsonLinesSink::open(&path).unwrap();
    node.output_data(0, &mut sink).unwrap();
    node.output_data(1, &mut sink).unwrap();
    node.terminate(Some(&mut sink)).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let records: Vec<ProxyRecord> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2 * mesh.vertex_count());
    assert_eq!(records[0].frame, 0);
    assert_eq!(records.last().unwrap().frame, 1);

    let _ = std::fs::remove_file(&path);
}

// ─── End-to-end exchange ────────────────────────────────────────────

/// Drops a 4-vertex, 2-triangle flat mesh onto rigid terrain and runs
/// the full exchange with a mesh-side point-mass integrator until the
/// extracted forces balance the mesh weight.
#[test]
fn flat_mesh_on_rigid_terrain_reaches_force_equilibrium() {
    let vertex_mass = 0.5;
    let gravity = 9.81;
    let dt = 1.0e-3;

    let mut node = rigid_node(CosimConfig::default());

    // Node proxies on this grid have radius ~0.57; start just above
    // first contact so the mesh falls in within a few hundred rounds.
    let mesh = flat_grid(1, 1, 1.0, 1.0, 0.6);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangle_count(), 2);
    node.initialize(&mesh, None).unwrap();

    let mut states = at_rest(&mesh);
    let mut forces = vec![Vec3::ZERO; states.len()];

    for n in 0..3000u64 {
        node.synchronize(n, n as f64 * dt, &states).unwrap();
        node.advance(dt).unwrap();

        forces.iter_mut().for_each(|f| *f = Vec3::ZERO);
        for (vid, force) in node.extract_forces().unwrap() {
            forces[vid.index()] = force;
        }

        // Mesh side: each vertex is an independent point mass under
        // gravity plus the terrain feedback force.
        for (state, force) in states.iter_mut().zip(&forces) {
            state.vel += (*force / vertex_mass - Vec3::new(0.0, 0.0, gravity)) * dt;
            state.pos += state.vel * dt;
        }
    }

    let expected = vertex_mass * gravity;
    for (i, force) in forces.iter().enumerate() {
        assert_relative_eq!(force.z, expected, max_relative = 0.15);
        assert!(force.x.abs() < 1.0e-9, "vertex {i} lateral force {}", force.x);
        assert!(force.y.abs() < 1.0e-9, "vertex {i} lateral force {}", force.y);
    }

    // Quiescent mesh at equilibrium.
    for state in &states {
        assert!(state.vel.length() < 0.05, "vertex still moving: {:?}", state.vel);
    }

    // Sparse output only names vertices that carry force.
    let sparse = node.extract_forces().unwrap();
    assert_eq!(sparse.len(), 4);
    assert!(sparse.windows(2).all(|w| w[0].0 < w[1].0));
    assert_eq!(sparse[0].0, VertexId(0));
}
