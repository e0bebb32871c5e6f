//! The co-simulation node: protocol state machine around the terrain
//! domain and its proxy layer.
//!
//! Call order is enforced strictly:
//!
//! ```text
//! [settle] → initialize → (synchronize → advance → [extract_forces])* → terminate
//! ```
//!
//! Any out-of-order call is a `ProtocolViolation` and aborts the round;
//! the node state is left unchanged so the caller can observe where the
//! exchange derailed.

use std::time::{Duration, Instant};

use loam_math::Vec3;
use loam_mesh::{MeshConnectivity, VertexState};
use loam_proxy::{ProxyConfig, ProxyLayer, ProxyVisitor};
use loam_solver::SolveReport;
use loam_terrain::{SettleConfig, TerrainConfig, TerrainDomain, TerrainModel};
use loam_types::{LoamError, LoamResult, VertexId};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticsSink, ProxyRecord};

/// Protocol phase of a co-simulation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CosimState {
    /// Constructed; neither settled nor initialized.
    Uninitialized,
    /// Terrain pre-rolled to quiescence; awaiting `initialize`.
    Settled,
    /// Proxies created; awaiting the first `synchronize`.
    Ready,
    /// Mesh state received; awaiting `advance`.
    Synchronized,
    /// Round advanced; forces may be extracted, or the next
    /// `synchronize` may begin.
    Advanced,
    /// Shut down; every further protocol call is rejected.
    Terminated,
}

/// Node-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosimConfig {
    /// Proxy creation parameters used at `initialize`.
    pub proxy: ProxyConfig,
    /// Settling parameters used by `settle`.
    pub settle: SettleConfig,
    /// Refuse `initialize` unless `settle` has completed. Deformable
    /// terrain needs a quiescent bed before proxies make sense.
    pub require_settle: bool,
}

impl Default for CosimConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            settle: SettleConfig::default(),
            require_settle: false,
        }
    }
}

impl CosimConfig {
    /// Preset for granular terrain: settling is mandatory.
    pub fn granular() -> Self {
        Self {
            require_settle: true,
            ..Default::default()
        }
    }
}

/// One side of the co-simulation: owns the terrain domain and the proxy
/// layer, and exchanges vertex states for nodal forces with the mesh
/// side.
pub struct CosimNode {
    config: CosimConfig,
    domain: TerrainDomain,
    layer: Option<ProxyLayer>,
    state: CosimState,
    init_height: Option<f64>,
    step_number: u64,
    sim_time: f64,
    last_dt: f64,
    round_time: Duration,
    total_time: Duration,
    cached_forces: Option<Vec<(VertexId, Vec3)>>,
}

impl CosimNode {
    pub fn new(model: TerrainModel, terrain: TerrainConfig, config: CosimConfig) -> Self {
        Self {
            domain: TerrainDomain::new(model, terrain),
            layer: None,
            state: CosimState::Uninitialized,
            init_height: None,
            step_number: 0,
            sim_time: 0.0,
            last_dt: 0.0,
            round_time: Duration::ZERO,
            total_time: Duration::ZERO,
            cached_forces: None,
            config,
        }
    }

    pub fn state(&self) -> CosimState {
        self.state
    }

    pub fn domain(&self) -> &TerrainDomain {
        &self.domain
    }

    /// Settled surface height, available after `settle`.
    pub fn init_height(&self) -> Option<f64> {
        self.init_height
    }

    /// Proxy count, available after `initialize`.
    pub fn proxy_count(&self) -> Option<usize> {
        self.layer.as_ref().map(ProxyLayer::count)
    }

    /// Wall-clock time spent in the last `advance`.
    pub fn round_time(&self) -> Duration {
        self.round_time
    }

    /// Cumulative wall-clock time spent in `advance` calls.
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    pub fn step_number(&self) -> u64 {
        self.step_number
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    fn violation(&self, op: &'static str) -> LoamError {
        LoamError::ProtocolViolation {
            op,
            state: format!("{:?}", self.state),
        }
    }

    /// Pre-rolls the terrain alone until quiescence and records the
    /// settled surface height.
    ///
    /// Fatal `NotSettled` if the terrain keeps moving past the budget.
    pub fn settle(&mut self) -> LoamResult<f64> {
        if self.state != CosimState::Uninitialized {
            return Err(self.violation("settle"));
        }
        let height = self.domain.settle(&self.config.settle)?;
        self.init_height = Some(height);
        self.state = CosimState::Settled;
        tracing::info!(height, "co-simulation terrain settled");
        Ok(height)
    }

    /// Receives the one-time mesh connectivity and creates the proxies.
    pub fn initialize(
        &mut self,
        mesh: &MeshConnectivity,
        visitor: Option<&mut dyn ProxyVisitor>,
    ) -> LoamResult<()> {
        match self.state {
            CosimState::Uninitialized if self.config.require_settle => {
                return Err(LoamError::NotSettled(
                    "initialize requires a completed settle phase".into(),
                ));
            }
            CosimState::Uninitialized | CosimState::Settled => {}
            _ => return Err(self.violation("initialize")),
        }

        let layer =
            ProxyLayer::create(&mut self.domain, mesh, self.config.proxy.clone(), visitor)?;
        tracing::info!(
            proxies = layer.count(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "co-simulation node initialized"
        );
        self.layer = Some(layer);
        self.state = CosimState::Ready;
        Ok(())
    }

    /// Data intake for one round: repositions every proxy from the mesh
    /// side's vertex states. Does not advance terrain time.
    pub fn synchronize(
        &mut self,
        step_number: u64,
        time: f64,
        states: &[VertexState],
    ) -> LoamResult<()> {
        if !matches!(self.state, CosimState::Ready | CosimState::Advanced) {
            return Err(self.violation("synchronize"));
        }
        let layer = self.layer.as_mut().ok_or_else(|| LoamError::ProtocolViolation {
            op: "synchronize",
            state: "no proxy layer".into(),
        })?;

        layer.update(&mut self.domain, states)?;
        self.step_number = step_number;
        self.sim_time = time;
        self.cached_forces = None;
        self.state = CosimState::Synchronized;
        tracing::debug!(step_number, time, "synchronized");
        Ok(())
    }

    /// Advances the terrain domain by one round of `step_size`.
    pub fn advance(&mut self, step_size: f64) -> LoamResult<SolveReport> {
        if self.state != CosimState::Synchronized {
            return Err(self.violation("advance"));
        }

        let started = Instant::now();
        let report = self.domain.step(step_size)?;
        self.round_time = started.elapsed();
        self.total_time += self.round_time;
        self.last_dt = step_size;
        self.state = CosimState::Advanced;
        tracing::debug!(
            step_number = self.step_number,
            iterations = report.iterations,
            converged = report.converged,
            "advanced"
        );
        Ok(report)
    }

    /// Returns the sparse per-vertex contact forces from the last
    /// advanced round, sorted by vertex index.
    ///
    /// Repeating the call without an intervening `synchronize` returns
    /// the same cached result.
    pub fn extract_forces(&mut self) -> LoamResult<Vec<(VertexId, Vec3)>> {
        if self.state != CosimState::Advanced {
            return Err(self.violation("extract_forces"));
        }
        let layer = self.layer.as_ref().ok_or_else(|| LoamError::ProtocolViolation {
            op: "extract_forces",
            state: "no proxy layer".into(),
        })?;

        if self.cached_forces.is_none() {
            self.cached_forces = Some(layer.extract_forces(&self.domain, self.last_dt));
        }
        Ok(self.cached_forces.clone().unwrap_or_default())
    }

    /// Writes one diagnostics record per proxy for the given frame.
    pub fn output_data(&self, frame: u64, sink: &mut dyn DiagnosticsSink) -> LoamResult<()> {
        let Some(layer) = self.layer.as_ref() else {
            return Err(self.violation("output_data"));
        };

        let inv_dt = if self.last_dt > 0.0 {
            1.0 / self.last_dt
        } else {
            0.0
        };
        for proxy in layer.proxies() {
            let body = self.domain.body(proxy.body);
            sink.record(&ProxyRecord {
                frame,
                mesh_index: proxy.mesh_index,
                position: body.pose.pos,
                velocity: self.domain.linear_velocity(proxy.body),
                force: self.domain.linear_impulse(proxy.body) * inv_dt,
            })?;
        }
        Ok(())
    }

    /// Shuts the node down; all further protocol calls are rejected.
    pub fn terminate(&mut self, sink: Option<&mut dyn DiagnosticsSink>) -> LoamResult<()> {
        if self.state == CosimState::Terminated {
            return Err(self.violation("terminate"));
        }
        if let Some(sink) = sink {
            sink.finalize()?;
            tracing::info!(sink = sink.name(), "diagnostics finalized");
        }
        self.state = CosimState::Terminated;
        tracing::info!(
            steps = self.step_number,
            total_ms = self.total_time.as_millis() as u64,
            "co-simulation node terminated"
        );
        Ok(())
    }
}
