//! Diagnostics sinks: per-proxy records emitted once per frame.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use loam_math::Vec3;
use loam_types::{LoamError, LoamResult};
use serde::{Deserialize, Serialize};

/// One proxy's state at one output frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub frame: u64,
    /// Vertex index (node mode) or triangle index (face mode).
    pub mesh_index: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Contact force on this proxy during the last advanced round.
    pub force: Vec3,
}

/// Injected strategy for diagnostics output.
///
/// The node calls `record` once per proxy per output frame and
/// `finalize` once when the co-simulation terminates.
pub trait DiagnosticsSink {
    fn record(&mut self, record: &ProxyRecord) -> LoamResult<()>;
    fn finalize(&mut self) -> LoamResult<()>;
    fn name(&self) -> &str;
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct VecSink {
    records: Vec<ProxyRecord>,
    finalized: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ProxyRecord] {
        &self.records
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl DiagnosticsSink for VecSink {
    fn record(&mut self, record: &ProxyRecord) -> LoamResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finalize(&mut self) -> LoamResult<()> {
        self.finalized = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "vec"
    }
}

/// Append-only file sink, one JSON record per line.
pub struct JsonLinesSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl JsonLinesSink {
    /// Opens (or creates) the file in append mode.
    pub fn open(path: impl AsRef<Path>) -> LoamResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticsSink for JsonLinesSink {
    fn record(&mut self, record: &ProxyRecord) -> LoamResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| LoamError::Serialization(e.to_string()))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finalize(&mut self) -> LoamResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}
