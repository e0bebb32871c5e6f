//! # loam-cosim
//!
//! The co-simulation stepping protocol: a terrain node that exchanges
//! mesh vertex states for nodal contact forces, one round at a time.
//!
//! The protocol is a strict state machine — settle (optional), then
//! initialize once, then synchronize/advance/extract in a loop. Calls
//! made out of order fail with `ProtocolViolation` rather than
//! producing silently stale data.
//!
//! ## Key Types
//!
//! - [`CosimNode`] — the terrain side of the exchange
//! - [`CosimState`] — observable protocol phase
//! - [`DiagnosticsSink`] — pluggable per-frame proxy output

pub mod diagnostics;
pub mod node;

pub use diagnostics::{DiagnosticsSink, JsonLinesSink, ProxyRecord, VecSink};
pub use node::{CosimConfig, CosimNode, CosimState};
