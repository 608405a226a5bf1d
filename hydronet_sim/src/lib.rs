//! HydroNet simulation harness.
//!
//! Thin shell around [`hydronet_core`]: named presets, a JSON exporter for
//! offline visualization, and the `hydronet-sim` CLI. All simulation
//! semantics live in the core crate; this crate only configures runs and
//! reports on their immutable results.

pub mod exporter;
pub mod presets;

pub use exporter::{RunExport, StrategyExport};
pub use presets::Preset;
