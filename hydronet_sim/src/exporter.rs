//! JSON exporter for offline visualization.
//!
//! Flattens a completed [`SimulationRun`] into plain serde structs so an
//! external plotting/playback tool can consume it without knowing the
//! engine's types.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

use hydronet_core::{round_statistics, SimulationConfig, SimulationRun, StrategyRun};

/// One exported cluster: head id/position plus member counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterExport {
    pub head: u64,
    pub x: f64,
    pub y: f64,
    pub members: usize,
    pub sleeping: usize,
}

/// One exported round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameExport {
    pub round: usize,
    pub alive: usize,
    pub active: usize,
    pub clusters: Vec<ClusterExport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sleeping: Vec<u64>,
}

/// One strategy's exported run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyExport {
    pub strategy: String,
    pub lifetime: usize,
    pub total_rounds: usize,
    pub mean_error: f64,
    pub error_series: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_active: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_saved: Option<f64>,
    pub frames: Vec<FrameExport>,
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    /// Seed used
    pub seed: u64,

    /// Configuration the run executed with
    pub config: SimulationConfig,

    /// One entry per strategy
    pub strategies: Vec<StrategyExport>,
}

impl RunExport {
    /// Flattens a run, keeping every `frame_stride`-th frame (plus the
    /// last one) to keep large exports manageable.
    pub fn from_run(run: &SimulationRun, config: &SimulationConfig, frame_stride: usize) -> Self {
        let stride = frame_stride.max(1);
        Self {
            seed: run.seed,
            config: config.clone(),
            strategies: run
                .strategies
                .iter()
                .map(|s| export_strategy(s, stride))
                .collect(),
        }
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

fn export_strategy(run: &StrategyRun, stride: usize) -> StrategyExport {
    let frames = run
        .frames
        .iter()
        .enumerate()
        .filter(|(i, _)| i % stride == 0 || *i + 1 == run.frames.len())
        .map(|(i, frame)| {
            let stats = round_statistics(run, i);
            FrameExport {
                round: frame.round,
                alive: stats.map_or(0, |s| s.alive),
                active: stats.map_or(0, |s| s.active),
                clusters: frame
                    .clusters
                    .iter()
                    .map(|c| {
                        let position = c
                            .head_position()
                            .unwrap_or_else(|| nalgebra::Point2::new(0.0, 0.0));
                        ClusterExport {
                            head: c.head,
                            x: position.x,
                            y: position.y,
                            members: c.members.len(),
                            sleeping: c.sleeping.len(),
                        }
                    })
                    .collect(),
                sleeping: frame.sleeping.clone(),
            }
        })
        .collect();

    StrategyExport {
        strategy: run.kind.name().to_string(),
        lifetime: run.lifetime,
        total_rounds: run.total_rounds,
        mean_error: run.mean_error(),
        error_series: run.error_series.clone(),
        avg_active: run.sleep_stats.map(|s| s.avg_active),
        energy_saved: run.sleep_stats.map(|s| s.energy_saved),
        frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydronet_core::SimulationRunner;

    fn tiny_run() -> (SimulationRun, SimulationConfig) {
        let config = SimulationConfig {
            sensor_count: 10,
            initial_energy: 10.0,
            max_rounds: 12,
            cluster_count: 2,
            ..Default::default()
        };
        let run = SimulationRunner::new(config.clone()).unwrap().with_seed(6).run();
        (run, config)
    }

    #[test]
    fn test_export_covers_all_strategies() {
        let (run, config) = tiny_run();
        let export = RunExport::from_run(&run, &config, 1);
        assert_eq!(export.strategies.len(), 3);
        for strategy in &export.strategies {
            assert_eq!(strategy.frames.len(), strategy.total_rounds);
        }
    }

    #[test]
    fn test_frame_stride_keeps_last_frame() {
        let (run, config) = tiny_run();
        let export = RunExport::from_run(&run, &config, 5);
        for strategy in &export.strategies {
            if strategy.total_rounds == 0 {
                continue;
            }
            let last = strategy.frames.last().unwrap();
            assert_eq!(last.round, strategy.total_rounds - 1);
        }
    }

    #[test]
    fn test_export_json_roundtrip() {
        let (run, config) = tiny_run();
        let export = RunExport::from_run(&run, &config, 2);
        let json = serde_json::to_string(&export).unwrap();
        let back: RunExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, export.seed);
        assert_eq!(back.strategies.len(), export.strategies.len());
    }
}
