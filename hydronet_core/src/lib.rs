//! HydroNet Core - Sensor Field Lifetime Simulation Engine
//!
//! Simulates the operational lifetime of an underwater wireless sensor field
//! under three competing clustering/energy-management strategies, producing a
//! round-by-round trace usable for comparison and playback.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SimulationRunner                        │
//! │  (round loop, reclustering cadence, history, lifetime)      │
//! │       │                │                  │                 │
//! │  ┌────▼─────┐    ┌─────▼──────┐    ┌──────▼───────┐         │
//! │  │ Strategy │    │   Energy   │    │  Estimator   │         │
//! │  │ KMeans / │    │   Model    │    │ (IDW + MAE)  │         │
//! │  │ Leach /  │    └─────┬──────┘    └──────┬───────┘         │
//! │  │InfoKMeans│          │                  │                 │
//! │  └────┬─────┘          ▼                  │                 │
//! │       │          ┌───────────┐            │                 │
//! │       └─────────►│SensorField│◄───────────┘                 │
//! │                  └─────┬─────┘                              │
//! │                        ▼                                    │
//! │              ┌──────────────────┐                           │
//! │              │ EnvironmentField │                           │
//! │              │ (ground truth)   │                           │
//! │              └──────────────────┘                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Execution is single-threaded and synchronous: strategies run sequentially,
//! each against its own exclusively-owned deep copy of the initial sensor
//! layout. Everything downstream of the seeded random placement is
//! deterministic given that layout and the configuration.

pub mod cluster;
pub mod config;
pub mod energy;
pub mod entropy;
pub mod environment;
pub mod estimator;
pub mod kmeans;
pub mod rotating;
pub mod runner;
pub mod sensor;
pub mod stats;
pub mod strategy;

pub use cluster::{Cluster, MemberSnapshot};
pub use config::{ConfigError, EnergyConfig, EntropyConfig, SimulationConfig, VariableRange};
pub use environment::{EnvironmentField, Reading, Variable};
pub use estimator::ReadingEstimator;
pub use runner::{RoundFrame, SimulationRun, SimulationRunner, SleepStats, StrategyRun};
pub use sensor::{Sensor, SensorField, SensorId};
pub use stats::{round_statistics, RoundStatistics};
pub use strategy::{ClusterContext, ClusterStrategy, StrategyKind};
