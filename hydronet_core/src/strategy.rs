//! The clustering capability and its three variants.
//!
//! Strategies are a tagged variant dispatched by kind, not a class
//! hierarchy; the entropy-gated variant composes the centroid-based
//! algorithm. Cross-round mutable per-sensor state (rotation cool-downs,
//! reading windows) is owned explicitly by each variant's state struct so
//! strategies stay swappable and testable in isolation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cluster::{Cluster, MemberSnapshot};
use crate::config::SimulationConfig;
use crate::entropy::InfoKMeansState;
use crate::environment::Reading;
use crate::kmeans::cluster_by_centroid;
use crate::rotating::RotatingHeadState;
use crate::sensor::{SensorField, SensorId};

/// Strategy identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Centroid partitioning, recomputed from scratch each epoch.
    KMeans,

    /// Rotating-head protocol with per-cycle head cool-down.
    Leach,

    /// Entropy-gated sleep scheduling over centroid clustering.
    InfoKMeans,
}

impl StrategyKind {
    /// Returns all strategies in execution order.
    pub fn all() -> Vec<StrategyKind> {
        vec![
            StrategyKind::KMeans,
            StrategyKind::Leach,
            StrategyKind::InfoKMeans,
        ]
    }

    /// Returns the strategy name.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::KMeans => "kmeans",
            StrategyKind::Leach => "leach",
            StrategyKind::InfoKMeans => "info_kmeans",
        }
    }

    /// Returns a description of the strategy.
    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::KMeans => "Centroid partitioning with grid-seeded Lloyd iteration",
            StrategyKind::Leach => "Probabilistic head rotation with energy-weighted thresholds",
            StrategyKind::InfoKMeans => {
                "Conditional-entropy sleep gating composed over centroid clustering"
            }
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kmeans" | "k-means" => Ok(StrategyKind::KMeans),
            "leach" | "rotating" => Ok(StrategyKind::Leach),
            "info_kmeans" | "infokmeans" | "entropy" => Ok(StrategyKind::InfoKMeans),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

/// Read-only inputs a strategy sees for one clustering epoch.
pub struct ClusterContext<'a> {
    pub field: &'a SensorField,
    pub config: &'a SimulationConfig,
    pub round: usize,
}

/// A clustering strategy instance with its cross-round state.
pub enum ClusterStrategy {
    KMeans,
    Leach(RotatingHeadState),
    InfoKMeans(InfoKMeansState),
}

impl ClusterStrategy {
    pub fn new(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::KMeans => ClusterStrategy::KMeans,
            StrategyKind::Leach => ClusterStrategy::Leach(RotatingHeadState::new()),
            StrategyKind::InfoKMeans => ClusterStrategy::InfoKMeans(InfoKMeansState::new()),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            ClusterStrategy::KMeans => StrategyKind::KMeans,
            ClusterStrategy::Leach(_) => StrategyKind::Leach,
            ClusterStrategy::InfoKMeans(_) => StrategyKind::InfoKMeans,
        }
    }

    /// Feeds this round's readings to stateful variants. Called every
    /// round, including carry-forward rounds.
    pub fn observe(
        &mut self,
        readings: &BTreeMap<SensorId, Reading>,
        field: &SensorField,
        config: &SimulationConfig,
    ) {
        if let ClusterStrategy::InfoKMeans(state) = self {
            state.observe(readings, field.sensors(), config.entropy.history_window);
        }
    }

    /// Produces this epoch's topology. Returns an empty sequence if no
    /// sensors are alive; a lone survivor heads its own single cluster.
    pub fn cluster(&mut self, ctx: &ClusterContext) -> Vec<Cluster> {
        match self {
            ClusterStrategy::KMeans => {
                let nodes: Vec<MemberSnapshot> = ctx
                    .field
                    .alive()
                    .map(|s| MemberSnapshot {
                        id: s.id,
                        position: s.position,
                        energy: s.energy,
                        asleep: false,
                    })
                    .collect();
                cluster_by_centroid(
                    &nodes,
                    ctx.config.cluster_count,
                    ctx.config.field_width,
                    ctx.config.field_height,
                )
            }
            ClusterStrategy::Leach(state) => state.cluster(ctx),
            ClusterStrategy::InfoKMeans(state) => state.cluster(ctx),
        }
    }
}
