//! Simulation orchestrator.
//!
//! Drives the round loop for each strategy in turn, always in the same
//! order, each against its own deep copy of the initial layout and an
//! identically-seeded environment. One round = one state transition:
//! alive check, fresh readings, recluster-or-carry-forward, energy
//! application, frame append. After all strategies finish, shorter-lived
//! strategies' error series are extended to the longest horizon so the
//! three series stay comparable.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::cluster::{carry_forward, refresh_snapshots, Cluster};
use crate::config::{ConfigError, SimulationConfig};
use crate::energy::apply_round_cost;
use crate::environment::{EnvironmentField, Reading};
use crate::estimator::ReadingEstimator;
use crate::sensor::{SensorField, SensorId};
use crate::strategy::{ClusterContext, ClusterStrategy, StrategyKind};

/// Default master seed, matching the harness default.
const DEFAULT_SEED: u64 = 42;

/// One round's record: the topology (with post-energy member snapshots),
/// the round's readings for all sensors, and who slept. Immutable once
/// appended to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundFrame {
    pub round: usize,
    pub clusters: Vec<Cluster>,
    pub readings: BTreeMap<SensorId, Reading>,
    pub sleeping: Vec<SensorId>,

    /// Post-cost remaining energy for every sensor, dead included. The
    /// topology alone cannot answer field-wide queries: a head death drops
    /// its whole cluster on carry-forward rounds, orphaning alive members.
    pub energies: BTreeMap<SensorId, f64>,
}

/// Aggregates specific to the sleep-scheduling strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SleepStats {
    /// Mean number of active (alive, awake) sensors per round.
    pub avg_active: f64,

    /// Cumulative energy the sleeping sensors avoided spending.
    pub energy_saved: f64,
}

/// Full history of one strategy's run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRun {
    pub kind: StrategyKind,

    /// Round frames, index = round number. Append-only.
    pub frames: Vec<RoundFrame>,

    /// First round index with zero alive sensors, or the round budget if
    /// it was exhausted first.
    pub lifetime: usize,

    /// Rounds actually executed.
    pub total_rounds: usize,

    /// Present only for the entropy-gated strategy.
    pub sleep_stats: Option<SleepStats>,

    /// Per-round reconstruction error, possibly extended past
    /// `total_rounds` to the common horizon.
    pub error_series: Vec<f64>,
}

/// Results of a complete simulation: the shared initial layout plus one run
/// per strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub seed: u64,
    pub layout: SensorField,
    pub strategies: Vec<StrategyRun>,
}

impl StrategyRun {
    /// Mean of the (possibly extended) error series; 0 for an empty run.
    pub fn mean_error(&self) -> f64 {
        if self.error_series.is_empty() {
            return 0.0;
        }
        self.error_series.iter().sum::<f64>() / self.error_series.len() as f64
    }
}

impl SimulationRun {
    /// Looks up one strategy's run by kind.
    pub fn strategy(&self, kind: StrategyKind) -> Option<&StrategyRun> {
        self.strategies.iter().find(|r| r.kind == kind)
    }
}

/// Executes the round loop for every strategy over one seeded layout.
pub struct SimulationRunner {
    config: SimulationConfig,
    seed: u64,
}

impl SimulationRunner {
    /// Validates the configuration up front; an invalid configuration is a
    /// caller contract violation and never reaches the round loop.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            seed: DEFAULT_SEED,
        })
    }

    /// Sets the master seed for reproducible layouts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Environment seed derived from the master seed so layout changes do
    /// not ripple into the environment and vice versa.
    fn env_seed(&self) -> u64 {
        self.seed.wrapping_mul(0x9e3779b97f4a7c15)
    }

    /// Runs all strategies sequentially against the same initial layout and
    /// extends every error series to the common horizon.
    pub fn run(&self) -> SimulationRun {
        let layout = SensorField::generate(&self.config, self.seed);

        let mut completed: Vec<(StrategyRun, ReadingEstimator)> = StrategyKind::all()
            .into_iter()
            .map(|kind| self.run_strategy(kind, &layout))
            .collect();
        self.extend_error_series(&mut completed, &layout);

        SimulationRun {
            seed: self.seed,
            layout,
            strategies: completed.into_iter().map(|(run, _)| run).collect(),
        }
    }

    fn run_strategy(
        &self,
        kind: StrategyKind,
        layout: &SensorField,
    ) -> (StrategyRun, ReadingEstimator) {
        let config = &self.config;
        let mut field = layout.clone();
        let mut env = EnvironmentField::new(config, self.env_seed());
        let mut strategy = ClusterStrategy::new(kind);
        let mut estimator = ReadingEstimator::new(config.entropy.neighbor_count);

        let mut frames: Vec<RoundFrame> = Vec::new();
        let mut error_series: Vec<f64> = Vec::new();
        let mut previous: Vec<Cluster> = Vec::new();
        let mut last_epoch: Option<usize> = None;
        let mut lifetime: Option<usize> = None;
        let mut active_sum = 0usize;
        let mut energy_saved = 0.0;

        let mut round = 0;
        while round < config.max_rounds {
            if field.alive_count() == 0 {
                lifetime = Some(round);
                break;
            }

            // Slow environmental drift between clustering epochs.
            if round > 0 && round % config.recluster_interval == 0 {
                env.drift();
            }

            // Readings for all sensors, dead or alive; positions come from
            // the pristine layout.
            let readings: BTreeMap<SensorId, Reading> = layout
                .sensors()
                .iter()
                .map(|s| (s.id, env.reading(&s.position, round)))
                .collect();
            strategy.observe(&readings, &field, config);

            let reclustering = last_epoch.map_or(true, |e| round - e >= config.recluster_interval);
            let mut clusters = if reclustering {
                last_epoch = Some(round);
                let clusters = strategy.cluster(&ClusterContext {
                    field: &field,
                    config,
                    round,
                });
                sync_sleep_flags(&mut field, &clusters);
                clusters
            } else {
                carry_forward(&previous, &field)
            };

            apply_round_cost(&clusters, &mut field, config);
            refresh_snapshots(&mut clusters, &field);

            let error = estimator.observe_round(layout, &field, &readings, &env, round);
            error_series.push(error);

            let sleeping = field.sleeping_ids();
            active_sum += field.sensors().iter().filter(|s| s.is_active()).count();
            energy_saved += sleeping.len() as f64
                * (config.energy.transmit + config.energy.idle - config.energy.sleep_drain);

            let energies: BTreeMap<SensorId, f64> = field
                .sensors()
                .iter()
                .map(|s| (s.id, s.energy))
                .collect();
            frames.push(RoundFrame {
                round,
                clusters: clusters.clone(),
                readings,
                sleeping,
                energies,
            });
            previous = clusters;
            round += 1;
        }

        let total_rounds = frames.len();
        let lifetime = lifetime.unwrap_or(total_rounds);
        let sleep_stats = match kind {
            StrategyKind::InfoKMeans if total_rounds > 0 => Some(SleepStats {
                avg_active: active_sum as f64 / total_rounds as f64,
                energy_saved,
            }),
            _ => None,
        };

        (
            StrategyRun {
                kind,
                frames,
                lifetime,
                total_rounds,
                sleep_stats,
                error_series,
            },
            estimator,
        )
    }

    /// Pads every strategy that ended before the longest-surviving one:
    /// for each remaining round, the same reconstruction error is computed
    /// as if every sensor were permanently in its last-known state. The
    /// environment is replayed from the same seed with the same drift
    /// cadence so ground truth matches what the run would have seen.
    fn extend_error_series(
        &self,
        completed: &mut [(StrategyRun, ReadingEstimator)],
        layout: &SensorField,
    ) {
        let horizon = completed
            .iter()
            .map(|(run, _)| run.total_rounds)
            .max()
            .unwrap_or(0);

        for (run, estimator) in completed {
            if run.error_series.len() >= horizon {
                continue;
            }
            let mut env = EnvironmentField::new(&self.config, self.env_seed());
            for round in 0..horizon {
                if round > 0 && round % self.config.recluster_interval == 0 {
                    env.drift();
                }
                if round < run.error_series.len() {
                    continue;
                }
                run.error_series
                    .push(estimator.estimate_all(layout, &env, round));
            }
        }
    }
}

/// Aligns working-copy sleep flags with the freshly clustered topology.
fn sync_sleep_flags(field: &mut SensorField, clusters: &[Cluster]) {
    let sleeping: HashSet<SensorId> = clusters
        .iter()
        .flat_map(|c| c.sleeping.iter().map(|m| m.id))
        .collect();
    for sensor in field.sensors_mut() {
        sensor.asleep = sleeping.contains(&sensor.id);
    }
}
