//! Entropy-gated sleep scheduling (information-aware k-means).
//!
//! Maintains a bounded sliding window of recent readings per sensor. Once
//! enough history exists, each sensor gets an information score: the
//! normalized temporal conditional entropy of its discretized reading
//! sequences given those of its nearest neighbors. Predictable (low-score)
//! sensors are put to sleep, a guardrail keeps enough sensors awake to feed
//! clustering, and the active subset is clustered with the centroid
//! algorithm. Sleepers attach to the cluster with the nearest head without
//! re-optimizing centroids.

use nalgebra::distance_squared;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::cluster::{Cluster, MemberSnapshot};
use crate::config::{SimulationConfig, VariableRange};
use crate::environment::{Reading, Variable};
use crate::kmeans::cluster_by_centroid;
use crate::sensor::{Sensor, SensorId};
use crate::strategy::ClusterContext;

/// Minimum history samples before a sensor's score is trusted.
const MIN_HISTORY: usize = 3;

/// Fraction of alive sensors that must reach `MIN_HISTORY` before gating.
const COVERAGE_FRACTION: f64 = 0.8;

/// Neighbors need at least this much history to inform a score.
const NEIGHBOR_MIN_HISTORY: usize = 2;

/// Guardrail: at least this many sensors stay active.
const MIN_ACTIVE_FLOOR: usize = 3;

/// Guardrail: at least this fraction of alive sensors stays active.
const MIN_ACTIVE_FRACTION: f64 = 0.3;

/// Cross-round state for the entropy-gated strategy.
#[derive(Debug, Default)]
pub struct InfoKMeansState {
    /// Bounded recent-reading window per sensor.
    history: HashMap<SensorId, VecDeque<Reading>>,
}

impl InfoKMeansState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records this round's readings for sensors that actually sensed
    /// (alive and awake), trimming each window to the configured length.
    pub fn observe(
        &mut self,
        readings: &BTreeMap<SensorId, Reading>,
        sensors: &[Sensor],
        window: usize,
    ) {
        for sensor in sensors {
            if !sensor.is_active() {
                continue;
            }
            let Some(reading) = readings.get(&sensor.id) else {
                continue;
            };
            let entry = self.history.entry(sensor.id).or_default();
            entry.push_back(*reading);
            while entry.len() > window {
                entry.pop_front();
            }
        }
    }

    /// Partitions alive sensors into active and sleeping subsets, clusters
    /// the active subset via the centroid algorithm, and attaches sleepers
    /// to the cluster with the spatially nearest head.
    pub fn cluster(&mut self, ctx: &ClusterContext) -> Vec<Cluster> {
        let alive: Vec<&Sensor> = ctx.field.alive().collect();
        if alive.is_empty() {
            return Vec::new();
        }

        let (active, sleeping) = self.partition(&alive, ctx.config);

        let active_nodes: Vec<MemberSnapshot> = active
            .iter()
            .map(|s| MemberSnapshot {
                id: s.id,
                position: s.position,
                energy: s.energy,
                asleep: false,
            })
            .collect();

        let mut clusters = cluster_by_centroid(
            &active_nodes,
            ctx.config.cluster_count,
            ctx.config.field_width,
            ctx.config.field_height,
        );
        if clusters.is_empty() {
            return clusters;
        }

        for sensor in sleeping {
            let nearest = clusters
                .iter()
                .enumerate()
                .filter_map(|(i, c)| {
                    c.head_position()
                        .map(|p| (i, distance_squared(&sensor.position, &p)))
                })
                .min_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(i, _)| i);
            if let Some(i) = nearest {
                clusters[i].sleeping.push(MemberSnapshot {
                    id: sensor.id,
                    position: sensor.position,
                    energy: sensor.energy,
                    asleep: true,
                });
            }
        }
        clusters
    }

    /// Splits alive sensors into (active, sleeping). Without sufficient
    /// history everyone stays active; with it, sensors scoring under the
    /// information threshold sleep, subject to the wake guardrail.
    fn partition<'a>(
        &self,
        alive: &[&'a Sensor],
        config: &SimulationConfig,
    ) -> (Vec<&'a Sensor>, Vec<&'a Sensor>) {
        if !self.has_coverage(alive) {
            return (alive.to_vec(), Vec::new());
        }

        let mut active = Vec::new();
        let mut sleeping: Vec<(f64, &Sensor)> = Vec::new();
        for &sensor in alive {
            let score = self.information_score(sensor, alive, config);
            if score >= config.entropy.information_threshold {
                active.push(sensor);
            } else {
                sleeping.push((score, sensor));
            }
        }

        // Wake the highest-scoring sleepers if too few sensors remain
        // active to feed clustering.
        let min_active = MIN_ACTIVE_FLOOR
            .max((MIN_ACTIVE_FRACTION * alive.len() as f64).ceil() as usize)
            .min(alive.len());
        sleeping.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
        while active.len() < min_active {
            match sleeping.first() {
                Some(&(_, sensor)) => {
                    active.push(sensor);
                    sleeping.remove(0);
                }
                None => break,
            }
        }

        (active, sleeping.into_iter().map(|(_, s)| s).collect())
    }

    /// True once >= 80% of alive sensors carry >= 3 history samples.
    fn has_coverage(&self, alive: &[&Sensor]) -> bool {
        if alive.is_empty() {
            return false;
        }
        let covered = alive
            .iter()
            .filter(|s| {
                self.history
                    .get(&s.id)
                    .is_some_and(|h| h.len() >= MIN_HISTORY)
            })
            .count();
        covered as f64 >= COVERAGE_FRACTION * alive.len() as f64
    }

    /// Normalized information content of one sensor in [0, 1].
    ///
    /// Averages, over the four environmental variables, the mean temporal
    /// conditional entropy of the sensor's discretized reading sequence
    /// given each qualifying neighbor's sequence, normalized by the maximum
    /// possible entropy (log2 of the bin count). High score = hard to
    /// predict from neighbors = must stay awake.
    fn information_score(
        &self,
        sensor: &Sensor,
        alive: &[&Sensor],
        config: &SimulationConfig,
    ) -> f64 {
        let Some(target) = self.history.get(&sensor.id) else {
            return 1.0;
        };
        if target.len() < NEIGHBOR_MIN_HISTORY {
            return 1.0;
        }

        let mut neighbors: Vec<&Sensor> = alive
            .iter()
            .copied()
            .filter(|n| {
                n.id != sensor.id
                    && self
                        .history
                        .get(&n.id)
                        .is_some_and(|h| h.len() >= NEIGHBOR_MIN_HISTORY)
            })
            .collect();
        if neighbors.is_empty() {
            return 1.0;
        }
        neighbors.sort_by(|a, b| {
            distance_squared(&sensor.position, &a.position)
                .total_cmp(&distance_squared(&sensor.position, &b.position))
        });
        neighbors.truncate(config.entropy.neighbor_count);

        let bins = config.entropy.bins;
        let max_entropy = (bins as f64).log2();
        let mut variable_sum = 0.0;
        for variable in Variable::ALL {
            let range = range_of(config, variable);
            let target_seq = discretize(target, variable, range, bins);

            let mut neighbor_sum = 0.0;
            for neighbor in &neighbors {
                let neighbor_seq =
                    discretize(&self.history[&neighbor.id], variable, range, bins);
                let aligned = target_seq.len().min(neighbor_seq.len());
                let xs = &target_seq[target_seq.len() - aligned..];
                let ys = &neighbor_seq[neighbor_seq.len() - aligned..];
                neighbor_sum += conditional_entropy(xs, ys);
            }
            variable_sum += neighbor_sum / neighbors.len() as f64;
        }
        (variable_sum / Variable::ALL.len() as f64 / max_entropy).clamp(0.0, 1.0)
    }
}

fn range_of(config: &SimulationConfig, variable: Variable) -> VariableRange {
    match variable {
        Variable::Temperature => config.ranges.temperature,
        Variable::Salinity => config.ranges.salinity,
        Variable::Pressure => config.ranges.pressure,
        Variable::Ph => config.ranges.ph,
    }
}

/// Discretizes one variable's history into `bins` buckets over its range.
fn discretize(
    history: &VecDeque<Reading>,
    variable: Variable,
    range: VariableRange,
    bins: usize,
) -> Vec<usize> {
    history
        .iter()
        .map(|reading| {
            let normalized = (reading.get(variable) - range.min) / range.span();
            ((normalized * bins as f64) as usize).min(bins - 1)
        })
        .collect()
}

/// Temporal conditional entropy H(X|Y) = H(X,Y) - H(Y) in bits, estimated
/// from joint/marginal counts over the aligned window.
fn conditional_entropy(xs: &[usize], ys: &[usize]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let n = xs.len() as f64;
    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut marginal: HashMap<usize, usize> = HashMap::new();
    for (&x, &y) in xs.iter().zip(ys) {
        *joint.entry((x, y)).or_insert(0) += 1;
        *marginal.entry(y).or_insert(0) += 1;
    }

    let entropy = |counts: &mut dyn Iterator<Item = &usize>| -> f64 {
        counts
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.log2()
            })
            .sum()
    };
    let h_joint = entropy(&mut joint.values());
    let h_marginal = entropy(&mut marginal.values());
    (h_joint - h_marginal).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorField;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn field_of(count: usize) -> SensorField {
        let sensors = (0..count)
            .map(|i| {
                Sensor::new(
                    i as SensorId,
                    Point2::new((i as f64 * 71.0) % 500.0, (i as f64 * 113.0) % 500.0),
                    100.0,
                )
            })
            .collect();
        SensorField::from_sensors(sensors)
    }

    fn constant_reading() -> Reading {
        Reading {
            temperature: 15.0,
            salinity: 35.0,
            pressure: 200.0,
            ph: 8.0,
        }
    }

    fn feed_constant_history(state: &mut InfoKMeansState, field: &SensorField, rounds: usize) {
        let readings: BTreeMap<SensorId, Reading> = field
            .sensors()
            .iter()
            .map(|s| (s.id, constant_reading()))
            .collect();
        for _ in 0..rounds {
            state.observe(&readings, field.sensors(), 20);
        }
    }

    #[test]
    fn test_no_history_keeps_everyone_active() {
        let field = field_of(10);
        let config = SimulationConfig::default();
        let mut state = InfoKMeansState::new();
        let clusters = state.cluster(&ClusterContext {
            field: &field,
            config: &config,
            round: 0,
        });

        let active: usize = clusters.iter().map(|c| c.members.len()).sum();
        let sleeping: usize = clusters.iter().map(|c| c.sleeping.len()).sum();
        assert_eq!(active, 10);
        assert_eq!(sleeping, 0);
    }

    #[test]
    fn test_threshold_one_leaves_only_guardrail_minimum_active() {
        let field = field_of(10);
        let mut config = SimulationConfig::default();
        config.entropy.information_threshold = 1.0;
        let mut state = InfoKMeansState::new();
        feed_constant_history(&mut state, &field, 4);

        let clusters = state.cluster(&ClusterContext {
            field: &field,
            config: &config,
            round: 4,
        });

        let active: usize = clusters.iter().map(|c| c.members.len()).sum();
        let sleeping: usize = clusters.iter().map(|c| c.sleeping.len()).sum();
        // max(3, ceil(0.3 * 10)) = 3 sensors stay awake.
        assert_eq!(active, 3);
        assert_eq!(sleeping, 7);
    }

    #[test]
    fn test_active_floor_never_violated_while_sensors_alive() {
        for count in [1usize, 2, 3, 5, 12] {
            let field = field_of(count);
            let mut config = SimulationConfig::default();
            config.entropy.information_threshold = 1.0;
            let mut state = InfoKMeansState::new();
            feed_constant_history(&mut state, &field, 5);

            let clusters = state.cluster(&ClusterContext {
                field: &field,
                config: &config,
                round: 5,
            });
            let active: usize = clusters.iter().map(|c| c.members.len()).sum();
            let floor = MIN_ACTIVE_FLOOR
                .max((MIN_ACTIVE_FRACTION * count as f64).ceil() as usize)
                .min(count);
            assert!(active >= floor, "{count} sensors: active {active} < {floor}");
        }
    }

    #[test]
    fn test_sleepers_attach_to_nearest_head_marked_asleep() {
        let field = field_of(10);
        let mut config = SimulationConfig::default();
        config.entropy.information_threshold = 1.0;
        config.cluster_count = 2;
        let mut state = InfoKMeansState::new();
        feed_constant_history(&mut state, &field, 4);

        let clusters = state.cluster(&ClusterContext {
            field: &field,
            config: &config,
            round: 4,
        });

        let heads: Vec<_> = clusters
            .iter()
            .map(|c| c.head_position().unwrap())
            .collect();
        for cluster in &clusters {
            let own = cluster.head_position().unwrap();
            for sleeper in &cluster.sleeping {
                assert!(sleeper.asleep);
                let d = distance_squared(&sleeper.position, &own);
                for other in &heads {
                    assert!(d <= distance_squared(&sleeper.position, other) + 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_insufficient_coverage_skips_gating() {
        let field = field_of(10);
        let mut config = SimulationConfig::default();
        config.entropy.information_threshold = 1.0;
        let mut state = InfoKMeansState::new();
        // Only 2 samples each: below the 3-sample coverage requirement.
        feed_constant_history(&mut state, &field, 2);

        let clusters = state.cluster(&ClusterContext {
            field: &field,
            config: &config,
            round: 2,
        });
        let sleeping: usize = clusters.iter().map(|c| c.sleeping.len()).sum();
        assert_eq!(sleeping, 0);
    }

    #[test]
    fn test_observe_bounds_window() {
        let field = field_of(2);
        let mut state = InfoKMeansState::new();
        let readings: BTreeMap<SensorId, Reading> = field
            .sensors()
            .iter()
            .map(|s| (s.id, constant_reading()))
            .collect();
        for _ in 0..12 {
            state.observe(&readings, field.sensors(), 5);
        }
        assert_eq!(state.history[&0].len(), 5);
    }

    #[test]
    fn test_observe_skips_sleeping_sensors() {
        let mut field = field_of(2);
        field.get_mut(1).unwrap().asleep = true;
        let mut state = InfoKMeansState::new();
        let readings: BTreeMap<SensorId, Reading> = field
            .sensors()
            .iter()
            .map(|s| (s.id, constant_reading()))
            .collect();
        state.observe(&readings, field.sensors(), 5);

        assert!(state.history.contains_key(&0));
        assert!(!state.history.contains_key(&1));
    }

    #[test]
    fn test_conditional_entropy_of_determined_sequence_is_zero() {
        // X is a function of Y: knowing Y removes all uncertainty.
        let ys = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let xs: Vec<usize> = ys.iter().map(|&y| y + 2).collect();
        assert_relative_eq!(conditional_entropy(&xs, &ys), 0.0);
    }

    #[test]
    fn test_conditional_entropy_of_independent_sequence_is_positive() {
        let ys = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let xs = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let h = conditional_entropy(&xs, &ys);
        assert!(h > 0.9, "expected near 1 bit, got {h}");
    }

    #[test]
    fn test_discretize_clamps_to_bins() {
        let range = VariableRange::new(0.0, 10.0);
        let mut history = VecDeque::new();
        for t in [0.0, 5.0, 10.0] {
            let mut r = constant_reading();
            r.temperature = t;
            history.push_back(r);
        }
        let seq = discretize(&history, Variable::Temperature, range, 4);
        assert_eq!(seq, vec![0, 2, 3]);
    }
}
