//! Missing-reading estimation and per-round error scoring.
//!
//! Keeps a last-known-reading cache fed only by sensors that are alive and
//! awake (stale but trustworthy ground truth). Dead or sleeping sensors get
//! their reading reconstructed by inverse-distance weighting over the k
//! nearest originally-placed sensors holding cached data; with no cached
//! neighbor at all, the environment generator is queried directly as an
//! oracle. The round score is the mean absolute error of those
//! reconstructions, so all strategies are compared on the same footing.

use nalgebra::distance;
use std::collections::{BTreeMap, HashMap};

use crate::environment::{EnvironmentField, Reading, Variable};
use crate::sensor::{SensorField, SensorId};

/// Distance offset so co-located neighbors cannot divide by zero.
const EPSILON: f64 = 1e-6;

/// Reconstructs readings for missing sensors and scores each round.
pub struct ReadingEstimator {
    last_known: HashMap<SensorId, Reading>,
    neighbor_count: usize,
}

impl ReadingEstimator {
    pub fn new(neighbor_count: usize) -> Self {
        Self {
            last_known: HashMap::new(),
            neighbor_count,
        }
    }

    /// Folds one round in: refreshes the cache from alive awake sensors,
    /// then reconstructs every dead or sleeping sensor's reading and
    /// returns the mean absolute error across them. Rounds with no missing
    /// sensors score 0.
    pub fn observe_round(
        &mut self,
        layout: &SensorField,
        working: &SensorField,
        readings: &BTreeMap<SensorId, Reading>,
        env: &EnvironmentField,
        round: usize,
    ) -> f64 {
        for sensor in working.sensors() {
            if sensor.is_active() {
                if let Some(reading) = readings.get(&sensor.id) {
                    self.last_known.insert(sensor.id, *reading);
                }
            }
        }

        let missing: Vec<SensorId> = working
            .sensors()
            .iter()
            .filter(|s| !s.is_active())
            .map(|s| s.id)
            .collect();
        if missing.is_empty() {
            return 0.0;
        }

        let error_sum: f64 = missing
            .iter()
            .filter_map(|&id| {
                let truth = readings.get(&id)?;
                Some(self.estimate(id, layout, env, round).mean_abs_error(truth))
            })
            .sum();
        error_sum / missing.len() as f64
    }

    /// Reconstruction error against fresh ground truth as if every sensor
    /// were permanently in its last-known state. The cache is not updated.
    /// Used by the orchestrator to extend shorter-lived strategies' error
    /// series to a common horizon.
    pub fn estimate_all(&self, layout: &SensorField, env: &EnvironmentField, round: usize) -> f64 {
        if layout.is_empty() {
            return 0.0;
        }
        let error_sum: f64 = layout
            .sensors()
            .iter()
            .map(|sensor| {
                let truth = env.reading(&sensor.position, round);
                self.estimate(sensor.id, layout, env, round)
                    .mean_abs_error(&truth)
            })
            .sum();
        error_sum / layout.len() as f64
    }

    /// Inverse-distance-weighted average of the k nearest cached neighbors,
    /// falling back to the environment oracle when no neighbor has data.
    fn estimate(
        &self,
        id: SensorId,
        layout: &SensorField,
        env: &EnvironmentField,
        round: usize,
    ) -> Reading {
        let Some(target) = layout.get(id) else {
            return Reading::zero();
        };

        let mut neighbors: Vec<(f64, &Reading)> = layout
            .sensors()
            .iter()
            .filter(|s| s.id != id)
            .filter_map(|s| {
                self.last_known
                    .get(&s.id)
                    .map(|r| (distance(&target.position, &s.position), r))
            })
            .collect();
        if neighbors.is_empty() {
            return env.reading(&target.position, round);
        }
        neighbors.sort_by(|a, b| a.0.total_cmp(&b.0));
        neighbors.truncate(self.neighbor_count);

        let mut estimate = Reading::zero();
        let mut weight_sum = 0.0;
        for (d, reading) in &neighbors {
            let weight = 1.0 / (d + EPSILON);
            weight_sum += weight;
            for variable in Variable::ALL {
                estimate.set(variable, estimate.get(variable) + weight * reading.get(variable));
            }
        }
        for variable in Variable::ALL {
            estimate.set(variable, estimate.get(variable) / weight_sum);
        }
        estimate
    }
}
