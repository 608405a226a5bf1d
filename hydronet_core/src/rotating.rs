//! Rotating-head clustering (LEACH-style probabilistic head rotation).
//!
//! Cross-round state is explicit: the strategy owns the round in which each
//! sensor last served as head, and sensors that led within the current
//! rotation cycle are ineligible until the cycle wraps. A top-energy forcing
//! fallback guarantees the round always has at least one head while any
//! sensor is alive.

use nalgebra::{distance_squared, Point2};
use std::collections::HashMap;

use crate::cluster::{Cluster, MemberSnapshot};
use crate::sensor::{Sensor, SensorId};
use crate::strategy::ClusterContext;

/// Cap on the energy multiplier applied to the rotation threshold.
const ENERGY_FACTOR_CAP: f64 = 2.0;

/// Per-sensor rotation state for the LEACH-style strategy.
#[derive(Debug, Default)]
pub struct RotatingHeadState {
    /// Round in which each sensor last served as head.
    last_head_round: HashMap<SensorId, usize>,
}

impl RotatingHeadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects heads for this round and partitions alive sensors around
    /// them. Returns an empty sequence if no sensors are alive.
    pub fn cluster(&mut self, ctx: &ClusterContext) -> Vec<Cluster> {
        let alive: Vec<&Sensor> = ctx.field.alive().collect();
        if alive.is_empty() {
            return Vec::new();
        }

        let desired = ctx.config.cluster_count.min(alive.len());
        let probability = desired as f64 / alive.len() as f64;
        let cycle = (1.0 / probability).ceil() as usize;
        let cycle_start = ctx.round - (ctx.round % cycle);

        // Threshold rises as the cycle progresses so late-cycle sensors
        // that have not yet served become near-certain picks.
        let denominator = 1.0 - probability * (ctx.round % cycle) as f64;
        let threshold = if denominator > f64::EPSILON {
            probability / denominator
        } else {
            1.0
        };
        let reference = ctx.config.initial_energy.max(f64::MIN_POSITIVE);

        let mut ranked: Vec<(f64, &Sensor)> = alive
            .iter()
            .map(|&sensor| {
                let served_this_cycle = self
                    .last_head_round
                    .get(&sensor.id)
                    .is_some_and(|&r| r >= cycle_start);
                let eligibility = if served_this_cycle {
                    0.0
                } else {
                    let factor = (sensor.energy / reference).min(ENERGY_FACTOR_CAP);
                    threshold * factor
                };
                (eligibility, sensor)
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then(b.1.energy.total_cmp(&a.1.energy))
                .then(a.1.id.cmp(&b.1.id))
        });

        let mut heads: Vec<&Sensor> = ranked
            .iter()
            .filter(|(eligibility, _)| *eligibility > 0.0)
            .take(desired)
            .map(|&(_, sensor)| sensor)
            .collect();

        // Not enough eligible sensors mid-cycle: force the remaining
        // top-energy sensors into headship.
        if heads.len() < desired {
            let mut remaining: Vec<&Sensor> = alive
                .iter()
                .copied()
                .filter(|s| !heads.iter().any(|h| h.id == s.id))
                .collect();
            remaining.sort_by(|a, b| b.energy.total_cmp(&a.energy).then(a.id.cmp(&b.id)));
            for sensor in remaining {
                if heads.len() >= desired {
                    break;
                }
                heads.push(sensor);
            }
        }

        for head in &heads {
            self.last_head_round.insert(head.id, ctx.round);
        }

        let head_positions: Vec<Point2<f64>> = heads.iter().map(|h| h.position).collect();
        let mut clusters: Vec<Cluster> = heads
            .iter()
            .enumerate()
            .map(|(i, head)| Cluster::new(i as u32, head.id, vec![MemberSnapshot::of(head)]))
            .collect();

        for sensor in &alive {
            if heads.iter().any(|h| h.id == sensor.id) {
                continue;
            }
            let nearest = head_positions
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    distance_squared(&sensor.position, a)
                        .total_cmp(&distance_squared(&sensor.position, b))
                })
                .map(|(i, _)| i)
                .unwrap_or(0);
            clusters[nearest].members.push(MemberSnapshot::of(sensor));
        }

        clusters.retain(|c| !c.members.is_empty());
        clusters
    }
}
