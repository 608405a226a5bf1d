//! Per-round energy depletion model.
//!
//! Pure bookkeeping over the round's cluster topology: heads pay receive +
//! uplink costs, active members pay transmit plus distance attenuation,
//! sleeping members pay a small drain, and every alive awake sensor pays the
//! idle drain exactly once per round in a single global pass. All debits
//! clamp at the 0 floor; energy never recovers.

use nalgebra::distance_squared;

use crate::cluster::Cluster;
use crate::config::SimulationConfig;
use crate::sensor::SensorField;

/// Applies one round's energy costs to `field` in place given the round's
/// topology. Clusters whose head has died are not charged.
pub fn apply_round_cost(clusters: &[Cluster], field: &mut SensorField, config: &SimulationConfig) {
    let costs = config.energy;

    for cluster in clusters {
        let head_position = match field.get(cluster.head) {
            Some(head) if head.is_alive() => head.position,
            _ => continue,
        };

        let mut active_members = 0usize;
        for member in &cluster.members {
            if member.id == cluster.head {
                continue;
            }
            let Some(sensor) = field.get_mut(member.id) else {
                continue;
            };
            if !sensor.is_active() {
                continue;
            }
            active_members += 1;
            let d2 = distance_squared(&sensor.position, &head_position);
            sensor.drain(costs.transmit + costs.amplifier * d2);
        }

        for member in &cluster.sleeping {
            if let Some(sensor) = field.get_mut(member.id) {
                if sensor.is_alive() {
                    sensor.drain(costs.sleep_drain);
                }
            }
        }

        if let Some(head) = field.get_mut(cluster.head) {
            head.drain(active_members as f64 * costs.receive + costs.uplink);
        }
    }

    // Idle drain is charged once per round across the whole field, not per
    // cluster.
    for sensor in field.sensors_mut() {
        if sensor.is_active() {
            sensor.drain(costs.idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::MemberSnapshot;
    use crate::sensor::{Sensor, SensorId};
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    fn field_with_positions(positions: &[(f64, f64)]) -> SensorField {
        let sensors = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Sensor::new(i as SensorId, Point2::new(x, y), 100.0))
            .collect();
        SensorField::from_sensors(sensors)
    }

    fn cluster_over(field: &SensorField, head: SensorId, ids: &[SensorId]) -> Cluster {
        let members = ids
            .iter()
            .map(|&i| MemberSnapshot::of(field.get(i).unwrap()))
            .collect();
        Cluster::new(0, head, members)
    }

    #[test]
    fn test_member_pays_transmit_plus_distance() {
        let config = config();
        let mut field = field_with_positions(&[(0.0, 0.0), (30.0, 40.0)]);
        let cluster = cluster_over(&field, 0, &[0, 1]);

        apply_round_cost(&[cluster], &mut field, &config);

        // Member 1 sits 50m from its head: transmit + amp * 50^2 + idle.
        let expected = config.energy.transmit + config.energy.amplifier * 2500.0 + config.energy.idle;
        assert_relative_eq!(field.get(1).unwrap().energy, 100.0 - expected);
    }

    #[test]
    fn test_head_pays_receive_per_active_member_plus_uplink() {
        let config = config();
        let mut field = field_with_positions(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let cluster = cluster_over(&field, 0, &[0, 1, 2]);

        apply_round_cost(&[cluster], &mut field, &config);

        let expected = 2.0 * config.energy.receive + config.energy.uplink + config.energy.idle;
        assert_relative_eq!(field.get(0).unwrap().energy, 100.0 - expected);
    }

    #[test]
    fn test_sleeping_member_pays_only_sleep_drain() {
        let config = config();
        let mut field = field_with_positions(&[(0.0, 0.0), (10.0, 0.0)]);
        field.get_mut(1).unwrap().asleep = true;
        let mut cluster = cluster_over(&field, 0, &[0]);
        cluster.sleeping.push(MemberSnapshot::of(field.get(1).unwrap()));

        apply_round_cost(&[cluster], &mut field, &config);

        assert_relative_eq!(
            field.get(1).unwrap().energy,
            100.0 - config.energy.sleep_drain
        );
        // Head had no active members to receive from.
        assert_relative_eq!(
            field.get(0).unwrap().energy,
            100.0 - config.energy.uplink - config.energy.idle
        );
    }

    #[test]
    fn test_idle_drain_once_with_multiple_clusters() {
        let config = config();
        let mut field =
            field_with_positions(&[(0.0, 0.0), (10.0, 0.0), (400.0, 400.0), (410.0, 400.0)]);
        let clusters = vec![
            cluster_over(&field, 0, &[0, 1]),
            cluster_over(&field, 2, &[2, 3]),
        ];

        apply_round_cost(&clusters, &mut field, &config);

        // Two clusters in the round must not double the idle drain.
        let expected =
            config.energy.transmit + config.energy.amplifier * 100.0 + config.energy.idle;
        assert_relative_eq!(field.get(1).unwrap().energy, 100.0 - expected);
    }

    #[test]
    fn test_dead_head_cluster_not_charged() {
        let config = config();
        let mut field = field_with_positions(&[(0.0, 0.0), (10.0, 0.0)]);
        let cluster = cluster_over(&field, 0, &[0, 1]);
        field.get_mut(0).unwrap().energy = 0.0;

        apply_round_cost(&[cluster], &mut field, &config);

        // Member only pays the global idle drain.
        assert_relative_eq!(field.get(1).unwrap().energy, 100.0 - config.energy.idle);
        assert_eq!(field.get(0).unwrap().energy, 0.0);
    }

    #[test]
    fn test_energy_clamps_at_zero() {
        let config = config();
        let mut field = field_with_positions(&[(0.0, 0.0), (100.0, 0.0)]);
        field.get_mut(1).unwrap().energy = 0.1;
        let cluster = cluster_over(&field, 0, &[0, 1]);

        apply_round_cost(&[cluster], &mut field, &config);

        assert_eq!(field.get(1).unwrap().energy, 0.0);
    }
}
