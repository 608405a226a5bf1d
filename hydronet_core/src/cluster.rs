//! Cluster topology types.
//!
//! A [`Cluster`] is one round's grouping: exactly one head (alive at
//! formation time, drawn from the members it leads), the active members it
//! aggregates for, and optionally the sleeping members attached to it by the
//! entropy-gated strategy. Member state is snapshotted per round; frames are
//! immutable once appended to history.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::sensor::{Sensor, SensorField, SensorId};

/// A sensor's state captured at one point within a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub id: SensorId,
    pub position: Point2<f64>,
    pub energy: f64,
    pub asleep: bool,
}

impl MemberSnapshot {
    pub fn of(sensor: &Sensor) -> Self {
        Self {
            id: sensor.id,
            position: sensor.position,
            energy: sensor.energy,
            asleep: sensor.asleep,
        }
    }
}

/// One cluster in a round's topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: u32,

    /// The member responsible for aggregation and uplink.
    pub head: SensorId,

    /// Active members, head included.
    pub members: Vec<MemberSnapshot>,

    /// Sleeping members attached by the entropy-gated strategy.
    pub sleeping: Vec<MemberSnapshot>,
}

impl Cluster {
    pub fn new(id: u32, head: SensorId, members: Vec<MemberSnapshot>) -> Self {
        Self {
            id,
            head,
            members,
            sleeping: Vec::new(),
        }
    }

    /// Snapshot of the head, if still present among the members.
    pub fn head_snapshot(&self) -> Option<&MemberSnapshot> {
        self.members.iter().find(|m| m.id == self.head)
    }

    /// Position of the head at snapshot time.
    pub fn head_position(&self) -> Option<Point2<f64>> {
        self.head_snapshot().map(|m| m.position)
    }

    /// Total sensors tracked by this cluster (active + sleeping).
    pub fn size(&self) -> usize {
        self.members.len() + self.sleeping.len()
    }
}

/// Carries a previous round's topology forward: refreshes every member
/// snapshot from current sensor state, drops members that have since died,
/// and drops whole clusters whose head died. Sleeping members keep their
/// epoch-time cluster assignment.
pub fn carry_forward(previous: &[Cluster], field: &SensorField) -> Vec<Cluster> {
    previous
        .iter()
        .filter_map(|cluster| {
            let head_alive = field.get(cluster.head).map(Sensor::is_alive)?;
            if !head_alive {
                return None;
            }
            let members: Vec<MemberSnapshot> = cluster
                .members
                .iter()
                .filter_map(|m| field.get(m.id))
                .filter(|s| s.is_alive())
                .map(MemberSnapshot::of)
                .collect();
            if members.is_empty() {
                return None;
            }
            let sleeping = cluster
                .sleeping
                .iter()
                .filter_map(|m| field.get(m.id))
                .filter(|s| s.is_alive())
                .map(MemberSnapshot::of)
                .collect();
            Some(Cluster {
                id: cluster.id,
                head: cluster.head,
                members,
                sleeping,
            })
        })
        .collect()
}

/// Refreshes every snapshot in `clusters` from current sensor state without
/// changing membership. Used to record post-energy state into the frame.
pub fn refresh_snapshots(clusters: &mut [Cluster], field: &SensorField) {
    for cluster in clusters {
        for member in cluster.members.iter_mut().chain(cluster.sleeping.iter_mut()) {
            if let Some(sensor) = field.get(member.id) {
                member.energy = sensor.energy;
                member.asleep = sensor.asleep;
            }
        }
    }
}
